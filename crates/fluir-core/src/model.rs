//! The Program Model: the hierarchical source of truth owned by the edit
//! service.
//!
//! A [`ProgramModel`] is a list of declarations. Today the only declaration
//! kind is a [`Function`], which owns an ordered list of [`Node`]s and an
//! ordered list of [`Conduit`]s. All ids are local to the owning declaration;
//! the [`QualifiedAddress`] of an entity is its declaration's id followed by
//! its local id.
//!
//! The client never mutates a model. Each successful edit response carries a
//! fresh model that replaces the previous one wholesale.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::{LocalId, QualifiedAddress};

/// Placement and draw order of an entity, in model units.
///
/// `z` is draw order, not a third spatial axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub width: i32,
    pub height: i32,
}

impl Location {
    pub fn new(x: i32, y: i32, z: i32, width: i32, height: i32) -> Self {
        Location {
            x,
            y,
            z,
            width,
            height,
        }
    }
}

/// Operator symbols carried by operator nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// Placeholder for an operator that has not been chosen yet.
    #[serde(rename = "<?>")]
    Unknown,
    #[serde(rename = "+")]
    Plus,
    #[serde(rename = "-")]
    Minus,
    #[serde(rename = "*")]
    Star,
    #[serde(rename = "/")]
    Slash,
}

impl Operator {
    /// Symbols a binary operator node may take.
    pub const BINARY: [Operator; 4] = [
        Operator::Plus,
        Operator::Minus,
        Operator::Star,
        Operator::Slash,
    ];

    /// Symbols a unary operator node may take.
    pub const UNARY: [Operator; 2] = [Operator::Plus, Operator::Minus];

    pub fn symbol(self) -> &'static str {
        match self {
            Operator::Unknown => "<?>",
            Operator::Plus => "+",
            Operator::Minus => "-",
            Operator::Star => "*",
            Operator::Slash => "/",
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Operator> {
        match symbol {
            "<?>" => Some(Operator::Unknown),
            "+" => Some(Operator::Plus),
            "-" => Some(Operator::Minus),
            "*" => Some(Operator::Star),
            "/" => Some(Operator::Slash),
            _ => None,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Value type of a constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlType {
    F64,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
}

impl FlType {
    pub const ALL: [FlType; 9] = [
        FlType::F64,
        FlType::I8,
        FlType::I16,
        FlType::I32,
        FlType::I64,
        FlType::U8,
        FlType::U16,
        FlType::U32,
        FlType::U64,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FlType::F64 => "F64",
            FlType::I8 => "I8",
            FlType::I16 => "I16",
            FlType::I32 => "I32",
            FlType::I64 => "I64",
            FlType::U8 => "U8",
            FlType::U16 => "U16",
            FlType::U32 => "U32",
            FlType::U64 => "U64",
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, FlType::F64)
    }

    pub fn is_signed_integer(self) -> bool {
        matches!(self, FlType::I8 | FlType::I16 | FlType::I32 | FlType::I64)
    }

    pub fn is_unsigned_integer(self) -> bool {
        matches!(self, FlType::U8 | FlType::U16 | FlType::U32 | FlType::U64)
    }
}

impl fmt::Display for FlType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A literal value node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constant {
    pub id: LocalId,
    pub location: Location,
    #[serde(rename = "flType", default = "default_fl_type")]
    pub fl_type: FlType,
    /// The literal exactly as the service stores it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

fn default_fl_type() -> FlType {
    FlType::F64
}

/// A two-input operator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryOp {
    pub id: LocalId,
    pub location: Location,
    pub op: Operator,
}

/// A one-input operator node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnaryOp {
    pub id: LocalId,
    pub location: Location,
    pub op: Operator,
}

/// A node inside a function body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "snake_case")]
pub enum Node {
    Constant(Constant),
    Binary(BinaryOp),
    Unary(UnaryOp),
}

impl Node {
    pub fn id(&self) -> LocalId {
        match self {
            Node::Constant(c) => c.id,
            Node::Binary(b) => b.id,
            Node::Unary(u) => u.id,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Node::Constant(c) => &c.location,
            Node::Binary(b) => &b.location,
            Node::Unary(u) => &u.location,
        }
    }

    /// Number of input ports the node exposes.
    pub fn input_count(&self) -> u32 {
        match self {
            Node::Constant(_) => 0,
            Node::Binary(_) => 2,
            Node::Unary(_) => 1,
        }
    }
}

/// One branch of a conduit tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "snake_case")]
pub enum ConduitChild {
    /// Terminal consumer port.
    ConduitOutput {
        target: LocalId,
        #[serde(default)]
        index: u32,
    },
    /// Branch point fanning out to further children.
    ConduitSegment {
        #[serde(default)]
        children: Vec<ConduitChild>,
    },
}

/// A data-flow connection: a small tree rooted at one producer port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conduit {
    pub id: LocalId,
    /// Local id of the producing node.
    pub input: LocalId,
    /// Producer port index.
    #[serde(default)]
    pub index: u32,
    #[serde(default)]
    pub children: Vec<ConduitChild>,
}

impl Conduit {
    /// Terminal `(target, port)` pairs in pre-order.
    pub fn outputs(&self) -> Vec<(LocalId, u32)> {
        fn walk(children: &[ConduitChild], out: &mut Vec<(LocalId, u32)>) {
            for child in children {
                match child {
                    ConduitChild::ConduitOutput { target, index } => out.push((*target, *index)),
                    ConduitChild::ConduitSegment { children } => walk(children, out),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.children, &mut out);
        out
    }
}

/// A function declaration and its body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub id: LocalId,
    pub location: Location,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub conduits: Vec<Conduit>,
}

impl Function {
    pub fn node(&self, id: LocalId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn conduit(&self, id: LocalId) -> Option<&Conduit> {
        self.conduits.iter().find(|c| c.id == id)
    }

    /// Highest draw order among the body's nodes, `None` for an empty body.
    pub fn max_node_z(&self) -> Option<i32> {
        self.nodes.iter().map(|n| n.location().z).max()
    }
}

/// A top-level declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "discriminator", rename_all = "snake_case")]
pub enum Declaration {
    Function(Function),
}

impl Declaration {
    pub fn id(&self) -> LocalId {
        match self {
            Declaration::Function(f) => f.id,
        }
    }

    pub fn location(&self) -> &Location {
        match self {
            Declaration::Function(f) => &f.location,
        }
    }
}

/// A borrowed view of whatever a Qualified Address resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity<'a> {
    Declaration(&'a Declaration),
    Node(&'a Node),
    Conduit(&'a Conduit),
}

/// The whole program as last returned by the edit service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgramModel {
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

impl ProgramModel {
    pub fn declaration(&self, id: LocalId) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.id() == id)
    }

    /// Resolves an address to the entity it names.
    ///
    /// Node and conduit ids share one local id space per function; a node
    /// wins if both were to carry the same id.
    pub fn find(&self, address: &QualifiedAddress) -> Option<Entity<'_>> {
        match address.segments() {
            [decl] => self.declaration(*decl).map(Entity::Declaration),
            [decl, local] => match self.declaration(*decl)? {
                Declaration::Function(f) => f
                    .node(*local)
                    .map(Entity::Node)
                    .or_else(|| f.conduit(*local).map(Entity::Conduit)),
            },
            _ => None,
        }
    }

    /// The function owning the entity at `address` (or named by it).
    pub fn owning_function(&self, address: &QualifiedAddress) -> Option<&Function> {
        let decl = *address.segments().first()?;
        match self.declaration(decl)? {
            Declaration::Function(f) => Some(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> ProgramModel {
        serde_json::from_value(json!({
            "declarations": [{
                "discriminator": "function",
                "name": "main",
                "id": 1,
                "location": {"x": 0, "y": 0, "z": 0, "width": 200, "height": 200},
                "nodes": [
                    {"discriminator": "constant", "id": 2, "flType": "F64", "value": "1.5",
                     "location": {"x": 10, "y": 20, "z": 0, "width": 12, "height": 5}},
                    {"discriminator": "binary", "id": 3, "op": "+",
                     "location": {"x": 40, "y": 20, "z": 1, "width": 6, "height": 5}}
                ],
                "conduits": [
                    {"id": 4, "input": 2, "index": 0, "children": [
                        {"discriminator": "conduit_output", "target": 3, "index": 1}
                    ]}
                ]
            }]
        }))
        .unwrap()
    }

    #[test]
    fn deserializes_tagged_model() {
        let model = sample();
        let Declaration::Function(f) = &model.declarations[0];
        assert_eq!(f.name, "main");
        assert_eq!(f.nodes.len(), 2);
        assert!(matches!(f.nodes[1], Node::Binary(BinaryOp { op: Operator::Plus, .. })));
        assert_eq!(f.conduits[0].outputs(), vec![(3, 1)]);
    }

    #[test]
    fn serializes_discriminators() {
        let model = sample();
        let value = serde_json::to_value(&model).unwrap();
        assert_eq!(value["declarations"][0]["discriminator"], "function");
        assert_eq!(value["declarations"][0]["nodes"][0]["discriminator"], "constant");
        assert_eq!(value["declarations"][0]["nodes"][0]["flType"], "F64");
        assert_eq!(
            value["declarations"][0]["conduits"][0]["children"][0]["discriminator"],
            "conduit_output"
        );
    }

    #[test]
    fn unknown_operator_symbol() {
        let op: Operator = serde_json::from_str("\"<?>\"").unwrap();
        assert_eq!(op, Operator::Unknown);
        assert_eq!(Operator::from_symbol("*"), Some(Operator::Star));
        assert_eq!(Operator::from_symbol("%"), None);
    }

    #[test]
    fn find_resolves_each_level() {
        let model = sample();
        assert!(matches!(
            model.find(&QualifiedAddress::root(1)),
            Some(Entity::Declaration(_))
        ));
        assert!(matches!(
            model.find(&QualifiedAddress::from_segments(&[1, 2])),
            Some(Entity::Node(Node::Constant(_)))
        ));
        assert!(matches!(
            model.find(&QualifiedAddress::from_segments(&[1, 4])),
            Some(Entity::Conduit(_))
        ));
        assert_eq!(model.find(&QualifiedAddress::from_segments(&[1, 9])), None);
        assert_eq!(model.find(&QualifiedAddress::from_segments(&[1, 2, 3])), None);
    }

    #[test]
    fn segment_outputs_are_preorder() {
        let conduit = Conduit {
            id: 9,
            input: 1,
            index: 0,
            children: vec![
                ConduitChild::ConduitSegment {
                    children: vec![
                        ConduitChild::ConduitOutput { target: 2, index: 0 },
                        ConduitChild::ConduitOutput { target: 3, index: 1 },
                    ],
                },
                ConduitChild::ConduitOutput { target: 4, index: 0 },
            ],
        };
        assert_eq!(conduit.outputs(), vec![(2, 0), (3, 1), (4, 0)]);
    }

    #[test]
    fn max_node_z() {
        let model = sample();
        let f = model.owning_function(&QualifiedAddress::root(1)).unwrap();
        assert_eq!(f.max_node_z(), Some(1));
    }
}
