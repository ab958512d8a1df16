//! The editor session: current snapshot, projection and request sequencing.
//!
//! An [`EditorSession`] owns the last program status the edit service
//! returned. Nothing changes it except a successful response: commands are
//! sent, and only the response replaces the snapshot and triggers
//! re-projection. Every request is tagged with a monotonically increasing
//! [`Ticket`] and a UUID request id. A response for a ticket older than the
//! last applied one is dropped as stale instead of clobbering newer state.
//!
//! Failures are never fatal. A rejected or unreachable request leaves the
//! snapshot alone, records a [`Notice`] and is logged at `warn`.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use fluir_core::{
    commands, project, validate_handles, CommandSink, CoreError, Declaration, EditCommand, Entity,
    Node, ProgramModel, ProjectionDiff, ProjectionInput, ProjectionOptions, QualifiedAddress,
    VisualGraph, Zoom,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ClientError;
use crate::interaction::{DragInteraction, ResizeInteraction, TextEdit};
use crate::picker::PathPicker;
use crate::schema::{ProgramStatus, ServiceRequest};
use crate::service::EditService;

/// Sequence number of one request within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(pub u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A request that has been issued but not yet answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub ticket: Ticket,
    pub request_id: Uuid,
    pub request: ServiceRequest,
}

/// What happened to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The snapshot was replaced; the diff lists re-rendered elements.
    Applied(ProjectionDiff),
    /// A newer response was already applied; this one was dropped.
    Stale(Ticket),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    ValidationRejected,
    CommandRejected,
    Transport,
    Encode,
    Decode,
    NoProgram,
    UnknownTarget,
}

/// A user-visible message about a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub request_id: Option<Uuid>,
}

impl Notice {
    fn from_error(err: &ClientError, request_id: Option<Uuid>) -> Self {
        let kind = match err {
            ClientError::ValidationRejected(_) => NoticeKind::ValidationRejected,
            ClientError::CommandRejected { .. } => NoticeKind::CommandRejected,
            ClientError::Transport(_) => NoticeKind::Transport,
            ClientError::Encode(_) => NoticeKind::Encode,
            ClientError::Decode(_) => NoticeKind::Decode,
            ClientError::NoProgram => NoticeKind::NoProgram,
            ClientError::UnknownTarget(_) => NoticeKind::UnknownTarget,
        };
        Notice {
            kind,
            message: err.to_string(),
            request_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Command queue
// ---------------------------------------------------------------------------

/// A [`CommandSink`] feeding an unbounded channel, so synchronous
/// [`Emitter`](fluir_core::Emitter)s can hand commands to the async session.
#[derive(Debug, Clone)]
pub struct CommandQueue {
    tx: mpsc::UnboundedSender<EditCommand>,
}

pub type CommandReceiver = mpsc::UnboundedReceiver<EditCommand>;

impl CommandQueue {
    pub fn channel() -> (CommandQueue, CommandReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (CommandQueue { tx }, rx)
    }
}

impl CommandSink for CommandQueue {
    fn commit(&self, command: EditCommand) {
        if self.tx.send(command).is_err() {
            warn!("command queue closed, dropping command");
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

pub struct EditorSession<S> {
    service: S,
    status: Option<Arc<ProgramStatus>>,
    zoom: Zoom,
    options: ProjectionOptions,
    graph: VisualGraph,
    next_ticket: u64,
    last_applied: Option<Ticket>,
    notices: Vec<Notice>,
}

impl<S: EditService> EditorSession<S> {
    pub fn new(service: S) -> Self {
        EditorSession {
            service,
            status: None,
            zoom: Zoom::default(),
            options: ProjectionOptions::default(),
            graph: VisualGraph::default(),
            next_ticket: 1,
            last_applied: None,
            notices: Vec::new(),
        }
    }

    pub fn with_options(mut self, options: ProjectionOptions) -> Self {
        self.options = options;
        self.reproject();
        self
    }

    pub fn service(&self) -> &S {
        &self.service
    }

    // -- Snapshot accessors -------------------------------------------------

    /// The current immutable snapshot, shareable with renderers.
    pub fn snapshot(&self) -> Option<Arc<ProgramStatus>> {
        self.status.clone()
    }

    pub fn program(&self) -> Option<&ProgramModel> {
        self.status.as_deref().map(|s| &s.program)
    }

    pub fn graph(&self) -> &VisualGraph {
        &self.graph
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn options(&self) -> ProjectionOptions {
        self.options
    }

    pub fn saved(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s.saved)
    }

    pub fn path(&self) -> Option<&str> {
        self.status.as_deref().and_then(|s| s.path.as_deref())
    }

    pub fn can_undo(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s.can_undo)
    }

    pub fn can_redo(&self) -> bool {
        self.status.as_deref().is_some_and(|s| s.can_redo)
    }

    pub fn last_applied(&self) -> Option<Ticket> {
        self.last_applied
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // -- Zoom ---------------------------------------------------------------

    pub fn set_zoom(&mut self, zoom: Zoom) -> ProjectionDiff {
        self.zoom = zoom;
        self.reproject()
    }

    pub fn zoom_in(&mut self, step: f64) -> Result<ProjectionDiff, ClientError> {
        let zoom = self.zoom.zoom_in(step).map_err(CoreError::from)?;
        Ok(self.set_zoom(zoom))
    }

    pub fn zoom_out(&mut self, step: f64) -> Result<ProjectionDiff, ClientError> {
        let zoom = self.zoom.zoom_out(step).map_err(CoreError::from)?;
        Ok(self.set_zoom(zoom))
    }

    // -- Request sequencing -------------------------------------------------

    /// Issues a ticket for `request`. Fails (and records a notice) when the
    /// request needs an open program and there is none.
    pub fn begin(&mut self, request: ServiceRequest) -> Result<PendingRequest, ClientError> {
        if request.requires_program() && self.status.is_none() {
            return Err(self.reject(ClientError::NoProgram, None));
        }
        let ticket = Ticket(self.next_ticket);
        self.next_ticket += 1;
        let request_id = Uuid::new_v4();
        debug!(%ticket, %request_id, action = request.action(), "issued request");
        Ok(PendingRequest {
            ticket,
            request_id,
            request,
        })
    }

    /// Applies the service's answer to a pending request.
    pub fn complete(
        &mut self,
        pending: &PendingRequest,
        result: Result<ProgramStatus, ClientError>,
    ) -> Result<ApplyOutcome, ClientError> {
        if let Some(last) = self.last_applied {
            if pending.ticket <= last {
                warn!(
                    ticket = %pending.ticket,
                    last_applied = %last,
                    request_id = %pending.request_id,
                    "dropping stale response"
                );
                return Ok(ApplyOutcome::Stale(pending.ticket));
            }
        }

        match result {
            Ok(status) => {
                self.status = Some(Arc::new(status));
                self.last_applied = Some(pending.ticket);
                let diff = self.reproject();
                info!(
                    ticket = %pending.ticket,
                    request_id = %pending.request_id,
                    action = pending.request.action(),
                    "applied response"
                );
                Ok(ApplyOutcome::Applied(diff))
            }
            Err(err) => Err(self.reject(err, Some(pending.request_id))),
        }
    }

    /// Sends one request and applies its response.
    pub async fn submit(&mut self, request: ServiceRequest) -> Result<ApplyOutcome, ClientError> {
        let pending = self.begin(request)?;
        let result = self
            .service
            .call(pending.request.clone(), pending.request_id)
            .await;
        self.complete(&pending, result)
    }

    // -- Service operations -------------------------------------------------

    pub async fn new_program(&mut self) -> Result<ApplyOutcome, ClientError> {
        self.submit(ServiceRequest::New).await
    }

    pub async fn open(&mut self, path: &Path) -> Result<ApplyOutcome, ClientError> {
        self.submit(ServiceRequest::Open {
            path: path.display().to_string(),
        })
        .await
    }

    /// Opens whatever the picker yields. `Ok(None)` when the user cancelled.
    pub async fn open_with(
        &mut self,
        picker: &mut impl PathPicker,
    ) -> Result<Option<ApplyOutcome>, ClientError> {
        match picker.pick_open() {
            Some(path) => self.open(&path).await.map(Some),
            None => Ok(None),
        }
    }

    /// Saves to `path`; `None` saves in place.
    pub async fn save(&mut self, path: Option<&Path>) -> Result<ApplyOutcome, ClientError> {
        let path = path.map(|p| p.display().to_string()).unwrap_or_default();
        self.submit(ServiceRequest::Save { path }).await
    }

    /// Saves to the path the picker yields. `Ok(None)` when cancelled.
    pub async fn save_with(
        &mut self,
        picker: &mut impl PathPicker,
    ) -> Result<Option<ApplyOutcome>, ClientError> {
        let current = self.path().map(|p| Path::new(p).to_path_buf());
        match picker.pick_save(current.as_deref()) {
            Some(path) => self.save(Some(&path)).await.map(Some),
            None => Ok(None),
        }
    }

    pub async fn undo(&mut self) -> Result<ApplyOutcome, ClientError> {
        self.submit(ServiceRequest::Undo).await
    }

    pub async fn redo(&mut self) -> Result<ApplyOutcome, ClientError> {
        self.submit(ServiceRequest::Redo).await
    }

    pub async fn edit(&mut self, command: EditCommand) -> Result<ApplyOutcome, ClientError> {
        self.submit(ServiceRequest::Edit(command)).await
    }

    /// Sends every command queued so far, in commit order.
    pub async fn flush(
        &mut self,
        queue: &mut CommandReceiver,
    ) -> Vec<Result<ApplyOutcome, ClientError>> {
        let mut results = Vec::new();
        while let Ok(command) = queue.try_recv() {
            results.push(self.edit(command).await);
        }
        results
    }

    /// Connects two ports. A connection that would close a cycle (or names a
    /// malformed handle) never reaches the service.
    pub async fn connect(
        &mut self,
        source_handle: &str,
        target_handle: &str,
    ) -> Result<ApplyOutcome, ClientError> {
        let (source, target) =
            match validate_handles(&self.graph.edges, source_handle, target_handle) {
                Ok(handles) => handles,
                Err(err) => return Err(self.reject(err.into(), None)),
            };
        self.edit(commands::add_conduit(&source, &target)).await
    }

    // -- Interactions -------------------------------------------------------

    pub fn begin_drag(&mut self, node_id: &str) -> Result<DragInteraction, ClientError> {
        let begun = match self.graph.node(node_id) {
            Some(node) => DragInteraction::begin(node).map_err(CoreError::from),
            None => return Err(self.reject(ClientError::UnknownTarget(node_id.to_string()), None)),
        };
        begun.map_err(|err| self.reject(err.into(), None))
    }

    /// Ends a drag; a drag that rounds to no movement sends nothing.
    pub async fn finish_drag(
        &mut self,
        drag: DragInteraction,
    ) -> Result<Option<ApplyOutcome>, ClientError> {
        match drag.finish(self.zoom, self.options.scalar) {
            Some(command) => self.edit(command).await.map(Some),
            None => Ok(None),
        }
    }

    pub fn begin_resize(&mut self, node_id: &str) -> Result<ResizeInteraction, ClientError> {
        let begun = match self.graph.node(node_id) {
            Some(node) => ResizeInteraction::begin(node).map_err(CoreError::from),
            None => return Err(self.reject(ClientError::UnknownTarget(node_id.to_string()), None)),
        };
        begun.map_err(|err| self.reject(err.into(), None))
    }

    pub async fn finish_resize(
        &mut self,
        resize: ResizeInteraction,
    ) -> Result<Option<ApplyOutcome>, ClientError> {
        match resize.finish(self.zoom, self.options.scalar) {
            Some(command) => self.edit(command).await.map(Some),
            None => Ok(None),
        }
    }

    /// Starts a text edit of a constant's literal or a declaration's name.
    pub fn begin_text_edit(&mut self, target: &QualifiedAddress) -> Result<TextEdit, ClientError> {
        let edit = match self.program().map(|p| p.find(target)) {
            None => Err(ClientError::NoProgram),
            Some(Some(Entity::Node(Node::Constant(c)))) => Ok(TextEdit::constant(
                target.clone(),
                c.fl_type,
                c.value.as_deref().unwrap_or_default(),
            )),
            Some(Some(Entity::Declaration(Declaration::Function(f)))) => {
                Ok(TextEdit::rename(target.clone(), &f.name))
            }
            Some(_) => Err(ClientError::UnknownTarget(target.to_string())),
        };
        edit.map_err(|err| self.reject(err, None))
    }

    /// Commits a text edit. Screening failures are reported without a request.
    pub async fn commit_text(&mut self, edit: TextEdit) -> Result<Option<ApplyOutcome>, ClientError> {
        match edit.commit() {
            Ok(Some(command)) => self.edit(command).await.map(Some),
            Ok(None) => Ok(None),
            Err(err) => Err(self.reject(err.into(), None)),
        }
    }

    // -- Internals ----------------------------------------------------------

    fn reject(&mut self, err: ClientError, request_id: Option<Uuid>) -> ClientError {
        warn!(error = %err, request_id = ?request_id, "action rejected");
        self.notices.push(Notice::from_error(&err, request_id));
        err
    }

    fn reproject(&mut self) -> ProjectionDiff {
        let graph = match self.status.as_deref() {
            Some(status) => project(
                ProjectionInput::new(&status.program, self.zoom).with_options(self.options),
            ),
            None => VisualGraph::default(),
        };
        let diff = graph.diff(&self.graph);
        if !diff.is_empty() {
            let fingerprint = match graph.fingerprint() {
                Ok(hash) => hash.to_hex().to_string(),
                Err(err) => {
                    warn!(error = %err, "could not fingerprint projection");
                    String::new()
                }
            };
            debug!(
                %fingerprint,
                added = diff.added_nodes.len() + diff.added_edges.len(),
                removed = diff.removed_nodes.len() + diff.removed_edges.len(),
                changed = diff.changed_nodes.len() + diff.changed_edges.len(),
                "reprojected"
            );
        }
        self.graph = graph;
        diff
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fluir_core::{ConnectionRejected, Emitter};
    use serde_json::json;
    use std::sync::Mutex;

    /// Answers from a script and records every request.
    #[derive(Default)]
    struct ScriptedService {
        responses: Mutex<Vec<Result<ProgramStatus, ClientError>>>,
        requests: Mutex<Vec<ServiceRequest>>,
    }

    impl ScriptedService {
        fn answering(responses: Vec<Result<ProgramStatus, ClientError>>) -> Self {
            ScriptedService {
                responses: Mutex::new(responses.into_iter().rev().collect()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requests(&self) -> Vec<ServiceRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl EditService for ScriptedService {
        async fn call(
            &self,
            request: ServiceRequest,
            _request_id: Uuid,
        ) -> Result<ProgramStatus, ClientError> {
            self.requests.lock().unwrap().push(request);
            self.responses
                .lock()
                .unwrap()
                .pop()
                .unwrap_or(Err(ClientError::Transport("script exhausted".to_string())))
        }
    }

    fn status(x: i32) -> ProgramStatus {
        serde_json::from_value(json!({
            "saved": false,
            "can_undo": true,
            "program": {"declarations": [{
                "discriminator": "function",
                "name": "main",
                "id": 0,
                "location": {"x": 0, "y": 0, "z": 0, "width": 100, "height": 100},
                "nodes": [
                    {"discriminator": "constant", "id": 1, "flType": "F64", "value": "1.0",
                     "location": {"x": x, "y": 10, "z": 1, "width": 12, "height": 5}},
                    {"discriminator": "unary", "id": 2, "op": "-",
                     "location": {"x": 40, "y": 10, "z": 2, "width": 6, "height": 5}},
                    {"discriminator": "unary", "id": 3, "op": "+",
                     "location": {"x": 60, "y": 10, "z": 3, "width": 6, "height": 5}}
                ],
                "conduits": [
                    {"id": 4, "input": 1, "index": 0,
                     "children": [{"discriminator": "conduit_output", "target": 2, "index": 0}]},
                    {"id": 5, "input": 2, "index": 0,
                     "children": [{"discriminator": "conduit_output", "target": 3, "index": 0}]}
                ]
            }]}
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn applied_response_replaces_snapshot() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![Ok(status(10))]));
        assert!(session.graph().nodes.is_empty());

        let outcome = session.new_program().await.unwrap();
        match outcome {
            ApplyOutcome::Applied(diff) => assert_eq!(diff.added_nodes.len(), 4),
            other => panic!("expected applied, got {:?}", other),
        }
        assert!(session.can_undo());
        assert_eq!(session.last_applied(), Some(Ticket(1)));
        assert!(session.graph().node("0:1").is_some());
    }

    #[tokio::test]
    async fn rejected_command_keeps_snapshot() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![
            Ok(status(10)),
            Err(ClientError::CommandRejected {
                status: 400,
                message: "bad target".to_string(),
            }),
        ]));
        session.new_program().await.unwrap();
        let before = session.snapshot().unwrap();

        let err = session
            .edit(commands::move_by(QualifiedAddress::from_segments(&[0, 9]), 1, 0))
            .await
            .unwrap_err();
        assert!(err.is_remote());
        assert!(Arc::ptr_eq(&before, &session.snapshot().unwrap()));
        assert_eq!(session.notices().len(), 1);
        assert_eq!(session.notices()[0].kind, NoticeKind::CommandRejected);
        assert!(session.notices()[0].request_id.is_some());
    }

    #[tokio::test]
    async fn stale_response_is_dropped() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![]));
        let first = session.begin(ServiceRequest::New).unwrap();
        let second = session.begin(ServiceRequest::New).unwrap();
        assert!(first.ticket < second.ticket);

        let applied = session.complete(&second, Ok(status(30))).unwrap();
        assert!(matches!(applied, ApplyOutcome::Applied(_)));

        let stale = session.complete(&first, Ok(status(10))).unwrap();
        assert_eq!(stale, ApplyOutcome::Stale(first.ticket));
        let x = session.graph().node("0:1").unwrap().position.x;
        assert_eq!(x, 300.0);
    }

    #[tokio::test]
    async fn edit_without_program_is_refused() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![]));
        let err = session.undo().await.unwrap_err();
        assert_eq!(err, ClientError::NoProgram);
        assert!(session.service().requests().is_empty());
        assert_eq!(session.take_notices()[0].kind, NoticeKind::NoProgram);
        assert!(session.notices().is_empty());
    }

    #[tokio::test]
    async fn cycle_never_reaches_service() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![Ok(status(10))]));
        session.new_program().await.unwrap();

        let err = session.connect("input-0:3-0", "output-0:1-0").await.unwrap_err();
        assert!(matches!(
            err,
            ClientError::ValidationRejected(CoreError::Connection(ConnectionRejected::WouldCycle { .. }))
        ));
        assert_eq!(session.service().requests().len(), 1);
        assert_eq!(session.notices()[0].kind, NoticeKind::ValidationRejected);
    }

    #[tokio::test]
    async fn text_edit_flows_through_session() {
        let mut session =
            EditorSession::new(ScriptedService::answering(vec![Ok(status(10)), Ok(status(10))]));
        session.new_program().await.unwrap();

        let target = QualifiedAddress::from_segments(&[0, 1]);
        let mut edit = session.begin_text_edit(&target).unwrap();
        edit.type_text("4.32");
        edit.type_text("13");
        session.commit_text(edit).await.unwrap();

        let requests = session.service().requests();
        assert_eq!(
            requests.last(),
            Some(&ServiceRequest::Edit(commands::update_constant(target.clone(), "4.3213")))
        );

        let mut edit = session.begin_text_edit(&target).unwrap();
        edit.type_text("abc");
        assert!(session.commit_text(edit).await.is_err());
        assert_eq!(session.service().requests().len(), 2);

        let edit = session.begin_text_edit(&target).unwrap();
        edit.cancel();
        assert_eq!(session.service().requests().len(), 2);
    }

    #[tokio::test]
    async fn drag_sends_one_move() {
        let mut session =
            EditorSession::new(ScriptedService::answering(vec![Ok(status(10)), Ok(status(12))]));
        session.new_program().await.unwrap();

        let mut drag = session.begin_drag("0:1").unwrap();
        drag.update(fluir_core::PixelDelta { dx: 8.0, dy: 1.0 });
        drag.update(fluir_core::PixelDelta { dx: 19.0, dy: 2.0 });
        let outcome = session.finish_drag(drag).await.unwrap().unwrap();
        match outcome {
            ApplyOutcome::Applied(diff) => assert_eq!(diff.changed_nodes, vec!["0:1"]),
            other => panic!("expected applied, got {:?}", other),
        }
        assert_eq!(
            session.service().requests().last(),
            Some(&ServiceRequest::Edit(commands::move_by(
                QualifiedAddress::from_segments(&[0, 1]),
                2,
                0
            )))
        );
        assert!(session.begin_drag("0:99").is_err());
    }

    #[tokio::test]
    async fn queued_emitter_commands_are_flushed() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![
            Ok(status(10)),
            Ok(status(11)),
            Ok(status(12)),
        ]));
        session.new_program().await.unwrap();

        let (queue, mut rx) = CommandQueue::channel();
        let emitter = Emitter::new(queue, QualifiedAddress::from_segments(&[0, 1]));
        emitter.move_by(1, 0);
        emitter.move_by(1, 0);

        let results = session.flush(&mut rx).await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.is_ok()));
        assert_eq!(session.last_applied(), Some(Ticket(3)));
    }

    #[tokio::test]
    async fn zoom_reprojects() {
        let mut session = EditorSession::new(ScriptedService::answering(vec![Ok(status(10))]));
        session.new_program().await.unwrap();
        let diff = session.zoom_in(2.0).unwrap();
        assert_eq!(diff.changed_nodes.len(), 4);
        assert_eq!(session.graph().node("0:1").unwrap().position.x, 200.0);
        assert!(session.zoom_in(0.5).is_err());
    }

    #[tokio::test]
    async fn picker_cancellation_sends_nothing() {
        use crate::picker::FixedPicker;

        let mut session = EditorSession::new(ScriptedService::answering(vec![Ok(status(10))]));
        let outcome = session.open_with(&mut FixedPicker::cancelled()).await.unwrap();
        assert_eq!(outcome, None);
        assert!(session.service().requests().is_empty());

        session
            .open_with(&mut FixedPicker::new("/tmp/demo.fl"))
            .await
            .unwrap();
        assert_eq!(
            session.service().requests(),
            vec![ServiceRequest::Open {
                path: "/tmp/demo.fl".to_string()
            }]
        );
    }
}
