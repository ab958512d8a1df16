//! End-to-end tests of the editor session against an in-process edit service.
//!
//! Each test starts an axum stub of the edit service on an ephemeral port and
//! drives an [`EditorSession`] over real HTTP through [`HttpEditService`].
//! The stub keeps a linear undo history and implements just enough of the
//! `move` command to observe its effect on the projection.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use fluir_client::{
    ApplyOutcome, ClientConfig, ClientError, EditorSession, HttpEditService, NoticeKind,
};
use fluir_core::{commands, PixelDelta, QualifiedAddress};

// ---------------------------------------------------------------------------
// Stub edit service
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Stub {
    history: Vec<Value>,
    cursor: usize,
    path: Option<String>,
    saved: bool,
    edits: Vec<Value>,
    request_ids: Vec<String>,
}

type Shared = Arc<Mutex<Stub>>;

fn initial_program() -> Value {
    json!({"declarations": [{
        "discriminator": "function",
        "name": "main",
        "id": 0,
        "location": {"x": 0, "y": 0, "z": 0, "width": 100, "height": 100},
        "nodes": [
            {"discriminator": "constant", "id": 1, "flType": "F64", "value": "1.0",
             "location": {"x": 10, "y": 10, "z": 1, "width": 12, "height": 5}},
            {"discriminator": "binary", "id": 2, "op": "+",
             "location": {"x": 40, "y": 10, "z": 2, "width": 6, "height": 5}}
        ],
        "conduits": [
            {"id": 3, "input": 1, "index": 0,
             "children": [{"discriminator": "conduit_output", "target": 2, "index": 0}]}
        ]
    }]})
}

impl Stub {
    fn status(&self) -> Value {
        json!({
            "saved": self.saved,
            "path": self.path,
            "program": self.history[self.cursor],
            "can_undo": self.cursor > 0,
            "can_redo": self.cursor + 1 < self.history.len(),
        })
    }

    fn record(&mut self, headers: &HeaderMap) {
        if let Some(id) = headers.get("x-request-id").and_then(|v| v.to_str().ok()) {
            self.request_ids.push(id.to_string());
        }
    }

    fn push(&mut self, program: Value) {
        self.history.truncate(self.cursor + 1);
        self.history.push(program);
        self.cursor = self.history.len() - 1;
        self.saved = false;
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

fn rejected(detail: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "detail": detail })))
}

async fn new_program(State(stub): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    stub.history = vec![initial_program()];
    stub.cursor = 0;
    stub.path = None;
    Json(stub.status())
}

async fn open(State(stub): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    let path = body["path"].as_str().unwrap_or_default().to_string();
    if !path.ends_with(".fl") {
        return Err(rejected("not a program file"));
    }
    stub.history = vec![initial_program()];
    stub.cursor = 0;
    stub.path = Some(path);
    stub.saved = true;
    Ok(Json(stub.status()))
}

async fn edit(State(stub): State<Shared>, headers: HeaderMap, Json(command): Json<Value>) -> Reply {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    stub.edits.push(command.clone());

    let mut program = stub.history[stub.cursor].clone();
    match command["discriminator"].as_str() {
        Some("move") => {
            let local = command["target"][1].as_u64();
            let nodes = program["declarations"][0]["nodes"]
                .as_array_mut()
                .ok_or_else(|| rejected("malformed program"))?;
            let node = nodes
                .iter_mut()
                .find(|n| n["id"].as_u64() == local)
                .ok_or_else(|| rejected("unknown target"))?;
            let x = node["location"]["x"].as_i64().unwrap_or_default();
            let y = node["location"]["y"].as_i64().unwrap_or_default();
            node["location"]["x"] = json!(x + command["dx"].as_i64().unwrap_or_default());
            node["location"]["y"] = json!(y + command["dy"].as_i64().unwrap_or_default());
        }
        _ => return Err(rejected("unsupported command")),
    }
    stub.push(program);
    Ok(Json(stub.status()))
}

async fn undo(State(stub): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    stub.cursor = stub.cursor.saturating_sub(1);
    Json(stub.status())
}

async fn redo(State(stub): State<Shared>, headers: HeaderMap) -> Json<Value> {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    if stub.cursor + 1 < stub.history.len() {
        stub.cursor += 1;
    }
    Json(stub.status())
}

async fn save(State(stub): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Reply {
    let mut stub = stub.lock().unwrap();
    stub.record(&headers);
    let path = body["path"].as_str().unwrap_or_default();
    if !path.is_empty() {
        stub.path = Some(path.to_string());
    }
    if stub.path.is_none() {
        return Err(rejected("no path to save to"));
    }
    stub.saved = true;
    Ok(Json(stub.status()))
}

async fn garbage() -> &'static str {
    "this is not a program status"
}

/// Starts the stub and returns a session talking to it.
async fn start_stub() -> (EditorSession<HttpEditService>, Shared) {
    let stub: Shared = Arc::new(Mutex::new(Stub::default()));
    let app = Router::new()
        .route("/api/module/new", post(new_program))
        .route("/api/module/open", post(open))
        .route("/api/module/edit", post(edit))
        .route("/api/module/undo", post(undo))
        .route("/api/module/redo", post(redo))
        .route("/api/module/save", post(save))
        .with_state(stub.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::default()
        .with_server_url(format!("http://{}", addr))
        .with_timeout(Duration::from_secs(5));
    let service = HttpEditService::new(config).unwrap();
    (EditorSession::new(service), stub)
}

fn constant_x(session: &EditorSession<HttpEditService>) -> f64 {
    session.graph().node("0:1").unwrap().position.x
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn edit_undo_redo_round_trip() {
    let (mut session, stub) = start_stub().await;

    session.new_program().await.unwrap();
    assert_eq!(session.graph().nodes.len(), 3);
    assert_eq!(session.graph().edges.len(), 1);
    assert!(!session.can_undo());

    let mut drag = session.begin_drag("0:1").unwrap();
    drag.update(PixelDelta { dx: 31.0, dy: 0.0 });
    let outcome = session.finish_drag(drag).await.unwrap().unwrap();
    match outcome {
        ApplyOutcome::Applied(diff) => assert_eq!(diff.changed_nodes, vec!["0:1"]),
        other => panic!("expected applied, got {:?}", other),
    }
    assert_eq!(constant_x(&session), 130.0);
    assert!(session.can_undo());

    session.undo().await.unwrap();
    assert_eq!(constant_x(&session), 100.0);
    assert!(session.can_redo());

    session.redo().await.unwrap();
    assert_eq!(constant_x(&session), 130.0);

    let stub = stub.lock().unwrap();
    assert_eq!(
        stub.edits,
        vec![json!({"discriminator": "move", "target": [0, 1], "dx": 3, "dy": 0})]
    );
    assert_eq!(stub.request_ids.len(), 4);
    let mut ids = stub.request_ids.clone();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 4, "request ids must be unique");
}

#[tokio::test]
async fn service_rejection_keeps_snapshot() {
    let (mut session, _stub) = start_stub().await;
    session.new_program().await.unwrap();
    let before = session.snapshot().unwrap();

    let err = session
        .edit(commands::move_by(QualifiedAddress::from_segments(&[0, 42]), 1, 1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        ClientError::CommandRejected {
            status: 400,
            message: "unknown target".to_string()
        }
    );
    assert_eq!(*before, *session.snapshot().unwrap());
    assert_eq!(session.notices().len(), 1);
    assert_eq!(session.notices()[0].kind, NoticeKind::CommandRejected);
}

#[tokio::test]
async fn cycle_is_blocked_locally() {
    let (mut session, stub) = start_stub().await;
    session.new_program().await.unwrap();

    let err = session.connect("input-0:2-0", "output-0:1-0").await.unwrap_err();
    assert!(matches!(err, ClientError::ValidationRejected(_)));
    assert!(stub.lock().unwrap().edits.is_empty());
}

#[tokio::test]
async fn open_and_save_track_path() {
    let (mut session, _stub) = start_stub().await;

    session
        .open(std::path::Path::new("/work/demo.fl"))
        .await
        .unwrap();
    assert_eq!(session.path(), Some("/work/demo.fl"));
    assert!(session.saved());

    session.save(None).await.unwrap();
    session
        .save(Some(std::path::Path::new("/work/copy.fl")))
        .await
        .unwrap();
    assert_eq!(session.path(), Some("/work/copy.fl"));

    let err = session
        .open(std::path::Path::new("/work/readme.txt"))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::CommandRejected { status: 400, .. }));
    assert_eq!(session.path(), Some("/work/copy.fl"));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ClientConfig::default()
        .with_server_url(format!("http://{}", addr))
        .with_timeout(Duration::from_secs(2));
    let mut session = EditorSession::new(HttpEditService::new(config).unwrap());

    let err = session.new_program().await.unwrap_err();
    assert!(matches!(err, ClientError::Transport(_)));
    assert!(session.program().is_none());
    assert_eq!(session.notices()[0].kind, NoticeKind::Transport);
}

#[tokio::test]
async fn garbage_response_is_a_decode_error() {
    let app = Router::new().route("/api/module/new", post(garbage));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = ClientConfig::default().with_server_url(format!("http://{}", addr));
    let mut session = EditorSession::new(HttpEditService::new(config).unwrap());
    let err = session.new_program().await.unwrap_err();
    assert!(matches!(err, ClientError::Decode(_)));
    assert_eq!(session.notices()[0].kind, NoticeKind::Decode);
}
