// Integration tests for the HTTP task source
//
// A throwaway axum server plays the task backend.

mod common;

use anyhow::Result;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use common::RecordingView;
use task_recorder::{
    Controls, ExitCodePolicy, HttpTaskSource, RecorderLocator, RecorderSupervisor,
    SessionController, SessionSettings, SessionState, ShutdownPolicy, Task, TaskSource,
    NO_MORE_TASKS,
};
use tokio::sync::mpsc;

type Received = Arc<Mutex<Vec<Value>>>;

/// Serve `next` on `/next_task` and record `/submit` bodies.
async fn spawn_backend(next: Value, status: StatusCode) -> Result<(String, Received)> {
    let received: Received = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&received);

    let app = Router::new()
        .route(
            "/next_task",
            get(move || {
                let next = next.clone();
                async move { (status, Json(next)) }
            }),
        )
        .route(
            "/submit",
            post(move |Json(body): Json<Value>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(body);
                    (status, Json(json!({"ok": true})))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    Ok((format!("http://{}", addr), received))
}

fn http_source(base: &str) -> Result<HttpTaskSource> {
    HttpTaskSource::new(base, Duration::from_secs(2))
}

#[tokio::test]
async fn test_next_task_is_parsed() -> Result<()> {
    let (base, _) = spawn_backend(json!({"task_id": "abc", "text": "Open mail"}), StatusCode::OK).await?;

    // Trailing slash is tolerated
    let mut source = http_source(&format!("{}/", base))?;
    assert_eq!(source.base_url(), base);

    let task = source.get_next_task().await;
    assert_eq!(
        task,
        Some(Task {
            task_id: "abc".to_string(),
            text: "Open mail".to_string()
        })
    );

    Ok(())
}

#[tokio::test]
async fn test_missing_text_means_no_task() -> Result<()> {
    let (base, _) = spawn_backend(json!({"task_id": "abc"}), StatusCode::OK).await?;
    let mut source = http_source(&base)?;

    assert_eq!(source.get_next_task().await, None);
    Ok(())
}

#[tokio::test]
async fn test_backend_without_text_ends_the_task_list() -> Result<()> {
    let (base, received) = spawn_backend(json!({"task_id": "x"}), StatusCode::OK).await?;
    let dir = tempfile::TempDir::new()?;

    let (exit_tx, _exits) = mpsc::unbounded_channel();
    let supervisor = RecorderSupervisor::new(RecorderLocator::new(None), None, exit_tx);
    let view = RecordingView::default();
    let settings = SessionSettings {
        dataset_root: dir.path().to_path_buf(),
        operator: None,
        shutdown: ShutdownPolicy::default(),
        exit_codes: ExitCodePolicy::default(),
    };
    let mut controller = SessionController::new(
        Box::new(http_source(&base)?),
        supervisor,
        Box::new(view.clone()),
        settings,
    );

    controller.load_next_task().await;

    assert_eq!(controller.state(), SessionState::NoMoreTasks);
    assert_eq!(view.last_task().as_deref(), Some(NO_MORE_TASKS));
    assert_eq!(view.last_controls(), Some(Controls::default()));
    assert!(!controller.start());
    assert!(received.lock().unwrap().is_empty());

    Ok(())
}

#[tokio::test]
async fn test_task_id_is_stringified_or_empty() -> Result<()> {
    let (base, _) = spawn_backend(json!({"task_id": 17, "text": "Numbered"}), StatusCode::OK).await?;
    let mut source = http_source(&base)?;
    assert_eq!(source.get_next_task().await.unwrap().task_id, "17");

    let (base, _) = spawn_backend(json!({"text": "Anonymous"}), StatusCode::OK).await?;
    let mut source = http_source(&base)?;
    let task = source.get_next_task().await.unwrap();
    assert_eq!(task.task_id, "");
    assert_eq!(task.text, "Anonymous");

    Ok(())
}

#[tokio::test]
async fn test_server_error_means_no_task() -> Result<()> {
    let (base, _) = spawn_backend(
        json!({"task_id": "abc", "text": "Should not be used"}),
        StatusCode::INTERNAL_SERVER_ERROR,
    )
    .await?;
    let mut source = http_source(&base)?;

    assert_eq!(source.get_next_task().await, None);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_backend_means_no_task() -> Result<()> {
    // Grab a free port and release it
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;
    drop(listener);

    let mut source = http_source(&format!("http://{}", addr))?;
    assert_eq!(source.get_next_task().await, None);

    // Submission failures are swallowed
    source.submit_result("t1", "rec_1", &Map::new()).await;
    Ok(())
}

#[tokio::test]
async fn test_submit_posts_result_document() -> Result<()> {
    let (base, received) = spawn_backend(json!({}), StatusCode::OK).await?;
    let source = http_source(&base)?;

    let mut meta = Map::new();
    meta.insert("operator".to_string(), json!("anna"));
    meta.insert("frames".to_string(), json!(240));

    source.submit_result("t42", "rec_20250101_120000", &meta).await;

    let bodies = received.lock().unwrap().clone();
    assert_eq!(
        bodies,
        vec![json!({
            "task_id": "t42",
            "rec_id": "rec_20250101_120000",
            "meta": {"operator": "anna", "frames": 240}
        })]
    );

    Ok(())
}

#[tokio::test]
async fn test_submit_to_failing_backend_is_dropped() -> Result<()> {
    let (base, received) = spawn_backend(json!({}), StatusCode::SERVICE_UNAVAILABLE).await?;
    let source = http_source(&base)?;

    source.submit_result("t1", "rec_1", &Map::new()).await;

    // Sent exactly once, no retry
    assert_eq!(received.lock().unwrap().len(), 1);
    Ok(())
}
