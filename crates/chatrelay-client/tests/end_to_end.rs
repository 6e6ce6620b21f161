use std::sync::Arc;
use std::time::Duration;

use axum::{Router, http::StatusCode, http::header, routing::post};
use chatrelay_client::{ClientError, RelayClient, TurnCancelHandle};
use chatrelay_contracts::ChatRequest;
use chatrelay_server::{RelayState, UpstreamClient, UpstreamConfig, build_router};

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Starts a fake upstream and a relay in front of it, returning the relay URL.
async fn spawn_stack(status: StatusCode, content_type: &'static str, body: String) -> String {
    let upstream_app = Router::new().route(
        "/v1/chat-messages",
        post(move || {
            let body = body.clone();
            async move { (status, [(header::CONTENT_TYPE, content_type)], body) }
        }),
    );
    let upstream_url = serve(upstream_app).await;

    let upstream = UpstreamClient::new(&UpstreamConfig {
        base_url: format!("{}/v1", upstream_url),
        api_key: Some("app-test-key".to_string()),
        timeout_secs: 5,
    })
    .unwrap();
    serve(build_router(Arc::new(RelayState {
        upstream,
        keep_alive: Duration::from_secs(15),
    })))
    .await
}

fn sse(events: &[&str]) -> String {
    events
        .iter()
        .map(|event| format!("data: {}\n\n", event))
        .collect()
}

#[tokio::test]
async fn test_turn_reconciles_to_final_answer() {
    let relay_url = spawn_stack(
        StatusCode::OK,
        "text/event-stream",
        sse(&[
            r#"{"event":"message","answer":"Hel"}"#,
            r#"{"event":"agent_message","answer":"Hello"}"#,
            r#"{"event":"message_end","answer":"Hello world"}"#,
        ]),
    )
    .await;

    let client = RelayClient::new(&relay_url);
    let (_cancel, receiver) = TurnCancelHandle::new();
    let mut progress = Vec::new();
    let message = client
        .send_turn(&ChatRequest::query("u", "Say hello"), receiver, |text| {
            progress.push(text.to_string())
        })
        .await
        .unwrap()
        .unwrap();

    assert_eq!(message.content, "Hello world");
    assert_eq!(progress, vec!["Hel", "Hello"]);
}

#[tokio::test]
async fn test_malformed_upstream_frames_are_harmless() {
    let relay_url = spawn_stack(
        StatusCode::OK,
        "text/event-stream",
        format!(
            "{}data: not json\n\n: ping\n\nevent: message\n{}",
            sse(&[r#"{"event":"message","answer":"Hello, how are"}"#]),
            sse(&[
                r#"{"event":"workflow_started","data":{}}"#,
                r#"{"event":"message","answer":" you"}"#,
            ]),
        ),
    )
    .await;

    let message = RelayClient::new(&relay_url)
        .collect(&ChatRequest::query("u", "hi"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(message.content, "Hello, how are you");
}

#[tokio::test]
async fn test_upstream_error_surfaces_as_turn_error() {
    let relay_url = spawn_stack(
        StatusCode::OK,
        "text/event-stream",
        sse(&[
            r#"{"event":"message","answer":"Hel"}"#,
            r#"{"event":"error","status":500,"message":"model overloaded"}"#,
            r#"{"event":"message_end","answer":"never delivered"}"#,
        ]),
    )
    .await;

    let result = RelayClient::new(&relay_url)
        .collect(&ChatRequest::query("u", "hi"))
        .await;
    match result {
        Err(ClientError::Turn(message)) => assert_eq!(message, "model overloaded"),
        other => panic!("expected turn error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_upstream_rejection_reaches_client() {
    let relay_url = spawn_stack(
        StatusCode::UNAUTHORIZED,
        "application/json",
        r#"{"code":"unauthorized","message":"Access token is invalid"}"#.to_string(),
    )
    .await;

    let err = RelayClient::new(&relay_url)
        .collect(&ChatRequest::query("u", "hi"))
        .await
        .unwrap_err();
    match &err {
        ClientError::Rejected {
            status,
            error,
            details,
        } => {
            assert_eq!(*status, 401);
            assert_eq!(error, "Upstream request failed");
            assert_eq!(details.as_deref(), Some("Access token is invalid"));
        }
        other => panic!("expected rejection, got {:?}", other),
    }
    assert!(err.is_configuration());
}

#[tokio::test]
async fn test_invalid_conversation_is_rejected_by_relay() {
    let relay_url = spawn_stack(StatusCode::OK, "text/event-stream", String::new()).await;

    let err = RelayClient::new(&relay_url)
        .collect(&ChatRequest::new("u", vec![]))
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Rejected { status: 400, .. }));
}

#[tokio::test]
async fn test_empty_upstream_stream_yields_no_message() {
    let relay_url = spawn_stack(StatusCode::OK, "text/event-stream", String::new()).await;

    let message = RelayClient::new(&relay_url)
        .collect(&ChatRequest::query("u", "hi"))
        .await
        .unwrap();
    assert!(message.is_none());
}

#[tokio::test]
async fn test_cancel_before_response_abandons_turn() {
    let relay_url = spawn_stack(StatusCode::OK, "text/event-stream", String::new()).await;

    let (cancel, receiver) = TurnCancelHandle::new();
    cancel.cancel();
    let result = RelayClient::new(&relay_url)
        .send_turn(&ChatRequest::query("u", "hi"), receiver, |_| {})
        .await;
    assert!(matches!(result, Err(ClientError::Cancelled)));
}
