//! Call API Integration Tests

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use circlecall::domain::calling::CallSessionManager;
use circlecall::domain::shared::value_objects::UserId;
use circlecall::infrastructure::persistence::InMemoryCallStore;
use circlecall::interface::api::{build_router, AppState, USER_ID_HEADER};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot`
use uuid::Uuid;

fn setup_app() -> Router {
    let store = Arc::new(InMemoryCallStore::new());
    let state = AppState {
        call_manager: Arc::new(CallSessionManager::new(store)),
    };
    build_router(state, None)
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    user: Option<UserId>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(USER_ID_HEADER, user.to_string());
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn start_call(app: &Router, admin: UserId) -> String {
    let (status, json) = send(
        app,
        "POST",
        "/calls",
        Some(admin),
        Some(json!({ "group": Uuid::new_v4() })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    json["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_api_health() {
    let app = setup_app();
    let (status, json) = send(&app, "GET", "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["data"], "OK");
}

#[tokio::test]
async fn test_api_start_call() {
    let app = setup_app();
    let admin = UserId::new();

    let (status, json) = send(
        &app,
        "POST",
        "/calls",
        Some(admin),
        Some(json!({ "group": Uuid::new_v4() })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["success"], true);
    assert_eq!(json["message"], "Call successfully started!");
    assert_eq!(json["data"]["admin"], admin.to_string());
    assert_eq!(json["data"]["is_ongoing"], true);
    assert!(json["data"]["participants"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_api_call_lifecycle() {
    let app = setup_app();
    let admin = UserId::new();
    let user = UserId::new();
    let call_id = start_call(&app, admin).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/join", call_id),
        Some(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Joined the call");
    assert_eq!(json["data"]["participants"], json!([user.to_string()]));

    let (_, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/switch-mode", call_id),
        Some(user),
        None,
    )
    .await;
    assert_eq!(json["data"]["listeners"], json!([user.to_string()]));
    assert_eq!(json["data"]["participants"], json!([]));

    let (_, json) = send(&app, "POST", &format!("/calls/{}/mute", call_id), Some(user), None).await;
    assert_eq!(json["data"]["is_muted"], true);
    assert_eq!(json["message"], format!("User {} mute status changed", user));

    let (_, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/request-to-speak", call_id),
        Some(user),
        None,
    )
    .await;
    assert_eq!(json["data"]["speaker_queue"], json!([user.to_string()]));

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/next-speaker", call_id),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Next speaker called");
    assert_eq!(json["data"]["speaker"], user.to_string());

    let (_, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/next-speaker", call_id),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(json["message"], "No more speakers in the queue");
    assert!(json["data"]["speaker"].is_null());

    let (_, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/leave", call_id),
        Some(user),
        None,
    )
    .await;
    assert_eq!(json["message"], "Left the call");
    assert_eq!(json["data"]["listeners"], json!([]));

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/end", call_id),
        Some(admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Call ended successfully");

    let (status, json) = send(&app, "GET", &format!("/calls/{}", call_id), None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["is_ongoing"], false);

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/join", call_id),
        Some(user),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(json["success"], false);
}

#[tokio::test]
async fn test_api_non_admin_cannot_end() {
    let app = setup_app();
    let admin = UserId::new();
    let call_id = start_call(&app, admin).await;

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/end", call_id),
        Some(UserId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(json["error"], "Only the admin can end the call");

    let (_, json) = send(&app, "GET", &format!("/calls/{}", call_id), None, None).await;
    assert_eq!(json["data"]["is_ongoing"], true);
}

#[tokio::test]
async fn test_api_unknown_call() {
    let app = setup_app();
    let missing = Uuid::new_v4();

    let (status, json) = send(
        &app,
        "POST",
        &format!("/calls/{}/join", missing),
        Some(UserId::new()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], format!("Call {} does not exist", missing));
}

#[tokio::test]
async fn test_api_rejects_bad_identifiers() {
    let app = setup_app();

    let (status, _) = send(&app, "POST", "/calls/not-a-uuid/join", Some(UserId::new()), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let call_id = start_call(&app, UserId::new()).await;
    let (status, json) = send(&app, "POST", &format!("/calls/{}/join", call_id), None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], format!("Missing {} header", USER_ID_HEADER));
}

#[tokio::test]
async fn test_api_rejects_malformed_start_body() {
    let app = setup_app();

    let request = Request::builder()
        .method("POST")
        .uri("/calls")
        .header(USER_ID_HEADER, UserId::new().to_string())
        .header("content-type", "application/json")
        .body(Body::from("{ not json"))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).expect("error body should be JSON");
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    // Well-formed JSON missing the group is rejected the same way
    let (status, json) = send(
        &app,
        "POST",
        "/calls",
        Some(UserId::new()),
        Some(json!({ "name": "standup" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}
