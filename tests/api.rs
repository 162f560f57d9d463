//! HTTP-level tests driving the full router over in-memory stores.

use axum::http::{header::AUTHORIZATION, HeaderValue, StatusCode};
use axum_test::TestServer;
use serde_json::{json, Value};
use taskreminder::{
    app::build_app,
    auth::jwt::JwtKeys,
    config::{AppConfig, JwtConfig},
    state::AppState,
};
use time::{Duration, OffsetDateTime};

fn create_test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".to_string(),
        jwt: JwtConfig {
            secret: "test-secret-key-for-testing-only".to_string(),
            issuer: "taskreminder".to_string(),
            audience: "taskreminder-users".to_string(),
            ttl_minutes: 30,
        },
    }
}

fn create_test_server() -> TestServer {
    let state = AppState::in_memory(create_test_config());
    TestServer::new(build_app(state)).expect("Failed to create test server")
}

fn bearer(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("Bearer {}", token)).unwrap()
}

async fn register(server: &TestServer, username: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/users")
        .json(&json!({ "username": username, "password": password }))
        .await
}

async fn login(server: &TestServer, username: &str, password: &str) -> axum_test::TestResponse {
    server
        .post("/token")
        .form(&[("username", username), ("password", password)])
        .await
}

/// Registers and logs in, returning the access token.
async fn signup(server: &TestServer, username: &str, password: &str) -> String {
    register(server, username, password).await.assert_status_ok();
    let response = login(server, username, password).await;
    response.assert_status_ok();
    response.json::<Value>()["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}

fn task_body(created_by: &str, content: &str) -> Value {
    json!({
        "time_to_run": "2025-12-31T23:59:59Z",
        "assignee": "john.doe@example.com",
        "task_content": content,
        "reminder_type": "Email",
        "created_by": created_by,
    })
}

async fn create_task(server: &TestServer, token: &str, created_by: &str, content: &str) -> Value {
    let response = server
        .post("/tasks")
        .add_header(AUTHORIZATION, bearer(token))
        .json(&task_body(created_by, content))
        .await;
    response.assert_status(StatusCode::CREATED);
    response.json::<Value>()
}

fn error_code(response: &axum_test::TestResponse) -> String {
    response.json::<Value>()["error"]["code"]
        .as_str()
        .unwrap_or_default()
        .to_string()
}

// ============================================================================
// Registration & login
// ============================================================================

#[tokio::test]
async fn register_returns_public_user_only() {
    let server = create_test_server();
    let response = register(&server, "alice", "pw1").await;
    response.assert_status_ok();

    let body: Value = response.json();
    assert_eq!(body["username"], "alice");
    assert!(body["id"].as_i64().is_some());
    assert!(body.get("password").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn duplicate_registration_is_rejected_regardless_of_password() {
    let server = create_test_server();
    register(&server, "alice", "pw1").await.assert_status_ok();

    let response = register(&server, "alice", "another-password").await;
    response.assert_status(StatusCode::BAD_REQUEST);
    assert_eq!(error_code(&response), "USERNAME_TAKEN");
}

#[tokio::test]
async fn login_returns_bearer_token() {
    let server = create_test_server();
    register(&server, "alice", "pw1").await.assert_status_ok();

    let response = login(&server, "alice", "pw1").await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["token_type"], "bearer");
    assert!(!body["access_token"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn login_failures_do_not_reveal_which_factor_failed() {
    let server = create_test_server();
    register(&server, "alice", "pw1").await.assert_status_ok();

    let wrong_password = login(&server, "alice", "pw2").await;
    let unknown_user = login(&server, "mallory", "pw1").await;

    wrong_password.assert_status(StatusCode::UNAUTHORIZED);
    unknown_user.assert_status(StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.json::<Value>(), unknown_user.json::<Value>());
}

#[tokio::test]
async fn me_returns_the_token_holder() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;

    let response = server
        .get("/users/me")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>()["username"], "alice");
}

// ============================================================================
// Task lifecycle
// ============================================================================

#[tokio::test]
async fn full_task_lifecycle() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;

    let created = create_task(&server, &token, "alice", "t1").await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["created_by"], "alice");
    assert!(created["modified_by"].is_null());
    assert_eq!(created["created_at"], created["modified_at"]);

    let response = server
        .put(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "task_content": "t2" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["task_content"], "t2");
    assert_eq!(updated["modified_by"], "alice");

    let response = server
        .delete(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NO_CONTENT);

    let response = server
        .get(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::NOT_FOUND);
    assert_eq!(error_code(&response), "NOT_FOUND");
}

#[tokio::test]
async fn partial_update_leaves_other_fields_untouched() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;
    let created = create_task(&server, &token, "alice", "t1").await;
    let id = created["id"].as_i64().unwrap();

    let response = server
        .patch(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "task_content": "t2" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();

    for field in ["assignee", "time_to_run", "reminder_type", "created_by", "created_at", "id"] {
        assert_eq!(updated[field], created[field], "{field} changed");
    }
    assert_eq!(updated["modified_by"], "alice");

    let modified_at = OffsetDateTime::parse(
        updated["modified_at"].as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    )
    .unwrap();
    let created_at = OffsetDateTime::parse(
        created["created_at"].as_str().unwrap(),
        &time::format_description::well_known::Rfc3339,
    )
    .unwrap();
    assert!(modified_at >= created_at);
}

#[tokio::test]
async fn update_cannot_touch_immutable_fields() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;
    let created = create_task(&server, &token, "alice", "t1").await;
    let id = created["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "created_by": "bob" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);

    let response = server
        .get(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.json::<Value>(), created);
}

#[tokio::test]
async fn create_for_another_user_is_forbidden_and_not_stored() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;

    let response = server
        .post("/tasks")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&task_body("bob", "sneaky"))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);
    assert_eq!(error_code(&response), "FORBIDDEN");

    let response = server
        .get("/tasks")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    assert_eq!(response.json::<Value>(), json!([]));
}

#[tokio::test]
async fn invalid_reminder_type_is_a_validation_error() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;

    let mut body = task_body("alice", "t1");
    body["reminder_type"] = json!("Sms");
    let response = server
        .post("/tasks")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(error_code(&response), "VALIDATION_ERROR");
}

#[tokio::test]
async fn malformed_body_is_rejected_before_authentication() {
    let server = create_test_server();
    let response = server
        .post("/tasks")
        .json(&json!({ "assignee": "x" }))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn non_numeric_id_is_a_validation_error() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;
    let response = server
        .get("/tasks/abc")
        .add_header(AUTHORIZATION, bearer(&token))
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}

// ============================================================================
// Ownership
// ============================================================================

#[tokio::test]
async fn other_users_cannot_read_modify_or_delete() {
    let server = create_test_server();
    let alice = signup(&server, "alice", "pw1").await;
    let bob = signup(&server, "bob", "pw2").await;

    let created = create_task(&server, &alice, "alice", "alice's task").await;
    let id = created["id"].as_i64().unwrap();
    let path = format!("/tasks/{}", id);

    let response = server.delete(&path).add_header(AUTHORIZATION, bearer(&bob)).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server.get(&path).add_header(AUTHORIZATION, bearer(&bob)).await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server
        .put(&path)
        .add_header(AUTHORIZATION, bearer(&bob))
        .json(&json!({ "task_content": "bob was here" }))
        .await;
    response.assert_status(StatusCode::FORBIDDEN);

    let response = server.get("/tasks").add_header(AUTHORIZATION, bearer(&bob)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), json!([]));

    let response = server.get(&path).add_header(AUTHORIZATION, bearer(&alice)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Value>(), created);
}

#[tokio::test]
async fn list_returns_only_own_tasks() {
    let server = create_test_server();
    let alice = signup(&server, "alice", "pw1").await;
    let bob = signup(&server, "bob", "pw2").await;

    create_task(&server, &alice, "alice", "a1").await;
    create_task(&server, &bob, "bob", "b1").await;
    create_task(&server, &alice, "alice", "a2").await;

    let response = server.get("/tasks").add_header(AUTHORIZATION, bearer(&alice)).await;
    let tasks: Vec<Value> = response.json();
    let contents: Vec<&str> = tasks
        .iter()
        .map(|t| t["task_content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["a1", "a2"]);
    assert!(tasks.iter().all(|t| t["created_by"] == "alice"));
}

#[tokio::test]
async fn unknown_id_is_not_found_for_everyone() {
    let server = create_test_server();
    let bob = signup(&server, "bob", "pw2").await;
    let response = server.delete("/tasks/999").add_header(AUTHORIZATION, bearer(&bob)).await;
    response.assert_status(StatusCode::NOT_FOUND);
}

// ============================================================================
// Token handling
// ============================================================================

async fn assert_every_protected_endpoint_is_unauthenticated(server: &TestServer, token: Option<&str>) {
    let requests = vec![
        server.get("/tasks"),
        server.post("/tasks").json(&task_body("alice", "x")),
        server.get("/tasks/1"),
        server.put("/tasks/1").json(&json!({ "task_content": "x" })),
        server.patch("/tasks/1").json(&json!({ "task_content": "x" })),
        server.delete("/tasks/1"),
        server.get("/users/me"),
    ];
    for request in requests {
        let request = match token {
            Some(t) => request.add_header(AUTHORIZATION, bearer(t)),
            None => request,
        };
        let response = request.await;
        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_eq!(error_code(&response), "UNAUTHENTICATED");
    }
}

#[tokio::test]
async fn missing_token_is_rejected() {
    let server = create_test_server();
    assert_every_protected_endpoint_is_unauthenticated(&server, None).await;
}

#[tokio::test]
async fn forged_token_is_rejected() {
    let server = create_test_server();
    let alice = signup(&server, "alice", "pw1").await;
    create_task(&server, &alice, "alice", "t1").await;

    let mut forger_config = create_test_config().jwt;
    forger_config.secret = "some-other-secret".to_string();
    let forged = JwtKeys::new(&forger_config).issue("alice").unwrap();

    assert_every_protected_endpoint_is_unauthenticated(&server, Some(&forged)).await;
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let server = create_test_server();
    let alice = signup(&server, "alice", "pw1").await;
    create_task(&server, &alice, "alice", "t1").await;

    let keys = JwtKeys::new(&create_test_config().jwt);
    let expired = keys
        .issue_at("alice", OffsetDateTime::now_utc() - Duration::hours(2))
        .unwrap();

    assert_every_protected_endpoint_is_unauthenticated(&server, Some(&expired)).await;
}

#[tokio::test]
async fn token_for_unregistered_user_is_rejected() {
    let server = create_test_server();
    let keys = JwtKeys::new(&create_test_config().jwt);
    let ghost = keys.issue("ghost").unwrap();
    assert_every_protected_endpoint_is_unauthenticated(&server, Some(&ghost)).await;
}

#[tokio::test]
async fn health_needs_no_auth() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    response.assert_text("ok");
}

// ============================================================================
// Wire compatibility
// ============================================================================

#[tokio::test]
async fn collection_routes_accept_trailing_slash() {
    let server = create_test_server();
    server
        .post("/users/")
        .json(&json!({ "username": "alice", "password": "pw1" }))
        .await
        .assert_status_ok();
    let response = login(&server, "alice", "pw1").await;
    let token = response.json::<Value>()["access_token"].as_str().unwrap().to_string();

    let response = server
        .post("/tasks/")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&task_body("alice", "t1"))
        .await;
    response.assert_status(StatusCode::CREATED);

    let response = server.get("/tasks/").add_header(AUTHORIZATION, bearer(&token)).await;
    response.assert_status_ok();
    assert_eq!(response.json::<Vec<Value>>().len(), 1);
}

#[tokio::test]
async fn modified_by_in_update_body_is_ignored() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;
    let created = create_task(&server, &token, "alice", "t1").await;
    let id = created["id"].as_i64().unwrap();

    let response = server
        .put(&format!("/tasks/{}", id))
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&json!({ "task_content": "t2", "modified_by": "admin.user@example.com" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["task_content"], "t2");
    assert_eq!(updated["modified_by"], "alice");
}

#[tokio::test]
async fn empty_assignee_is_accepted() {
    let server = create_test_server();
    let token = signup(&server, "alice", "pw1").await;

    let mut body = task_body("alice", "t1");
    body["assignee"] = json!("");
    let response = server
        .post("/tasks")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::CREATED);
    assert_eq!(response.json::<Value>()["assignee"], "");

    body["assignee"] = json!("x".repeat(101));
    let response = server
        .post("/tasks")
        .add_header(AUTHORIZATION, bearer(&token))
        .json(&body)
        .await;
    response.assert_status(StatusCode::UNPROCESSABLE_ENTITY);
}
