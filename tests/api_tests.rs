use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::{ActiveModelTrait, Set};
use serde_json::{Value, json};
use std::sync::Arc;
use timewarden::api::AppState;
use timewarden::config::Config;
use timewarden::entities::users::{self, Role};
use tower::ServiceExt;

/// Bootstrap parent account seeded by the initial migration
const PARENT_USERNAME: &str = "parent";
const PARENT_PASSWORD: &str = "parent123";

async fn spawn_app_with_state() -> (Router, Arc<AppState>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.server.secure_cookies = false;

    let state = timewarden::api::create_app_state(config)
        .await
        .expect("Failed to create app state");
    let app = timewarden::api::router(Arc::clone(&state)).await;
    (app, state)
}

async fn spawn_app() -> Router {
    spawn_app_with_state().await.0
}

/// Insert an extra parent account directly, the way the migration seeds one.
async fn seed_parent(state: &AppState, username: &str, password: &str) {
    let hash = {
        let config = state.config().read().await;
        state
            .store
            .hash_password(password, &config.security)
            .await
            .expect("Failed to hash password")
    };

    let now = chrono::Utc::now().to_rfc3339();
    users::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set(hash),
        role: Set(Role::Parent),
        created_at: Set(now.clone()),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&state.store.conn)
    .await
    .expect("Failed to seed parent");
}

/// Log in and return the session cookie to send on subsequent requests.
async fn login(app: &Router, username: &str, password: &str) -> String {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/auth/login")
                .header("Content-Type", "application/json")
                .body(Body::from(
                    json!({"username": username, "password": password}).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK, "login failed");

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("no session cookie")
        .to_str()
        .unwrap();

    set_cookie.split(';').next().unwrap().to_string()
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

async fn create_child(app: &Router, cookie: &str, body: Value) -> Value {
    let (status, json) = request(app, "POST", "/api/children", Some(cookie), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    json["data"].clone()
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let app = spawn_app().await;

    for uri in ["/api/children", "/api/time-entries?child_id=1", "/api/system/status"] {
        let (status, body) = request(&app, "GET", uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri} was not protected");
        // The middleware's 401 uses the same envelope as every other error
        assert_eq!(body["success"], false);
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_login_rejects_bad_credentials() {
    let app = spawn_app().await;

    let (status, body) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": PARENT_USERNAME, "password": "wrong"})),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_login_and_me() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let (status, body) = request(&app, "GET", "/api/auth/me", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["username"], PARENT_USERNAME);
    assert_eq!(body["data"]["role"], "PARENT");
}

#[tokio::test]
async fn test_child_crud() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(&app, &cookie, json!({"name": "Alex", "username": "alex"})).await;

    // Default allowance, starting balance equals the allowance, no login
    assert_eq!(child["daily_allowance"], 180);
    assert_eq!(child["current_time"], 180);
    assert_eq!(child["has_login"], false);
    let child_id = child["id"].as_i64().unwrap();

    let (status, body) = request(&app, "GET", "/api/children", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Alex");

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/children/{child_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = request(&app, "GET", "/api/children", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_create_child_validation() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/children",
        Some(&cookie),
        Some(json!({"username": "noname"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/children",
        Some(&cookie),
        Some(json!({"name": "Bad", "username": "has space"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = request(
        &app,
        "POST",
        "/api/children",
        Some(&cookie),
        Some(json!({"name": "Bad", "username": "bad", "daily_allowance": -5})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    create_child(&app, &cookie, json!({"name": "Alex", "username": "alex"})).await;

    let (status, _) = request(
        &app,
        "POST",
        "/api/children",
        Some(&cookie),
        Some(json!({"name": "Other Alex", "username": "alex"})),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_balance_clamps_at_zero_but_ledger_keeps_raw_delta() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(
        &app,
        &cookie,
        json!({"name": "Alex", "username": "alex", "daily_allowance": 120}),
    )
    .await;
    let child_id = child["id"].as_i64().unwrap();
    assert_eq!(child["current_time"], 120);

    // Overdraw: 120 - 150 clamps to 0
    let (status, body) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({
            "child_id": child_id,
            "amount": 150,
            "reason": "Gaming marathon",
            "kind": "DEDUCTION"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_time"], 0);

    // Addition starts from the clamped balance, not from -30
    let (status, body) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({
            "child_id": child_id,
            "amount": 30,
            "reason": "Chores done",
            "kind": "ADDITION"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_time"], 30);

    // The ledger keeps the raw signed deltas
    let entries = body["data"]["time_entries"].as_array().unwrap();
    assert_eq!(entries[0]["amount"], 30);
    assert_eq!(entries[1]["amount"], -150);
}

#[tokio::test]
async fn test_append_entry_validation() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(&app, &cookie, json!({"name": "Alex", "username": "alex"})).await;
    let child_id = child["id"].as_i64().unwrap();

    // Amount must be positive; the kind determines the sign
    let (status, _) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({"child_id": child_id, "amount": -30, "reason": "x", "kind": "DEDUCTION"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // RESET entries only come from the reset endpoints
    let (status, _) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({"child_id": child_id, "amount": 30, "reason": "x", "kind": "RESET"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown child reads as not found
    let (status, _) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({"child_id": 9999, "amount": 30, "reason": "x", "kind": "ADDITION"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_entries_requires_child_id() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let (status, _) = request(&app, "GET", "/api/time-entries", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_manual_reset_restores_allowance() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(
        &app,
        &cookie,
        json!({"name": "Alex", "username": "alex", "daily_allowance": 90}),
    )
    .await;
    let child_id = child["id"].as_i64().unwrap();

    request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&cookie),
        Some(json!({"child_id": child_id, "amount": 60, "reason": "TV", "kind": "DEDUCTION"})),
    )
    .await;

    let (status, body) = request(
        &app,
        "POST",
        &format!("/api/children/{child_id}/reset"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["current_time"], 90);

    let entries = body["data"]["time_entries"].as_array().unwrap();
    assert_eq!(entries[0]["kind"], "RESET");
    assert_eq!(entries[0]["reason"], "Daily allowance reset");
    assert_eq!(entries[0]["amount"], 90);
}

#[tokio::test]
async fn test_child_login_is_read_only() {
    let app = spawn_app().await;
    let parent_cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(
        &app,
        &parent_cookie,
        json!({"name": "Alex", "username": "alex", "password": "alexpw"}),
    )
    .await;
    assert_eq!(child["has_login"], true);
    let child_id = child["id"].as_i64().unwrap();

    let child_cookie = login(&app, "alex", "alexpw").await;

    // A child sees only its own profile
    let (status, body) = request(&app, "GET", "/api/children", Some(&child_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    let list = body["data"].as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], child_id);

    // And can read its own ledger
    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/time-entries?child_id={child_id}"),
        Some(&child_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // But every write is forbidden
    let (status, _) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&child_cookie),
        Some(json!({"child_id": child_id, "amount": 30, "reason": "x", "kind": "ADDITION"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "POST",
        "/api/children",
        Some(&child_cookie),
        Some(json!({"name": "Nope", "username": "nope"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/children/{child_id}/reset"),
        Some(&child_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_foreign_parent_cannot_touch_another_households_child() {
    let (app, state) = spawn_app_with_state().await;
    seed_parent(&state, "parent2", "parent2pw").await;

    let owner_cookie = login(&app, "parent2", "parent2pw").await;
    let child = create_child(&app, &owner_cookie, json!({"name": "Alex", "username": "alex"})).await;
    let child_id = child["id"].as_i64().unwrap();

    let other_cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    // The foreign child never shows up in the other household's list
    let (status, body) = request(&app, "GET", "/api/children", Some(&other_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"].as_array().unwrap().is_empty());

    // Writes read as not found, confirming nothing about the ID
    let (status, _) = request(
        &app,
        "POST",
        "/api/time-entries",
        Some(&other_cookie),
        Some(json!({"child_id": child_id, "amount": 30, "reason": "x", "kind": "ADDITION"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "POST",
        &format!("/api/children/{child_id}/reset"),
        Some(&other_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/children/{child_id}"),
        Some(&other_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Ledger reads are denied outright
    let (status, _) = request(
        &app,
        "GET",
        &format!("/api/time-entries?child_id={child_id}"),
        Some(&other_cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // None of it touched the child
    let (status, body) = request(&app, "GET", "/api/children", Some(&owner_cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["current_time"], 180);
}

#[tokio::test]
async fn test_deleting_child_removes_login() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    let child = create_child(
        &app,
        &cookie,
        json!({"name": "Alex", "username": "alex", "password": "alexpw"}),
    )
    .await;
    let child_id = child["id"].as_i64().unwrap();

    let (status, _) = request(
        &app,
        "DELETE",
        &format!("/api/children/{child_id}"),
        Some(&cookie),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = request(
        &app,
        "POST",
        "/api/auth/login",
        None,
        Some(json!({"username": "alex", "password": "alexpw"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_system_status() {
    let app = spawn_app().await;
    let cookie = login(&app, PARENT_USERNAME, PARENT_PASSWORD).await;

    create_child(&app, &cookie, json!({"name": "Alex", "username": "alex"})).await;

    let (status, body) = request(&app, "GET", "/api/system/status", Some(&cookie), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["version"].is_string());
    assert_eq!(body["data"]["children"], 1);
}
