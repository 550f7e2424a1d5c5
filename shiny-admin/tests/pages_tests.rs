//! Integration tests for the server-rendered pages
//!
//! Tests cover:
//! - Landing redirects and the wrapper page context attributes
//! - Registration (success and re-rendered errors)
//! - Login / logout cookie flow
//! - Password reset request, confirm and token reuse

use axum::{
    body::Body,
    http::{header, Request, Response, StatusCode},
    Router,
};
use shiny_admin::{build_router, AppState};
use shiny_common::config::ServerConfig;
use shiny_common::db::init_memory_database;
use shiny_common::users::{self, create_user, NewUser};
use shiny_common::{groups, sessions};
use sqlx::SqlitePool;
use tower::util::ServiceExt; // for `oneshot` method

const PASSWORD: &str = "river-otter-42";

async fn setup_app() -> (Router, SqlitePool) {
    let pool = init_memory_database().await.expect("Should create database");
    let state = AppState::new(pool.clone(), ServerConfig::default());
    (build_router(state), pool)
}

async fn add_user(pool: &SqlitePool, username: &str, email: &str, group_id: Option<i64>) -> i64 {
    create_user(
        pool,
        NewUser {
            username: username.to_string(),
            password: PASSWORD.to_string(),
            email: email.to_string(),
            group_id,
            ..Default::default()
        },
    )
    .await
    .expect("Should create user")
    .id
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_form(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    String::from_utf8(bytes.to_vec()).expect("Should be UTF-8")
}

fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// `name=value` part of a Set-Cookie header, usable as a Cookie header
fn cookie_pair(set_cookie: &str) -> String {
    set_cookie.split(';').next().unwrap_or_default().to_string()
}

async fn log_in(app: &Router, username: &str, password: &str) -> Response<Body> {
    let body = format!("username={}&password={}", username, password);
    app.clone()
        .oneshot(post_form("/login/", None, &body))
        .await
        .unwrap()
}

// =============================================================================
// Landing and wrapper
// =============================================================================

#[tokio::test]
async fn test_landing_redirects_by_session() {
    let (app, pool) = setup_app().await;

    let response = app.clone().oneshot(get("/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");

    let alice = add_user(&pool, "alice", "", None).await;
    let session = sessions::create_session(&pool, alice, 3600).await.unwrap();
    let cookie = format!("sessionid={}", session.session_key);

    let response = app.oneshot(get("/", Some(&cookie))).await.unwrap();
    assert_eq!(location(&response), "/dams_mcda_wrapper/");
}

#[tokio::test]
async fn test_wrapper_requires_login() {
    let (app, _pool) = setup_app().await;

    let response = app.oneshot(get("/dams_mcda_wrapper/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");
}

#[tokio::test]
async fn test_wrapper_exposes_context() {
    let (app, pool) = setup_app().await;
    let group = groups::create_group(&pool, "Penobscot").await.unwrap();
    let alice = add_user(&pool, "alice", "", Some(group.id)).await;
    let session = sessions::create_session(&pool, alice, 3600).await.unwrap();
    let cookie = format!("sessionid={}", session.session_key);

    let response = app.oneshot(get("/dams_mcda_wrapper/", Some(&cookie))).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("data-username=\"alice\""));
    assert!(html.contains("data-groupname=\"Penobscot\""));
    assert!(html.contains(&format!("data-session=\"{}\"", session.session_key)));
    assert!(html.contains("name=\"shiny-dams-mcda\""));
    assert!(html.contains("src=\"/dams_mcda/\""));
}

#[tokio::test]
async fn test_wrapper_script_served() {
    let (app, _pool) = setup_app().await;

    let response = app
        .oneshot(get("/static/js/shiny-app-wrapper.js", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("setUpFrame"));
}

// =============================================================================
// Registration
// =============================================================================

#[tokio::test]
async fn test_register_creates_user() {
    let (app, pool) = setup_app().await;
    let group = groups::create_group(&pool, "Kennebec").await.unwrap();

    let body = format!(
        "username=carol&email=carol%40example.org&password1={p}&password2={p}&group={g}",
        p = PASSWORD,
        g = group.id
    );
    let response = app.oneshot(post_form("/register/", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login/");

    let carol = users::get_user_by_username(&pool, "carol").await.unwrap().unwrap();
    assert_eq!(carol.email, "carol@example.org");
    assert_eq!(carol.group_id, Some(group.id));
}

#[tokio::test]
async fn test_register_taken_username_rerenders() {
    let (app, pool) = setup_app().await;
    add_user(&pool, "alice", "", None).await;

    let body = format!("username=alice&password1={p}&password2={p}", p = PASSWORD);
    let response = app.oneshot(post_form("/register/", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = body_text(response).await;
    assert!(html.contains("A user with that username already exists."));
    assert_eq!(users::list_users(&pool).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_password_mismatch_writes_nothing() {
    let (app, pool) = setup_app().await;

    let body = "username=dave&password1=river-otter-42&password2=river-otter-43";
    let response = app.oneshot(post_form("/register/", None, body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("The two password fields didn't match."));
    assert!(users::get_user_by_username(&pool, "dave").await.unwrap().is_none());
}

#[tokio::test]
async fn test_register_malformed_email_rerenders() {
    let (app, pool) = setup_app().await;

    let body = format!("username=erin&email=erin-at-example&password1={p}&password2={p}", p = PASSWORD);
    let response = app.oneshot(post_form("/register/", None, &body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Enter a valid email address."));
    assert!(users::get_user_by_username(&pool, "erin").await.unwrap().is_none());
}

// =============================================================================
// Login / logout
// =============================================================================

#[tokio::test]
async fn test_login_failure_shows_fixed_message() {
    let (app, pool) = setup_app().await;
    add_user(&pool, "alice", "", None).await;

    for (username, password) in [("alice", "wrong-password"), ("nobody", PASSWORD)] {
        let response = log_in(&app, username, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(set_cookie(&response).is_empty());
        assert!(body_text(response)
            .await
            .contains("invalid login credentials, please try again"));
    }
}

#[tokio::test]
async fn test_login_sets_working_cookie_and_logout_clears_it() {
    let (app, pool) = setup_app().await;
    let alice = add_user(&pool, "alice", "", None).await;

    let response = log_in(&app, "alice", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");

    let cookie = cookie_pair(&set_cookie(&response));
    assert!(cookie.starts_with("sessionid="));

    let user = users::get_user(&pool, alice).await.unwrap().unwrap();
    assert!(user.last_login.is_some());

    let response = app
        .clone()
        .oneshot(get("/api/get_user_session/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(get("/logout/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response).contains("Max-Age=0"));

    let response = app
        .oneshot(get("/api/get_user_session/", Some(&cookie)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_without_session() {
    let (app, _pool) = setup_app().await;

    let response = app.oneshot(get("/logout/", None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

// =============================================================================
// Password reset
// =============================================================================

async fn latest_token(pool: &SqlitePool, user_id: i64) -> String {
    sqlx::query_scalar(
        "SELECT token FROM password_reset_tokens WHERE user_id = ? ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
    .expect("Should have issued a token")
}

#[tokio::test]
async fn test_password_reset_flow() {
    let (app, pool) = setup_app().await;
    let alice = add_user(&pool, "alice", "alice@example.org", None).await;
    let old_session = sessions::create_session(&pool, alice, 3600).await.unwrap();

    let response = app
        .clone()
        .oneshot(post_form("/password_reset/", None, "email=ALICE%40example.org"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/password_reset/done/");

    let token = latest_token(&pool, alice).await;
    let confirm = format!("/password_reset/confirm/{}/{}/", alice, token);

    let response = app.clone().oneshot(get(&confirm, None)).await.unwrap();
    assert!(body_text(response).await.contains("new_password1"));

    let response = app
        .clone()
        .oneshot(post_form(
            &confirm,
            None,
            "new_password1=fresh-salmon-7&new_password2=fresh-salmon-8",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("errorlist"));

    let response = app
        .clone()
        .oneshot(post_form(
            &confirm,
            None,
            "new_password1=fresh-salmon-7&new_password2=fresh-salmon-7",
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/password_reset/complete/");

    assert!(sessions::get_session(&pool, &old_session.session_key)
        .await
        .unwrap()
        .is_none());
    assert_eq!(log_in(&app, "alice", "fresh-salmon-7").await.status(), StatusCode::SEE_OTHER);
    assert_eq!(log_in(&app, "alice", PASSWORD).await.status(), StatusCode::OK);

    let response = app.oneshot(get(&confirm, None)).await.unwrap();
    assert!(body_text(response).await.contains("invalid"));
}

#[tokio::test]
async fn test_password_reset_unknown_email_looks_the_same() {
    let (app, pool) = setup_app().await;

    let response = app
        .clone()
        .oneshot(post_form("/password_reset/", None, "email=nobody%40example.org"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/password_reset/done/");

    let issued: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM password_reset_tokens")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(issued, 0);

    let response = app
        .oneshot(post_form("/password_reset/", None, "email=not-an-email"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_text(response).await.contains("Enter a valid email address."));
}

#[tokio::test]
async fn test_bad_reset_links() {
    let (app, _pool) = setup_app().await;

    for uri in ["/password_reset/confirm/abc/def/", "/password_reset/confirm/1/nope/"] {
        let response = app.clone().oneshot(get(uri, None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_text(response).await.contains("invalid"));
    }
}
