//! Helpers for driving the full router in tests.

use crate::{router, AppState};
use axum::body::{to_bytes, Body};
use axum::http::{header, Request, Response};
use axum::Router;
use domain::user::{self as UserApi, Registration, User};
use service::config::Config;
use tower::ServiceExt;

pub(crate) const TEST_SESSION_KEY: &str =
    "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

pub(crate) fn app() -> (AppState, Router) {
    let config = Config::from_defaults().set_session_key(TEST_SESSION_KEY.to_string());
    let app_state = AppState::new(config).unwrap();
    let router = router::define_routes(app_state.clone());
    (app_state, router)
}

pub(crate) fn register(app_state: &AppState, email: &str) -> User {
    UserApi::register(
        &app_state.users,
        Registration {
            name: "Bee".to_string(),
            email: email.to_string(),
            password: "hunter2".to_string(),
        },
    )
    .unwrap()
}

/// `Cookie` request header value carrying a fresh session for `user`.
pub(crate) fn session_cookie(app_state: &AppState, user: &User) -> String {
    let token = app_state
        .sessions
        .encode(&app_state.sessions.issue(user.id).unwrap())
        .unwrap();
    format!("{}={token}", app_state.config.session_cookie_name())
}

/// The `name=value` pair out of a response's `Set-Cookie` header.
pub(crate) fn cookie_pair(response: &Response<Body>) -> String {
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    set_cookie.split(';').next().unwrap().to_string()
}

pub(crate) async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
    router.clone().oneshot(request).await.unwrap()
}

pub(crate) fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::get(uri), cookie).body(Body::empty()).unwrap()
}

pub(crate) fn delete(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::delete(uri), cookie).body(Body::empty()).unwrap()
}

pub(crate) fn json(method: &str, uri: &str, cookie: Option<&str>, body: serde_json::Value) -> Request<Body> {
    with_cookie(Request::builder().method(method).uri(uri), cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) fn form(uri: &str, body: &str) -> Request<Body> {
    Request::post(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub(crate) async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn with_cookie(
    builder: axum::http::request::Builder,
    cookie: Option<&str>,
) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}
