use crate::controller::ApiResponse;
use crate::cookies;
use crate::error::Result as WebResult;
use crate::AppState;
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use domain::session::Session;
use domain::user::{self as UserApi, Credentials, User};
use log::*;
use serde::Serialize;
use utoipa::ToSchema;

/// What `GET /session` reports about the caller's session cookie.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SessionStatus {
    authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Issues a session for `user` and renders it as a `Set-Cookie` header value.
pub(crate) fn start_session(app_state: &AppState, user: &User) -> WebResult<String> {
    let session = app_state.sessions.issue(user.id)?;
    let token = app_state.sessions.encode(&session)?;
    let cookie = cookies::session_cookie(&app_state.config, token, app_state.sessions.ttl());
    Ok(cookie.to_string())
}

/// Logs the user into the platform and returns a new session cookie.
///
/// Successful login will return a sealed session cookie, e.g.:
/// set-cookie: __session=AbC...xYz; HttpOnly; SameSite=Strict; Path=/; Max-Age=86400
///
/// After logging in successfully, the browser passes the cookie back on
/// every API call, e.g.:
/// curl -v --header "Cookie: __session=AbC...xYz" --request GET http://localhost:4000/dashboard/expenses
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = domain::user::Credentials, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Logs in and returns session authentication cookie", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 405, description = "Method not allowed"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn login(
    State(app_state): State<AppState>,
    Form(creds): Form<Credentials>,
) -> WebResult<impl IntoResponse> {
    let user = UserApi::authenticate(&app_state.users, &creds)?;
    let set_cookie = start_session(&app_state, &user)?;

    debug!("User {} logged in", user.id);

    Ok((
        [(header::SET_COOKIE, set_cookie)],
        Json(ApiResponse::new(StatusCode::OK.into(), user)),
    ))
}

/// Logs the user out of the platform by telling the browser to drop the
/// session cookie. Sessions live entirely in the cookie, so there is nothing
/// to destroy server-side.
/// Test this with curl: curl -v --request POST http://localhost:4000/logout
#[utoipa::path(
    post,
    path = "/logout",
    responses(
        (status = 200, description = "Successfully logged out"),
        (status = 405, description = "Method not allowed"),
        (status = 503, description = "Service temporarily unavailable")
    )
)]
pub async fn delete(State(app_state): State<AppState>) -> impl IntoResponse {
    trace!("UserSessionController::delete()");
    let removal = cookies::removal_cookie(&app_state.config);
    (StatusCode::OK, [(header::SET_COOKIE, removal.to_string())])
}

/// Reports whether the request carries a live session and when it expires.
/// Never fails: an absent or rejected cookie reads as unauthenticated.
#[utoipa::path(
    get,
    path = "/session",
    responses(
        (status = 200, description = "Current session status", body = SessionStatus),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub async fn read(State(app_state): State<AppState>, headers: HeaderMap) -> impl IntoResponse {
    let token = cookies::read(&headers, app_state.config.session_cookie_name());
    let session: Option<Session> = app_state.sessions.resolve(token.as_deref()).ok();

    Json(ApiResponse::new(
        StatusCode::OK.into(),
        SessionStatus {
            authenticated: session.is_some(),
            expires_at: session.map(|session| session.expires_at),
        },
    ))
}
