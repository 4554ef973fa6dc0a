use crate::cookies;
use crate::extractors::RejectionType;
use crate::AppState;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
};
use domain::user::User;
use log::*;

/// The user behind a request's session cookie.
#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser(pub User);

impl AuthenticatedUser {
    /// The authentication gate as seen from HTTP: resolves the session
    /// cookie of `parts` into the account it names.
    pub(crate) fn resolve(parts: &Parts, state: &AppState) -> Result<Self, RejectionType> {
        let token = cookies::read(&parts.headers, state.config.session_cookie_name());
        let user_id = state
            .sessions
            .resolve_identity(token.as_deref())
            .map_err(|_| unauthorized())?;

        match state.users.find_by_id(user_id) {
            Ok(user) => Ok(AuthenticatedUser(user)),
            Err(_) => {
                warn!("Session names unknown user {user_id}");
                Err(unauthorized())
            }
        }
    }
}

impl FromRequestParts<AppState> for AuthenticatedUser {
    type Rejection = RejectionType;

    // Reuses the user already resolved by the `require_auth` middleware when
    // present, otherwise resolves the cookie itself. A request without a
    // valid session is rejected with 401 Unauthorized.
    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(user.clone());
        }
        Self::resolve(parts, state)
    }
}

fn unauthorized() -> RejectionType {
    (StatusCode::UNAUTHORIZED, "Unauthorized".to_string())
}
