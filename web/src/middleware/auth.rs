use crate::extractors::authenticated_user::AuthenticatedUser;
use crate::AppState;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// Authentication middleware that returns 401 Unauthorized for unauthenticated requests.
///
/// The resolved user is stored in the request extensions so handlers using the
/// `AuthenticatedUser` extractor do not open the session cookie a second time.
pub async fn require_auth(
    State(app_state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let (mut parts, body) = request.into_parts();
    match AuthenticatedUser::resolve(&parts, &app_state) {
        Ok(user) => {
            parts.extensions.insert(user);
            next.run(Request::from_parts(parts, body)).await
        }
        Err(rejection) => rejection.into_response(),
    }
}
