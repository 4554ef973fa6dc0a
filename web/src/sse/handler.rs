use crate::extractors::{authenticated_user::AuthenticatedUser, RejectionType};
use crate::AppState;
use axum::extract::State;
use axum::http::header;
use axum::response::sse::{KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use sse::StreamController;
use std::time::Duration;

/// SSE handler that establishes a long-lived connection for live updates.
///
/// Every tab of a user opens its own connection and receives a
/// `server-change` event whenever one of that user's records changes.
/// Unauthenticated requests are answered with 401 before anything is
/// subscribed. When the client disconnects the response body is dropped,
/// which unsubscribes the connection.
#[utoipa::path(
    get,
    path = "/sse",
    responses(
        (status = 200, description = "text/event-stream of `server-change` events"),
        (status = 401, description = "Unauthorized"),
    ),
    security(
        ("cookie_auth" = [])
    )
)]
pub(crate) async fn sse_handler(
    State(app_state): State<AppState>,
    identity: Result<AuthenticatedUser, RejectionType>,
) -> Response {
    let identity = identity.map(|AuthenticatedUser(user)| user.id.to_string());

    let mut controller = StreamController::new(app_state.sse_manager.clone());
    match controller.open(identity) {
        Ok(stream) => {
            let keep_alive = KeepAlive::new()
                .interval(Duration::from_secs(app_state.config.sse_keep_alive_seconds));
            (
                [
                    (header::CACHE_CONTROL, "no-store, no-transform"),
                    (header::CONNECTION, "keep-alive"),
                ],
                Sse::new(stream).keep_alive(keep_alive),
            )
                .into_response()
        }
        Err(rejection) => rejection.into_response(),
    }
}
