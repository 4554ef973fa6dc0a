use crate::{
    controller::{
        health_check_controller, record_controller, user_controller, user_session_controller,
    },
    middleware::auth::require_auth,
    sse::handler::sse_handler,
    AppState,
};
use axum::{
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};

use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_rapidoc::RapiDoc;

// This is the global definition of our OpenAPI document. To be a part
// of the rendered document, a path and schema must be listed here.
#[derive(OpenApi)]
#[openapi(
        info(
            title = "BeeRich API"
        ),
        paths(
            record_controller::create,
            record_controller::index,
            record_controller::read,
            record_controller::logs,
            record_controller::update,
            record_controller::delete,
            record_controller::remove_attachment,
            health_check_controller::health_check,
            user_controller::create,
            user_session_controller::login,
            user_session_controller::delete,
            user_session_controller::read,
            crate::sse::handler::sse_handler,
        ),
        components(
            schemas(
                domain::record::Record,
                domain::record::RecordKind,
                domain::record::RecordLog,
                domain::record::RecordParams,
                domain::user::User,
                domain::user::Credentials,
                domain::user::Registration,
                user_session_controller::SessionStatus,
            )
        ),
        modifiers(&SecurityAddon),
        tags(
            (name = "beerich", description = "BeeRich expense & income tracking API")
        )
    )]
struct ApiDoc;

struct SecurityAddon;

// Defines our cookie session based authentication requirement for gaining access to our
// API endpoints for OpenAPI.
impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "cookie_auth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    service::config::DEFAULT_SESSION_COOKIE_NAME,
                    "Sealed session value returned from successful login or signup via Set-Cookie header",
                ))),
            )
        }
    }
}

pub fn define_routes(app_state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(record_routes(app_state.clone()))
        .merge(sse_routes(app_state.clone()))
        .merge(user_routes(app_state.clone()))
        .merge(user_session_routes(app_state))
        .merge(RapiDoc::with_openapi("/api-docs/openapi2.json", ApiDoc::openapi()).path("/rapidoc"))
}

fn health_routes() -> Router {
    Router::new().route("/health", get(health_check_controller::health_check))
}

fn record_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/dashboard/{kind}", post(record_controller::create))
        .route("/dashboard/{kind}", get(record_controller::index))
        .route("/dashboard/{kind}/{id}", get(record_controller::read))
        .route("/dashboard/{kind}/{id}/logs", get(record_controller::logs))
        .route("/dashboard/{kind}/{id}", put(record_controller::update))
        .route("/dashboard/{kind}/{id}", delete(record_controller::delete))
        .route(
            "/dashboard/{kind}/{id}/attachment",
            delete(record_controller::remove_attachment),
        )
        .route_layer(from_fn_with_state(app_state.clone(), require_auth))
        .with_state(app_state)
}

// The SSE handler answers unauthenticated requests itself, so it sits
// outside `require_auth`.
fn sse_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/sse", get(sse_handler))
        .with_state(app_state)
}

fn user_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/signup", post(user_controller::create))
        .with_state(app_state)
}

pub fn user_session_routes(app_state: AppState) -> Router {
    Router::new()
        .route("/login", post(user_session_controller::login))
        .route("/logout", post(user_session_controller::delete))
        .route("/session", get(user_session_controller::read))
        .with_state(app_state)
}
