use axum::http::{header, HeaderValue, Method};
use domain::encryption::EncryptionKey;
use domain::error::Error as DomainError;
use domain::record::RecordStore;
use domain::session::SessionStore;
use domain::user::UserStore;
use events::EventPublisher;
use log::*;
use service::config::Config;
use ::sse::{Manager, SseDomainEventHandler};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

mod controller;
mod cookies;
mod error;
mod extractors;
mod middleware;
pub mod router;
mod sse;

#[cfg(test)]
mod test_support;

pub use error::{Error, Result};

// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<Manager>,
    pub event_publisher: Arc<EventPublisher>,
    pub sessions: Arc<SessionStore>,
    pub users: Arc<UserStore>,
    pub records: Arc<RecordStore>,
}

impl AppState {
    /// Wires the event bus into the domain event publisher and opens the
    /// session store with the configured key.
    pub fn new(config: Config) -> std::result::Result<Self, DomainError> {
        let key = match config.session_key() {
            Some(key_hex) => EncryptionKey::from_hex(key_hex)?,
            None if config.is_production() => {
                error!("SESSION_KEY must be set when running in production");
                return Err(DomainError::config());
            }
            None => {
                warn!("SESSION_KEY not set, generating an ephemeral key; sessions will not survive a restart");
                EncryptionKey::generate()
            }
        };

        let ttl = SessionStore::ttl_from_seconds(config.backend_session_expiry_seconds)?;
        let sse_manager = Arc::new(Manager::new());
        let event_publisher = EventPublisher::new()
            .with_handler(Arc::new(SseDomainEventHandler::new(sse_manager.clone())));

        Ok(Self {
            config,
            sse_manager,
            event_publisher: Arc::new(event_publisher),
            sessions: Arc::new(SessionStore::new(key, ttl)),
            users: Arc::new(UserStore::new()),
            records: Arc::new(RecordStore::new()),
        })
    }
}

pub async fn init_server(app_state: AppState) -> std::io::Result<()> {
    let server_url = app_state.config.listen_address();

    let listen_addr = format!("http://{server_url}");
    info!("Server starting... listening for connections on {listen_addr}");

    let listener = tokio::net::TcpListener::bind(server_url).await?;

    let allowed_origins: Vec<HeaderValue> = app_state
        .config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {origin}");
                None
            }
        })
        .collect();
    info!("allowed_origins: {allowed_origins:#?}");

    let cors_layer = CorsLayer::new()
        .allow_methods([Method::DELETE, Method::GET, Method::POST, Method::PUT])
        .allow_credentials(true)
        .allow_headers([header::ACCEPT, header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_origin(allowed_origins);

    axum::serve(listener, router::define_routes(app_state).layer(cors_layer)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TEST_SESSION_KEY;
    use domain::error::DomainErrorKind;

    fn config() -> Config {
        Config::from_defaults().set_session_key(TEST_SESSION_KEY.to_string())
    }

    #[test]
    fn out_of_range_session_expiry_fails_startup() {
        for seconds in [0, 1_000_000_000_000_000, u64::MAX] {
            let mut config = config();
            config.backend_session_expiry_seconds = seconds;

            match AppState::new(config) {
                Err(error) => assert_eq!(error.error_kind, DomainErrorKind::Config, "{seconds}"),
                Ok(_) => panic!("expiry of {seconds} seconds was accepted"),
            }
        }
    }

    #[test]
    fn session_lifetime_follows_configured_expiry() {
        let mut config = config();
        config.backend_session_expiry_seconds = 3_600;

        let app_state = AppState::new(config).unwrap();
        assert_eq!(app_state.sessions.ttl(), chrono::Duration::hours(1));
    }

    #[test]
    fn malformed_session_key_fails_startup() {
        let config = Config::from_defaults().set_session_key("abcd".to_string());
        match AppState::new(config) {
            Err(error) => assert_eq!(error.error_kind, DomainErrorKind::Config),
            Ok(_) => panic!("a 2-byte session key was accepted"),
        }
    }
}
