use crate::application::EntityStore;
use crate::domain::{Session, User};
use crate::infrastructure::api::ApiClient;
use crate::infrastructure::session::SessionStore;
use crate::Config;
use crowdsolve_errors::AppError;
use std::sync::Arc;

/// Explicit context threaded through every view and networked operation.
#[derive(Clone)]
pub struct AppContext {
    pub api: Arc<ApiClient>,
    pub sessions: Arc<SessionStore>,
    pub store: EntityStore,
}

impl AppContext {
    pub fn new(api: ApiClient, sessions: SessionStore) -> Self {
        Self {
            api: Arc::new(api),
            sessions: Arc::new(sessions),
            store: EntityStore::new(),
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let api = ApiClient::new(config.base_url.clone(), config.request_timeout)?;
        tracing::info!("Using service at {}", config.base_url);
        Ok(Self::new(api, SessionStore::new(&config.session_dir)))
    }

    pub fn from_env() -> Result<Self, AppError> {
        Self::from_config(&Config::from_env()?)
    }

    /// Read fresh from client-local storage on every call.
    pub fn current_session(&self) -> Option<Session> {
        self.sessions.load()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current_session().map(|s| s.user)
    }

    pub fn require_session(&self) -> Result<Session, AppError> {
        self.current_session()
            .ok_or_else(|| AppError::Auth("Please log in to continue".to_string()))
    }
}
