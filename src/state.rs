use crate::auth::{AuthError, AuthState};
use crate::config::AppConfig;
use crate::ports::{Clock, DocumentStore, IdentityProvider, Mailer};

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub(crate) auth: AuthState,
    pub store: Arc<dyn DocumentStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub mailer: Arc<dyn Mailer>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Arc<dyn DocumentStore>,
        identity: Arc<dyn IdentityProvider>,
        mailer: Arc<dyn Mailer>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        let auth = AuthState::from_config(&config)?;
        Ok(Self {
            config,
            auth,
            store,
            identity,
            mailer,
            clock,
        })
    }
}
