use std::sync::Arc;

use crate::auth::{ApiKeyValidator, Authenticator, TokenService};
use crate::config::Config;
use crate::store::Store;

/// Shared request state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub auth: Arc<Authenticator>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
        let auth = Authenticator::new(
            TokenService::new(&config.jwt_secret),
            ApiKeyValidator::new(config.legacy_api_keys.iter().cloned()),
        );
        Self { store, auth: Arc::new(auth), config: Arc::new(config) }
    }
}
