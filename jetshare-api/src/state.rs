use jetshare_core::{ClientFactory, VectorIndex};
use jetshare_store::{app_config, Backends};
use std::sync::Arc;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
    pub audience: String,
    pub session_cookie: String,
}

impl From<&app_config::AuthConfig> for AuthConfig {
    fn from(config: &app_config::AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            audience: config.jwt_audience.clone(),
            session_cookie: config.session_cookie.clone(),
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub clients: Arc<dyn ClientFactory>,
    pub vectors: Arc<dyn VectorIndex>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(backends: Backends, auth: AuthConfig) -> Self {
        Self {
            clients: backends.clients,
            vectors: backends.vectors,
            auth,
        }
    }
}
