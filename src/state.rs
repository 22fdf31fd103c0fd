use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::config::Config;
use crate::session::SessionRegistry;
use crate::store::{PgStore, SessionStore};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub store: Arc<dyn SessionStore>,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub fn new(pool: PgPool, config: Config) -> Self {
        AppState {
            store: Arc::new(PgStore::new(pool.clone())),
            sessions: SessionRegistry::new(),
            pool,
            config,
        }
    }
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
