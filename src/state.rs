use std::sync::Arc;

use axum::extract::FromRef;

use crate::{
    config::Config, generator::DynGenerator, quiz::registry::AttemptRegistry, store::DynStore,
};

#[derive(Clone)]
pub struct AppState {
    pub store: DynStore,
    pub generator: DynGenerator,
    /// Live attempts, keyed by attempt ID.
    pub attempts: Arc<AttemptRegistry>,
    pub config: Config,
}

impl FromRef<AppState> for DynStore {
    fn from_ref(state: &AppState) -> Self {
        state.store.clone()
    }
}

impl FromRef<AppState> for DynGenerator {
    fn from_ref(state: &AppState) -> Self {
        state.generator.clone()
    }
}

impl FromRef<AppState> for Arc<AttemptRegistry> {
    fn from_ref(state: &AppState) -> Self {
        state.attempts.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
