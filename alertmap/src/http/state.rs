use std::sync::Arc;

use crate::{service::AlertService, store::Store};

/// Shared state for all handlers
pub struct AppState<S: Store> {
    pub service: AlertService<S>,
    /// Storage backend name reported by `/health`.
    pub backend: &'static str,
}

impl<S: Store> AppState<S> {
    pub fn new(service: AlertService<S>, backend: &'static str) -> Arc<Self> {
        Arc::new(Self { service, backend })
    }
}
