use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::app::AppContainer;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub container: Arc<dyn AppContainer>,
    /// Cancelled on shutdown; each request runs under a child token
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(container: Arc<dyn AppContainer>, shutdown: CancellationToken) -> Self {
        Self {
            container,
            shutdown,
        }
    }
}
