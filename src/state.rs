//! Shared application state for all routes: the store handle and nothing else.

use crate::store::Store;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn Store>,
}

impl AppState {
    pub fn new<S: Store + 'static>(store: S) -> Self {
        Self {
            store: Arc::new(store),
        }
    }
}
