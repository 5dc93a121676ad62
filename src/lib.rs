pub mod config;
pub mod controllers;
pub mod database;
pub mod error;
pub mod models;
pub mod store;
pub mod validation;

use std::sync::Arc;

use crate::store::EventStore;

// Shared state for the whole application
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EventStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EventStore>) -> Arc<Self> {
        Arc::new(Self { store })
    }
}
