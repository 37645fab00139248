pub mod catalog;
pub mod config;
pub mod logging;
pub mod response;
pub mod routes;
pub mod seed;
pub mod services;
pub mod state;
pub mod store;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::catalog::{CatalogError, TopicCatalog};
use crate::config::PracticeConfig;
use crate::services::PracticeService;
use crate::state::AppState;
use crate::store::InMemoryStore;

/// Catalog from `catalog_path`, or the built-in demo catalog
pub fn load_catalog(config: &PracticeConfig) -> Result<TopicCatalog, CatalogError> {
    match config.catalog_path.as_deref() {
        Some(path) => {
            let catalog = TopicCatalog::load(path)?;
            tracing::info!(path = %path.display(), topics = catalog.len(), "topic catalog loaded");
            Ok(catalog)
        }
        None => seed::demo_catalog(),
    }
}

/// Wires the in-memory store, catalog and practice service together
pub fn build_state(config: &PracticeConfig) -> Result<AppState, CatalogError> {
    let catalog = load_catalog(config)?;
    let store = InMemoryStore::new(config.recent_attempt_window);
    if config.seed_demo {
        seed::seed_demo_questions(&store, &catalog);
    }

    let service = PracticeService::new(Arc::new(store), Arc::new(catalog), config.clone());
    Ok(AppState::new(Arc::new(service)))
}

pub fn create_app(config: &PracticeConfig) -> Result<axum::Router, CatalogError> {
    let state = build_state(config)?;
    Ok(app_with_state(state))
}

pub fn app_with_state(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
