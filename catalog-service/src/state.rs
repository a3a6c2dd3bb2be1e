//! Application state management

use std::sync::Arc;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::store::MemoryStore;
use crate::uploads::ImageStore;

/// Application state shared across handlers
#[derive(Debug, Clone)]
pub struct AppState {
    config: Arc<Config>,
    store: MemoryStore,
    catalog: Catalog,
    images: ImageStore,
}

impl AppState {
    /// Build the store, catalog collections and image store from `config`
    pub fn new(config: Config) -> Self {
        let store = MemoryStore::new();
        let catalog = Catalog::new(&store, config.pagination.policy());
        let images = ImageStore::new(config.uploads.directory.clone(), config.uploads.max_image_bytes());

        Self {
            config: Arc::new(config),
            store,
            catalog,
            images,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The document store behind the catalog
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Catalog entity handlers
    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Image upload storage
    pub fn images(&self) -> &ImageStore {
        &self.images
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
