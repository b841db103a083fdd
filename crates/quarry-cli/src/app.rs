//! Application state management.

use anyhow::Context;
use quarry_core::{Catalog, Config, Library, SourceEvent};
use std::sync::Arc;
use tracing::info;

/// Shared application state.
pub struct App {
    /// Configuration
    pub config: Config,

    /// The search session
    pub library: Arc<Library>,

    /// Record catalog backing the library
    pub catalog: Catalog,
}

impl App {
    /// Load the catalog and build the index over it.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let catalog_path = config.catalog_path()?;
        let catalog = Catalog::load(&catalog_path)
            .with_context(|| format!("Cannot open catalog {}", catalog_path.display()))?;
        let library = Arc::new(Library::from_config(&config));

        // a freshly loaded catalog behaves like a completed add
        library.handle_event(SourceEvent::AddComplete, &catalog);

        info!(
            catalog = %catalog_path.display(),
            records = catalog.len(),
            "Application initialized"
        );

        Ok(App {
            config,
            library,
            catalog,
        })
    }

    /// Reread the catalog and pass `event` on to the library.
    ///
    /// Returns true when the index was rebuilt or cleared.
    pub fn reload(&mut self, event: SourceEvent) -> anyhow::Result<bool> {
        self.catalog.reload()?;
        Ok(self.library.handle_event(event, &self.catalog))
    }
}
