use std::sync::Arc;

use crate::core::config::{AppPaths, Settings};
use crate::core::errors::ApiError;
use crate::retrieval::{embeddings, SemanticRetriever};
use crate::store::SessionStore;
use crate::wiki::{PageFetcher, WikiSearchClient};

/// Application state shared across all routes.
pub struct AppState {
    pub paths: Arc<AppPaths>,
    pub settings: Settings,
    pub store: SessionStore,
    pub retriever: SemanticRetriever,
    pub fetcher: PageFetcher,
    pub search: WikiSearchClient,
}

impl AppState {
    pub fn initialize() -> Result<Arc<Self>, ApiError> {
        let paths = Arc::new(AppPaths::new());
        let settings = Settings::load(&paths);

        let store = SessionStore::open(paths.store_path.clone());
        let backend = embeddings::backend_from_settings(&settings.retrieval.embedding)?;
        let retriever = SemanticRetriever::new(backend);
        let fetcher = PageFetcher::new(&settings.fetcher)?;
        let search = WikiSearchClient::new(&settings.search)?;

        Ok(Arc::new(AppState {
            paths,
            settings,
            store,
            retriever,
            fetcher,
            search,
        }))
    }
}
