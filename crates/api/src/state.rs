use std::sync::Arc;

use crate::{catalog::SeriesCatalog, config::Config, interactions::LogProcessor, stores::Stores};

#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// KV namespaces (Redis or in-memory).
    pub stores: Stores,
    /// Static series data.
    pub catalog: Arc<dyn SeriesCatalog>,
    /// Log aggregation, shared by the scheduler and the process-log endpoint.
    pub processor: LogProcessor,
}
