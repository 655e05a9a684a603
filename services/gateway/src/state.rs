use crate::config::GatewayConfig;
use crate::rate_limit::RateLimiter;
use matching_engine::MatchEngine;
use records::RecordStore;
use std::sync::Arc;
use types::topic::SubjectCatalog;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<MatchEngine>,
    pub store: Arc<dyn RecordStore>,
    pub catalog: Arc<SubjectCatalog>,
    pub rate_limiter: Arc<RateLimiter>,
    pub config: Arc<GatewayConfig>,
}

impl AppState {
    pub fn new(config: GatewayConfig, store: Arc<dyn RecordStore>) -> Self {
        Self {
            engine: Arc::new(MatchEngine::new()),
            store,
            catalog: Arc::new(SubjectCatalog::default()),
            rate_limiter: Arc::new(RateLimiter::new(config.rate_limit_per_min)),
            config: Arc::new(config),
        }
    }
}
