pub mod circuit;
pub mod config;
pub mod domain {
    pub mod transaction;
}
pub mod engine {
    pub mod backoff;
    pub mod fallback;
}
pub mod http {
    pub mod handlers {
        pub mod processors;
        pub mod stats;
        pub mod transactions;
    }
}
pub mod processors;
pub mod stats;

use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<engine::fallback::FallbackEngine>,
    pub registry: Arc<circuit::registry::BreakerRegistry>,
    pub stats: Arc<stats::StatsService>,
    pub processors: Vec<Arc<dyn processors::Processor>>,
}
