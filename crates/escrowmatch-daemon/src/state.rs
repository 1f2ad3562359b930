//! Shared runtime state for the daemon.
//!
//! Handlers receive `State<Arc<AppState>>` from axum. Everything mutable
//! lives behind the engine's store and presence registry.

use std::sync::Arc;

use escrowmatch_engine::{EscrowService, LifecycleEngine, QuoteSource};
use escrowmatch_presence::PresenceRegistry;
use escrowmatch_store::MemoryOrderStore;
use escrowmatch_types::{EngineConfig, Result, constants};

/// Static build metadata included in health responses.
#[derive(Clone, Debug)]
pub struct BuildInfo {
    pub service: &'static str,
    pub version: &'static str,
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self {
            service: "escrowmatch-daemon",
            version: constants::VERSION,
        }
    }
}

pub struct AppState {
    pub service: EscrowService,
    pub build: BuildInfo,
}

impl AppState {
    #[must_use]
    pub fn new(service: EscrowService) -> Self {
        Self {
            service,
            build: BuildInfo::default(),
        }
    }

    /// Wire an engine over the in-memory store and a fresh registry.
    pub fn in_memory(quotes: Arc<dyn QuoteSource>, config: EngineConfig) -> Result<Self> {
        let engine = LifecycleEngine::new(
            Arc::new(MemoryOrderStore::new()),
            quotes,
            Arc::new(PresenceRegistry::new()),
            config,
        )?;
        Ok(Self::new(EscrowService::new(Arc::new(engine))))
    }
}
