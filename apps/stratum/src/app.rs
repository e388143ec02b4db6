//! # Application Wiring
//!
//! Builds one execution context: the capability tiers, the coordinator
//! components on top of them and the bridge in front.
//!
//! ```text
//! App::build ──► Shell complete
//! App::start ──► Bridge::init (Registry, ModuleLoad, ModuleHydrate, Ready)
//!            └─► background: listener, hydration, cache verification
//!                            ──► Background complete
//! App::shutdown ──► bounded final flush
//! ```

use crate::boot::{BootOrchestrator, BootPhase};
use crate::bridge::{Bridge, BootReport};
use crate::config::StratumConfig;
use crate::hub::ContextHub;
use crate::hydrator::GraphHydrator;
use crate::sync::DurableSyncCoordinator;
use crate::warm::CacheWarmer;
use std::sync::{Arc, Mutex};
use stratum_core::{
    BootCache, DurableStore, FsDurableStore, GraphEngine, GraphIndex, MemoryStore, RecordStore,
    RedbBootCache, StratumError,
};
use tokio::task::JoinHandle;

/// The storage tiers one context runs on.
pub struct Capabilities {
    pub store: Arc<dyn RecordStore>,
    pub durable: Arc<dyn DurableStore>,
    pub engine: Arc<dyn GraphEngine>,
    pub boot_cache: Option<Arc<dyn BootCache>>,
}

impl Capabilities {
    /// The reference tiers rooted at the configured data directory.
    ///
    /// A boot cache that cannot be opened is logged and left out.
    pub fn open(config: &StratumConfig) -> Result<Self, StratumError> {
        let durable = FsDurableStore::open(&config.data_dir)?;

        let boot_cache: Option<Arc<dyn BootCache>> = if config.boot_cache {
            match RedbBootCache::open(config.boot_cache_path()) {
                Ok(cache) => Some(Arc::new(cache)),
                Err(e) => {
                    tracing::warn!("Boot cache unavailable, continuing without it: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(Self {
            store: Arc::new(MemoryStore::new()),
            durable: Arc::new(durable),
            engine: Arc::new(GraphIndex::new()),
            boot_cache,
        })
    }
}

/// One wired execution context.
pub struct App {
    bridge: Arc<Bridge>,
    background: Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("bridge", &self.bridge)
            .finish_non_exhaustive()
    }
}

impl App {
    /// Build a context on the reference tiers.
    pub fn build(config: &StratumConfig) -> Result<Self, StratumError> {
        let capabilities = Capabilities::open(config)?;
        Ok(Self::with_capabilities(
            config,
            capabilities,
            Arc::new(ContextHub::default()),
        ))
    }

    /// Build a context on caller-supplied tiers and a shared hub.
    #[must_use]
    pub fn with_capabilities(
        config: &StratumConfig,
        capabilities: Capabilities,
        hub: Arc<ContextHub>,
    ) -> Self {
        let Capabilities {
            store,
            durable,
            engine,
            boot_cache,
        } = capabilities;

        let orchestrator = Arc::new(BootOrchestrator::new(config.phase_wait()));
        let sync =
            DurableSyncCoordinator::new(store.clone(), durable, hub, config.sync_settings());
        let hydrator = Arc::new(GraphHydrator::new(
            store.clone(),
            engine.clone(),
            config.hydration_wait(),
        ));
        let warmer = CacheWarmer::new(boot_cache, config.warm_attempts, config.warm_backoff());

        let bridge = Arc::new(Bridge::new(
            store,
            engine,
            sync,
            hydrator,
            warmer,
            orchestrator.clone(),
        ));
        orchestrator.complete_phase(BootPhase::Shell);

        Self {
            bridge,
            background: Mutex::new(None),
        }
    }

    /// Boot the context and start its background work.
    pub async fn start(&self) -> Result<BootReport, StratumError> {
        let report = self.bridge.init().await?;
        self.bridge.sync().spawn_listener();

        let bridge = self.bridge.clone();
        let handle = tokio::spawn(async move {
            bridge.hydrator().ensure_hydrated().await;
            bridge.sync().verified().await;
            bridge.orchestrator().complete_phase(BootPhase::Background);
        });
        if let Ok(mut slot) = self.background.lock()
            && let Some(old) = slot.replace(handle)
        {
            old.abort();
        }
        Ok(report)
    }

    /// Wait for the background work started by [`start`](Self::start).
    pub async fn wait_background(&self) {
        let handle = self.background.lock().ok().and_then(|mut slot| slot.take());
        if let Some(handle) = handle
            && let Err(e) = handle.await
        {
            tracing::warn!("Background boot task failed: {}", e);
        }
    }

    /// Best-effort final flush.
    pub async fn shutdown(&self) {
        tracing::info!("Shutting down");
        self.bridge.sync().shutdown().await;
    }

    /// The bridge facade.
    #[must_use]
    pub fn bridge(&self) -> &Arc<Bridge> {
        &self.bridge
    }

    /// The boot orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &Arc<BootOrchestrator> {
        self.bridge.orchestrator()
    }
}
