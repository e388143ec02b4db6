//! # Stratum
//!
//! The async coordinator that keeps a local-first application's storage
//! tiers in step:
//!
//! - [`boot`]: ordered boot phases gating readiness
//! - [`sync`]: debounced, lock-protected flushes to the durable tier
//! - [`hydrator`]: lazy, versioned projection into the graph engine
//! - [`bridge`]: the facade every read and write goes through
//!
//! [`app`] wires one execution context from a [`config::StratumConfig`];
//! [`api`] and [`cli`] are the outer surfaces.

pub mod api;
pub mod app;
pub mod boot;
pub mod bridge;
pub mod cli;
pub mod config;
pub mod hub;
pub mod hydrator;
pub mod sync;
pub mod warm;

pub use app::{App, Capabilities};
pub use boot::{BootOrchestrator, BootPhase, PhaseTiming};
pub use bridge::{BootReport, Bridge, BridgeStatus, SyncStatusReport};
pub use config::StratumConfig;
pub use hub::{ContextHub, SyncEvent};
pub use hydrator::{GraphHydrator, HydrationOutcome, HydrationStatus};
pub use sync::{
    BootSource, DurableSyncCoordinator, SyncOutcome, SyncSettings, SyncSnapshot, SyncStatus,
};
pub use warm::{CacheWarmer, WarmStats};
