//! # Boot Orchestrator
//!
//! Gates readiness on a strictly ordered sequence of boot phases:
//!
//! ```text
//! shell -> registry -> module_load -> module_hydrate -> ready -> background
//! ```
//!
//! Exactly one phase is current. Completing a phase moves the pointer to the
//! phase after it, never backward. Waiters suspend on a `watch` channel
//! carrying the pointer and are released after a bounded wait even if the
//! phase never arrives.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use std::time::Duration;
use stratum_core::StratumError;
use tokio::sync::watch;
use tokio::time::Instant;

// =============================================================================
// BOOT PHASE
// =============================================================================

/// Boot phases in their total order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootPhase {
    /// Process started, nothing loaded.
    Shell,
    /// Source-of-truth store is usable.
    Registry,
    /// Graph engine module is loaded.
    ModuleLoad,
    /// Boot data selected and the graph read path populated.
    ModuleHydrate,
    /// Everything the UI needs is in place.
    Ready,
    /// Deferred work (graph hydration, cache verification).
    Background,
}

impl BootPhase {
    /// All phases in order.
    pub const ALL: [BootPhase; 6] = [
        BootPhase::Shell,
        BootPhase::Registry,
        BootPhase::ModuleLoad,
        BootPhase::ModuleHydrate,
        BootPhase::Ready,
        BootPhase::Background,
    ];

    /// Position in the total order.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The phase after this one, clamped at `Background`.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            BootPhase::Shell => BootPhase::Registry,
            BootPhase::Registry => BootPhase::ModuleLoad,
            BootPhase::ModuleLoad => BootPhase::ModuleHydrate,
            BootPhase::ModuleHydrate => BootPhase::Ready,
            BootPhase::Ready | BootPhase::Background => BootPhase::Background,
        }
    }

    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BootPhase::Shell => "shell",
            BootPhase::Registry => "registry",
            BootPhase::ModuleLoad => "module_load",
            BootPhase::ModuleHydrate => "module_hydrate",
            BootPhase::Ready => "ready",
            BootPhase::Background => "background",
        }
    }
}

impl fmt::Display for BootPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// TIMINGS
// =============================================================================

#[derive(Debug, Clone, Copy, Default)]
struct PhaseClock {
    started: Option<Instant>,
    completed: Option<Instant>,
}

#[derive(Debug)]
struct Clocks {
    origin: Instant,
    phases: [PhaseClock; 6],
}

impl Clocks {
    fn fresh() -> Self {
        let origin = Instant::now();
        let mut phases = [PhaseClock::default(); 6];
        phases[BootPhase::Shell.index()].started = Some(origin);
        Self { origin, phases }
    }

    fn offset_ms(&self, at: Option<Instant>) -> Option<u64> {
        at.map(|t| t.saturating_duration_since(self.origin).as_millis() as u64)
    }
}

/// Start and completion offsets of one phase, in milliseconds since boot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTiming {
    pub phase: BootPhase,
    pub started_ms: Option<u64>,
    pub completed_ms: Option<u64>,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

/// Ordered boot-phase state machine.
#[derive(Debug)]
pub struct BootOrchestrator {
    current: watch::Sender<BootPhase>,
    clocks: Mutex<Clocks>,
    wait_bound: Duration,
}

impl BootOrchestrator {
    /// Create an orchestrator at `Shell`. Waits give up after `wait_bound`.
    #[must_use]
    pub fn new(wait_bound: Duration) -> Self {
        let (current, _) = watch::channel(BootPhase::Shell);
        Self {
            current,
            clocks: Mutex::new(Clocks::fresh()),
            wait_bound,
        }
    }

    /// The current phase.
    #[must_use]
    pub fn current(&self) -> BootPhase {
        *self.current.borrow()
    }

    /// Mark a phase complete.
    ///
    /// The first completion of a phase is timestamped; later ones are no-ops
    /// for the timestamp. The pointer moves to `max(current, phase.next())`.
    pub fn complete_phase(&self, phase: BootPhase) {
        let Ok(mut clocks) = self.lock() else {
            return;
        };
        let now = Instant::now();

        let clock = &mut clocks.phases[phase.index()];
        let first = clock.completed.is_none();
        if first {
            clock.completed = Some(now);
        }
        let elapsed_ms = clock
            .started
            .map(|s| now.saturating_duration_since(s).as_millis() as u64);

        let target = phase.next();
        let advanced = self.current.send_if_modified(|current| {
            if target > *current {
                *current = target;
                true
            } else {
                false
            }
        });
        if advanced {
            let started = &mut clocks.phases[target.index()].started;
            if started.is_none() {
                *started = Some(now);
            }
        }

        if first {
            tracing::info!(phase = %phase, elapsed_ms = ?elapsed_ms, current = %self.current(), "Boot phase complete");
        }
    }

    /// Wait until `phase` is current or past.
    ///
    /// Returns `false` if the wait bound expired first. Callers are released
    /// either way.
    pub async fn wait_for(&self, phase: BootPhase) -> bool {
        if self.reached(phase) {
            return true;
        }

        let mut rx = self.current.subscribe();
        match tokio::time::timeout(self.wait_bound, async {
            rx.wait_for(|current| *current >= phase).await.is_ok()
        })
        .await
        {
            Ok(reached) => reached,
            Err(_) => {
                tracing::warn!(
                    phase = %phase,
                    current = %self.current(),
                    wait_ms = self.wait_bound.as_millis() as u64,
                    "Timed out waiting for boot phase"
                );
                false
            }
        }
    }

    /// Return every phase to its initial state.
    pub fn reset(&self) {
        if let Ok(mut clocks) = self.lock() {
            *clocks = Clocks::fresh();
        }
        self.current.send_replace(BootPhase::Shell);
        tracing::debug!("Boot orchestrator reset");
    }

    /// The source-of-truth store is usable.
    #[must_use]
    pub fn is_registry_ready(&self) -> bool {
        self.current() >= BootPhase::ModuleLoad
    }

    /// The graph engine module is loaded.
    #[must_use]
    pub fn is_module_ready(&self) -> bool {
        self.current() >= BootPhase::ModuleHydrate
    }

    /// The application is ready for use.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.current() >= BootPhase::Ready
    }

    /// Per-phase timings for diagnostics.
    #[must_use]
    pub fn timings(&self) -> Vec<PhaseTiming> {
        let Ok(clocks) = self.lock() else {
            return Vec::new();
        };
        BootPhase::ALL
            .iter()
            .map(|&phase| {
                let clock = clocks.phases[phase.index()];
                PhaseTiming {
                    phase,
                    started_ms: clocks.offset_ms(clock.started),
                    completed_ms: clocks.offset_ms(clock.completed),
                }
            })
            .collect()
    }

    fn reached(&self, phase: BootPhase) -> bool {
        if self.current() >= phase {
            return true;
        }
        self.lock()
            .map(|clocks| clocks.phases[phase.index()].completed.is_some())
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Clocks>, StratumError> {
        self.clocks
            .lock()
            .map_err(|_| StratumError::LockPoisoned("boot clocks"))
    }
}

// =============================================================================
// GLOBAL ACCESSOR
// =============================================================================

static GLOBAL: OnceLock<Arc<BootOrchestrator>> = OnceLock::new();

/// Publish an orchestrator for call sites that cannot take it as a parameter.
///
/// New code should receive the orchestrator through its constructor; this
/// exists only for legacy callers. Returns `false` if one was already set.
pub fn install_global(orchestrator: Arc<BootOrchestrator>) -> bool {
    GLOBAL.set(orchestrator).is_ok()
}

/// The orchestrator published with [`install_global`], if any.
#[must_use]
pub fn global() -> Option<Arc<BootOrchestrator>> {
    GLOBAL.get().cloned()
}

// =============================================================================
// TESTS
// =============================================================================
