//! Property tests for boot-phase progression.

#![allow(clippy::unwrap_used, clippy::panic)]

use proptest::prelude::*;
use std::time::Duration;
use stratum::{BootOrchestrator, BootPhase};

fn phase() -> impl Strategy<Value = BootPhase> {
    (0..BootPhase::ALL.len()).prop_map(|i| BootPhase::ALL[i])
}

proptest! {
    /// The pointer never moves backward and always sits one past the
    /// furthest completed phase.
    #[test]
    fn pointer_is_monotonic(completions in prop::collection::vec(phase(), 0..32)) {
        let boot = BootOrchestrator::new(Duration::from_secs(1));
        let mut previous = boot.current();
        let mut furthest: Option<BootPhase> = None;

        for phase in completions {
            boot.complete_phase(phase);
            let current = boot.current();
            prop_assert!(current >= previous);

            furthest = Some(furthest.map_or(phase, |f| f.max(phase)));
            prop_assert_eq!(Some(current), furthest.map(BootPhase::next));
            previous = current;
        }
    }

    /// Every completed phase keeps a completion timestamp, whatever the order.
    #[test]
    fn completions_are_recorded(completions in prop::collection::vec(phase(), 1..16)) {
        let boot = BootOrchestrator::new(Duration::from_secs(1));
        for phase in &completions {
            boot.complete_phase(*phase);
        }

        let timings = boot.timings();
        for phase in completions {
            prop_assert!(timings[phase.index()].completed_ms.is_some());
        }
    }

    /// Derived readiness flags agree with the pointer.
    #[test]
    fn readiness_flags_follow_pointer(phase in phase()) {
        let boot = BootOrchestrator::new(Duration::from_secs(1));
        boot.complete_phase(phase);
        let current = boot.current();

        prop_assert_eq!(boot.is_registry_ready(), current >= BootPhase::ModuleLoad);
        prop_assert_eq!(boot.is_module_ready(), current >= BootPhase::ModuleHydrate);
        prop_assert_eq!(boot.is_ready(), current >= BootPhase::Ready);
    }
}

#[test]
fn global_accessor_installs_once() {
    let first = std::sync::Arc::new(BootOrchestrator::new(Duration::from_secs(1)));
    let second = std::sync::Arc::new(BootOrchestrator::new(Duration::from_secs(1)));

    assert!(stratum::boot::install_global(first.clone()));
    assert!(!stratum::boot::install_global(second));
    assert!(std::sync::Arc::ptr_eq(
        &stratum::boot::global().unwrap(),
        &first
    ));
}
