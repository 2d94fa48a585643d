use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Process-wide flags for the workflow: the reentrancy guard and the
/// cooperative stop request. Shared by the state machine and any timer that
/// wants to know whether a step is running.
#[derive(Debug, Default)]
pub struct WorkflowRuntime {
    in_flight: AtomicBool,
    cancel_requested: AtomicBool,
}

impl WorkflowRuntime {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Claim the guard. `None` means another resume is already running and
    /// this caller must drop its work.
    pub fn try_enter(self: &Arc<Self>) -> Option<InFlightGuard> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard {
                runtime: Arc::clone(self),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub fn request_cancel(&self) {
        self.cancel_requested.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel_requested.load(Ordering::Acquire)
    }

    /// Called when a new run starts
    pub fn reset(&self) {
        self.cancel_requested.store(false, Ordering::Release);
    }
}

/// Releases the reentrancy guard on drop
#[derive(Debug)]
pub struct InFlightGuard {
    runtime: Arc<WorkflowRuntime>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.runtime.in_flight.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_entry_is_refused_until_guard_drops() {
        let runtime = WorkflowRuntime::new();
        let guard = runtime.try_enter();
        assert!(guard.is_some());
        assert!(runtime.is_busy());
        assert!(runtime.try_enter().is_none());

        drop(guard);
        assert!(!runtime.is_busy());
        assert!(runtime.try_enter().is_some());
    }

    #[test]
    fn test_reset_clears_cancel() {
        let runtime = WorkflowRuntime::new();
        runtime.request_cancel();
        assert!(runtime.is_cancelled());
        runtime.reset();
        assert!(!runtime.is_cancelled());
    }
}
