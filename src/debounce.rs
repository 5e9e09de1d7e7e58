//! Cancel-and-restart timers.

use std::cell::Cell;
use std::rc::Rc;

use crate::dom::{Host, TimerHandle};

/// Runs a callback once `delay_ms` has passed without another `schedule` call.
pub struct Debouncer<H: Host> {
    host: Rc<H>,
    delay_ms: u32,
    pending: Rc<Cell<Option<TimerHandle>>>,
}

impl<H: Host> Debouncer<H> {
    pub fn new(host: Rc<H>, delay_ms: u32) -> Self {
        Self {
            host,
            delay_ms,
            pending: Rc::new(Cell::new(None)),
        }
    }

    /// Replace any pending callback with `callback`, restarting the delay.
    pub fn schedule(&self, callback: impl FnOnce() + 'static) {
        self.cancel();
        let pending = self.pending.clone();
        let handle = self.host.set_timeout(
            self.delay_ms,
            Box::new(move || {
                pending.set(None);
                callback();
            }),
        );
        self.pending.set(Some(handle));
    }

    /// Drop the pending callback, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match self.pending.take() {
            Some(handle) => {
                self.host.clear_timeout(handle);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.get().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::memory::MemoryHost;

    #[test]
    fn test_burst_runs_once_after_quiet_period() {
        let host = MemoryHost::new(1024);
        let debouncer = Debouncer::new(host.clone(), 150);
        let calls = Rc::new(Cell::new(0));

        for _ in 0..5 {
            let c = calls.clone();
            debouncer.schedule(move || c.set(c.get() + 1));
            host.advance(100);
        }
        assert_eq!(calls.get(), 0);
        assert!(debouncer.is_pending());

        host.advance(50);
        assert_eq!(calls.get(), 1);
        assert!(!debouncer.is_pending());
        assert_eq!(host.pending_timers(), 0);
    }

    #[test]
    fn test_cancel() {
        let host = MemoryHost::new(1024);
        let debouncer = Debouncer::new(host.clone(), 500);
        let calls = Rc::new(Cell::new(0));
        let c = calls.clone();
        debouncer.schedule(move || c.set(c.get() + 1));
        assert!(debouncer.cancel());
        assert!(!debouncer.cancel());
        host.advance(1000);
        assert_eq!(calls.get(), 0);
    }
}
