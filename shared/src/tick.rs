use portable_atomic::{AtomicBool, Ordering};

// Single-slot pending tick. The timer interrupt raises it, the main loop
// consumes it. A tick raised while one is already pending overwrites it, so
// overrun cycles are dropped rather than queued and the loop never runs more
// than one cycle per observed tick.
pub struct TickFlag(AtomicBool);

impl TickFlag {
    pub const fn new() -> Self {
        Self(AtomicBool::new(false))
    }

    /// Called from interrupt context. Must not block or perform I/O.
    pub fn raise(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Consume the pending tick, if any.
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::Relaxed)
    }
}

impl Default for TickFlag {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_consumes() {
        let flag = TickFlag::new();
        assert!(!flag.take());

        flag.raise();
        assert!(flag.take());
        assert!(!flag.take());
    }

    #[test]
    fn overrun_ticks_are_dropped() {
        let flag = TickFlag::new();

        // two periods elapse before the loop gets around to polling
        flag.raise();
        flag.raise();

        // only one cycle runs, there is no backlog
        assert!(flag.take());
        assert!(!flag.take());
    }
}
