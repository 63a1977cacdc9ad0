//! Per-round elapsed-time counter.

/// Counts whole seconds spent in the current phase of a round.
///
/// The timer doesn't read a clock. The round calls
/// [`advance`](Self::advance) once per host tick while it is running, and
/// [`restart`](Self::restart) on every phase change, so elapsed time is
/// always "ticks since this phase began".
///
/// ```text
///   idle ──start()──→ running ──cancel()──→ idle
///                      │  ↑
///                      └──┘ advance() / restart()
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhaseTimer {
    running: bool,
    elapsed: u32,
}

impl PhaseTimer {
    /// An idle timer at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts counting from zero.
    pub fn start(&mut self) {
        self.running = true;
        self.elapsed = 0;
    }

    /// Resets elapsed time to zero without stopping.
    pub fn restart(&mut self) {
        self.elapsed = 0;
    }

    /// Stops the timer and resets it. Unconditional: a cancelled timer
    /// ignores `advance` until started again.
    pub fn cancel(&mut self) {
        self.running = false;
        self.elapsed = 0;
    }

    /// Adds one second if running. Returns the new elapsed value.
    pub fn advance(&mut self) -> u32 {
        if self.running {
            self.elapsed = self.elapsed.saturating_add(1);
        }
        self.elapsed
    }

    pub fn elapsed(&self) -> u32 {
        self.elapsed
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Seconds left until `limit`, or `None` when there is no limit.
    pub fn remaining(&self, limit: Option<u32>) -> Option<u32> {
        limit.map(|l| l.saturating_sub(self.elapsed))
    }
}
