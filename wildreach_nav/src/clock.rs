// Time as a capability, not an ambient authority.
//
// Every time-bounded behavior in the subsystem — the pathfinder's wall-clock
// timeout, the request processor's per-tick budget, the agent tracker's stuck
// timers — reads time through the `Clock` trait instead of calling
// `Instant::now()` directly. Production code uses `WallClock`; tests and
// lockstep multiplayer hosts use `ManualClock` and advance it explicitly,
// keeping every timeout path deterministic and testable with synthetic time.
//
// See also: `pathfinding.rs` for the search deadline, `queue.rs` for the
// drain budget, `agent.rs` for stuck-timer accumulation.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source. `now()` is an offset from an arbitrary origin;
/// only differences are meaningful.
pub trait Clock {
    fn now(&self) -> Duration;
}

/// Real wall-clock time, measured from construction.
#[derive(Clone, Debug)]
pub struct WallClock {
    origin: Instant,
}

impl WallClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for WallClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for WallClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually driven time. Cloned handles share the same underlying instant, so
/// a test can keep one handle while the `Navigator` owns another.
///
/// An optional `step` advances time on every read, which lets tests exercise
/// in-search timeouts: the search reads the clock once per node expansion and
/// each read moves time forward.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    inner: Rc<ManualClockInner>,
}

#[derive(Debug, Default)]
struct ManualClockInner {
    now: Cell<Duration>,
    step: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that advances by `step` on every `now()` read.
    pub fn with_step(step: Duration) -> Self {
        let clock = Self::new();
        clock.inner.step.set(step);
        clock
    }

    /// Advance time by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.inner.now.set(self.inner.now.get() + delta);
    }

    /// Set the absolute time.
    pub fn set(&self, now: Duration) {
        self.inner.now.set(now);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.inner.now.get();
        self.inner.now.set(now + self.inner.step.get());
        now
    }
}
