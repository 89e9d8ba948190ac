//! Time sources and the life-drain clock for Gauntlet rooms.
//!
//! The room is frame-stepped: nothing here sleeps or spawns a timer. The
//! frame driver polls [`LifeDrainClock::poll`] once per frame and the clock
//! answers whether a whole-second boundary has been crossed since the last
//! time it fired.
//!
//! # Edge detection, not rate
//!
//! The clock fires at most once per poll, no matter how many seconds went
//! by since the previous poll. A stalled frame loop skips seconds instead
//! of catching up:
//!
//! ```text
//! t = 10.2  poll → false   (last = 10)
//! t = 10.9  poll → false
//! t = 11.0  poll → true    (last = 11)
//! t = 14.5  poll → true    (last = 14, seconds 12 and 13 skipped)
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, trace};

// ---------------------------------------------------------------------------
// Clock sources
// ---------------------------------------------------------------------------

/// A source of "now", measured from some fixed epoch.
pub trait Clock: Send + 'static {
    fn now(&self) -> Duration;
}

/// Wall-clock time since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        // A system clock set before 1970 reads as the epoch itself.
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the room it drives.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock reading `start`.
    pub fn starting_at(start: Duration) -> Self {
        let clock = Self::default();
        clock.set(start);
        clock
    }

    /// Jumps to an absolute time.
    pub fn set(&self, now: Duration) {
        self.millis
            .store(now.as_millis() as u64, Ordering::SeqCst);
    }

    /// Moves time forward by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.millis
            .fetch_add(dt.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

// ---------------------------------------------------------------------------
// Life drain
// ---------------------------------------------------------------------------

/// Fires once each time the clock's whole-second value moves forward.
pub struct LifeDrainClock {
    clock: Box<dyn Clock>,
    /// Last whole second at which the clock fired (or was created).
    /// Only ever moves forward.
    last_tick_second: u64,
    fired: u64,
}

impl LifeDrainClock {
    /// Creates the clock, taking the current second as the baseline.
    pub fn new(clock: impl Clock) -> Self {
        let last_tick_second = clock.now().as_secs();
        debug!(second = last_tick_second, "life drain clock created");
        Self {
            clock: Box::new(clock),
            last_tick_second,
            fired: 0,
        }
    }

    /// Returns `true` if a new whole second started since the last time
    /// this returned `true`.
    ///
    /// A clock that jumps backwards never fires and does not move the
    /// baseline back.
    pub fn poll(&mut self) -> bool {
        let now = self.clock.now().as_secs();
        if now <= self.last_tick_second {
            if now < self.last_tick_second {
                debug!(
                    now,
                    last = self.last_tick_second,
                    "clock went backwards, ignoring"
                );
            }
            return false;
        }

        let skipped = now - self.last_tick_second - 1;
        if skipped > 0 {
            debug!(now, skipped, "life drain skipped seconds");
        }
        trace!(second = now, "life drain tick");
        self.last_tick_second = now;
        self.fired += 1;
        true
    }

    /// The whole second the clock last fired at.
    pub fn last_tick_second(&self) -> u64 {
        self.last_tick_second
    }

    /// How many times [`poll`](Self::poll) has returned `true`.
    pub fn fired(&self) -> u64 {
        self.fired
    }
}

impl std::fmt::Debug for LifeDrainClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeDrainClock")
            .field("last_tick_second", &self.last_tick_second)
            .field("fired", &self.fired)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_clock_is_after_epoch() {
        assert!(SystemClock.now() > Duration::ZERO);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::starting_at(Duration::from_secs(5));
        let other = clock.clone();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(other.now(), Duration::from_millis(6500));
    }
}
