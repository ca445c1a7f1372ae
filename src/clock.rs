//! Wall-clock source used for presence timestamps.

use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;
}

/// Clock backed by [`SystemTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64)
            .unwrap_or_default()
    }
}

#[cfg(test)]
pub(crate) mod test_clock {
    use std::sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    };

    use super::Clock;

    /// Clock that only moves when told to.
    #[derive(Clone, Default)]
    pub(crate) struct ManualClock {
        now: Arc<AtomicU64>,
    }

    impl ManualClock {
        pub(crate) fn at(millis: u64) -> Self {
            let clock = Self::default();
            clock.set(millis);
            clock
        }

        pub(crate) fn set(&self, millis: u64) {
            self.now.store(millis, Ordering::SeqCst);
        }
    }

    impl Clock for ManualClock {
        fn now_millis(&self) -> u64 {
            self.now.load(Ordering::SeqCst)
        }
    }
}
