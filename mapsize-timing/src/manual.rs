use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::timer::{FrameStats, Timer};

/// Clock that only moves when told to. Clones share the same clock, so a test can keep
/// a handle and advance time underneath a state machine that owns another clone.
#[derive(Debug, Clone, Default)]
pub struct ManualTimer {
    now_ns: Arc<AtomicU64>,
    frame_times: Vec<Duration>,
}

impl ManualTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, d: Duration) {
        let delta = u64::try_from(d.as_nanos()).unwrap_or(u64::MAX);
        let _ = self
            .now_ns
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |now| {
                Some(now.saturating_add(delta))
            });
    }

    pub fn set(&self, now_ns: u64) {
        self.now_ns.store(now_ns, Ordering::SeqCst);
    }
}

impl Timer for ManualTimer {
    type Timestamp = u64;

    fn now(&self) -> u64 {
        self.now_ns.load(Ordering::SeqCst)
    }

    fn elapsed(&self, ts: u64) -> Duration {
        Duration::from_nanos(self.now().saturating_sub(ts))
    }

    fn record_frame(&mut self, d: Duration) {
        self.frame_times.push(d);
    }

    fn frame_stats(&self) -> FrameStats {
        FrameStats::from_durations(&self.frame_times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_clock() {
        let clock = ManualTimer::new();
        let owned = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(owned.now(), 250_000_000);
        assert_eq!(owned.elapsed(50_000_000), Duration::from_millis(200));
    }

    #[test]
    fn advance_saturates_at_the_end_of_time() {
        let clock = ManualTimer::new();
        clock.set(u64::MAX - 1);
        clock.advance(Duration::from_secs(u64::MAX));
        assert_eq!(clock.now(), u64::MAX);
    }

    #[test]
    fn set_jumps_to_absolute_time() {
        let clock = ManualTimer::new();
        clock.set(42);
        assert_eq!(clock.now(), 42);
    }
}
