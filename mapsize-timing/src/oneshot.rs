use std::time::Duration;

/// Single-slot deadline. Re-arming replaces the pending deadline, so at most one is
/// ever outstanding, and a deadline fires at most once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OneShot {
    due_ns: Option<u64>,
}

impl OneShot {
    pub fn arm(&mut self, now_ns: u64, delay: Duration) {
        let delay_ns = u64::try_from(delay.as_nanos()).unwrap_or(u64::MAX);
        self.due_ns = Some(now_ns.saturating_add(delay_ns));
    }

    /// Returns true exactly once, on the first poll at or after the deadline.
    pub fn poll(&mut self, now_ns: u64) -> bool {
        match self.due_ns {
            Some(due) if now_ns >= due => {
                self.due_ns = None;
                true
            }
            _ => false,
        }
    }

    pub fn cancel(&mut self) {
        self.due_ns = None;
    }

    pub fn is_armed(&self) -> bool {
        self.due_ns.is_some()
    }

    pub fn due_ns(&self) -> Option<u64> {
        self.due_ns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_at_deadline() {
        let mut shot = OneShot::default();
        shot.arm(1_000, Duration::from_nanos(500));
        assert!(!shot.poll(1_499));
        assert!(shot.poll(1_500));
        assert!(!shot.poll(2_000));
        assert!(!shot.is_armed());
    }

    #[test]
    fn rearm_replaces_pending_deadline() {
        let mut shot = OneShot::default();
        shot.arm(0, Duration::from_millis(300));
        shot.arm(0, Duration::from_millis(100));
        assert_eq!(shot.due_ns(), Some(100_000_000));
        assert!(shot.poll(100_000_000));
    }

    #[test]
    fn huge_delay_saturates_instead_of_wrapping() {
        let mut shot = OneShot::default();
        shot.arm(5, Duration::from_secs(u64::MAX));
        assert_eq!(shot.due_ns(), Some(u64::MAX));
        assert!(!shot.poll(1_000_000_000));

        // 2^64 + 1 ns would truncate to 1 ns.
        shot.arm(0, Duration::from_nanos(u64::MAX) + Duration::from_nanos(2));
        assert!(!shot.poll(10));
        assert_eq!(shot.due_ns(), Some(u64::MAX));
    }

    #[test]
    fn cancelled_deadline_never_fires() {
        let mut shot = OneShot::default();
        shot.arm(0, Duration::ZERO);
        shot.cancel();
        assert!(!shot.poll(u64::MAX));
    }
}
