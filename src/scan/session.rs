//! Per-worker scan session state

use std::time::{Duration, Instant};

use log::info;

use super::{MIN_SCAN_INTERVAL, STATS_LOG_EVERY};

/// Lifecycle state of a scan worker.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SessionState {
    /// No init received yet, or destroyed; scans are rejected
    #[default]
    Uninitialized,
    /// Armed; scans are admitted subject to the throttle
    Ready,
}

/// Outcome of offering a scan to the session.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    /// Run the scan now
    Accepted,
    /// Arrived inside the throttle window; drop silently
    Throttled,
    /// Session not armed; answer with an error
    NotReady,
}

/// Lifecycle, throttle clock and rolling performance counter for one worker.
///
/// Kept apart from the worker loop so the admission and accounting rules are
/// testable with simulated clocks.
#[derive(Clone, Debug, Default)]
pub struct ScanSession {
    state: SessionState,
    scans: u64,
    total: Duration,
    last_accepted: Option<Instant>,
}

impl ScanSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self.state, SessionState::Ready)
    }

    /// Scans recorded since the last reset.
    #[must_use]
    pub const fn scan_count(&self) -> u64 {
        self.scans
    }

    /// Arm the session. Counters and the throttle reference start fresh, so
    /// a second init works as a full reset.
    pub fn init(&mut self) {
        self.state = SessionState::Ready;
        self.reset_counters();
    }

    /// Disarm the session and clear all counters. Harmless when already
    /// disarmed.
    pub fn destroy(&mut self) {
        self.state = SessionState::Uninitialized;
        self.reset_counters();
    }

    fn reset_counters(&mut self) {
        self.scans = 0;
        self.total = Duration::ZERO;
        self.last_accepted = None;
    }

    /// Decide whether a scan arriving at `now` may run.
    ///
    /// Acceptance pins `now` as the new throttle reference, so the interval
    /// is measured between scan starts. Throttled arrivals leave the
    /// reference untouched; a burst after one accepted scan stays dropped
    /// until the full interval has passed.
    pub fn admit(&mut self, now: Instant) -> Admission {
        if !self.is_ready() {
            return Admission::NotReady;
        }

        if let Some(last) = self.last_accepted {
            if now.duration_since(last) < MIN_SCAN_INTERVAL {
                return Admission::Throttled;
            }
        }

        self.last_accepted = Some(now);
        Admission::Accepted
    }

    /// Fold one finished scan into the rolling counter. Every
    /// [`STATS_LOG_EVERY`] scans the running average lands in the log.
    pub fn record_scan(&mut self, elapsed: Duration) {
        self.scans += 1;
        self.total += elapsed;

        if self.scans % STATS_LOG_EVERY == 0 {
            let average_ms = self.total.as_secs_f64() * 1000.0 / self.scans as f64;
            info!("processed {} scans, average {average_ms:.1}ms", self.scans);
        }
    }

    /// Mean processing time since the last reset.
    #[must_use]
    pub fn average_scan_time(&self) -> Option<Duration> {
        if self.scans == 0 {
            return None;
        }
        Some(Duration::from_secs_f64(
            self.total.as_secs_f64() / self.scans as f64,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready_session() -> ScanSession {
        let mut session = ScanSession::new();
        session.init();
        session
    }

    #[test]
    fn starts_uninitialized_and_rejects_scans() {
        let mut session = ScanSession::new();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.admit(Instant::now()), Admission::NotReady);
    }

    #[test]
    fn init_arms_the_session() {
        let mut session = ready_session();
        assert_eq!(session.state(), SessionState::Ready);
        assert_eq!(session.admit(Instant::now()), Admission::Accepted);
    }

    #[test]
    fn destroy_disarms_and_clears_counters() {
        let mut session = ready_session();
        let t0 = Instant::now();
        assert_eq!(session.admit(t0), Admission::Accepted);
        session.record_scan(Duration::from_millis(8));

        session.destroy();
        assert_eq!(session.state(), SessionState::Uninitialized);
        assert_eq!(session.scan_count(), 0);
        assert_eq!(session.average_scan_time(), None);
        assert_eq!(session.admit(t0 + MIN_SCAN_INTERVAL), Admission::NotReady);
    }

    #[test]
    fn destroy_before_init_is_harmless() {
        let mut session = ScanSession::new();
        session.destroy();
        assert_eq!(session.state(), SessionState::Uninitialized);
    }

    #[test]
    fn scans_inside_the_interval_are_throttled() {
        let mut session = ready_session();
        let t0 = Instant::now();

        assert_eq!(session.admit(t0), Admission::Accepted);
        assert_eq!(
            session.admit(t0 + Duration::from_millis(99)),
            Admission::Throttled
        );
        assert_eq!(
            session.admit(t0 + Duration::from_millis(100)),
            Admission::Accepted
        );
    }

    #[test]
    fn throttle_measures_from_the_accepted_start() {
        let mut session = ready_session();
        let t0 = Instant::now();

        assert_eq!(session.admit(t0), Admission::Accepted);
        // dropped arrivals must not push the reference forward
        assert_eq!(
            session.admit(t0 + Duration::from_millis(50)),
            Admission::Throttled
        );
        assert_eq!(
            session.admit(t0 + Duration::from_millis(90)),
            Admission::Throttled
        );
        assert_eq!(
            session.admit(t0 + Duration::from_millis(120)),
            Admission::Accepted
        );
        // and the reference now sits at 120, not at 90
        assert_eq!(
            session.admit(t0 + Duration::from_millis(219)),
            Admission::Throttled
        );
        assert_eq!(
            session.admit(t0 + Duration::from_millis(220)),
            Admission::Accepted
        );
    }

    #[test]
    fn reinit_clears_the_throttle_reference() {
        let mut session = ready_session();
        let t0 = Instant::now();
        assert_eq!(session.admit(t0), Admission::Accepted);

        session.init();
        assert_eq!(
            session.admit(t0 + Duration::from_millis(1)),
            Admission::Accepted
        );
    }

    #[test]
    fn average_tracks_recorded_scans() {
        let mut session = ready_session();
        assert_eq!(session.average_scan_time(), None);

        session.record_scan(Duration::from_millis(10));
        session.record_scan(Duration::from_millis(30));
        assert_eq!(session.scan_count(), 2);
        assert_eq!(session.average_scan_time(), Some(Duration::from_millis(20)));
    }
}
