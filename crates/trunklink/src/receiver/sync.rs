//! Sync acquisition tracking
//!
//! Each detected sync pattern is evidence that symbol timing is
//! good; each message length that passes without one is evidence
//! that it is not. [`SyncMonitor`] counts that evidence and maps
//! it to a [`SyncState`], which selects how aggressively the
//! timing loop may correct itself. An unsynchronized receiver
//! needs large corrections to acquire; a synchronized one needs
//! small corrections so noise cannot walk it off the signal.

use strum::EnumMessage;
use strum_macros::Display;

/// Timing loop gain while searching for sync
pub const TIMING_GAIN_COARSE: f32 = 0.33;

/// Timing loop gain after one sync detection
pub const TIMING_GAIN_MEDIUM: f32 = 0.11;

/// Timing loop gain while tracking a steady signal
pub const TIMING_GAIN_FINE: f32 = 0.05;

/// Confidence in the current symbol timing
#[derive(
    Clone,
    Copy,
    Debug,
    Display,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum_macros::EnumMessage,
)]
pub enum SyncState {
    /// No recent sync patterns seen
    #[strum(detailed_message = "searching for sync")]
    Coarse,

    /// One recent sync pattern seen
    #[strum(detailed_message = "sync candidate acquired")]
    Medium,

    /// Locked to a steady stream of sync patterns
    #[strum(detailed_message = "locked to sync")]
    Fine,
}

impl SyncState {
    /// Timing correction gain for this state
    pub fn timing_gain(&self) -> f32 {
        match self {
            SyncState::Coarse => TIMING_GAIN_COARSE,
            SyncState::Medium => TIMING_GAIN_MEDIUM,
            SyncState::Fine => TIMING_GAIN_FINE,
        }
    }

    /// Human-readable description
    ///
    /// Converts to a human-readable phrase, like
    /// "`searching for sync`."
    pub fn as_display_str(&self) -> &'static str {
        self.get_detailed_message().expect("missing definition")
    }
}

/// Counts sync detections and decays them over time
///
/// Holds a hit count clamped to `0..=3`. Detections raise it;
/// every `message_length` symbols without a detection lowers it.
#[derive(Clone, Debug)]
pub struct SyncMonitor {
    hits: u32,
    symbols_elapsed: u32,
    message_length: u32,
}

impl SyncMonitor {
    /// Create a monitor expecting a sync every `message_length`
    /// symbols
    pub fn new(message_length: u32) -> Self {
        Self {
            hits: 0,
            symbols_elapsed: 0,
            message_length,
        }
    }

    /// Current confidence state
    pub fn state(&self) -> SyncState {
        match self.hits {
            0 => SyncState::Coarse,
            1 => SyncState::Medium,
            _ => SyncState::Fine,
        }
    }

    /// Record a detected sync pattern
    pub fn sync_detected(&mut self) {
        self.symbols_elapsed = 0;
        self.hits = u32::min(self.hits + 1, 3);
    }

    /// Record one decoded symbol
    ///
    /// After a full message length passes without a sync, one
    /// hit decays away.
    pub fn increment(&mut self) {
        self.symbols_elapsed += 1;
        if self.symbols_elapsed > self.message_length {
            self.hits = self.hits.saturating_sub(1);
            self.symbols_elapsed = 0;
        }
    }

    /// Return to the unsynchronized state
    pub fn reset(&mut self) {
        self.hits = 0;
        self.symbols_elapsed = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_acquisition() {
        let mut monitor = SyncMonitor::new(120);
        assert_eq!(SyncState::Coarse, monitor.state());
        assert_approx_eq!(TIMING_GAIN_COARSE, monitor.state().timing_gain());

        monitor.sync_detected();
        assert_eq!(SyncState::Medium, monitor.state());
        assert_approx_eq!(TIMING_GAIN_MEDIUM, monitor.state().timing_gain());

        monitor.sync_detected();
        assert_eq!(SyncState::Fine, monitor.state());
        assert_approx_eq!(TIMING_GAIN_FINE, monitor.state().timing_gain());
    }

    #[test]
    fn test_hits_saturate() {
        let mut monitor = SyncMonitor::new(120);
        for _ in 0..10 {
            monitor.sync_detected();
        }
        assert_eq!(SyncState::Fine, monitor.state());

        // saturation means exactly three decays back to Coarse
        for _ in 0..3 {
            for _ in 0..121 {
                monitor.increment();
            }
        }
        assert_eq!(SyncState::Coarse, monitor.state());
    }

    #[test]
    fn test_decay() {
        let mut monitor = SyncMonitor::new(10);
        monitor.sync_detected();
        monitor.sync_detected();
        assert_eq!(SyncState::Fine, monitor.state());

        // ten symbols are not yet a miss
        for _ in 0..10 {
            monitor.increment();
        }
        assert_eq!(SyncState::Fine, monitor.state());

        // the eleventh completes a missed message
        monitor.increment();
        assert_eq!(SyncState::Medium, monitor.state());

        for _ in 0..11 {
            monitor.increment();
        }
        assert_eq!(SyncState::Coarse, monitor.state());

        // already at the floor
        for _ in 0..11 {
            monitor.increment();
        }
        assert_eq!(SyncState::Coarse, monitor.state());
    }

    #[test]
    fn test_detection_rearms_decay() {
        let mut monitor = SyncMonitor::new(10);
        monitor.sync_detected();
        for _ in 0..6 {
            monitor.increment();
        }
        monitor.sync_detected();
        assert_eq!(SyncState::Fine, monitor.state());

        // the elapsed count restarted at the second detection
        for _ in 0..10 {
            monitor.increment();
        }
        assert_eq!(SyncState::Fine, monitor.state());
    }

    #[test]
    fn test_reset() {
        let mut monitor = SyncMonitor::new(120);
        monitor.sync_detected();
        monitor.sync_detected();
        monitor.reset();
        assert_eq!(SyncState::Coarse, monitor.state());
    }

    #[test]
    fn test_state_display() {
        assert_eq!("Coarse", format!("{}", SyncState::Coarse));
        assert_eq!("Fine", SyncState::Fine.to_string());
    }

    #[test]
    fn test_state_description() {
        assert_eq!("searching for sync", SyncState::Coarse.as_display_str());
        assert_eq!("sync candidate acquired", SyncState::Medium.as_display_str());
        assert_eq!("locked to sync", SyncState::Fine.as_display_str());
    }
}
