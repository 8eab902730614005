//! Hysteresis flow control for the receive ring.
//!
//! The pause line is asserted once free space drops below a quarter of the ring and
//! released only after it climbs back above half. The gap between the two levels keeps
//! the line from toggling on every byte while occupancy hovers near one boundary.

use crate::config::FlowControl;

/// State of the pause (RTS-equivalent) output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseSignal {
    /// The peer may send.
    Deasserted,
    /// The peer has been asked to stop.
    Asserted,
}

impl PauseSignal {
    /// Returns `true` for [`PauseSignal::Asserted`].
    pub fn is_asserted(self) -> bool {
        self == PauseSignal::Asserted
    }
}

/// Decides when the pause signal changes, given the ring's free space.
#[derive(Debug)]
pub struct FlowController<const N: usize> {
    mode: FlowControl,
    signal: PauseSignal,
}

impl<const N: usize> FlowController<N> {
    /// Free space below which the peer is paused.
    pub const PAUSE_THRESHOLD: usize = N / 4;
    /// Free space above which the peer is resumed.
    pub const RESUME_THRESHOLD: usize = N / 2;

    /// Create a controller in the deasserted state.
    pub const fn new(mode: FlowControl) -> Self {
        Self {
            mode,
            signal: PauseSignal::Deasserted,
        }
    }

    /// Called after a byte was stored. Returns the new signal on a transition.
    pub fn on_receive(&mut self, remaining: usize) -> Option<PauseSignal> {
        if self.mode == FlowControl::None || self.signal.is_asserted() {
            return None;
        }
        if remaining < Self::PAUSE_THRESHOLD {
            self.signal = PauseSignal::Asserted;
            return Some(self.signal);
        }
        None
    }

    /// Called after a byte was consumed. Returns the new signal on a transition.
    pub fn on_consume(&mut self, remaining: usize) -> Option<PauseSignal> {
        if !self.signal.is_asserted() {
            return None;
        }
        if remaining > Self::RESUME_THRESHOLD {
            self.signal = PauseSignal::Deasserted;
            return Some(self.signal);
        }
        None
    }

    /// Current signal state.
    pub fn signal(&self) -> PauseSignal {
        self.signal
    }

    /// Configured mode.
    pub fn mode(&self) -> FlowControl {
        self.mode
    }

    /// Return to the deasserted state under `mode`.
    pub fn reset(&mut self, mode: FlowControl) {
        self.mode = mode;
        self.signal = PauseSignal::Deasserted;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thresholds() {
        assert_eq!(FlowController::<128>::PAUSE_THRESHOLD, 32);
        assert_eq!(FlowController::<128>::RESUME_THRESHOLD, 64);
        assert_eq!(FlowController::<4>::PAUSE_THRESHOLD, 1);
        assert_eq!(FlowController::<4>::RESUME_THRESHOLD, 2);
    }

    #[test]
    fn test_asserts_strictly_below_pause_level() {
        let mut flow = FlowController::<128>::new(FlowControl::RtsCts);
        assert_eq!(flow.on_receive(32), None);
        assert_eq!(flow.on_receive(31), Some(PauseSignal::Asserted));
        // Already asserted: no second transition.
        assert_eq!(flow.on_receive(30), None);
    }

    #[test]
    fn test_hysteresis_band() {
        let mut flow = FlowController::<128>::new(FlowControl::RtsCts);
        flow.on_receive(31);

        for remaining in 32..=64 {
            assert_eq!(flow.on_consume(remaining), None);
            assert!(flow.signal().is_asserted());
        }
        assert_eq!(flow.on_consume(65), Some(PauseSignal::Deasserted));
        assert_eq!(flow.on_consume(66), None);
    }

    #[test]
    fn test_disabled_never_asserts() {
        let mut flow = FlowController::<16>::new(FlowControl::None);
        assert_eq!(flow.on_receive(0), None);
        assert_eq!(flow.signal(), PauseSignal::Deasserted);
    }

    #[test]
    fn test_reset_deasserts() {
        let mut flow = FlowController::<16>::new(FlowControl::RtsCts);
        flow.on_receive(0);
        flow.reset(FlowControl::None);
        assert_eq!(flow.signal(), PauseSignal::Deasserted);
        assert_eq!(flow.mode(), FlowControl::None);
    }
}
