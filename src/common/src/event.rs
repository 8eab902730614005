//! Interrupt outcomes and channel counters.

use bitflags::bitflags;

bitflags! {
    /// What a single pass of the serial interrupt handler did.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Events: u8 {
        const TX_COMPLETE = 1 << 0; // Transmitter ready for the next byte
        const RX_BYTE     = 1 << 1; // One byte moved into the receive ring
        const PAUSED      = 1 << 2; // Pause signal asserted towards the peer
        const OVERRUN     = 1 << 3; // Ring was full, a byte was discarded
    }
}

/// Snapshot of a channel's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChannelStats {
    /// Bytes stored into the receive ring.
    pub received: u32,
    /// Bytes handed to the foreground.
    pub consumed: u32,
    /// Bytes handed to the transmitter.
    pub transmitted: u32,
    /// Bytes lost to a full receive ring.
    pub overruns: u32,
    /// Times the pause signal was asserted.
    pub pauses: u32,
}
