//! Test infrastructure for uartflow.
//!
//! Provides a simulated peripheral and a tick source so the channel logic can be
//! exercised on a host, with ordinary threads standing in for the interrupt context.
//!
//! # Usage
//!
//! ```rust,ignore
//! use uartflow::testutil::{deliver, SimUart};
//!
//! let channel: Channel<SimUart, 16> = Channel::new(SimUart::new());
//! channel.init(ChannelConfig::new());
//! deliver(&channel, b"hello");
//! assert_eq!(channel.get_char(), Ok(b'h'));
//! ```

use crate::channel::Channel;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, AtomicU8, Ordering};
use crossbeam_queue::ArrayQueue;
use uartflow_common::Events;
use uartflow_hal::{InterruptMask, Timer, UartRegisters};

/// Transmitted bytes retained by [`SimUart`].
const TX_LOG_CAPACITY: usize = 1024;

/// Simulated serial peripheral.
///
/// Models a one-byte receive register with a ready flag, a transmit register whose
/// completion flag is raised by [`SimUart::complete_tx`], and the pause/peer lines.
pub struct SimUart {
    rx_data: AtomicU8,
    rx_pending: AtomicBool,
    tx_pending: AtomicBool,
    tx_log: ArrayQueue<u8>,
    auto_complete: bool,
    pause: AtomicBool,
    pause_transitions: AtomicU32,
    peer_paused: AtomicBool,
    rate: AtomicU32,
    rx_enabled: AtomicBool,
    interrupt_enabled: AtomicBool,
}

impl Default for SimUart {
    fn default() -> Self {
        Self::new()
    }
}

impl SimUart {
    /// Create an idle peripheral.
    pub fn new() -> Self {
        Self {
            rx_data: AtomicU8::new(0),
            rx_pending: AtomicBool::new(false),
            tx_pending: AtomicBool::new(false),
            tx_log: ArrayQueue::new(TX_LOG_CAPACITY),
            auto_complete: false,
            pause: AtomicBool::new(false),
            pause_transitions: AtomicU32::new(0),
            peer_paused: AtomicBool::new(false),
            rate: AtomicU32::new(0),
            rx_enabled: AtomicBool::new(false),
            interrupt_enabled: AtomicBool::new(false),
        }
    }

    /// Create a peripheral whose transmitter finishes instantly.
    ///
    /// Every write raises transmit-complete; the channel still has to service the
    /// interrupt before it accepts the next byte.
    pub fn with_auto_complete() -> Self {
        Self {
            auto_complete: true,
            ..Self::new()
        }
    }

    /// Latch `byte` in the receive register and raise receive-ready.
    pub fn inject_rx(&self, byte: u8) {
        self.rx_data.store(byte, Ordering::Relaxed);
        self.rx_pending.store(true, Ordering::Release);
    }

    /// Raise transmit-complete.
    pub fn complete_tx(&self) {
        self.tx_pending.store(true, Ordering::Release);
    }

    /// Returns `true` while either interrupt condition is raised.
    pub fn interrupt_pending(&self) -> bool {
        self.rx_pending.load(Ordering::Acquire) || self.tx_pending.load(Ordering::Acquire)
    }

    /// Drain transmitted bytes (for testing/inspection).
    pub fn drain_tx(&self) -> Vec<u8> {
        core::iter::from_fn(|| self.tx_log.pop()).collect()
    }

    /// Current level of the pause output.
    pub fn pause_asserted(&self) -> bool {
        self.pause.load(Ordering::Acquire)
    }

    /// How many times the pause output changed level.
    pub fn pause_transitions(&self) -> u32 {
        self.pause_transitions.load(Ordering::Relaxed)
    }

    /// Drive the peer's pause input.
    pub fn set_peer_paused(&self, paused: bool) {
        self.peer_paused.store(paused, Ordering::Release);
    }

    /// Last programmed line rate.
    pub fn rate(&self) -> u32 {
        self.rate.load(Ordering::Relaxed)
    }

    /// Returns `true` once the receiver was enabled.
    pub fn rx_enabled(&self) -> bool {
        self.rx_enabled.load(Ordering::Relaxed)
    }

    /// Returns `true` once the interrupt source was unmasked.
    pub fn interrupt_enabled(&self) -> bool {
        self.interrupt_enabled.load(Ordering::Relaxed)
    }
}

impl UartRegisters for SimUart {
    fn configure_rate(&self, bps: u32) {
        self.rate.store(bps, Ordering::Relaxed);
    }

    fn read_rx(&self) -> u8 {
        self.rx_data.load(Ordering::Relaxed)
    }

    fn write_tx(&self, byte: u8) {
        // The log only bounds memory; a full log drops the byte silently.
        let _ = self.tx_log.push(byte);
        if self.auto_complete {
            self.complete_tx();
        }
    }

    fn rx_ready(&self) -> bool {
        self.rx_pending.load(Ordering::Acquire)
    }

    fn clear_rx_ready(&self) {
        self.rx_pending.store(false, Ordering::Release);
    }

    fn tx_complete(&self) -> bool {
        self.tx_pending.load(Ordering::Acquire)
    }

    fn clear_tx_complete(&self) {
        self.tx_pending.store(false, Ordering::Release);
    }

    fn enable_rx(&self) {
        self.rx_enabled.store(true, Ordering::Relaxed);
    }

    fn enable_rx_interrupt(&self) {
        self.interrupt_enabled.store(true, Ordering::Relaxed);
    }

    fn set_pause_signal(&self, paused: bool) {
        if self.pause.swap(paused, Ordering::AcqRel) != paused {
            self.pause_transitions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn peer_paused(&self) -> bool {
        self.peer_paused.load(Ordering::Acquire)
    }
}

impl InterruptMask for SimUart {
    // Host threads are not interrupts; the channel's lock already excludes them.
    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R {
        f()
    }
}

/// Feed `bytes` through the receive interrupt path one at a time.
///
/// Returns the union of the events raised.
pub fn deliver<const N: usize>(channel: &Channel<SimUart, N>, bytes: &[u8]) -> Events {
    let mut events = Events::empty();
    for &byte in bytes {
        channel.hardware().inject_rx(byte);
        events |= channel.on_interrupt();
    }
    events
}

/// Tick source advanced by hand, or automatically on every read.
pub struct ManualTimer {
    ticks: AtomicU64,
    step: u64,
}

impl Default for ManualTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualTimer {
    /// A timer that only moves through [`ManualTimer::advance`].
    pub const fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            step: 0,
        }
    }

    /// A timer that moves forward by `step` every time it is read.
    pub const fn auto_advance(step: u64) -> Self {
        Self {
            ticks: AtomicU64::new(0),
            step,
        }
    }

    /// Move the timer forward.
    pub fn advance(&self, ticks: u64) {
        self.ticks.fetch_add(ticks, Ordering::Relaxed);
    }
}

impl Timer for ManualTimer {
    fn current_ticks(&self) -> u64 {
        self.ticks.fetch_add(self.step, Ordering::Relaxed)
    }
}
