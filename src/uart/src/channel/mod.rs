//! Interrupt-driven serial channel.
//!
//! A [`Channel`] owns the peripheral, the receive ring, the flow controller and the
//! transmit handshake. Two contexts touch it:
//!
//! - the interrupt handler, which calls [`Channel::on_interrupt`] and never blocks;
//! - one foreground consumer, which calls the `get`/`put` family.
//!
//! Ring and flow state sit behind a spin lock that the foreground only takes with the
//! channel's interrupt masked, so the handler can never spin on a lock held by the code
//! it preempted. On hosts the same lock gives real mutual exclusion between threads.
//!
//! # Example
//!
//! ```ignore
//! static CONSOLE: Channel<Uart16550, 128> = Channel::new(unsafe { Uart16550::new(COM1) });
//!
//! CONSOLE.init(ChannelConfig::new());
//! // in the serial interrupt vector:
//! CONSOLE.on_interrupt();
//! // in the foreground:
//! let byte = CONSOLE.get_char()?;
//! CONSOLE.put_char(byte)?;
//! ```

mod future;
mod port;
mod wait;

pub use future::{ReadFuture, WriteFuture};
pub use port::Port;

use crate::config::{ChannelConfig, FlowControl, OverflowPolicy};
use crate::flow::{FlowController, PauseSignal};
use crate::ring::RingBuffer;
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use futures_util::task::AtomicWaker;
use log::{debug, warn};
use spin::Mutex;
use uartflow_common::{ChannelStats, Events, SerialError};
use uartflow_hal::{SerialHardware, Timer, UartRegisters};

/// State shared between the interrupt handler and the foreground.
struct RxState<const N: usize> {
    ring: RingBuffer<N>,
    flow: FlowController<N>,
    overflow: OverflowPolicy,
    received: u32,
    consumed: u32,
    overruns: u32,
    /// Overruns already reported through the log.
    logged_overruns: u32,
    /// Set on overrun, cleared by [`Channel::take_overrun`].
    overrun_flag: bool,
    pauses: u32,
}

/// A byte handed to the foreground, plus any overruns not yet reported.
struct Consumed {
    byte: u8,
    lost: u32,
}

impl<const N: usize> RxState<N> {
    const fn new() -> Self {
        Self {
            ring: RingBuffer::new(),
            flow: FlowController::new(FlowControl::RtsCts),
            overflow: OverflowPolicy::DropNewest,
            received: 0,
            consumed: 0,
            overruns: 0,
            logged_overruns: 0,
            overrun_flag: false,
            pauses: 0,
        }
    }

    fn reset(&mut self, config: &ChannelConfig) {
        *self = Self::new();
        self.flow.reset(config.flow_control);
        self.overflow = config.overflow;
    }

    /// Interrupt side: store one byte and update the pause line.
    fn receive<R: UartRegisters>(&mut self, byte: u8, regs: &R) -> Events {
        let mut events = Events::empty();

        let stored = match self.overflow {
            OverflowPolicy::DropNewest => self.ring.push(byte).is_ok(),
            OverflowPolicy::OverwriteOldest => {
                if self.ring.push_overwrite(byte).is_some() {
                    self.overruns = self.overruns.wrapping_add(1);
                    self.overrun_flag = true;
                    events |= Events::OVERRUN;
                }
                true
            }
        };

        if stored {
            self.received = self.received.wrapping_add(1);
            events |= Events::RX_BYTE;
        } else {
            self.overruns = self.overruns.wrapping_add(1);
            self.overrun_flag = true;
            events |= Events::OVERRUN;
        }

        if let Some(PauseSignal::Asserted) = self.flow.on_receive(self.ring.remaining()) {
            regs.set_pause_signal(true);
            self.pauses = self.pauses.wrapping_add(1);
            events |= Events::PAUSED;
        }
        events
    }

    /// Foreground side: take one byte and update the pause line.
    fn consume<R: UartRegisters>(&mut self, regs: &R) -> Option<Consumed> {
        let byte = self.ring.pop()?;
        self.consumed = self.consumed.wrapping_add(1);

        if let Some(PauseSignal::Deasserted) = self.flow.on_consume(self.ring.remaining()) {
            regs.set_pause_signal(false);
        }

        let lost = self.overruns.wrapping_sub(self.logged_overruns);
        self.logged_overruns = self.overruns;
        Some(Consumed { byte, lost })
    }
}

/// One asynchronous serial channel with a receive ring of `N` bytes.
///
/// `N` must be a power of two between 4 and 256; other values fail to compile.
pub struct Channel<H, const N: usize> {
    hw: H,
    rx: Mutex<RxState<N>>,
    /// Transmitter may accept a byte.
    tx_ready: AtomicBool,
    initialized: AtomicBool,
    transmitted: AtomicU32,
    rx_waker: AtomicWaker,
    tx_waker: AtomicWaker,
}

impl<H, const N: usize> Channel<H, N> {
    /// Create a channel around `hw`. Nothing is touched until [`Channel::init`].
    pub const fn new(hw: H) -> Self {
        Self {
            hw,
            rx: Mutex::new(RxState::new()),
            tx_ready: AtomicBool::new(true),
            initialized: AtomicBool::new(false),
            transmitted: AtomicU32::new(0),
            rx_waker: AtomicWaker::new(),
            tx_waker: AtomicWaker::new(),
        }
    }

    /// The underlying peripheral.
    pub fn hardware(&self) -> &H {
        &self.hw
    }

    /// Receive ring capacity.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Returns `true` if the transmitter can take a byte right now.
    pub fn tx_ready(&self) -> bool {
        self.tx_ready.load(Ordering::Acquire)
    }

    /// Returns `true` once [`Channel::init`] has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn ensure_initialized(&self) -> Result<(), SerialError> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(SerialError::NotInitialized)
        }
    }
}

impl<H: SerialHardware, const N: usize> Channel<H, N> {
    /// Configure the peripheral and reset all channel state.
    ///
    /// Leaves the ring empty, the transmitter ready, the receiver and its interrupt
    /// enabled, and the pause line released so the peer may start sending.
    pub fn init(&self, config: ChannelConfig) {
        self.hw.without_interrupts(|| {
            self.hw.configure_rate(config.baud.bps());
            self.rx.lock().reset(&config);
            self.tx_ready.store(true, Ordering::Release);
            self.transmitted.store(0, Ordering::Relaxed);
            self.hw.enable_rx();
            self.hw.enable_rx_interrupt();
            self.hw.set_pause_signal(false);
            self.initialized.store(true, Ordering::Release);
        });
        debug!(
            "serial channel up: {}, {:?}, ring {} bytes",
            config.baud, config.flow_control, N
        );
    }

    /// Service the peripheral. Call from the serial interrupt vector.
    ///
    /// Handles a pending transmit-complete and a pending received byte in the same pass.
    /// Runs in bounded time and never logs.
    pub fn on_interrupt(&self) -> Events {
        let mut events = Events::empty();

        if self.hw.tx_complete() {
            self.hw.clear_tx_complete();
            self.tx_ready.store(true, Ordering::Release);
            self.tx_waker.wake();
            events |= Events::TX_COMPLETE;
        }

        if self.hw.rx_ready() {
            self.hw.clear_rx_ready();
            let byte = self.hw.read_rx();
            events |= self.rx.lock().receive(byte, &self.hw);
            self.rx_waker.wake();
        }

        events
    }

    /// Returns `true` if a received byte is waiting.
    pub fn char_avail(&self) -> bool {
        self.hw.without_interrupts(|| self.rx.lock().ring.available())
    }

    /// Take one received byte if there is one.
    pub fn try_get_char(&self) -> nb::Result<u8, SerialError> {
        self.ensure_initialized()?;
        let consumed = self.hw.without_interrupts(|| self.rx.lock().consume(&self.hw));

        match consumed {
            Some(Consumed { byte, lost }) => {
                if lost > 0 {
                    warn!("serial rx overrun: {} byte(s) lost", lost);
                }
                Ok(byte)
            }
            None => Err(nb::Error::WouldBlock),
        }
    }

    /// Wait for a received byte.
    pub fn get_char(&self) -> Result<u8, SerialError> {
        wait::block(|| self.try_get_char())
    }

    /// Wait at most `ticks` of `timer` for a received byte.
    pub fn get_char_timeout<T: Timer + ?Sized>(
        &self,
        timer: &T,
        ticks: u64,
    ) -> Result<u8, SerialError> {
        wait::block_timeout(timer, ticks, || self.try_get_char())
    }

    /// Hand `byte` to the transmitter if it is ready. Returns the byte written.
    ///
    /// Claiming the transmitter and loading the byte happen with the interrupt masked:
    /// a level-triggered transmit-complete must not be observed between the two.
    pub fn try_put_char(&self, byte: u8) -> nb::Result<u8, SerialError> {
        self.ensure_initialized()?;
        let claimed = self.hw.without_interrupts(|| {
            let claimed = self
                .tx_ready
                .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
                .is_ok();
            if claimed {
                self.hw.write_tx(byte);
            }
            claimed
        });
        if !claimed {
            return Err(nb::Error::WouldBlock);
        }
        self.transmitted.fetch_add(1, Ordering::Relaxed);
        Ok(byte)
    }

    /// Wait for the transmitter, then send `byte`. Returns the byte written.
    pub fn put_char(&self, byte: u8) -> Result<u8, SerialError> {
        wait::block(|| self.try_put_char(byte))
    }

    /// Wait at most `ticks` of `timer` for the transmitter, then send `byte`.
    pub fn put_char_timeout<T: Timer + ?Sized>(
        &self,
        timer: &T,
        byte: u8,
        ticks: u64,
    ) -> Result<u8, SerialError> {
        wait::block_timeout(timer, ticks, || self.try_put_char(byte))
    }

    /// Send every byte of `bytes` in order.
    pub fn write_bytes(&self, bytes: &[u8]) -> Result<(), SerialError> {
        for &byte in bytes {
            self.put_char(byte)?;
        }
        Ok(())
    }

    /// Future resolving to the next received byte.
    pub fn read(&self) -> ReadFuture<'_, H, N> {
        ReadFuture::new(self)
    }

    /// Future resolving once `byte` has been handed to the transmitter.
    pub fn write(&self, byte: u8) -> WriteFuture<'_, H, N> {
        WriteFuture::new(self, byte)
    }

    /// Borrow the channel as a [`Port`] for `core::fmt::Write` and HAL `Serial` use.
    pub fn port(&self) -> Port<'_, H, N> {
        Port::new(self)
    }

    /// Returns `Err(SerialError::Overrun)` once for every run of lost bytes.
    pub fn take_overrun(&self) -> Result<(), SerialError> {
        let flagged = self.hw.without_interrupts(|| {
            let mut rx = self.rx.lock();
            core::mem::replace(&mut rx.overrun_flag, false)
        });
        if flagged {
            Err(SerialError::Overrun)
        } else {
            Ok(())
        }
    }

    /// Returns `true` while the peer is being asked to pause.
    pub fn pause_asserted(&self) -> bool {
        self.hw.without_interrupts(|| self.rx.lock().flow.signal().is_asserted())
    }

    /// Free slots in the receive ring.
    pub fn remaining(&self) -> usize {
        self.hw.without_interrupts(|| self.rx.lock().ring.remaining())
    }

    /// Bytes lost to a full ring since `init`.
    pub fn overruns(&self) -> u32 {
        self.hw.without_interrupts(|| self.rx.lock().overruns)
    }

    /// Samples the peer's pause input.
    ///
    /// Transmission does not consult it; callers that honor the peer's handshake
    /// check it themselves.
    pub fn peer_paused(&self) -> bool {
        self.hw.peer_paused()
    }

    /// Snapshot of the channel's counters.
    pub fn stats(&self) -> ChannelStats {
        let mut stats = self.hw.without_interrupts(|| {
            let rx = self.rx.lock();
            ChannelStats {
                received: rx.received,
                consumed: rx.consumed,
                overruns: rx.overruns,
                pauses: rx.pauses,
                ..ChannelStats::default()
            }
        });
        stats.transmitted = self.transmitted.load(Ordering::Relaxed);
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BaudRate;
    use crate::testutil::SimUart;

    fn channel<const N: usize>(config: ChannelConfig) -> Channel<SimUart, N> {
        let channel = Channel::new(SimUart::new());
        channel.init(config);
        channel
    }

    #[test]
    fn test_init_programs_hardware() {
        let channel: Channel<SimUart, 16> = Channel::new(SimUart::new());
        assert!(!channel.is_initialized());

        channel.init(ChannelConfig::new().with_baud(BaudRate::B28800));
        let hw = channel.hardware();
        assert_eq!(hw.rate(), 28_800);
        assert!(hw.rx_enabled());
        assert!(hw.interrupt_enabled());
        assert!(!hw.pause_asserted());
        assert!(channel.tx_ready());
        assert!(!channel.char_avail());
    }

    #[test]
    fn test_init_releases_pause_without_handshake() {
        let channel: Channel<SimUart, 16> = Channel::new(SimUart::new());
        channel.hardware().set_pause_signal(true);

        channel.init(ChannelConfig::new().with_flow_control(FlowControl::None));
        assert!(!channel.hardware().pause_asserted());
        assert_eq!(channel.hardware().pause_transitions(), 2);

        for b in 0..16u8 {
            channel.hardware().inject_rx(b);
            channel.on_interrupt();
        }
        assert!(!channel.hardware().pause_asserted());
        assert_eq!(channel.hardware().pause_transitions(), 2);
    }

    #[test]
    fn test_use_before_init_is_rejected() {
        let channel: Channel<SimUart, 16> = Channel::new(SimUart::new());
        assert_eq!(
            channel.try_get_char(),
            Err(nb::Error::Other(SerialError::NotInitialized))
        );
        assert_eq!(channel.put_char(b'x'), Err(SerialError::NotInitialized));
    }

    #[test]
    fn test_interrupt_reports_both_events() {
        let channel = channel::<16>(ChannelConfig::new());
        channel.put_char(b'a').unwrap();
        assert!(!channel.tx_ready());

        channel.hardware().inject_rx(b'z');
        channel.hardware().complete_tx();
        let events = channel.on_interrupt();

        assert_eq!(events, Events::TX_COMPLETE | Events::RX_BYTE);
        assert!(channel.tx_ready());
        assert_eq!(channel.try_get_char(), Ok(b'z'));
    }

    #[test]
    fn test_spurious_interrupt_does_nothing() {
        let channel = channel::<16>(ChannelConfig::new());
        assert_eq!(channel.on_interrupt(), Events::empty());
        assert_eq!(channel.remaining(), 16);
    }

    #[test]
    fn test_drop_newest_counts_overrun() {
        let channel = channel::<4>(ChannelConfig::new());
        for b in 0..5u8 {
            channel.hardware().inject_rx(b);
            channel.on_interrupt();
        }
        assert_eq!(channel.overruns(), 1);
        assert_eq!(channel.take_overrun(), Err(SerialError::Overrun));
        assert_eq!(channel.take_overrun(), Ok(()));

        for b in 0..4u8 {
            assert_eq!(channel.try_get_char(), Ok(b));
        }
        assert_eq!(channel.try_get_char(), Err(nb::Error::WouldBlock));
    }

    #[test]
    fn test_overwrite_oldest_keeps_newest() {
        let channel = channel::<4>(
            ChannelConfig::new().with_overflow(OverflowPolicy::OverwriteOldest),
        );
        for b in 0..6u8 {
            channel.hardware().inject_rx(b);
            channel.on_interrupt();
        }
        assert_eq!(channel.overruns(), 2);
        assert_eq!(channel.remaining(), 0);
        for b in 2..6u8 {
            assert_eq!(channel.try_get_char(), Ok(b));
        }
    }

    #[test]
    fn test_reinit_clears_state() {
        let channel = channel::<8>(ChannelConfig::new());
        channel.hardware().inject_rx(1);
        channel.on_interrupt();
        channel.put_char(2).unwrap();

        channel.init(ChannelConfig::new());
        assert!(!channel.char_avail());
        assert!(channel.tx_ready());
        assert_eq!(channel.stats(), ChannelStats::default());
    }

    #[test]
    fn test_stats() {
        let channel = channel::<8>(ChannelConfig::new());
        for b in 0..7u8 {
            channel.hardware().inject_rx(b);
            channel.on_interrupt();
        }
        channel.try_get_char().unwrap();
        channel.put_char(b'!').unwrap();

        let stats = channel.stats();
        assert_eq!(stats.received, 7);
        assert_eq!(stats.consumed, 1);
        assert_eq!(stats.transmitted, 1);
        assert_eq!(stats.pauses, 1);
        assert_eq!(stats.overruns, 0);
    }
}
