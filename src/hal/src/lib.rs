//! uartflow Hardware Abstraction Layer (HAL) traits.
//!
//! This crate defines the narrow register surface the serial channel core talks to,
//! so the buffer and flow-control logic never touches a peripheral directly.

#![no_std]

/// Trait for a serial port or similar character-based communication channel.
pub trait Serial {
    /// Writes a single byte to the serial port.
    fn write_byte(&mut self, byte: u8);
    /// Reads a single byte from the serial port, if available.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Register-level view of one asynchronous serial peripheral.
///
/// All methods take `&self`: registers are shared between the interrupt handler and
/// foreground code, and implementations provide their own interior mutability
/// (port I/O, volatile MMIO, or atomics in a simulation).
pub trait UartRegisters {
    /// Programs the line rate in bits per second.
    ///
    /// Only rates accepted by the caller's configuration layer reach this method.
    fn configure_rate(&self, bps: u32);

    /// Reads the byte latched in the receive register.
    fn read_rx(&self) -> u8;
    /// Hands one byte to the transmitter.
    fn write_tx(&self, byte: u8);

    /// Returns `true` while a received byte is waiting.
    fn rx_ready(&self) -> bool;
    /// Acknowledges the receive-ready condition.
    fn clear_rx_ready(&self);

    /// Returns `true` once the transmitter has finished with the last byte.
    fn tx_complete(&self) -> bool;
    /// Acknowledges the transmit-complete condition.
    fn clear_tx_complete(&self);

    /// Enables the receiver.
    fn enable_rx(&self);
    /// Unmasks the peripheral's interrupt source.
    fn enable_rx_interrupt(&self);

    /// Drives the pause (RTS-equivalent) output. `true` asks the peer to stop sending.
    fn set_pause_signal(&self, paused: bool);

    /// Samples the peer's pause (CTS-equivalent) input. `true` means the peer asked us to stop.
    fn peer_paused(&self) -> bool {
        false
    }
}

/// Trait for masking the interrupt that services a serial channel.
pub trait InterruptMask {
    /// Runs `f` with the channel's interrupt masked, restoring the previous state afterwards.
    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R;
}

/// Trait for a system timer.
pub trait Timer {
    /// Returns the number of ticks since the system started.
    fn current_ticks(&self) -> u64;
}

/// Everything the channel core needs from a peripheral.
pub trait SerialHardware: UartRegisters + InterruptMask {}

impl<T: UartRegisters + InterruptMask> SerialHardware for T {}
