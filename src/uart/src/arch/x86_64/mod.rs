//! x86_64 architecture support.
//!
//! Provides the two standard PC serial channels on top of a 16550-compatible UART.
//! Interrupt vector wiring and end-of-interrupt signalling belong to the platform; the
//! vector for IRQ 4 should call [`on_com1_interrupt`] and the one for IRQ 3
//! [`on_com2_interrupt`].

pub mod uart16550;

pub use uart16550::Uart16550;

use crate::channel::Channel;
use crate::config::{ChannelConfig, FlowControl};
use uartflow_common::Events;

/// COM1 I/O port address.
pub const COM1_PORT: u16 = 0x3F8;

/// COM2 I/O port address.
pub const COM2_PORT: u16 = 0x2F8;

/// Receive ring size for both channels.
pub const RING_SIZE: usize = 128;

/// Console channel on COM1, with RTS/CTS handshaking.
// SAFETY: COM1_PORT (0x3F8) is a well-known x86 serial port address.
pub static CONSOLE: Channel<Uart16550, RING_SIZE> =
    Channel::new(unsafe { Uart16550::new(COM1_PORT) });

/// Auxiliary channel on COM2, without handshaking.
// SAFETY: COM2_PORT (0x2F8) is a well-known x86 serial port address.
pub static AUX: Channel<Uart16550, RING_SIZE> =
    Channel::new(unsafe { Uart16550::new(COM2_PORT) });

/// Initializes both serial channels.
pub fn init(console: ChannelConfig, aux: ChannelConfig) {
    CONSOLE.init(console);
    AUX.init(aux.with_flow_control(FlowControl::None));
}

/// Services COM1. Call from the IRQ 4 handler.
pub fn on_com1_interrupt() -> Events {
    CONSOLE.on_interrupt()
}

/// Services COM2. Call from the IRQ 3 handler.
pub fn on_com2_interrupt() -> Events {
    AUX.on_interrupt()
}
