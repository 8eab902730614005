//! uartflow
//!
//! Interrupt-driven serial channels with hysteresis RTS flow control.
//!
//! # Architecture
//!
//! The crate is structured into the following modules:
//! - `ring`: fixed-capacity receive ring filled from interrupt context
//! - `flow`: pause/resume decisions driven by ring occupancy
//! - `channel`: the shared channel object, its interrupt entry point and foreground API
//! - `config`: line rate, handshaking and overflow settings
//! - `arch`: peripheral backends (16550 on x86_64)
//! - `testutil`: simulated peripheral and timer for host tests
//!
//! # Safety
//!
//! This is a `#![no_std]` crate. All unsafe code is documented with safety
//! invariants explaining why the usage is correct.

#![no_std]
#![warn(missing_docs)]

extern crate alloc;

pub mod arch;
pub mod channel;
pub mod config;
pub mod flow;
pub mod ring;
pub mod testutil;

pub use channel::{Channel, Port, ReadFuture, WriteFuture};
pub use config::{BaudRate, ChannelConfig, FlowControl, OverflowPolicy};
pub use flow::{FlowController, PauseSignal};
pub use ring::RingBuffer;
pub use uartflow_common::{ChannelStats, Events, SerialError};
pub use uartflow_hal::{InterruptMask, Serial, SerialHardware, Timer, UartRegisters};

/// Initializes the platform's serial channels with default settings.
///
/// Called early in the boot process, before the serial interrupt vectors are unmasked.
#[cfg(target_arch = "x86_64")]
pub fn init() {
    arch::x86_64::init(ChannelConfig::new(), ChannelConfig::new());
}
