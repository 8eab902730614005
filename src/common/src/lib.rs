//! Types shared between the uartflow crates.

#![no_std]

pub mod error;
pub mod event;

pub use error::SerialError;
pub use event::{ChannelStats, Events};
