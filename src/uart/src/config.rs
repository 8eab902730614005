//! Channel configuration.

use core::fmt;
use log::warn;
use uartflow_common::SerialError;

/// Supported line rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum BaudRate {
    /// 2400 bps
    B2400,
    /// 4800 bps
    B4800,
    /// 9600 bps
    #[default]
    B9600,
    /// 14400 bps
    B14400,
    /// 19200 bps
    B19200,
    /// 28800 bps
    B28800,
    /// 38400 bps
    B38400,
    /// 57600 bps
    B57600,
    /// 115200 bps
    B115200,
}

impl BaudRate {
    /// The rate in bits per second.
    pub const fn bps(self) -> u32 {
        match self {
            BaudRate::B2400 => 2_400,
            BaudRate::B4800 => 4_800,
            BaudRate::B9600 => 9_600,
            BaudRate::B14400 => 14_400,
            BaudRate::B19200 => 19_200,
            BaudRate::B28800 => 28_800,
            BaudRate::B38400 => 38_400,
            BaudRate::B57600 => 57_600,
            BaudRate::B115200 => 115_200,
        }
    }
}

impl TryFrom<u32> for BaudRate {
    type Error = SerialError;

    fn try_from(bps: u32) -> Result<Self, Self::Error> {
        Ok(match bps {
            2_400 => BaudRate::B2400,
            4_800 => BaudRate::B4800,
            9_600 => BaudRate::B9600,
            14_400 => BaudRate::B14400,
            19_200 => BaudRate::B19200,
            28_800 => BaudRate::B28800,
            38_400 => BaudRate::B38400,
            57_600 => BaudRate::B57600,
            115_200 => BaudRate::B115200,
            other => return Err(SerialError::UnsupportedBaudRate(other)),
        })
    }
}

impl fmt::Display for BaudRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} bps", self.bps())
    }
}

/// Hardware handshaking mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlowControl {
    /// Drive the pause line from ring occupancy.
    #[default]
    RtsCts,
    /// Never pause the peer.
    None,
}

/// What the interrupt handler does with a byte that arrives when the ring is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverflowPolicy {
    /// Discard the incoming byte.
    #[default]
    DropNewest,
    /// Discard the oldest unread byte to make room.
    OverwriteOldest,
}

/// Settings applied by [`Channel::init`](crate::channel::Channel::init).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelConfig {
    /// Line rate.
    pub baud: BaudRate,
    /// Handshaking mode.
    pub flow_control: FlowControl,
    /// Full-ring behavior.
    pub overflow: OverflowPolicy,
}

impl ChannelConfig {
    /// 9600 bps, RTS/CTS handshaking, drop on overflow.
    pub const fn new() -> Self {
        Self {
            baud: BaudRate::B9600,
            flow_control: FlowControl::RtsCts,
            overflow: OverflowPolicy::DropNewest,
        }
    }

    /// Set the line rate.
    pub const fn with_baud(mut self, baud: BaudRate) -> Self {
        self.baud = baud;
        self
    }

    /// Set the line rate from a raw value.
    ///
    /// Unsupported rates fall back to 9600 bps.
    pub fn with_baud_bps(self, bps: u32) -> Self {
        match BaudRate::try_from(bps) {
            Ok(baud) => self.with_baud(baud),
            Err(err) => {
                warn!("{}, falling back to {}", err, BaudRate::default());
                self.with_baud(BaudRate::default())
            }
        }
    }

    /// Set the handshaking mode.
    pub const fn with_flow_control(mut self, flow_control: FlowControl) -> Self {
        self.flow_control = flow_control;
        self
    }

    /// Set the full-ring behavior.
    pub const fn with_overflow(mut self, overflow: OverflowPolicy) -> Self {
        self.overflow = overflow;
        self
    }
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self::new()
    }
}
