//! System-wide error types for uartflow.

use core::fmt;

/// Serial channel error types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SerialError {
    /// Channel used before `init`
    NotInitialized,
    /// Wait deadline elapsed
    Timeout,
    /// Receive ring overflowed and bytes were discarded
    Overrun,
    /// Line rate not supported by the channel
    UnsupportedBaudRate(u32),
}

impl fmt::Display for SerialError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SerialError::NotInitialized => write!(f, "serial channel not initialized"),
            SerialError::Timeout => write!(f, "serial operation timed out"),
            SerialError::Overrun => write!(f, "receive buffer overrun"),
            SerialError::UnsupportedBaudRate(bps) => write!(f, "unsupported baud rate {}", bps),
        }
    }
}
