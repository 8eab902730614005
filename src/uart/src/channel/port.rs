//! Borrowed handle exposing a channel through standard character traits.

use super::Channel;
use core::fmt;
use uartflow_hal::{Serial, SerialHardware};

/// A channel viewed as a character device.
///
/// Implements `core::fmt::Write`, so `write!` formats straight onto the line, and the
/// HAL [`Serial`] trait for code written against it.
pub struct Port<'a, H, const N: usize> {
    channel: &'a Channel<H, N>,
}

impl<'a, H, const N: usize> Port<'a, H, N> {
    pub(super) fn new(channel: &'a Channel<H, N>) -> Self {
        Self { channel }
    }
}

impl<H: SerialHardware, const N: usize> fmt::Write for Port<'_, H, N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.channel.write_bytes(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

impl<H: SerialHardware, const N: usize> Serial for Port<'_, H, N> {
    fn write_byte(&mut self, byte: u8) {
        // Only fails before init; the HAL trait has no error path.
        let _ = self.channel.put_char(byte);
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.channel.try_get_char().ok()
    }
}
