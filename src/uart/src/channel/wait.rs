//! Waiting on non-blocking channel operations.

use core::hint::spin_loop;
use log::debug;
use uartflow_common::SerialError;
use uartflow_hal::Timer;

/// Retry `op` until it stops returning `WouldBlock`.
pub(super) fn block<T>(
    mut op: impl FnMut() -> nb::Result<T, SerialError>,
) -> Result<T, SerialError> {
    nb::block!(op().map_err(|err| {
        if let nb::Error::WouldBlock = err {
            spin_loop();
        }
        err
    }))
}

/// Retry `op` until it stops returning `WouldBlock` or `ticks` of `timer` elapse.
///
/// `op` is always tried at least once, so a zero timeout is a plain poll.
pub(super) fn block_timeout<T, C: Timer + ?Sized>(
    timer: &C,
    ticks: u64,
    mut op: impl FnMut() -> nb::Result<T, SerialError>,
) -> Result<T, SerialError> {
    let start = timer.current_ticks();
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(nb::Error::Other(err)) => return Err(err),
            Err(nb::Error::WouldBlock) => {
                if timer.current_ticks().wrapping_sub(start) >= ticks {
                    debug!("serial wait timed out after {} ticks", ticks);
                    return Err(SerialError::Timeout);
                }
                spin_loop();
            }
        }
    }
}
