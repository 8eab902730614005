//! Futures for cooperative executors.
//!
//! Both futures register with the channel's wakers, which the interrupt handler signals
//! after it stores a byte or sees transmit-complete.

use super::Channel;
use core::{
    future::Future,
    pin::Pin,
    task::{Context, Poll},
};
use uartflow_common::SerialError;
use uartflow_hal::SerialHardware;

/// Future returned by [`Channel::read`].
pub struct ReadFuture<'a, H, const N: usize> {
    channel: &'a Channel<H, N>,
}

impl<'a, H, const N: usize> ReadFuture<'a, H, N> {
    pub(super) fn new(channel: &'a Channel<H, N>) -> Self {
        Self { channel }
    }
}

impl<H: SerialHardware, const N: usize> Future for ReadFuture<'_, H, N> {
    type Output = Result<u8, SerialError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let channel = self.channel;

        // fast path
        match channel.try_get_char() {
            Ok(byte) => return Poll::Ready(Ok(byte)),
            Err(nb::Error::Other(err)) => return Poll::Ready(Err(err)),
            Err(nb::Error::WouldBlock) => {}
        }

        channel.rx_waker.register(cx.waker());
        match channel.try_get_char() {
            Ok(byte) => {
                channel.rx_waker.take();
                Poll::Ready(Ok(byte))
            }
            Err(nb::Error::Other(err)) => Poll::Ready(Err(err)),
            Err(nb::Error::WouldBlock) => Poll::Pending,
        }
    }
}

/// Future returned by [`Channel::write`].
pub struct WriteFuture<'a, H, const N: usize> {
    channel: &'a Channel<H, N>,
    byte: u8,
}

impl<'a, H, const N: usize> WriteFuture<'a, H, N> {
    pub(super) fn new(channel: &'a Channel<H, N>, byte: u8) -> Self {
        Self { channel, byte }
    }
}

impl<H: SerialHardware, const N: usize> Future for WriteFuture<'_, H, N> {
    type Output = Result<u8, SerialError>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let channel = self.channel;
        let byte = self.byte;

        match channel.try_put_char(byte) {
            Ok(byte) => return Poll::Ready(Ok(byte)),
            Err(nb::Error::Other(err)) => return Poll::Ready(Err(err)),
            Err(nb::Error::WouldBlock) => {}
        }

        channel.tx_waker.register(cx.waker());
        match channel.try_put_char(byte) {
            Ok(byte) => {
                channel.tx_waker.take();
                Poll::Ready(Ok(byte))
            }
            Err(nb::Error::Other(err)) => Poll::Ready(Err(err)),
            Err(nb::Error::WouldBlock) => Poll::Pending,
        }
    }
}
