//! 16550-compatible UART register access through x86 I/O ports.
//!
//! The FIFOs are left disabled so each receive interrupt delivers exactly one byte.
//! The pause output is the modem-control RTS bit: clearing it asks the peer to stop.

use uartflow_hal::{InterruptMask, UartRegisters};
use x86_64::instructions::{interrupts, port::Port};

/// Input clock divided by 16, the rate reached with a divisor of 1.
const BASE_RATE: u32 = 115_200;

// Register offsets from the port base.
const DATA: u16 = 0; // RBR / THR, DLL with DLAB set
const INT_ENABLE: u16 = 1; // IER, DLM with DLAB set
const INT_IDENT: u16 = 2; // IIR on read, FCR on write
const LINE_CTRL: u16 = 3;
const MODEM_CTRL: u16 = 4;
const LINE_STATUS: u16 = 5;
const MODEM_STATUS: u16 = 6;

const IER_RX_AVAILABLE: u8 = 1 << 0;
const IER_THR_EMPTY: u8 = 1 << 1;

const LCR_8N1: u8 = 0x03;
const LCR_DLAB: u8 = 1 << 7;

const MCR_DTR: u8 = 1 << 0;
const MCR_RTS: u8 = 1 << 1;
const MCR_OUT2: u8 = 1 << 3; // gates the IRQ line on PC hardware

const LSR_DATA_READY: u8 = 1 << 0;
const LSR_THR_EMPTY: u8 = 1 << 5;

const MSR_CTS: u8 = 1 << 4;

/// A 16550 UART at a fixed I/O port base.
#[derive(Debug)]
pub struct Uart16550 {
    base: u16,
}

impl Uart16550 {
    /// Creates a handle for the UART at `base`.
    ///
    /// # Safety
    ///
    /// A 16550-compatible UART must be present at `base`, and no other code may drive
    /// its registers.
    pub const unsafe fn new(base: u16) -> Self {
        Self { base }
    }

    /// The I/O port base.
    pub fn base(&self) -> u16 {
        self.base
    }

    fn read(&self, offset: u16) -> u8 {
        // SAFETY: `new` guarantees a UART at `base`; offsets stay within its 8 registers.
        unsafe { Port::<u8>::new(self.base + offset).read() }
    }

    fn write(&self, offset: u16, value: u8) {
        // SAFETY: see `read`.
        unsafe { Port::<u8>::new(self.base + offset).write(value) }
    }

    fn update_modem_ctrl(&self, set: u8, clear: u8) {
        let mcr = self.read(MODEM_CTRL);
        self.write(MODEM_CTRL, (mcr | set) & !clear);
    }
}

impl UartRegisters for Uart16550 {
    fn configure_rate(&self, bps: u32) {
        let divisor = (BASE_RATE / bps.max(1)).clamp(1, u32::from(u16::MAX)) as u16;
        let [low, high] = divisor.to_le_bytes();

        self.write(INT_ENABLE, 0);
        self.write(LINE_CTRL, LCR_DLAB);
        self.write(DATA, low);
        self.write(INT_ENABLE, high);
        self.write(LINE_CTRL, LCR_8N1);
        self.write(INT_IDENT, 0);
    }

    fn read_rx(&self) -> u8 {
        self.read(DATA)
    }

    fn write_tx(&self, byte: u8) {
        self.write(DATA, byte);
    }

    fn rx_ready(&self) -> bool {
        self.read(LINE_STATUS) & LSR_DATA_READY != 0
    }

    fn clear_rx_ready(&self) {
        // Cleared by the RBR read that follows.
    }

    // THRE is a level, not a latch: it reads set for as long as the holder is empty.
    fn tx_complete(&self) -> bool {
        self.read(LINE_STATUS) & LSR_THR_EMPTY != 0
    }

    fn clear_tx_complete(&self) {
        // Reading IIR acknowledges a pending THR-empty interrupt.
        let _ = self.read(INT_IDENT);
    }

    fn enable_rx(&self) {
        self.update_modem_ctrl(MCR_DTR, 0);
    }

    fn enable_rx_interrupt(&self) {
        self.write(INT_ENABLE, IER_RX_AVAILABLE | IER_THR_EMPTY);
        self.update_modem_ctrl(MCR_OUT2, 0);
    }

    fn set_pause_signal(&self, paused: bool) {
        if paused {
            self.update_modem_ctrl(0, MCR_RTS);
        } else {
            self.update_modem_ctrl(MCR_RTS, 0);
        }
    }

    fn peer_paused(&self) -> bool {
        self.read(MODEM_STATUS) & MSR_CTS == 0
    }
}

impl InterruptMask for Uart16550 {
    fn without_interrupts<R, F: FnOnce() -> R>(&self, f: F) -> R {
        interrupts::without_interrupts(f)
    }
}
