//! Receive ring and flow-control behavior through the interrupt path.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use uartflow::testutil::{deliver, SimUart};
use uartflow::{Channel, ChannelConfig, Events, FlowControl, RingBuffer};

fn channel<const N: usize>(config: ChannelConfig) -> Channel<SimUart, N> {
    let channel = Channel::new(SimUart::new());
    channel.init(config);
    channel
}

/// Small deterministic generator so interleavings vary without a rand dependency.
struct Lcg(u32);

impl Lcg {
    fn next(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0 >> 16
    }
}

fn check_fifo_interleaving<const N: usize>(seed: u32) {
    let channel = channel::<N>(ChannelConfig::new());
    let mut rng = Lcg(seed);
    let mut pushed = 0u32;
    let mut popped = 0u32;

    for _ in 0..5_000 {
        let occupied = (pushed - popped) as usize;
        let receive = occupied == 0 || (occupied < N && rng.next() % 2 == 0);

        if receive {
            deliver(&channel, &[pushed as u8]);
            pushed += 1;
        } else {
            assert_eq!(channel.try_get_char(), Ok(popped as u8));
            popped += 1;
        }
        assert_eq!(channel.remaining(), N - (pushed - popped) as usize);
    }
    assert_eq!(channel.overruns(), 0);
}

#[test]
fn fifo_holds_for_any_interleaving() {
    check_fifo_interleaving::<4>(1);
    check_fifo_interleaving::<16>(7);
    check_fifo_interleaving::<128>(42);
    check_fifo_interleaving::<256>(2024);
}

#[test]
fn pause_asserts_below_quarter_and_holds_until_half() {
    let channel = channel::<128>(ChannelConfig::new());
    let hw = channel.hardware();

    let events = deliver(&channel, &[0xAA; 96]);
    assert!(!events.contains(Events::PAUSED));
    assert_eq!(channel.remaining(), 32);
    assert!(!hw.pause_asserted());

    let events = deliver(&channel, &[0xAA]);
    assert!(events.contains(Events::PAUSED));
    assert_eq!(channel.remaining(), 31);
    assert!(channel.pause_asserted());
    assert!(hw.pause_asserted());

    // More traffic while paused leaves the line alone.
    deliver(&channel, &[0xBB; 10]);
    assert_eq!(channel.remaining(), 21);

    while channel.remaining() < 64 {
        channel.get_char().unwrap();
        assert!(hw.pause_asserted());
    }
    // Pushes and pops inside the band do not release it.
    deliver(&channel, &[0xCC]);
    channel.get_char().unwrap();
    assert_eq!(channel.remaining(), 64);
    assert!(hw.pause_asserted());

    channel.get_char().unwrap();
    assert_eq!(channel.remaining(), 65);
    assert!(!hw.pause_asserted());
    assert_eq!(hw.pause_transitions(), 2);
    assert_eq!(channel.stats().pauses, 1);
}

#[test]
fn indices_stay_in_range_across_wraparound() {
    let mut ring = RingBuffer::<4>::new();
    let mut read = Vec::new();
    // 6 pushes interleaved with 4 pops
    let script = [true, true, false, true, false, true, true, false, true, false];

    let mut next = 10u8;
    for push in script {
        if push {
            ring.push(next).unwrap();
            next += 1;
        } else {
            read.push(ring.pop().unwrap());
        }
        assert!(ring.head() < 4);
        assert!(ring.tail() < 4);
    }
    assert_eq!(read, vec![10, 11, 12, 13]);
    assert_eq!(ring.len(), 2);

    let channel = channel::<4>(ChannelConfig::new());
    let mut read = Vec::new();
    let mut next = 10u8;
    for push in script {
        if push {
            deliver(&channel, &[next]);
            next += 1;
        } else {
            read.push(channel.get_char().unwrap());
        }
    }
    assert_eq!(read, vec![10, 11, 12, 13]);
    assert_eq!(channel.remaining(), 2);
}

#[test]
fn char_avail_tracks_unread_bytes() {
    let channel = channel::<16>(ChannelConfig::new());
    assert!(!channel.char_avail());

    deliver(&channel, b"ab");
    assert!(channel.char_avail());
    channel.get_char().unwrap();
    assert!(channel.char_avail());
    channel.get_char().unwrap();
    assert!(!channel.char_avail());
}

#[test]
fn full_ring_round_trips() {
    let channel = channel::<32>(ChannelConfig::new());
    let bytes: Vec<u8> = (0..32).map(|i| i * 7).collect();

    deliver(&channel, &bytes);
    assert!(channel.char_avail());
    assert_eq!(channel.remaining(), 0);

    let read: Vec<u8> = (0..bytes.len()).map(|_| channel.get_char().unwrap()).collect();
    assert_eq!(read, bytes);
    assert!(!channel.char_avail());
}

#[test]
fn no_handshake_channel_never_pauses() {
    let channel = channel::<16>(ChannelConfig::new().with_flow_control(FlowControl::None));
    let events = deliver(&channel, &[1; 16]);

    assert!(!events.contains(Events::PAUSED));
    assert!(!channel.pause_asserted());
    assert_eq!(channel.hardware().pause_transitions(), 0);
}

#[test]
fn compliant_peer_never_overruns() {
    const TOTAL: usize = 20_000;
    let channel = channel::<16>(ChannelConfig::new());
    let done = AtomicBool::new(false);

    let read = thread::scope(|s| {
        // Interrupt context: a peer that honors the pause line.
        s.spawn(|| {
            let hw = channel.hardware();
            for i in 0..TOTAL {
                while hw.pause_asserted() {
                    thread::yield_now();
                }
                deliver(&channel, &[i as u8]);
            }
            done.store(true, Ordering::Release);
        });

        let mut read = Vec::with_capacity(TOTAL);
        while read.len() < TOTAL {
            match channel.try_get_char() {
                Ok(byte) => read.push(byte),
                Err(nb::Error::WouldBlock) => thread::yield_now(),
                Err(nb::Error::Other(err)) => panic!("unexpected error: {err}"),
            }
        }
        read
    });

    assert!(done.load(Ordering::Acquire));
    assert_eq!(channel.overruns(), 0);
    assert!(read.iter().enumerate().all(|(i, &b)| b == i as u8));
    assert!(!channel.pause_asserted());
}
