//! In-memory serial port for tests, demos, and loopback use.
//!
//! Two [`MemoryPort`]s built over crossed byte queues behave like the two
//! ends of a cable: whatever one end writes, the other end reads. The
//! queues themselves are exposed ([`ByteQueue`]) so a test harness can
//! inject raw wire bytes, truncate a frame in flight, or flip a byte to
//! simulate line noise.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use super::SerialPort;

/// Shared byte stream backing one direction of a [`MemoryPort`] link.
pub type ByteQueue = Arc<Mutex<VecDeque<u8>>>;

/// An in-memory [`SerialPort`] over two shared byte queues.
pub struct MemoryPort {
    rx: ByteQueue,
    tx: ByteQueue,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryPort {
    /// Create an empty shared queue.
    pub fn queue() -> ByteQueue {
        Arc::new(Mutex::new(VecDeque::new()))
    }

    /// Build a port reading from `rx` and writing to `tx`.
    pub fn new(rx: ByteQueue, tx: ByteQueue) -> Self {
        Self {
            rx,
            tx,
            fail_writes: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Build both ends of a link with crossed queues.
    pub fn pair() -> (MemoryPort, MemoryPort) {
        let a_to_b = Self::queue();
        let b_to_a = Self::queue();
        (
            Self::new(b_to_a.clone(), a_to_b.clone()),
            Self::new(a_to_b, b_to_a),
        )
    }

    /// Append raw bytes to this port's inbound queue, as if the peer had
    /// written them.
    pub fn inject(&self, data: &[u8]) {
        self.rx.lock().unwrap().extend(data.iter().copied());
    }

    /// Force subsequent [`SerialPort::write`] calls to fail without
    /// queueing anything.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Relaxed);
    }
}

impl SerialPort for MemoryPort {
    fn bytes_available(&self) -> usize {
        self.rx.lock().unwrap().len()
    }

    fn read(&mut self, dst: &mut [u8]) -> usize {
        let mut rx = self.rx.lock().unwrap();
        let count = dst.len().min(rx.len());
        for slot in dst[..count].iter_mut() {
            *slot = rx.pop_front().expect("count bounded by queue length");
        }
        count
    }

    fn write(&mut self, src: &[u8]) -> bool {
        if self.fail_writes.load(Ordering::Relaxed) {
            return false;
        }
        self.tx.lock().unwrap().extend(src.iter().copied());
        true
    }
}
