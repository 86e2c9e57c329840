//! Transport module - the serial port capability boundary.
//!
//! The engine never talks to hardware directly. The host supplies an
//! implementation of [`SerialPort`] — a UART driver, a USB CDC endpoint, a
//! pty, or the in-memory [`MemoryPort`] pair used by tests and demos.

mod memory;

pub use memory::{ByteQueue, MemoryPort};

/// Capability set the engine requires from a byte-oriented serial link.
///
/// Implementations are free to block inside `read`/`write` per platform
/// rules; the engine itself never spins waiting for data — it pulls at
/// most [`bytes_available`](SerialPort::bytes_available) bytes per
/// ingestion pass.
pub trait SerialPort {
    /// Number of bytes immediately readable without blocking.
    fn bytes_available(&self) -> usize;

    /// Best-effort read into `dst`. Returns the number of bytes copied,
    /// which may be less than `dst.len()` (including zero).
    fn read(&mut self, dst: &mut [u8]) -> usize;

    /// Attempt to write all of `src` as one unit.
    ///
    /// All-or-nothing at this boundary: a platform whose underlying I/O
    /// is partial must either buffer internally or return `false`. The
    /// engine never retries.
    fn write(&mut self, src: &[u8]) -> bool;
}
