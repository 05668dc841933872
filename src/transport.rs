//! The modem transport: an opaque byte channel between the dialogue layer and whatever is on the
//! other end of the wire (a serial port, a pipe, a fake channel in tests).
//!
//! This module is deliberately thin. `ModemChannel` is the entire contract the dialogue layer
//! needs; nothing above this line cares whether the bytes came from a TTY, a Unix socket, or a
//! `Vec<u8>` fed in by a test.
use std::time::{Duration, Instant};

use crate::errors::{HuaweiError, HuaweiResult};

/// A full-duplex byte channel to a modem.
///
/// Implementors own whatever resource backs the channel (file descriptor, socket, in-memory
/// buffer) and release it on `Drop`; there is no separate `close`.
pub trait ModemChannel {
    /// Write `data` in full. A short write (the backing device accepted fewer bytes than given)
    /// is surfaced as `HuaweiError::ShortWrite` rather than silently returning a partial count.
    fn write_all(&mut self, data: &[u8]) -> HuaweiResult<usize>;
    /// Read into `dst`, blocking until either `dst` is full or `timeout` elapses with nothing to
    /// read. Returns the number of bytes read; `0` means the timeout expired before any data
    /// arrived.
    fn read_with_timeout(&mut self, dst: &mut [u8], timeout: Duration) -> HuaweiResult<usize>;
}

/// An in-memory `ModemChannel` used by tests: `write_all` appends to a log the test can inspect,
/// and `read_with_timeout` drains from a queue of canned responses the test pushes in advance.
#[cfg(test)]
pub mod fake {
    use super::*;
    use std::collections::VecDeque;

    #[derive(Default)]
    pub struct FakeChannel {
        pub written: Vec<u8>,
        responses: VecDeque<Vec<u8>>,
    }
    impl FakeChannel {
        pub fn new() -> Self {
            Self::default()
        }
        /// Queue a response to be handed back by the next `read_with_timeout` call.
        pub fn push_response(&mut self, data: &str) -> &mut Self {
            self.responses.push_back(data.as_bytes().to_vec());
            self
        }
        pub fn written_str(&self) -> String {
            String::from_utf8_lossy(&self.written).into_owned()
        }
    }
    impl ModemChannel for FakeChannel {
        fn write_all(&mut self, data: &[u8]) -> HuaweiResult<usize> {
            self.written.extend_from_slice(data);
            Ok(data.len())
        }
        fn read_with_timeout(&mut self, dst: &mut [u8], _timeout: Duration) -> HuaweiResult<usize> {
            match self.responses.pop_front() {
                Some(data) => {
                    let n = data.len().min(dst.len());
                    dst[..n].copy_from_slice(&data[..n]);
                    Ok(n)
                }
                None => Ok(0),
            }
        }
    }
}

/// A Linux TTY, configured 115200 8N1 raw with no flow control, exactly as spec'd: canonical
/// mode, echo, and signal generation all disabled, output post-processing off, no CR/LF
/// translation. This is illustrative plumbing around the `serial` crate, not part of the core
/// `ModemChannel` contract; the dialogue/flow layers only ever depend on the trait above.
#[cfg(feature = "linux-serial")]
pub mod linux {
    use super::*;
    use std::io::{Read, Write};
    use std::path::Path;
    use serial::{self, SerialPort};

    pub struct LinuxSerialChannel {
        port: serial::SystemPort,
    }
    impl LinuxSerialChannel {
        /// Open and configure `device` for AT dialogue. Scoped: the descriptor is released when
        /// the returned value is dropped.
        pub fn open<P: AsRef<Path>>(device: P) -> HuaweiResult<Self> {
            let mut port = serial::open(device.as_ref())?;
            port.reconfigure(&|settings| {
                settings.set_baud_rate(serial::Baud115200)?;
                settings.set_char_size(serial::Bits8);
                settings.set_parity(serial::ParityNone);
                settings.set_stop_bits(serial::Stop1);
                settings.set_flow_control(serial::FlowNone);
                Ok(())
            })?;
            Ok(LinuxSerialChannel { port })
        }
    }
    impl ModemChannel for LinuxSerialChannel {
        fn write_all(&mut self, data: &[u8]) -> HuaweiResult<usize> {
            let wrote = self.port.write(data)?;
            if wrote != data.len() {
                return Err(HuaweiError::ShortWrite { wrote, expected: data.len() });
            }
            Ok(wrote)
        }
        fn read_with_timeout(&mut self, dst: &mut [u8], timeout: Duration) -> HuaweiResult<usize> {
            self.port.set_timeout(timeout)?;
            let deadline = Instant::now() + timeout;
            let mut total = 0;
            // One byte at a time with a short pause between reads, mirroring the polling
            // granularity the modem dialogue expects of a raw TTY read.
            while total < dst.len() && Instant::now() < deadline {
                match self.port.read(&mut dst[total..total + 1]) {
                    Ok(0) => break,
                    Ok(n) => total += n,
                    Err(ref e) if e.kind() == std::io::ErrorKind::TimedOut => break,
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(total)
        }
    }
    impl From<serial::Error> for HuaweiError {
        fn from(e: serial::Error) -> HuaweiError {
            HuaweiError::IoError(std::io::Error::new(std::io::ErrorKind::Other, e))
        }
    }
}
