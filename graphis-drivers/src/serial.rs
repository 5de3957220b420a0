//! Host link over a UART
//!
//! Adapts any `embedded_io` byte port to the core's `ByteStream`. Reads
//! only happen when the port reports data ready, so `read_available`
//! never waits for the host. Replies are queued into the port and never
//! flushed; a buffered UART drains them from its interrupt.

use embedded_io::{Read, ReadReady, Write};

use graphis_core::traits::ByteStream;

/// Line ending appended to every reply
pub const LINE_ENDING: &[u8] = b"\r\n";

/// Non-blocking `ByteStream` over a UART
pub struct SerialStream<T> {
    port: T,
    read_errors: u32,
    write_errors: u32,
}

impl<T: Read + ReadReady + Write> SerialStream<T> {
    pub fn new(port: T) -> Self {
        Self {
            port,
            read_errors: 0,
            write_errors: 0,
        }
    }

    /// Failed reads since startup (framing, overrun)
    pub fn read_errors(&self) -> u32 {
        self.read_errors
    }

    /// Failed writes since startup
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    pub fn release(self) -> T {
        self.port
    }
}

impl<T: Read + ReadReady + Write> ByteStream for SerialStream<T> {
    fn available(&mut self) -> bool {
        self.port.read_ready().unwrap_or(false)
    }

    fn read_available(&mut self, buf: &mut [u8]) -> usize {
        if buf.is_empty() || !self.available() {
            return 0;
        }
        match self.port.read(buf) {
            Ok(n) => n,
            Err(_) => {
                self.read_errors = self.read_errors.saturating_add(1);
                0
            }
        }
    }

    fn write_line(&mut self, line: &str) {
        let result = self
            .port
            .write_all(line.as_bytes())
            .and_then(|_| self.port.write_all(LINE_ENDING));
        if result.is_err() {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}
