//! Byte stream trait

/// Host link carrying commands in and replies out
///
/// Reads never block: the scheduler polls `available` and takes whatever
/// bytes are there.
pub trait ByteStream {
    /// True if at least one byte can be read without blocking
    fn available(&mut self) -> bool;

    /// Read up to `buf.len()` immediately available bytes
    ///
    /// Returns the number of bytes read, zero if none were ready.
    fn read_available(&mut self, buf: &mut [u8]) -> usize;

    /// Send one reply line; the implementation appends the line ending
    fn write_line(&mut self, line: &str);
}
