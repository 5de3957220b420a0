//! Reply lines sent back to the host.
//!
//! - Sensor data: `i<index>=<value>`
//! - Errors: `!` followed by a human readable message
//! - Successful set commands: nothing at all

use core::fmt::{self, Write};

use heapless::String;

use crate::command::{CommandKind, ParseError, CODE_SENSOR};
use crate::line::LineError;

/// Prefix marking an error reply
pub const ERROR_PREFIX: char = '!';

/// Capacity of a rendered reply line (without line ending)
pub const REPLY_CAPACITY: usize = 64;

/// Why a command was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Segment could not be decoded
    Parse(ParseError),
    /// Input buffer problem
    Line(LineError),
    /// Index outside `0..count` for its collection
    IndexOutOfRange {
        kind: CommandKind,
        index: i32,
        count: usize,
    },
    /// `?` used on a collection that cannot be read
    QueryNotSupported(CommandKind),
    /// Sensor addressed with `=` instead of `?`
    SensorRequiresQuery,
    /// Type byte did not match any collection
    UnknownType(u8),
}

impl From<ParseError> for CommandError {
    fn from(e: ParseError) -> Self {
        CommandError::Parse(e)
    }
}

impl From<LineError> for CommandError {
    fn from(e: LineError) -> Self {
        CommandError::Line(e)
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Parse(e) => write!(f, "{}", e),
            CommandError::Line(e) => write!(f, "{}", e),
            CommandError::IndexOutOfRange { kind, index, count } => {
                write!(f, "{} index {} out of range (0..{})", kind.name(), index, count)
            }
            CommandError::QueryNotSupported(kind) => {
                write!(f, "query not supported for {}", kind.name())
            }
            CommandError::SensorRequiresQuery => f.write_str("sensor command must be a query"),
            CommandError::UnknownType(code) if code.is_ascii_graphic() => {
                write!(f, "unknown command type '{}'", *code as char)
            }
            CommandError::UnknownType(code) => write!(f, "unknown command type 0x{:02x}", code),
        }
    }
}

/// Outcome of executing one command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Set command applied, nothing to send
    None,
    /// Sensor reading
    Value { index: i32, value: i32 },
    /// Command rejected without side effects
    Error(CommandError),
}

impl Reply {
    /// True for error replies
    pub fn is_error(&self) -> bool {
        matches!(self, Reply::Error(_))
    }

    /// Write the reply text (no line ending) into `out`
    ///
    /// Writes nothing for `Reply::None`.
    pub fn write_to<W: Write>(&self, out: &mut W) -> fmt::Result {
        match self {
            Reply::None => Ok(()),
            Reply::Value { index, value } => {
                write!(out, "{}{}={}", CODE_SENSOR as char, index, value)
            }
            Reply::Error(e) => write!(out, "{}{}", ERROR_PREFIX, e),
        }
    }

    /// Render the reply into a fixed-capacity line
    ///
    /// Returns `None` when there is nothing to send. Messages that do not
    /// fit are truncated; the `!` prefix always survives.
    pub fn render(&self) -> Option<String<REPLY_CAPACITY>> {
        if matches!(self, Reply::None) {
            return None;
        }
        let mut line = Truncating(String::new());
        let _ = self.write_to(&mut line);
        Some(line.0)
    }
}

impl From<CommandError> for Reply {
    fn from(e: CommandError) -> Self {
        Reply::Error(e)
    }
}

/// `fmt::Write` adapter that silently drops what does not fit
struct Truncating<const N: usize>(String<N>);

impl<const N: usize> Write for Truncating<N> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for c in s.chars() {
            if self.0.push(c).is_err() {
                break;
            }
        }
        Ok(())
    }
}
