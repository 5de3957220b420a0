//! Command decoding for the actuator protocol.
//!
//! Command format (terminator already stripped):
//! - TYPE (1 byte): `s` shield servo, `l` loose servo, `t` stepper, `i` sensor
//! - INDEX: decimal integer, optional sign
//! - OP (1 byte): `=` set, `?` query
//! - VALUE: decimal integer, optional sign (set only)
//!
//! Integers are parsed leniently: leading digits are taken, anything after
//! them is ignored and a missing number reads as 0.

use core::fmt;

/// Type code for a servo on the PWM driver board
pub const CODE_SHIELD_SERVO: u8 = b's';

/// Type code for a servo wired directly to a controller pin
pub const CODE_LOOSE_SERVO: u8 = b'l';

/// Type code for a stepper motor
pub const CODE_STEPPER: u8 = b't';

/// Type code for a sensor
pub const CODE_SENSOR: u8 = b'i';

/// Separator between index and value of a set command
pub const SET: u8 = b'=';

/// Marker following the index of a query command
pub const QUERY: u8 = b'?';

/// Errors that can occur while decoding a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Fewer than two bytes, cannot hold a type and an index
    TooShort,
    /// Neither `?` nor `=` found after the type byte
    MissingSeparator,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::TooShort => f.write_str("command too short"),
            ParseError::MissingSeparator => f.write_str("missing '=' separator"),
        }
    }
}

/// Actuator collection a command is addressed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandKind {
    /// Servo channel on the PWM shield
    ShieldServo,
    /// Servo on a controller PWM pin
    LooseServo,
    /// Stepper motor (absolute position target)
    Stepper,
    /// Sensor (query only)
    Sensor,
    /// Unrecognised type byte, kept so the reply can name it
    Unknown(u8),
}

impl CommandKind {
    /// Look up the kind for a type byte
    pub fn from_code(code: u8) -> Self {
        match code {
            CODE_SHIELD_SERVO => CommandKind::ShieldServo,
            CODE_LOOSE_SERVO => CommandKind::LooseServo,
            CODE_STEPPER => CommandKind::Stepper,
            CODE_SENSOR => CommandKind::Sensor,
            other => CommandKind::Unknown(other),
        }
    }

    /// Type byte on the wire
    pub fn code(self) -> u8 {
        match self {
            CommandKind::ShieldServo => CODE_SHIELD_SERVO,
            CommandKind::LooseServo => CODE_LOOSE_SERVO,
            CommandKind::Stepper => CODE_STEPPER,
            CommandKind::Sensor => CODE_SENSOR,
            CommandKind::Unknown(code) => code,
        }
    }

    /// Human readable collection name, used in error replies
    pub fn name(self) -> &'static str {
        match self {
            CommandKind::ShieldServo => "shield servo",
            CommandKind::LooseServo => "loose servo",
            CommandKind::Stepper => "stepper",
            CommandKind::Sensor => "sensor",
            CommandKind::Unknown(_) => "unknown",
        }
    }
}

/// A decoded command
///
/// Built fresh for every terminated segment and consumed by the dispatcher.
/// The index is kept signed so that `t-1=5` survives decoding and is
/// rejected by the range check instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Command {
    /// Target collection
    pub kind: CommandKind,
    /// Index within the collection (not yet range checked)
    pub index: i32,
    /// Value for set commands, `None` for queries
    pub value: Option<i32>,
    /// True for `?` commands
    pub is_query: bool,
}

impl Command {
    /// Create a set command
    pub const fn set(kind: CommandKind, index: i32, value: i32) -> Self {
        Self {
            kind,
            index,
            value: Some(value),
            is_query: false,
        }
    }

    /// Create a query command
    pub const fn query(kind: CommandKind, index: i32) -> Self {
        Self {
            kind,
            index,
            value: None,
            is_query: true,
        }
    }

    /// Shorthand for a stepper target command
    pub const fn stepper(index: i32, position: i32) -> Self {
        Self::set(CommandKind::Stepper, index, position)
    }

    /// Shorthand for a sensor query
    pub const fn sensor(index: i32) -> Self {
        Self::query(CommandKind::Sensor, index)
    }
}

/// Wire form without the terminator, e.g. `t1=200` or `i2?`
impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = self.kind.code();
        if code.is_ascii_graphic() {
            write!(f, "{}{}", code as char, self.index)?;
        } else {
            write!(f, "\\x{:02x}{}", code, self.index)?;
        }
        match (self.is_query, self.value) {
            (true, _) => f.write_str("?"),
            (false, Some(value)) => write!(f, "={}", value),
            (false, None) => f.write_str("="),
        }
    }
}

/// Decode one command segment
///
/// `line` must not contain the `;` terminator. Surrounding whitespace is
/// ignored.
pub fn parse(line: &str) -> Result<Command, ParseError> {
    parse_bytes(line.as_bytes())
}

/// Decode one command segment from raw bytes
///
/// Works on bytes so arbitrary (non UTF-8) link noise decodes to an
/// error or an `Unknown` command instead of faulting.
pub fn parse_bytes(line: &[u8]) -> Result<Command, ParseError> {
    let line = trim_ascii(line);
    if line.len() < 2 {
        return Err(ParseError::TooShort);
    }

    let kind = CommandKind::from_code(line[0]);
    let body = &line[1..];

    let query_at = body.iter().position(|&b| b == QUERY);
    let set_at = body.iter().position(|&b| b == SET);

    match (query_at, set_at) {
        (Some(q), Some(s)) if q < s => Ok(Command::query(kind, parse_int_lenient(&body[..q]))),
        (Some(q), None) => Ok(Command::query(kind, parse_int_lenient(&body[..q]))),
        (_, Some(s)) => Ok(Command::set(
            kind,
            parse_int_lenient(&body[..s]),
            parse_int_lenient(&body[s + 1..]),
        )),
        (None, None) => Err(ParseError::MissingSeparator),
    }
}

/// Parse a decimal integer the lenient way
///
/// Skips leading whitespace, accepts one optional sign, then consumes the
/// longest run of ASCII digits. No digits gives 0, anything after the
/// digits is ignored and values beyond `i32` saturate.
pub fn parse_int_lenient(text: &[u8]) -> i32 {
    let mut bytes = text.iter().copied().skip_while(u8::is_ascii_whitespace).peekable();

    let negative = match bytes.peek() {
        Some(b'-') => {
            bytes.next();
            true
        }
        Some(b'+') => {
            bytes.next();
            false
        }
        _ => false,
    };

    // Accumulate as a negative number so i32::MIN is reachable
    let mut acc: i32 = 0;
    for digit in bytes.take_while(u8::is_ascii_digit) {
        let d = (digit - b'0') as i32;
        acc = acc.saturating_mul(10).saturating_sub(d);
    }

    if negative {
        acc
    } else {
        acc.checked_neg().unwrap_or(i32::MAX)
    }
}

/// Strip ASCII whitespace from both ends of a byte slice
pub(crate) fn trim_ascii(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}
