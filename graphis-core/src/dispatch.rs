//! Command dispatcher
//!
//! Routes a decoded command to its actuator collection. Every check
//! (query flag, index range, value presence) runs before the actuator is
//! touched, so a rejected command never has a partial effect.

use graphis_protocol::{parse_bytes, Command, CommandError, CommandKind, ParseError, Reply};

use crate::registry::ActuatorRegistry;
use crate::traits::{SensorDriver, ServoDriver, StepperDriver};

/// Shortest servo pulse the dispatcher will send, in microseconds
pub const MIN_SERVO_MICROS: u16 = 500;

/// Longest servo pulse the dispatcher will send, in microseconds
pub const MAX_SERVO_MICROS: u16 = 2500;

/// Clamp a requested pulse width into the safe servo range
pub fn clamp_servo_micros(value: i32) -> u16 {
    value.clamp(MIN_SERVO_MICROS as i32, MAX_SERVO_MICROS as i32) as u16
}

/// Dispatch counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DispatchStats {
    /// Commands applied (sets and successful queries)
    pub executed: u32,
    /// Commands rejected with an error reply
    pub rejected: u32,
}

/// Command dispatcher
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    stats: DispatchStats,
}

impl Dispatcher {
    /// Create a dispatcher with zeroed counters
    pub const fn new() -> Self {
        Self {
            stats: DispatchStats {
                executed: 0,
                rejected: 0,
            },
        }
    }

    /// Counters since startup
    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Decode and execute one terminated segment
    pub fn execute_line<T, S, L, N>(
        &mut self,
        registry: &mut ActuatorRegistry<T, S, L, N>,
        line: &[u8],
    ) -> Reply
    where
        T: StepperDriver,
        S: ServoDriver,
        L: ServoDriver,
        N: SensorDriver,
    {
        match parse_bytes(line) {
            Ok(cmd) => self.execute(registry, &cmd),
            Err(e) => self.record(Err(e.into())),
        }
    }

    /// Execute one decoded command
    ///
    /// Returns `Reply::None` for applied set commands, `Reply::Value` for
    /// sensor queries and `Reply::Error` for anything rejected.
    pub fn execute<T, S, L, N>(
        &mut self,
        registry: &mut ActuatorRegistry<T, S, L, N>,
        cmd: &Command,
    ) -> Reply
    where
        T: StepperDriver,
        S: ServoDriver,
        L: ServoDriver,
        N: SensorDriver,
    {
        let result = apply(registry, cmd);
        self.record(result)
    }

    fn record(&mut self, result: Result<Reply, CommandError>) -> Reply {
        match result {
            Ok(reply) => {
                self.stats.executed = self.stats.executed.wrapping_add(1);
                reply
            }
            Err(e) => {
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                Reply::Error(e)
            }
        }
    }
}

fn apply<T, S, L, N>(
    registry: &mut ActuatorRegistry<T, S, L, N>,
    cmd: &Command,
) -> Result<Reply, CommandError>
where
    T: StepperDriver,
    S: ServoDriver,
    L: ServoDriver,
    N: SensorDriver,
{
    let ActuatorRegistry {
        steppers,
        shield_servos,
        loose_servos,
        sensors,
    } = registry;

    match cmd.kind {
        CommandKind::ShieldServo => write_servo(shield_servos, cmd),
        CommandKind::LooseServo => write_servo(loose_servos, cmd),
        CommandKind::Stepper => {
            let value = set_value(cmd)?;
            let index = check_index(cmd, steppers.count())?;
            steppers.set_target(index, value);
            Ok(Reply::None)
        }
        CommandKind::Sensor => {
            if !cmd.is_query {
                return Err(CommandError::SensorRequiresQuery);
            }
            let index = check_index(cmd, sensors.count())?;
            let value = sensors.read(index, &*steppers);
            Ok(Reply::Value {
                index: cmd.index,
                value,
            })
        }
        CommandKind::Unknown(code) => Err(CommandError::UnknownType(code)),
    }
}

fn write_servo<D: ServoDriver>(servos: &mut D, cmd: &Command) -> Result<Reply, CommandError> {
    let value = set_value(cmd)?;
    let index = check_index(cmd, servos.count())?;
    servos.write_microseconds(index, clamp_servo_micros(value));
    Ok(Reply::None)
}

/// Value of a set command; queries are rejected for settable kinds
fn set_value(cmd: &Command) -> Result<i32, CommandError> {
    if cmd.is_query {
        return Err(CommandError::QueryNotSupported(cmd.kind));
    }
    cmd.value
        .ok_or(CommandError::Parse(ParseError::MissingSeparator))
}

/// Convert the signed wire index to a collection index
fn check_index(cmd: &Command, count: usize) -> Result<usize, CommandError> {
    usize::try_from(cmd.index)
        .ok()
        .filter(|&index| index < count)
        .ok_or(CommandError::IndexOutOfRange {
            kind: cmd.kind,
            index: cmd.index,
            count,
        })
}
