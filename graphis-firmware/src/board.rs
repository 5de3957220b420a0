//! Pin map for a Raspberry Pi Pico carrier
//!
//! Wiring follows the original plotter rig:
//!
//! | Function              | GPIO          |
//! |-----------------------|---------------|
//! | Host UART0 TX / RX    | 0 / 1         |
//! | Stepper 0 STEP / DIR  | 2 / 3         |
//! | PCA9685 SDA / SCL     | 4 / 5 (I2C0)  |
//! | Stepper 1 STEP / DIR  | 6 / 7         |
//! | Loose servo 0 (pen)   | 10 (PWM5 A)   |
//! | Pen contact switch    | 15 (to GND)   |
//!
//! The collection sizes below are fixed by the wiring; `machine.toml`
//! supplies names and limits for each slot.

/// Stepper slots wired on this board
pub const STEPPERS: usize = 2;

/// Loose servo slots wired on this board
pub const LOOSE_SERVOS: usize = 1;

/// Sensors: steppers idle (`i0`), pen contact (`i1`)
pub const SENSORS: usize = 2;

/// PWM divider for a 50 Hz servo period at 125 MHz system clock
pub const SERVO_PWM_DIVIDER: u8 = 64;

/// PWM wrap value: 125 MHz / 64 / 50 Hz - 1
pub const SERVO_PWM_TOP: u16 = 39_061;

/// Host UART buffer sizes
pub const UART_TX_BUF: usize = 256;
pub const UART_RX_BUF: usize = 256;

/// I2C bus speed for the servo shield
pub const I2C_FREQUENCY_HZ: u32 = 400_000;
