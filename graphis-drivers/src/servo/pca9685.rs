//! PCA9685 PWM shield (I2C)
//!
//! 16 channels of 12-bit PWM sharing one prescaler. Servo pulses are
//! expressed as an "off" tick inside the PWM period, with the "on" tick
//! fixed at 0.
//!
//! # Register Map (subset)
//!
//! - MODE1 (0x00): sleep, auto-increment, restart
//! - LED0_ON_L (0x06): first channel, 4 registers per channel
//! - PRE_SCALE (0xFE): `round(osc / (4096 * freq)) - 1`, writable in sleep only

use core::fmt;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use graphis_core::config::ShieldConfig;
use graphis_core::traits::ServoDriver;

/// PCA9685 register addresses
pub mod reg {
    pub const MODE1: u8 = 0x00;
    pub const MODE2: u8 = 0x01;
    pub const LED0_ON_L: u8 = 0x06;
    pub const PRE_SCALE: u8 = 0xFE;
}

/// MODE1 bits
pub mod mode1 {
    pub const RESTART: u8 = 0x80;
    pub const AUTO_INCREMENT: u8 = 0x20;
    pub const SLEEP: u8 = 0x10;
}

/// MODE2 totem-pole outputs
const MODE2_OUTDRV: u8 = 0x04;

/// Number of PWM channels
pub const CHANNELS: usize = 16;

/// Counter resolution per PWM period
const TICKS_PER_PERIOD: u32 = 4096;

/// Prescaler limits from the datasheet
const PRESCALE_MIN: u32 = 3;
const PRESCALE_MAX: u32 = 255;

/// PCA9685 errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Pca9685Error<E> {
    /// Bus transfer failed
    I2c(E),
    /// Channel outside 0..16
    InvalidChannel(u8),
}

impl<E: fmt::Debug> fmt::Display for Pca9685Error<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pca9685Error::I2c(e) => write!(f, "i2c error: {:?}", e),
            Pca9685Error::InvalidChannel(ch) => write!(f, "invalid channel {}", ch),
        }
    }
}

/// Prescaler for a PWM frequency, rounded to nearest and clamped
pub fn prescale_for(oscillator_hz: u32, pwm_freq_hz: u16) -> u8 {
    let divisor = pwm_freq_hz.max(1) as u32 * TICKS_PER_PERIOD;
    let prescale = ((oscillator_hz + divisor / 2) / divisor).saturating_sub(1);
    prescale.clamp(PRESCALE_MIN, PRESCALE_MAX) as u8
}

/// PCA9685 shield driver
pub struct Pca9685<I2C> {
    i2c: I2C,
    address: u8,
    oscillator_hz: u32,
    pwm_freq_hz: u16,
    prescale: u8,
    /// Failed channel writes (servo writes are fire-and-forget)
    write_errors: u32,
}

impl<I2C: I2c> Pca9685<I2C> {
    /// Create the driver; call `init` before writing channels
    pub fn new(i2c: I2C, config: &ShieldConfig) -> Self {
        Self {
            i2c,
            address: config.address,
            oscillator_hz: config.oscillator_hz,
            pwm_freq_hz: config.pwm_freq_hz,
            prescale: prescale_for(config.oscillator_hz, config.pwm_freq_hz),
            write_errors: 0,
        }
    }

    /// Reset the chip and program the PWM frequency
    pub fn init<D: DelayNs>(&mut self, delay: &mut D) -> Result<(), Pca9685Error<I2C::Error>> {
        self.write_register(reg::MODE1, mode1::RESTART)?;
        delay.delay_ms(10);
        self.write_register(reg::MODE2, MODE2_OUTDRV)?;
        self.set_pwm_frequency(self.pwm_freq_hz, delay)
    }

    /// Change the PWM frequency for all channels
    ///
    /// The prescaler only latches while the oscillator sleeps, so the chip
    /// is put to sleep, reprogrammed and restarted with auto-increment on.
    pub fn set_pwm_frequency<D: DelayNs>(
        &mut self,
        freq_hz: u16,
        delay: &mut D,
    ) -> Result<(), Pca9685Error<I2C::Error>> {
        let prescale = prescale_for(self.oscillator_hz, freq_hz);

        let old_mode = self.read_register(reg::MODE1)?;
        let sleep_mode = (old_mode & !mode1::RESTART) | mode1::SLEEP;
        self.write_register(reg::MODE1, sleep_mode)?;
        self.write_register(reg::PRE_SCALE, prescale)?;
        self.write_register(reg::MODE1, old_mode)?;
        delay.delay_ms(5);
        self.write_register(
            reg::MODE1,
            old_mode | mode1::RESTART | mode1::AUTO_INCREMENT,
        )?;

        self.pwm_freq_hz = freq_hz;
        self.prescale = prescale;
        Ok(())
    }

    /// Active prescaler value
    pub fn prescale(&self) -> u8 {
        self.prescale
    }

    /// Convert a pulse width to counter ticks at the active prescaler
    pub fn micros_to_ticks(&self, micros: u16) -> u16 {
        let ticks = micros as u64 * self.oscillator_hz as u64
            / (1_000_000 * (self.prescale as u64 + 1));
        ticks.min(TICKS_PER_PERIOD as u64 - 1) as u16
    }

    /// Program one channel's on and off ticks
    pub fn set_pwm(&mut self, channel: u8, on: u16, off: u16) -> Result<(), Pca9685Error<I2C::Error>> {
        if channel as usize >= CHANNELS {
            return Err(Pca9685Error::InvalidChannel(channel));
        }
        let [on_l, on_h] = on.to_le_bytes();
        let [off_l, off_h] = off.to_le_bytes();
        let register = reg::LED0_ON_L + 4 * channel;
        self.i2c
            .write(self.address, &[register, on_l, on_h, off_l, off_h])
            .map_err(Pca9685Error::I2c)
    }

    /// Drive a channel with a servo pulse of `micros`
    pub fn write_micros(&mut self, channel: u8, micros: u16) -> Result<(), Pca9685Error<I2C::Error>> {
        let ticks = self.micros_to_ticks(micros);
        self.set_pwm(channel, 0, ticks)
    }

    /// Channel writes that failed since startup
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    /// Give the bus back
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Pca9685Error<I2C::Error>> {
        self.i2c
            .write(self.address, &[register, value])
            .map_err(Pca9685Error::I2c)
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Pca9685Error<I2C::Error>> {
        let mut value = [0u8];
        self.i2c
            .write_read(self.address, &[register], &mut value)
            .map_err(Pca9685Error::I2c)?;
        Ok(value[0])
    }
}

impl<I2C: I2c> ServoDriver for Pca9685<I2C> {
    fn count(&self) -> usize {
        CHANNELS
    }

    fn write_microseconds(&mut self, index: usize, micros: u16) {
        let channel = u8::try_from(index).unwrap_or(u8::MAX);
        if self.write_micros(channel, micros).is_err() {
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockI2c, NoDelay};

    fn shield() -> Pca9685<MockI2c> {
        Pca9685::new(MockI2c::new(), &ShieldConfig::default())
    }

    #[test]
    fn test_prescale() {
        // 27 MHz calibrated oscillator at 50 Hz
        assert_eq!(prescale_for(27_000_000, 50), 131);
        // Nominal 25 MHz oscillator
        assert_eq!(prescale_for(25_000_000, 50), 121);
        // Clamped at both ends
        assert_eq!(prescale_for(25_000_000, 10), 255);
        assert_eq!(prescale_for(25_000_000, 5000), 3);
    }

    #[test]
    fn test_init_sequence() {
        let mut pca = shield();
        pca.init(&mut NoDelay).unwrap();

        let i2c = pca.release();
        assert!(i2c.writes.iter().all(|(addr, _)| *addr == 0x40));
        let frames: heapless::Vec<&[u8], 16> = i2c.writes.iter().map(|(_, d)| d.as_slice()).collect();
        assert_eq!(
            frames.as_slice(),
            [
                &[reg::MODE1, mode1::RESTART][..],
                &[reg::MODE2, MODE2_OUTDRV],
                &[reg::MODE1, mode1::SLEEP],
                &[reg::PRE_SCALE, 131],
                // MODE1 still reads back the reset value
                &[reg::MODE1, mode1::RESTART],
                &[reg::MODE1, mode1::RESTART | mode1::AUTO_INCREMENT],
            ]
        );
    }

    #[test]
    fn test_micros_to_ticks() {
        let pca = shield();
        // 1500 µs * 27 MHz / (1e6 * 132)
        assert_eq!(pca.micros_to_ticks(1500), 306);
        assert_eq!(pca.micros_to_ticks(500), 102);
        assert_eq!(pca.micros_to_ticks(2500), 511);
        // A full period and beyond saturates
        assert_eq!(pca.micros_to_ticks(u16::MAX), 4095);
    }

    #[test]
    fn test_write_channel() {
        let mut pca = shield();
        pca.write_microseconds(2, 1500);
        let i2c = pca.release();
        let (addr, frame) = i2c.writes.last().unwrap();
        assert_eq!(*addr, 0x40);
        // LED2_ON_L = 0x06 + 8; on = 0, off = 306 = 0x0132
        assert_eq!(frame.as_slice(), &[0x0E, 0x00, 0x00, 0x32, 0x01]);
    }

    #[test]
    fn test_invalid_channel() {
        let mut pca = shield();
        assert_eq!(
            pca.write_micros(16, 1500),
            Err(Pca9685Error::InvalidChannel(16))
        );
        pca.write_microseconds(300, 1500);
        assert_eq!(pca.write_errors(), 1);
    }

    #[test]
    fn test_bus_failure_is_counted() {
        let mut i2c = MockI2c::new();
        i2c.fail = true;
        let mut pca = Pca9685::new(i2c, &ShieldConfig::default());
        assert!(pca.init(&mut NoDelay).is_err());

        pca.write_microseconds(0, 1000);
        pca.write_microseconds(1, 1000);
        assert_eq!(pca.write_errors(), 2);
        assert_eq!(pca.count(), CHANNELS);
    }
}
