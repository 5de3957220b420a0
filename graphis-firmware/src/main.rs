//! Graphis - Pen Plotter Actuator Firmware
//!
//! Main firmware binary for RP2040-based plotter rigs. Receives terse
//! `;`-terminated actuator commands from the host over UART and drives
//! steppers, servos and sensors without ever blocking the step loop.
//!
//! Named after the Greek "graphis" meaning "stylus" - the pen this
//! firmware steers across the canvas.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::i2c::{Config as I2cConfig, I2c};
use embassy_rp::peripherals::UART0;
use embassy_rp::pwm::{Config as PwmConfig, Pwm};
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::{Delay, Duration, Instant};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use graphis_core::config::MachineConfig;
use graphis_core::dispatch::clamp_servo_micros;
use graphis_core::registry::ActuatorRegistry;
use graphis_core::scheduler::{MotionScheduler, PollOutcome, SchedulerStats, DEFAULT_LINE_CAPACITY};
use graphis_core::sensor::{SensorArray, SteppersIdle};
use graphis_core::traits::{ByteStream, Sensor, ServoDriver};
use graphis_drivers::sensor::DigitalSensor;
use graphis_drivers::serial::SerialStream;
use graphis_drivers::servo::{Pca9685, PwmServoBank};
use graphis_drivers::stepper::{AccelStepper, StepperBank};

use crate::clock::EmbassyClock;

mod board;
mod clock;
mod machine;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; board::UART_TX_BUF]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; board::UART_RX_BUF]> = StaticCell::new();

/// Interval between statistics reports
const STATS_INTERVAL: Duration = Duration::from_secs(30);

/// Informational line sent to the host at boot (`#` lines are never data)
const BANNER: &str = "#graphis ready";

/// Main entry point
#[embassy_executor::main]
async fn main(_spawner: Spawner) {
    info!("Graphis firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = machine::load();
    machine::warn_unplaced(&config, board::STEPPERS, board::LOOSE_SERVOS);

    // Host link
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.serial.baudrate;
    let tx_buf = TX_BUF.init([0u8; board::UART_TX_BUF]);
    let rx_buf = RX_BUF.init([0u8; board::UART_RX_BUF]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let mut stream = SerialStream::new(uart);
    info!("UART initialized at {} baud", config.serial.baudrate);

    // Steppers: STEP/DIR pairs on GPIO 2/3 and 6/7
    let top_left = AccelStepper::from_config(
        Output::new(p.PIN_2, Level::Low),
        Output::new(p.PIN_3, Level::Low),
        Delay,
        &machine::stepper(&config, 0),
    );
    let top_right = AccelStepper::from_config(
        Output::new(p.PIN_6, Level::Low),
        Output::new(p.PIN_7, Level::Low),
        Delay,
        &machine::stepper(&config, 1),
    );
    let steppers = StepperBank::new([top_left, top_right], EmbassyClock);
    info!("{} steppers initialized", board::STEPPERS);

    // PCA9685 shield on I2C0
    let shield = if config.shield.enabled {
        let mut i2c_config = I2cConfig::default();
        i2c_config.frequency = board::I2C_FREQUENCY_HZ;
        let i2c = I2c::new_blocking(p.I2C0, p.PIN_5, p.PIN_4, i2c_config);

        let mut pca = Pca9685::new(i2c, &config.shield);
        match pca.init(&mut Delay) {
            Ok(()) => info!(
                "PCA9685 at 0x{:02x}: {} Hz, prescale {}",
                config.shield.address,
                config.shield.pwm_freq_hz,
                pca.prescale()
            ),
            // Keep going: writes will fail and be counted
            Err(e) => error!("PCA9685 init failed: {}", e),
        }
        Some(pca)
    } else {
        info!("No servo shield configured");
        None
    };

    // Pen servo on GPIO 10 (PWM slice 5, channel A)
    let mut pwm_config = PwmConfig::default();
    pwm_config.divider = board::SERVO_PWM_DIVIDER.into();
    pwm_config.top = board::SERVO_PWM_TOP;
    let pwm = Pwm::new_output_a(p.PWM_SLICE5, p.PIN_10, pwm_config);
    let (pen_channel, _) = pwm.split();
    let loose_servos = PwmServoBank::<_, { board::LOOSE_SERVOS }>::new([unwrap!(pen_channel)]);

    // Sensors
    let mut steppers_idle = SteppersIdle::new();
    let mut pen_contact = DigitalSensor::new_active_low(Input::new(p.PIN_15, Pull::Up));
    let sensors: [&mut dyn Sensor; board::SENSORS] = [&mut steppers_idle, &mut pen_contact];

    let mut registry = ActuatorRegistry::new(
        steppers,
        shield,
        loose_servos,
        SensorArray::new(sensors),
    );
    registry.setup();
    apply_initial_servo_positions(&mut registry.loose_servos, &config);

    let counts = registry.counts();
    info!(
        "Registry: {} steppers, {} shield servos, {} loose servos, {} sensors",
        counts.steppers, counts.shield_servos, counts.loose_servos, counts.sensors
    );

    let mut scheduler =
        MotionScheduler::<_, DEFAULT_LINE_CAPACITY>::new(EmbassyClock, config.scheduler);

    stream.write_line(BANNER);
    info!("Firmware running");

    // Nothing else shares the executor: the scheduler owns the core
    let mut reporter = Reporter::new(config.scheduler.read_timeout_ms);
    scheduler.run_forever(&mut registry, &mut stream, |outcome, stats| {
        reporter.observe(outcome, stats)
    });
}

/// Move loose servos to their configured rest pulse
fn apply_initial_servo_positions<S: ServoDriver>(servos: &mut S, config: &MachineConfig) {
    for (index, servo) in config.loose_servos.iter().enumerate().take(servos.count()) {
        if let Some(micros) = servo.initial_micros {
            let micros = clamp_servo_micros(micros as i32);
            servos.write_microseconds(index, micros);
            info!("Loose servo {} '{}' -> {} us", index, servo.name.as_str(), micros);
        }
    }
}

/// Turns scheduler outcomes into log lines
struct Reporter {
    read_timeout_ms: u32,
    last_report: Instant,
    last_overflows: u32,
}

impl Reporter {
    fn new(read_timeout_ms: u32) -> Self {
        Self {
            read_timeout_ms,
            last_report: Instant::now(),
            last_overflows: 0,
        }
    }

    fn observe(&mut self, outcome: &PollOutcome, stats: &SchedulerStats) {
        if stats.overflows != self.last_overflows {
            self.last_overflows = stats.overflows;
            warn!("Command longer than {} bytes discarded", DEFAULT_LINE_CAPACITY);
        }
        if outcome.stale {
            warn!(
                "Partial command idle for more than {} ms, still waiting",
                self.read_timeout_ms
            );
        }
        if let Some(gap) = outcome.late_gap_us {
            warn!("Stepper service gap of {} us", gap);
        }
        if outcome.errors > 0 {
            debug!("{} error replies sent this pass", outcome.errors);
        }

        if self.last_report.elapsed() >= STATS_INTERVAL {
            self.last_report = Instant::now();
            info!(
                "Stats: {} commands ({} rejected), {} bytes, worst gap {} us, {} late passes",
                stats.dispatch.executed + stats.dispatch.rejected,
                stats.dispatch.rejected,
                stats.bytes_received,
                stats.worst_lag_us,
                stats.late_passes
            );
        }
    }
}
