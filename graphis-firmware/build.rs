//! Build script for graphis-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml and embeds it as postcard bytes

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use graphis_core::config::{ConfigError, MachineConfig};

fn main() {
    setup_linker();
    encode_config();
}

/// Set up linker search paths and scripts
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Parse, validate and encode machine.toml into `$OUT_DIR/machine.bin`
fn encode_config() {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: machine.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a machine.toml configuration file.        ║\n\
            ║  Please create one in the graphis-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read machine.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Syntax and field types are checked by deserializing straight into the
    // firmware's config types
    let config: MachineConfig = match toml::from_str(&config_content) {
        Ok(config) => config,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid machine.toml                                     ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                {}\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&e.to_string())
            );
        }
    };

    if let Err(e) = config.validate() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid machine configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            format_error_lines(&describe(&config, e))
        );
    }

    let bytes = match postcard::to_allocvec(&config) {
        Ok(bytes) => bytes,
        Err(e) => panic!("failed to encode machine.toml: {}", e),
    };

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("machine.bin"), &bytes).unwrap();

    println!(
        "cargo:warning=machine.toml validated: {} steppers, {} loose servos, shield {} ({} bytes)",
        config.steppers.len(),
        config.loose_servos.len(),
        if config.shield.enabled { "on" } else { "off" },
        bytes.len()
    );
}

/// Human readable explanation of a validation error
fn describe(config: &MachineConfig, error: ConfigError) -> String {
    match error {
        ConfigError::VersionMismatch => format!(
            "version = {} is not supported by this firmware",
            config.version
        ),
        ConfigError::InvalidSpeed { stepper } => format!(
            "[[steppers]] #{} '{}': max_speed must be greater than 0",
            stepper, config.steppers[stepper].name
        ),
        ConfigError::InvalidAcceleration { stepper } => format!(
            "[[steppers]] #{} '{}': acceleration must be greater than 0",
            stepper, config.steppers[stepper].name
        ),
        ConfigError::DuplicateName => {
            "two steppers or two loose servos share the same name".to_string()
        }
        ConfigError::PwmFrequencyOutOfRange => format!(
            "[shield] pwm_freq_hz = {} is outside 24..=1526",
            config.shield.pwm_freq_hz
        ),
        ConfigError::InvalidBaudrate => "[serial] baudrate must be greater than 0".to_string(),
        ConfigError::Deserialize => "configuration could not be decoded".to_string(),
    }
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
