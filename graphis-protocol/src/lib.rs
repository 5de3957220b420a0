//! Graphis Actuator Command Protocol
//!
//! This crate defines the ASCII protocol spoken between the plotting host
//! and the controller board. Commands are terse, `;`-terminated and not
//! newline-delimited, so one read from the link may carry several of them.
//!
//! # Protocol Overview
//!
//! ```text
//! <type><index><op><value>;
//!
//!   s0=1500;   shield servo 0 -> 1500 µs
//!   l1=2000;   loose servo 1  -> 2000 µs
//!   t1=200;    stepper 1      -> absolute position 200
//!   i2?;       query sensor 2 -> replies "i2=<value>"
//! ```
//!
//! Replies are one line each. Data replies look like `i<index>=<value>`,
//! errors start with `!`, and successful set commands produce no reply.

#![cfg_attr(not(any(test, feature = "std")), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod reply;

pub use command::{parse, parse_bytes, parse_int_lenient, Command, CommandKind, ParseError};
pub use line::{LineBuffer, LineError, TERMINATOR};
pub use reply::{CommandError, Reply, REPLY_CAPACITY};
