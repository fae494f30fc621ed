//! Keypad front end for the tx-keypad transmitter firmware.
//!
//! Turns bouncy matrix-key and rotary-encoder edges into a clean stream of
//! logical key events:
//!
//! - [`edge`]: interrupt side, queues rescans and decoded rotary steps
//! - [`keypad`]: debounce / repeat state machine run by the keypad task
//! - [`matrix`]: raw matrix scan and switch reads over `embedded-hal`
//! - [`scheduler`]: one-shot rescan timer contract and a tick-driven queue
//!
//! Everything here is `no_std` and hardware independent, so it builds and
//! tests on the host: `cargo test --lib` / `cargo test`.
//!
//! Note: The embedded binary lives in main.rs and needs the `embedded`
//! feature.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod command;
pub mod config;
pub mod edge;
pub mod error;
pub mod keypad;
pub mod keys;
pub mod matrix;
pub mod rotary;
pub mod scheduler;

pub use command::Command;
pub use edge::EdgeQueue;
pub use error::Error;
pub use keypad::{Beeper, KeySink, Keypad, Phase, Timing};
pub use keys::{KeyCode, Polarity, Switches};
pub use matrix::{GpioMatrix, KeyMatrix};
pub use rotary::Direction;
pub use scheduler::{Scheduler, TaskId, Tick, TimerQueue, KEYPAD_TASK};
