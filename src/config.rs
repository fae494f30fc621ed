//! Application-wide constants and compile-time configuration.
//!
//! All pin assignments, timing parameters and keypad policy live here so
//! they can be tuned in one place. Times are in scheduler ticks (1 ms).

use crate::keys::Polarity;
use crate::scheduler::Tick;

// Debounce & repeat timing

/// Minimum age of an accepted press before an edge may trigger a rescan.
pub const KEY_HOLDOFF: Tick = 10;

/// Ticks a key must stay held before auto-repeat starts.
pub const KEY_REPEAT_DELAY: Tick = 500;

/// Spacing between rescans of a held key, and between repeated events.
pub const KEY_REPEAT_TIME: Tick = 100;

// Matrix geometry
//
//   Columns (open-drain outputs)  → PB8..PB11
//   Rows    (pull-up, EXTI falling) → PB12..PB14
//   SWA, SWB, SWC                 → PB0, PB1, PB5
//   SWD                           → PC13
//   Rotary phase A (EXTI both)    → PC15
//   Rotary phase B                → PC14

/// Number of row lines read during a scan.
pub const MATRIX_ROWS: usize = 3;

/// Number of column lines driven during a scan.
pub const MATRIX_COLS: usize = 4;

/// Number of static toggle switches (SWA..SWD).
pub const SWITCH_COUNT: usize = 4;

/// Settle time after driving a column before the rows are sampled (µs).
pub const SCAN_SETTLE_US: u32 = 100;

/// Switch lines are pulled up; a closed switch reads low.
pub const SWITCH_POLARITY: Polarity = Polarity::ActiveLow;

// Handoff & feedback

/// Commands buffered between the edge interrupts and the keypad task.
pub const EDGE_QUEUE_DEPTH: usize = 8;

/// Key events buffered for the UI task.
pub const KEY_EVENT_DEPTH: usize = 8;

/// Play a short tone on each fresh key press.
pub const KEY_TONE_ENABLED: bool = true;
