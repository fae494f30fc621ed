//! Rotary encoder quadrature decoding.
//!
//! Edge-triggered: the decoder is handed the level of both phases as
//! sampled when an edge fired on one of them. No debounce is applied;
//! every edge resolves to exactly one step.
//!
//! ```text
//! Phase A falling: B low -> Right, B high -> Left
//! Phase A rising:  B low -> Left,  B high -> Right
//! Phase B edges mirror this (Right when the levels differ).
//! ```
//!
//! Ambiguous inputs (both phases switching at once) still yield a
//! deterministic direction, possibly the wrong one.

use crate::keys::KeyCode;

/// Encoder phase line that produced an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    A,
    B,
}

/// Direction of a single encoder step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Counter-clockwise.
    Left,
    /// Clockwise.
    Right,
}

impl Direction {
    /// Key synthesized for this step.
    pub fn key(self) -> KeyCode {
        match self {
            Direction::Left => KeyCode::LEFT,
            Direction::Right => KeyCode::RIGHT,
        }
    }
}

/// Classify one edge. `phase_a` / `phase_b` are the levels after the edge
/// (`true` = high).
pub fn decode(fired: Phase, phase_a: bool, phase_b: bool) -> Direction {
    let in_step = phase_a == phase_b;
    let clockwise = match fired {
        Phase::A => in_step,
        Phase::B => !in_step,
    };
    if clockwise {
        Direction::Right
    } else {
        Direction::Left
    }
}
