//! Keypad task invocation payloads.
//!
//! The scheduler carries a bare `u32` payload: 0 asks for a rescan of the
//! matrix, 1 and 2 carry a rotary step (right / left).

use crate::error::Error;
use crate::rotary::Direction;

/// What a keypad invocation should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Scan the matrix and advance the debounce / repeat state.
    Rescan,
    /// Emit one rotary step.
    Rotary(Direction),
}

impl From<Command> for u32 {
    fn from(cmd: Command) -> u32 {
        match cmd {
            Command::Rescan => 0,
            Command::Rotary(Direction::Right) => 1,
            Command::Rotary(Direction::Left) => 2,
        }
    }
}

impl TryFrom<u32> for Command {
    type Error = Error;

    fn try_from(payload: u32) -> Result<Self, Error> {
        match payload {
            0 => Ok(Command::Rescan),
            1 => Ok(Command::Rotary(Direction::Right)),
            2 => Ok(Command::Rotary(Direction::Left)),
            other => Err(Error::UnknownPayload(other)),
        }
    }
}
