//! Edge notifier - the interrupt side of the keypad.
//!
//! Edge interrupts never run keypad logic. They only record what happened
//! as a [`Command`] in an interrupt-safe queue that the cooperative keypad
//! task drains:
//!
//! - a falling edge on any matrix row queues one `Rescan` (further edges
//!   are absorbed while that rescan is still waiting),
//! - every rotary phase edge is decoded on the spot and queued as its own
//!   `Rotary` step, so fast rotation is never merged.
//!
//! The HAL clears the line's pending flag before the handler runs.

use core::sync::atomic::{AtomicBool, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::command::Command;
use crate::error::Error;
use crate::rotary::{self, Direction, Phase};

/// Interrupt -> keypad task command queue.
pub struct EdgeQueue<const N: usize> {
    commands: Channel<CriticalSectionRawMutex, Command, N>,
    rescan_queued: AtomicBool,
}

impl<const N: usize> EdgeQueue<N> {
    pub const fn new() -> Self {
        Self {
            commands: Channel::new(),
            rescan_queued: AtomicBool::new(false),
        }
    }

    /// A matrix row line changed. Call from interrupt context.
    pub fn on_matrix_edge(&self) -> Result<(), Error> {
        if self.rescan_queued.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        self.commands.try_send(Command::Rescan).map_err(|_| {
            self.rescan_queued.store(false, Ordering::Release);
            Error::QueueFull
        })
    }

    /// A rotary phase line changed. `phase_a` / `phase_b` are the levels
    /// sampled right after the edge. Call from interrupt context.
    pub fn on_rotary_edge(
        &self,
        phase_a: bool,
        phase_b: bool,
        fired: Phase,
    ) -> Result<Direction, Error> {
        let dir = rotary::decode(fired, phase_a, phase_b);
        self.commands
            .try_send(Command::Rotary(dir))
            .map_err(|_| Error::QueueFull)?;
        Ok(dir)
    }

    /// Take the oldest queued command without waiting.
    pub fn try_next(&self) -> Option<Command> {
        let cmd = self.commands.try_receive().ok()?;
        Some(self.taken(cmd))
    }

    /// Wait for the next queued command.
    pub async fn next(&self) -> Command {
        let cmd = self.commands.receive().await;
        self.taken(cmd)
    }

    /// Number of queued commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn taken(&self, cmd: Command) -> Command {
        if cmd == Command::Rescan {
            self.rescan_queued.store(false, Ordering::Release);
        }
        cmd
    }
}

impl<const N: usize> Default for EdgeQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}
