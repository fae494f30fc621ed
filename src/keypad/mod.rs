//! Debounce & repeat state machine.
//!
//! The keypad task runs [`Keypad::process`] once per invocation, either
//! because an edge was queued by the interrupt side or because its own
//! rescan timer fired. Each rescan:
//!
//! 1. Backs off while the last accepted press is younger than the holdoff,
//!    rescheduling itself for the remainder (contact bounce).
//! 2. Scans the matrix, then cancels any pending rescan. Scanning toggles
//!    the columns and re-fires row edges, so the timer is re-armed below
//!    only when a key is still down.
//! 3. Released: back to idle, nothing emitted.
//! 4. Held: rescan again after the repeat interval, then
//!    - fresh press: latch, tone, emit;
//!    - inside the repeat delay: nothing;
//!    - past the repeat delay: SEL emits one MENU then goes quiet, trim
//!      keys emit on every rescan, all other keys stay quiet.
//!
//! Rotary steps bypass all of this: each one is emitted immediately and
//! leaves the press state and the rescan timer alone.

use crate::command::Command;
use crate::config::{
    KEY_HOLDOFF, KEY_REPEAT_DELAY, KEY_REPEAT_TIME, KEY_TONE_ENABLED, SWITCH_POLARITY,
};
use crate::keys::{KeyCode, Polarity, Switches};
use crate::matrix::KeyMatrix;
use crate::rotary::Direction;
use crate::scheduler::{Scheduler, Tick, KEYPAD_TASK};

#[cfg(test)]
mod tests;

/// Consumer of logical key events (the UI layer).
///
/// Called synchronously from the keypad task; must not block.
pub trait KeySink {
    fn on_key_event(&mut self, key: KeyCode);
}

impl<F: FnMut(KeyCode)> KeySink for F {
    fn on_key_event(&mut self, key: KeyCode) {
        self(key)
    }
}

/// Audible key feedback and the policy deciding whether it plays.
pub trait Beeper {
    /// Whether key presses should produce a tone.
    fn tones_enabled(&self) -> bool {
        KEY_TONE_ENABLED
    }

    fn key_tone(&mut self);
}

/// Silent: no tones.
impl Beeper for () {
    fn tones_enabled(&self) -> bool {
        false
    }

    fn key_tone(&mut self) {}
}

/// Debounce and repeat timing, in ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub holdoff: Tick,
    pub repeat_delay: Tick,
    pub repeat_interval: Tick,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            holdoff: KEY_HOLDOFF,
            repeat_delay: KEY_REPEAT_DELAY,
            repeat_interval: KEY_REPEAT_TIME,
        }
    }
}

/// Press tracking between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RepeatState {
    Idle,
    /// Accepted at `since`, repeat not started.
    Pressed { since: Tick },
    /// Repeat delay passed; `key` is the last key handled by the repeat
    /// policy.
    Repeating { key: KeyCode, since: Tick },
}

impl RepeatState {
    fn since(&self) -> Option<Tick> {
        match *self {
            RepeatState::Idle => None,
            RepeatState::Pressed { since } | RepeatState::Repeating { since, .. } => Some(since),
        }
    }
}

/// Observable state of the keypad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    /// No key down, nothing pending.
    Idle,
    /// An edge arrived inside the holdoff; a rescan is scheduled.
    Debouncing,
    /// A key was latched at `since` and is inside its repeat delay.
    PressedInitial { since: Tick },
    /// The repeat delay has passed for `key`.
    Repeating { key: KeyCode },
}

/// Keypad front end: debounce, repeat, pending-key latch and switches.
pub struct Keypad<M, B> {
    matrix: M,
    beeper: B,
    timing: Timing,
    polarity: Polarity,
    state: RepeatState,
    debouncing: bool,
    pending: KeyCode,
}

impl<M: KeyMatrix, B: Beeper> Keypad<M, B> {
    /// Keypad with the default timing and switch polarity.
    pub fn new(matrix: M, beeper: B) -> Self {
        Self::with_timing(matrix, beeper, Timing::default())
    }

    pub fn with_timing(matrix: M, beeper: B, timing: Timing) -> Self {
        Self {
            matrix,
            beeper,
            timing,
            polarity: SWITCH_POLARITY,
            state: RepeatState::Idle,
            debouncing: false,
            pending: KeyCode::NONE,
        }
    }

    /// Override the switch polarity (board dependent).
    pub fn with_switch_polarity(mut self, polarity: Polarity) -> Self {
        self.polarity = polarity;
        self
    }

    /// Run one keypad invocation at tick `now`.
    pub fn process<S, U>(&mut self, cmd: Command, now: Tick, scheduler: &mut S, sink: &mut U)
    where
        S: Scheduler,
        U: KeySink,
    {
        match cmd {
            Command::Rescan => self.rescan(now, scheduler, sink),
            Command::Rotary(dir) => self.rotary_step(dir, sink),
        }
    }

    /// Test-and-clear: `true` if any bit of `key` was pressed since the
    /// last poll of that bit.
    pub fn poll(&mut self, key: KeyCode) -> bool {
        if self.pending.intersects(key) {
            self.pending.remove(key);
            true
        } else {
            false
        }
    }

    /// Keys pressed and not yet polled.
    pub fn pending(&self) -> KeyCode {
        self.pending
    }

    /// Current switch positions, read fresh from the hardware.
    pub fn read_switches(&mut self) -> Switches {
        self.matrix.read_switches(self.polarity)
    }

    /// Stop any press or repeat in flight and cancel the rescan timer.
    pub fn cancel_repeat<S: Scheduler>(&mut self, scheduler: &mut S) {
        if self.state != RepeatState::Idle {
            debug!("Keypad: repeat cancelled");
        }
        self.state = RepeatState::Idle;
        self.debouncing = false;
        scheduler.deschedule(KEYPAD_TASK);
    }

    pub fn phase(&self) -> Phase {
        if self.debouncing {
            return Phase::Debouncing;
        }
        match self.state {
            RepeatState::Idle => Phase::Idle,
            RepeatState::Pressed { since } => Phase::PressedInitial { since },
            RepeatState::Repeating { key, .. } => Phase::Repeating { key },
        }
    }

    pub fn matrix_mut(&mut self) -> &mut M {
        &mut self.matrix
    }

    fn rescan<S: Scheduler, U: KeySink>(&mut self, now: Tick, scheduler: &mut S, sink: &mut U) {
        if let Some(since) = self.state.since() {
            let age = now.wrapping_sub(since);
            if age < self.timing.holdoff {
                let wait = self.timing.holdoff - age;
                trace!("Keypad: holdoff, rescan in {}", wait);
                self.debouncing = true;
                scheduler.schedule(KEYPAD_TASK, Command::Rescan.into(), wait);
                return;
            }
        }
        self.debouncing = false;

        let scanned = self.matrix.scan_active_key();
        scheduler.deschedule(KEYPAD_TASK);

        let Some(key) = scanned else {
            if self.state != RepeatState::Idle {
                debug!("Keypad: released");
            }
            self.state = RepeatState::Idle;
            return;
        };
        debug_assert!(key.is_single());

        // Keep watching a held key even if no further edge arrives.
        scheduler.schedule(KEYPAD_TASK, Command::Rescan.into(), self.timing.repeat_interval);

        match self.state {
            RepeatState::Idle => {
                debug!("Keypad: press {:?}", key);
                self.state = RepeatState::Pressed { since: now };
                self.latch(key, true, sink);
            }
            RepeatState::Pressed { since } => {
                if now.wrapping_sub(since) < self.timing.repeat_delay {
                    return;
                }
                if key == KeyCode::SEL {
                    debug!("Keypad: SEL held, MENU");
                    self.state = RepeatState::Repeating { key, since };
                    self.latch(KeyCode::MENU, false, sink);
                } else if key.is_trim() {
                    self.state = RepeatState::Repeating { key, since };
                    self.latch(key, false, sink);
                }
            }
            RepeatState::Repeating { since, .. } => {
                // SEL already produced its MENU; only trims repeat.
                if key.is_trim() {
                    trace!("Keypad: repeat {:?}", key);
                    self.state = RepeatState::Repeating { key, since };
                    self.latch(key, false, sink);
                }
            }
        }
    }

    fn rotary_step<U: KeySink>(&mut self, dir: Direction, sink: &mut U) {
        trace!("Keypad: rotary {:?}", dir);
        self.latch(dir.key(), true, sink);
    }

    fn latch<U: KeySink>(&mut self, key: KeyCode, tone: bool, sink: &mut U) {
        self.pending |= key;
        if tone && self.beeper.tones_enabled() {
            self.beeper.key_tone();
        }
        sink.on_key_event(key);
    }
}
