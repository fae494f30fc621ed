//! Unit tests for the debounce / repeat state machine.
//!
//! The matrix is faked, and the rescan timer is a `TimerQueue` driven by
//! hand so every transition can be checked tick by tick.

use super::*;
use crate::scheduler::TimerQueue;

#[derive(Default)]
struct FakeMatrix {
    held: Option<KeyCode>,
    scans: usize,
    switch_levels: u8,
}

impl KeyMatrix for FakeMatrix {
    fn scan_active_key(&mut self) -> Option<KeyCode> {
        self.scans += 1;
        self.held
    }

    fn read_switch_bits(&mut self) -> u8 {
        self.switch_levels
    }
}

#[derive(Default)]
struct CountingBeeper {
    enabled: bool,
    tones: usize,
}

impl Beeper for CountingBeeper {
    fn tones_enabled(&self) -> bool {
        self.enabled
    }

    fn key_tone(&mut self) {
        self.tones += 1;
    }
}

struct Rig {
    keypad: Keypad<FakeMatrix, CountingBeeper>,
    timers: TimerQueue<2>,
    events: Vec<(Tick, KeyCode)>,
    now: Tick,
}

impl Rig {
    fn new() -> Self {
        let beeper = CountingBeeper {
            enabled: true,
            tones: 0,
        };
        Self {
            keypad: Keypad::new(FakeMatrix::default(), beeper),
            timers: TimerQueue::new(),
            events: Vec::new(),
            now: 0,
        }
    }

    fn hold(&mut self, key: Option<KeyCode>) {
        self.keypad.matrix_mut().held = key;
    }

    fn scans(&mut self) -> usize {
        self.keypad.matrix_mut().scans
    }

    /// Deliver a command at the current tick.
    fn invoke(&mut self, cmd: Command) {
        let now = self.now;
        let events = &mut self.events;
        self.timers.advance(now);
        self.keypad
            .process(cmd, now, &mut self.timers, &mut |k| events.push((now, k)));
    }

    /// Advance one tick, wrapping, and fire whatever came due.
    fn tick(&mut self) {
        self.now = self.now.wrapping_add(1);
        self.timers.advance(self.now);
        while let Some((task, payload)) = self.timers.pop_due() {
            assert_eq!(task, KEYPAD_TASK);
            let cmd = Command::try_from(payload).unwrap();
            self.invoke(cmd);
        }
    }

    /// Run the timer queue tick by tick up to and including `until`.
    fn run_until(&mut self, until: Tick) {
        while self.now < until {
            self.tick();
        }
    }

    fn keys(&self) -> Vec<KeyCode> {
        self.events.iter().map(|&(_, k)| k).collect()
    }
}

#[test]
fn idle_rescan_with_no_key_stays_idle() {
    let mut rig = Rig::new();
    rig.invoke(Command::Rescan);
    assert_eq!(rig.keypad.phase(), Phase::Idle);
    assert!(rig.events.is_empty());
    assert!(rig.timers.is_empty());
    assert_eq!(rig.scans(), 1);
}

#[test]
fn fresh_press_latches_tones_and_rearms() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::OK));
    rig.now = 3;
    rig.invoke(Command::Rescan);

    assert_eq!(rig.events, [(3, KeyCode::OK)]);
    assert_eq!(rig.keypad.phase(), Phase::PressedInitial { since: 3 });
    assert_eq!(rig.keypad.pending(), KeyCode::OK);
    assert_eq!(rig.keypad.beeper.tones, 1);
    assert_eq!(rig.timers.due_in(KEYPAD_TASK), Some(KEY_REPEAT_TIME));
}

#[test]
fn edge_inside_holdoff_reschedules_without_scanning() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::OK));
    rig.invoke(Command::Rescan);
    assert_eq!(rig.scans(), 1);

    for t in 1..KEY_HOLDOFF {
        rig.now = t;
        rig.invoke(Command::Rescan);
        assert_eq!(rig.scans(), 1, "scanned at t={t}");
        assert_eq!(rig.keypad.phase(), Phase::Debouncing);
        assert_eq!(rig.timers.due_in(KEYPAD_TASK), Some(KEY_HOLDOFF - t));
    }

    // The rescheduled rescan runs once the holdoff is over.
    rig.run_until(KEY_HOLDOFF);
    assert_eq!(rig.scans(), 2);
    assert_eq!(rig.keypad.phase(), Phase::PressedInitial { since: 0 });
    assert_eq!(rig.events.len(), 1);
}

#[test]
fn release_returns_to_idle_and_stops_rescanning() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::CH1_UP));
    rig.invoke(Command::Rescan);
    rig.hold(None);
    rig.run_until(KEY_REPEAT_TIME);

    assert_eq!(rig.keypad.phase(), Phase::Idle);
    assert!(!rig.timers.is_pending(KEYPAD_TASK));
    assert_eq!(rig.keys(), [KeyCode::CH1_UP]);
}

#[test]
fn non_trim_key_never_repeats() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::CANCEL));
    rig.invoke(Command::Rescan);
    rig.run_until(KEY_REPEAT_DELAY + 10 * KEY_REPEAT_TIME);

    assert_eq!(rig.keys(), [KeyCode::CANCEL]);
    // Still being observed so a stuck key eventually clears.
    assert!(rig.timers.is_pending(KEYPAD_TASK));
}

#[test]
fn trim_key_repeats_every_interval_after_delay() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::CH2_DN));
    rig.invoke(Command::Rescan);
    rig.run_until(KEY_REPEAT_DELAY + 3 * KEY_REPEAT_TIME);

    let times: Vec<Tick> = rig.events.iter().map(|&(t, _)| t).collect();
    assert_eq!(times, [0, 500, 600, 700, 800]);
    assert!(rig.keys().iter().all(|&k| k == KeyCode::CH2_DN));
    assert_eq!(
        rig.keypad.phase(),
        Phase::Repeating {
            key: KeyCode::CH2_DN
        }
    );
    // Only the initial press beeps.
    assert_eq!(rig.keypad.beeper.tones, 1);
}

#[test]
fn sel_hold_yields_exactly_one_menu() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::SEL));
    rig.invoke(Command::Rescan);
    rig.run_until(KEY_REPEAT_DELAY + 20 * KEY_REPEAT_TIME);

    assert_eq!(rig.keys(), [KeyCode::SEL, KeyCode::MENU]);
    assert_eq!(rig.events[1].0, KEY_REPEAT_DELAY);
    assert!(rig.keypad.poll(KeyCode::MENU));
    assert!(rig.keypad.poll(KeyCode::SEL));
}

#[test]
fn poll_is_test_and_clear_per_bit() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::OK));
    rig.invoke(Command::Rescan);
    rig.invoke(Command::Rotary(Direction::Left));

    assert!(!rig.keypad.poll(KeyCode::CANCEL));
    assert!(rig.keypad.poll(KeyCode::OK));
    assert!(!rig.keypad.poll(KeyCode::OK));
    assert_eq!(rig.keypad.pending(), KeyCode::LEFT);
    assert!(rig.keypad.poll(KeyCode::LEFT));
    assert!(rig.keypad.pending().is_empty());
}

#[test]
fn rotary_steps_emit_once_each_and_leave_press_state_alone() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::CH3_UP));
    rig.invoke(Command::Rescan);
    let due = rig.timers.due_in(KEYPAD_TASK);

    rig.now = 2;
    rig.invoke(Command::Rotary(Direction::Right));
    rig.invoke(Command::Rotary(Direction::Right));

    assert_eq!(rig.keys(), [KeyCode::CH3_UP, KeyCode::RIGHT, KeyCode::RIGHT]);
    assert_eq!(rig.keypad.phase(), Phase::PressedInitial { since: 0 });
    assert_eq!(rig.timers.due_in(KEYPAD_TASK), due.map(|d| d - 2));
    assert_eq!(rig.scans(), 1);
    assert_eq!(rig.keypad.beeper.tones, 3);
}

#[test]
fn cancel_repeat_stops_events_and_allows_fresh_press() {
    let mut rig = Rig::new();
    rig.hold(Some(KeyCode::CH4_UP));
    rig.invoke(Command::Rescan);
    rig.run_until(KEY_REPEAT_DELAY + KEY_REPEAT_TIME);
    assert_eq!(rig.events.len(), 3);

    rig.keypad.cancel_repeat(&mut rig.timers);
    assert_eq!(rig.keypad.phase(), Phase::Idle);
    rig.run_until(KEY_REPEAT_DELAY + 10 * KEY_REPEAT_TIME);
    assert_eq!(rig.events.len(), 3);

    // Idempotent.
    rig.keypad.cancel_repeat(&mut rig.timers);

    // The next edge starts a brand new press.
    rig.invoke(Command::Rescan);
    assert_eq!(rig.events.len(), 4);
    assert_eq!(
        rig.keypad.phase(),
        Phase::PressedInitial { since: rig.now }
    );
}

#[test]
fn silent_beeper_policy_suppresses_tones() {
    let mut rig = Rig::new();
    rig.keypad.beeper.enabled = false;
    rig.hold(Some(KeyCode::OK));
    rig.invoke(Command::Rescan);
    rig.invoke(Command::Rotary(Direction::Right));
    assert_eq!(rig.events.len(), 2);
    assert_eq!(rig.keypad.beeper.tones, 0);
}

#[test]
fn custom_timing_is_honoured() {
    let timing = Timing {
        holdoff: 2,
        repeat_delay: 20,
        repeat_interval: 5,
    };
    let mut keypad = Keypad::with_timing(FakeMatrix::default(), (), timing);
    let mut timers: TimerQueue<2> = TimerQueue::new();
    let mut events = Vec::new();
    keypad.matrix_mut().held = Some(KeyCode::CH1_DN);

    keypad.process(Command::Rescan, 0, &mut timers, &mut |k| events.push(k));
    for now in 1..=30 {
        timers.advance(now);
        while let Some((_, payload)) = timers.pop_due() {
            let cmd = Command::try_from(payload).unwrap();
            keypad.process(cmd, now, &mut timers, &mut |k| events.push(k));
        }
    }
    // Press at 0, repeats at 20, 25, 30.
    assert_eq!(events.len(), 4);
}

#[test]
fn switches_use_configured_polarity() {
    let mut keypad = Keypad::new(FakeMatrix::default(), ());
    keypad.matrix_mut().switch_levels = 0b1110;
    assert_eq!(keypad.read_switches(), Switches::SWA);

    let mut keypad = keypad.with_switch_polarity(Polarity::ActiveHigh);
    assert_eq!(
        keypad.read_switches(),
        Switches::SWB | Switches::SWC | Switches::SWD
    );
}

#[test]
fn trim_repeat_cadence_survives_tick_wraparound() {
    let mut rig = Rig::new();
    let start = Tick::MAX - 250;
    rig.now = start;
    rig.hold(Some(KeyCode::CH2_DN));
    rig.invoke(Command::Rescan);

    for _ in 0..KEY_REPEAT_DELAY + 3 * KEY_REPEAT_TIME {
        rig.tick();
    }

    let offsets: Vec<Tick> = rig
        .events
        .iter()
        .map(|&(t, _)| t.wrapping_sub(start))
        .collect();
    assert_eq!(offsets, [0, 500, 600, 700, 800]);
    assert!(rig.now < start);
    assert_eq!(
        rig.keypad.phase(),
        Phase::Repeating {
            key: KeyCode::CH2_DN
        }
    );
}
