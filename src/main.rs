//! tx-keypad firmware entry point (STM32F103).
//!
//! Task layout:
//!   - `keypad_task`: owns the matrix and the keypad state machine. Wakes on
//!     a row falling edge, a queued edge command or its rescan timer, and
//!     runs every pending invocation to completion. Row edges are only armed
//!     while the task waits, so an idle keypad re-reads the rows after each
//!     wake and arms a rescan if a key went down meanwhile.
//!   - `rotary_task`: waits for encoder phase A edges and queues steps.
//!   - `ui_task`: consumes logical key events.
//!
//! Pin assignments are listed in `config.rs`.

#![no_std]
#![no_main]

use core::future::pending;

use defmt::{info, trace, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{select3, Either3};
use embassy_stm32::exti::ExtiInput;
use embassy_stm32::gpio::{Input, Level, OutputOpenDrain, Pull, Speed};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_time::{Delay, Duration, Instant, Timer};
use {defmt_rtt as _, panic_probe as _};

use tx_keypad::config::{EDGE_QUEUE_DEPTH, KEY_EVENT_DEPTH, KEY_HOLDOFF};
use tx_keypad::rotary::Phase as RotaryPhase;
use tx_keypad::{
    Beeper, Command, EdgeQueue, GpioMatrix, KeyCode, KeySink, Keypad, Phase, Scheduler, TaskId,
    Tick, KEYPAD_TASK,
};

type Board = GpioMatrix<ExtiInput<'static>, OutputOpenDrain<'static>, Input<'static>, Delay>;

/// Edge interrupts -> keypad task.
static EDGES: EdgeQueue<EDGE_QUEUE_DEPTH> = EdgeQueue::new();

/// Keypad task -> UI task.
static KEY_EVENTS: Channel<CriticalSectionRawMutex, KeyCode, KEY_EVENT_DEPTH> = Channel::new();

/// The keypad's one-shot rescan timer on embassy-time.
struct RescanTimer {
    armed: Option<(Instant, u32)>,
}

impl Scheduler for RescanTimer {
    fn schedule(&mut self, _task: TaskId, payload: u32, delay: Tick) {
        let at = Instant::now() + Duration::from_millis(delay as u64);
        self.armed = Some((at, payload));
    }

    fn deschedule(&mut self, _task: TaskId) {
        self.armed = None;
    }
}

impl RescanTimer {
    /// Resolve with the payload once the armed deadline passes.
    async fn fired(&mut self) -> u32 {
        match self.armed {
            Some((at, payload)) => {
                Timer::at(at).await;
                self.armed = None;
                payload
            }
            None => pending().await,
        }
    }
}

/// Forwards key events to the UI task without blocking.
struct UiSink;

impl KeySink for UiSink {
    fn on_key_event(&mut self, key: KeyCode) {
        if KEY_EVENTS.try_send(key).is_err() {
            warn!("UI: event queue full, dropped {:?}", key);
        }
    }
}

/// Key click; the buzzer driver is owned by the audio subsystem.
struct KeyClick;

impl Beeper for KeyClick {
    fn key_tone(&mut self) {
        trace!("Keypad: click");
    }
}

#[embassy_executor::task]
async fn keypad_task(mut keypad: Keypad<Board, KeyClick>) {
    let mut timer = RescanTimer { armed: None };
    let mut ui = UiSink;

    loop {
        let wake = {
            let [r0, r1, r2] = keypad.matrix_mut().rows_mut();
            let row_edge = select3(
                r0.wait_for_falling_edge(),
                r1.wait_for_falling_edge(),
                r2.wait_for_falling_edge(),
            );
            select3(row_edge, EDGES.next(), timer.fired()).await
        };

        let cmd = match wake {
            Either3::First(_) => {
                if let Err(e) = EDGES.on_matrix_edge() {
                    warn!("Keypad: row edge dropped: {:?}", e);
                }
                None
            }
            Either3::Second(cmd) => Some(cmd),
            Either3::Third(payload) => match Command::try_from(payload) {
                Ok(cmd) => Some(cmd),
                Err(e) => {
                    warn!("Keypad: {:?}", e);
                    None
                }
            },
        };

        let now = Instant::now().as_millis() as Tick;
        if let Some(cmd) = cmd {
            keypad.process(cmd, now, &mut timer, &mut ui);
        }
        while let Some(cmd) = EDGES.try_next() {
            keypad.process(cmd, now, &mut timer, &mut ui);
        }

        // Catch a press that landed while the edges were disarmed.
        if keypad.phase() == Phase::Idle && timer.armed.is_none() {
            let rows = keypad.matrix_mut().rows_mut();
            if rows.iter_mut().any(|r| r.is_low()) {
                trace!("Keypad: row low while idle, rescan");
                timer.schedule(KEYPAD_TASK, Command::Rescan.into(), KEY_HOLDOFF);
            }
        }
    }
}

#[embassy_executor::task]
async fn rotary_task(mut phase_a: ExtiInput<'static>, phase_b: Input<'static>) {
    loop {
        phase_a.wait_for_any_edge().await;
        let a = phase_a.is_high();
        let b = phase_b.is_high();
        match EDGES.on_rotary_edge(a, b, RotaryPhase::A) {
            Ok(dir) => trace!("Rotary: {:?}", dir),
            Err(e) => warn!("Rotary: step dropped: {:?}", e),
        }
    }
}

#[embassy_executor::task]
async fn ui_task() {
    loop {
        let key = KEY_EVENTS.receive().await;
        info!("UI: key {:?}", key);
    }
}

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    let p = embassy_stm32::init(Default::default());
    info!("tx-keypad starting");

    let rows = [
        ExtiInput::new(p.PB12, p.EXTI12, Pull::Up),
        ExtiInput::new(p.PB13, p.EXTI13, Pull::Up),
        ExtiInput::new(p.PB14, p.EXTI14, Pull::Up),
    ];
    let cols = [
        OutputOpenDrain::new(p.PB8, Level::Low, Speed::Low),
        OutputOpenDrain::new(p.PB9, Level::Low, Speed::Low),
        OutputOpenDrain::new(p.PB10, Level::Low, Speed::Low),
        OutputOpenDrain::new(p.PB11, Level::Low, Speed::Low),
    ];
    let switches = [
        Input::new(p.PB0, Pull::Up),
        Input::new(p.PB1, Pull::Up),
        Input::new(p.PB5, Pull::Up),
        Input::new(p.PC13, Pull::Up),
    ];
    let phase_a = ExtiInput::new(p.PC15, p.EXTI15, Pull::None);
    let phase_b = Input::new(p.PC14, Pull::None);

    let mut keypad = Keypad::new(GpioMatrix::new(rows, cols, switches, Delay), KeyClick);
    info!("Switches: {:?}", keypad.read_switches());

    spawner.spawn(keypad_task(keypad)).unwrap();
    spawner.spawn(rotary_task(phase_a, phase_b)).unwrap();
    spawner.spawn(ui_task()).unwrap();
}
