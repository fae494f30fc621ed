//! Raw input source - key matrix scanning and switch reads.
//!
//! Wiring:
//!   - Columns are open-drain outputs. At rest they are all driven low so
//!     that closing any key pulls its row low and fires a row edge.
//!   - Rows are inputs pulled high externally. A '0' on a row while one
//!     column is low means the key at (column, row) is closed.
//!   - SWA..SWD are plain pulled-up inputs read on demand.
//!
//! Only one key is resolved per scan: the first column that shows a low
//! row wins, and within a column the lowest row wins.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::config::{MATRIX_COLS, MATRIX_ROWS, SCAN_SETTLE_US, SWITCH_COUNT};
use crate::keys::{KeyCode, Polarity, Switches};

/// Primitive hardware reads the keypad is built on.
pub trait KeyMatrix {
    /// Scan the matrix and return the active key, if any. Blocks for the
    /// column settle delays.
    fn scan_active_key(&mut self) -> Option<KeyCode>;

    /// Raw switch line levels, bit n set = switch n line high.
    fn read_switch_bits(&mut self) -> u8;

    /// Switch states with `polarity` applied. A line that cannot be read
    /// must come out as "off".
    fn read_switches(&mut self, polarity: Polarity) -> Switches {
        Switches::from_levels(self.read_switch_bits(), polarity)
    }
}

/// Key at `[column][row]`.
pub const KEY_MAP: [[Option<KeyCode>; MATRIX_ROWS]; MATRIX_COLS] = [
    [Some(KeyCode::CH1_UP), Some(KeyCode::CH3_UP), None],
    [Some(KeyCode::CH1_DN), Some(KeyCode::CH3_DN), Some(KeyCode::SEL)],
    [Some(KeyCode::CH2_UP), Some(KeyCode::CH4_UP), Some(KeyCode::OK)],
    [Some(KeyCode::CH2_DN), Some(KeyCode::CH4_DN), Some(KeyCode::CANCEL)],
];

/// GPIO key matrix plus static switches.
pub struct GpioMatrix<R, C, S, D> {
    rows: [R; MATRIX_ROWS],
    cols: [C; MATRIX_COLS],
    switches: [S; SWITCH_COUNT],
    delay: D,
}

impl<R, C, S, D> GpioMatrix<R, C, S, D>
where
    R: InputPin,
    C: OutputPin,
    S: InputPin,
    D: DelayNs,
{
    /// Take ownership of the lines and park every column low.
    pub fn new(
        rows: [R; MATRIX_ROWS],
        cols: [C; MATRIX_COLS],
        switches: [S; SWITCH_COUNT],
        delay: D,
    ) -> Self {
        let mut matrix = Self {
            rows,
            cols,
            switches,
            delay,
        };
        matrix.park_columns();
        matrix
    }

    /// Row lines, for awaiting their edges.
    pub fn rows_mut(&mut self) -> &mut [R; MATRIX_ROWS] {
        &mut self.rows
    }

    fn park_columns(&mut self) {
        for col in self.cols.iter_mut() {
            let _ = col.set_low();
        }
    }

    /// Walk a '0' across the columns; returns the column and the bitmask of
    /// low rows for the first column with any row pulled low.
    fn find_active(&mut self) -> Option<(usize, u8)> {
        for col in 0..MATRIX_COLS {
            for c in self.cols.iter_mut() {
                let _ = c.set_high();
            }
            let _ = self.cols[col].set_low();

            self.delay.delay_us(SCAN_SETTLE_US);

            let mut low_rows = 0u8;
            for (row, pin) in self.rows.iter_mut().enumerate() {
                // A failed read counts as "not pressed".
                if pin.is_low().unwrap_or(false) {
                    low_rows |= 1 << row;
                }
            }
            if low_rows != 0 {
                return Some((col, low_rows));
            }
        }
        None
    }
}

impl<R, C, S, D> KeyMatrix for GpioMatrix<R, C, S, D>
where
    R: InputPin,
    C: OutputPin,
    S: InputPin,
    D: DelayNs,
{
    fn scan_active_key(&mut self) -> Option<KeyCode> {
        let found = self.find_active();
        self.park_columns();

        let (col, low_rows) = found?;
        let row = low_rows.trailing_zeros() as usize;
        KEY_MAP[col][row]
    }

    fn read_switch_bits(&mut self) -> u8 {
        self.switches
            .iter_mut()
            .enumerate()
            .fold(0u8, |bits, (n, pin)| {
                if pin.is_high().unwrap_or(false) {
                    bits | (1 << n)
                } else {
                    bits
                }
            })
    }

    fn read_switches(&mut self, polarity: Polarity) -> Switches {
        let mut on = Switches::empty();
        for (n, pin) in self.switches.iter_mut().enumerate() {
            let active = match polarity {
                Polarity::ActiveHigh => pin.is_high(),
                Polarity::ActiveLow => pin.is_low(),
            };
            // A failed read counts as "off".
            if active.unwrap_or(false) {
                on |= Switches::from_bits_truncate(1 << n);
            }
        }
        on
    }
}
