//! Logical key and switch sets.
//!
//! Every key owns one bit so a set of keys (the "pressed since last
//! poll" accumulator) is a plain bitmask. A single matrix scan resolves at
//! most one bit.

use bitflags::bitflags;

bitflags! {
    /// One bit per logical key. The empty set is [`KeyCode::NONE`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KeyCode: u32 {
        const CH1_UP = 1 << 0;
        const CH1_DN = 1 << 1;
        const CH2_UP = 1 << 2;
        const CH2_DN = 1 << 3;
        const CH3_UP = 1 << 4;
        const CH3_DN = 1 << 5;
        const CH4_UP = 1 << 6;
        const CH4_DN = 1 << 7;
        const SEL    = 1 << 8;
        const OK     = 1 << 9;
        const CANCEL = 1 << 10;
        /// Synthesized from a clockwise rotary step.
        const RIGHT  = 1 << 11;
        /// Synthesized from a counter-clockwise rotary step.
        const LEFT   = 1 << 12;
        /// Synthesized when SEL is held past the repeat delay.
        const MENU   = 1 << 13;
    }
}

impl KeyCode {
    /// No key.
    pub const NONE: Self = Self::empty();

    /// The channel trim keys, the only keys that auto-repeat.
    pub const TRIM: Self = Self::CH1_UP
        .union(Self::CH1_DN)
        .union(Self::CH2_UP)
        .union(Self::CH2_DN)
        .union(Self::CH3_UP)
        .union(Self::CH3_DN)
        .union(Self::CH4_UP)
        .union(Self::CH4_DN);

    /// `true` for a single trim key.
    pub fn is_trim(self) -> bool {
        self.is_single() && Self::TRIM.contains(self)
    }

    /// `true` if exactly one key bit is set.
    pub fn is_single(self) -> bool {
        self.bits().count_ones() == 1
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for KeyCode {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "KeyCode({=u32:#x})", self.bits())
    }
}

/// Electrical level that means "switch on".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Polarity {
    ActiveHigh,
    ActiveLow,
}

bitflags! {
    /// Static toggle switches, read on demand.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Switches: u8 {
        const SWA = 1 << 0;
        const SWB = 1 << 1;
        const SWC = 1 << 2;
        const SWD = 1 << 3;
    }
}

impl Switches {
    /// Convert raw line levels (bit set = line high) into switch states.
    pub fn from_levels(levels: u8, polarity: Polarity) -> Self {
        let on = match polarity {
            Polarity::ActiveHigh => levels,
            Polarity::ActiveLow => !levels,
        };
        Self::from_bits_truncate(on)
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for Switches {
    fn format(&self, f: defmt::Formatter) {
        defmt::write!(f, "Switches({=u8:#x})", self.bits())
    }
}
