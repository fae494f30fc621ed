//! Unified error type for tx-keypad.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` for efficient on-target logging.
//!
//! Hardware reads never surface here: a failed pin read degrades to
//! "not pressed" instead.

/// Top-level error type used across the crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// The interrupt -> task command queue was full; the edge was dropped.
    QueueFull,

    /// A scheduler payload did not map to a keypad command.
    UnknownPayload(u32),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::QueueFull => f.write_str("edge queue full"),
            Error::UnknownPayload(p) => write!(f, "unknown keypad payload {}", p),
        }
    }
}
