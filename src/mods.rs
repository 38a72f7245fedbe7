//! Modifier bitmask handling.
//!
//! Modifiers are a fixed enumeration of bits with a static name table, not a
//! runtime dictionary. Combinations are bitwise unions (`HD | DT` renders as
//! "HDDT").

use std::fmt;

use serde::{Deserialize, Serialize};

/// Static bit → short-name table, in canonical rendering order.
const MOD_NAMES: &[(u32, &str)] = &[
    (1, "NF"),
    (2, "EZ"),
    (4, "TD"),
    (8, "HD"),
    (16, "HR"),
    (32, "SD"),
    (64, "DT"),
    (128, "RX"),
    (256, "HT"),
];

/// A modifier combination, stored as a bitmask.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Mods(pub u32);

impl Mods {
    pub const NONE: Mods = Mods(0);
    pub const DOUBLE_TIME: Mods = Mods(64);
    pub const HALF_TIME: Mods = Mods(256);

    /// Raw bitmask value.
    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }

    /// True if every bit of `other` is set in `self`.
    #[inline]
    pub fn contains(self, other: Mods) -> bool {
        self.0 & other.0 == other.0
    }

    /// Short names of all set bits, in canonical order.
    pub fn names(self) -> Vec<&'static str> {
        MOD_NAMES
            .iter()
            .filter(|(bit, _)| self.0 & bit != 0)
            .map(|(_, name)| *name)
            .collect()
    }

    /// Playback clock rate implied by the mask.
    ///
    /// DT plays at 1.5x, HT at 0.75x; DT wins if both bits are set.
    pub fn clock_rate(self) -> f64 {
        if self.contains(Mods::DOUBLE_TIME) {
            1.5
        } else if self.contains(Mods::HALF_TIME) {
            0.75
        } else {
            1.0
        }
    }

    /// Rescale a real-time duration (seconds) into the modified timeline.
    ///
    /// Display metadata from the catalog API reports unmodified lengths;
    /// callers divide by the clock rate before showing them. Pure function
    /// of the mask, part of the enrichment boundary contract.
    pub fn scaled_length(self, length_secs: u32) -> u32 {
        (length_secs as f64 / self.clock_rate()).round() as u32
    }
}

impl fmt::Display for Mods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 == 0 {
            return write!(f, "NM");
        }
        for name in self.names() {
            write!(f, "{name}")?;
        }
        Ok(())
    }
}

impl From<u32> for Mods {
    fn from(bits: u32) -> Self {
        Mods(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_canonical_order() {
        let hddt = Mods(8 | 64);
        assert_eq!(hddt.names(), vec!["HD", "DT"]);
        assert_eq!(hddt.to_string(), "HDDT");
    }

    #[test]
    fn nomod_renders_as_nm() {
        assert_eq!(Mods::NONE.to_string(), "NM");
        assert!(Mods::NONE.names().is_empty());
    }

    #[test]
    fn clock_rate_dt_wins_over_ht() {
        assert_eq!(Mods(64).clock_rate(), 1.5);
        assert_eq!(Mods(256).clock_rate(), 0.75);
        assert_eq!(Mods(64 | 256).clock_rate(), 1.5);
        assert_eq!(Mods(8).clock_rate(), 1.0);
    }

    #[test]
    fn length_rescaling() {
        // A 180s map under DT plays in 120s; under HT in 240s.
        assert_eq!(Mods(64).scaled_length(180), 120);
        assert_eq!(Mods(256).scaled_length(180), 240);
        assert_eq!(Mods::NONE.scaled_length(180), 180);
    }
}
