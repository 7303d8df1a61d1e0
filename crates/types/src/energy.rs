//! Fixed-point kinetic energy.
//!
//! Energies are summed across steps and across workers. Floating-point sums
//! depend on the order of addition, which would make the merged result depend
//! on worker scheduling. Storing integer micro-electronvolts keeps addition
//! exactly associative and commutative.

use derive_more::{From, Into};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed-point scale: 1,000,000 = 1 eV.
pub const ENERGY_SCALE: u64 = 1_000_000;

/// Non-negative kinetic energy in micro-electronvolts.
///
/// # Examples
/// - `Energy(2_000_000)` = 2.0 eV
/// - `Energy(1)` = 1 µeV (smallest representable increment)
#[derive(
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Default,
    From,
    Into,
)]
pub struct Energy(pub u64);

impl Energy {
    pub const ZERO: Energy = Energy(0);

    /// Convert an engine-reported energy in eV.
    ///
    /// Returns `None` for negative, non-finite, or unrepresentably large values.
    pub fn from_ev(ev: f64) -> Option<Self> {
        if !ev.is_finite() || ev < 0.0 {
            return None;
        }
        let scaled = (ev * ENERGY_SCALE as f64).round();
        if scaled >= u64::MAX as f64 {
            return None;
        }
        Some(Energy(scaled as u64))
    }

    /// Convert to electronvolts for display.
    #[inline]
    pub fn to_ev(self) -> f64 {
        self.0 as f64 / ENERGY_SCALE as f64
    }

    /// Addition that reports overflow instead of wrapping.
    #[inline]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Energy)
    }
}

impl fmt::Debug for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Energy({:.6} eV)", self.to_ev())
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6} eV", self.to_ev())
    }
}
