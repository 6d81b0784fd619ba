//! # CCLK Divisor Math
//!
//! CCLK is derived from SYS_CLKIN through the CGU PLL and the `CSEL` divisor:
//!
//! ```text
//! SYS_CLKIN ──▶ ÷ (DF + 1) ──▶ × MSEL ──▶ PLLCLK ──▶ ÷ CSEL ──▶ CCLK
//!
//! CCLK = (SYS_CLKIN / (DF + 1)) * MSEL / CSEL
//! CSEL = (SYS_CLKIN / (DF + 1)) * MSEL / CCLK
//! ```
//!
//! All functions here are pure. Frequencies are in kHz, intermediate products
//! are computed in 64 bits.

use crate::error::{Error, Result};
use crate::Khz;

// =============================================================================
// Constants
// =============================================================================

/// Smallest programmable CSEL value (0 means "unset")
pub const MIN_DIVISOR: u32 = 1;

/// Largest value of the 4-bit CSEL field
pub const MAX_DIVISOR: u32 = 15;

// =============================================================================
// PLL Configuration
// =============================================================================

/// CGU PLL multiplier and input pre-divider
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfig {
    /// PLL multiplier (CGU_CTL.MSEL)
    pub msel: u32,
    /// Input divider select (CGU_CTL.DF), the input is divided by `DF + 1`
    pub df: u32,
}

impl PllConfig {
    /// SC5xx boot configuration: 25 MHz SYS_CLKIN, PLLCLK at 4 GHz so that
    /// both 1000 MHz (CSEL 4) and 800 MHz (CSEL 5) are exact divisors
    pub const SC5XX: PllConfig = PllConfig { msel: 160, df: 0 };

    /// Create a PLL configuration
    pub const fn new(msel: u32, df: u32) -> Self {
        Self { msel, df }
    }

    /// PLL output for a given reference rate
    #[inline]
    pub const fn pll_khz(&self, reference_khz: Khz) -> u64 {
        (reference_khz as u64 / (self.df as u64 + 1)) * self.msel as u64
    }

    /// Divisor that brings `reference_khz` closest to `target_khz`
    ///
    /// A frequency reported by [`PllConfig::divisor_to_frequency`] maps back
    /// to the divisor that produced it; any other target rounds to the
    /// nearest divisor. A zero target is rejected before any division takes
    /// place.
    pub fn frequency_to_divisor(&self, reference_khz: Khz, target_khz: Khz) -> Result<u32> {
        if target_khz == 0 {
            return Err(Error::InvalidFrequency);
        }

        let pll = self.pll_khz(reference_khz);
        let target = target_khz as u64;
        let nearest = (pll + target / 2) / target;
        // Smallest divisor whose truncated output is exactly `target`
        let exact = pll / (target + 1) + 1;

        let divisor = if is_programmable(nearest) && pll / nearest == target {
            nearest
        } else if is_programmable(exact) && pll / exact == target {
            exact
        } else {
            nearest
        };

        if !is_programmable(divisor) {
            return Err(Error::InvalidDivisor(divisor.min(u32::MAX as u64) as u32));
        }

        Ok(divisor as u32)
    }

    /// CCLK produced by `divisor` for a given reference rate
    pub fn divisor_to_frequency(&self, reference_khz: Khz, divisor: u32) -> Result<Khz> {
        if !(MIN_DIVISOR..=MAX_DIVISOR).contains(&divisor) {
            return Err(Error::InvalidDivisor(divisor));
        }

        let freq = self.pll_khz(reference_khz) / divisor as u64;
        Ok(freq.min(Khz::MAX as u64) as Khz)
    }
}

#[inline]
const fn is_programmable(divisor: u64) -> bool {
    divisor >= MIN_DIVISOR as u64 && divisor <= MAX_DIVISOR as u64
}

impl Default for PllConfig {
    fn default() -> Self {
        Self::SC5XX
    }
}

// =============================================================================
// TESTS
// =============================================================================
