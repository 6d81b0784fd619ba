//! # Policy Verification
//!
//! The host framework hands in a requested `[min, max]` range and expects it
//! back clamped into what the hardware supports. The clamping order matches
//! the framework's own "verify within limits" helper: `max` is clamped first,
//! then `min` is clamped against the new `max`, so the result can never be
//! inverted.

use crate::error::{Error, Result};
use crate::table::FrequencyTable;
use crate::Khz;

// =============================================================================
// Policy Limits
// =============================================================================

/// A frequency range in kHz
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PolicyLimits {
    /// Lower bound
    pub min_khz: Khz,
    /// Upper bound
    pub max_khz: Khz,
}

impl PolicyLimits {
    /// Create a range
    pub const fn new(min_khz: Khz, max_khz: Khz) -> Self {
        Self { min_khz, max_khz }
    }
}

// =============================================================================
// Policy Verifier
// =============================================================================

/// Clamps requested ranges to the table bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PolicyVerifier {
    bounds: PolicyLimits,
}

impl PolicyVerifier {
    /// Verifier for an explicit range, bounds are ordered if given reversed
    pub const fn new(min_khz: Khz, max_khz: Khz) -> Self {
        let bounds = if min_khz <= max_khz {
            PolicyLimits::new(min_khz, max_khz)
        } else {
            PolicyLimits::new(max_khz, min_khz)
        };
        Self { bounds }
    }

    /// Verifier for the range spanned by a frequency table
    pub fn from_table(table: &FrequencyTable) -> Self {
        Self::new(table.min_frequency(), table.max_frequency())
    }

    /// Supported range
    pub const fn bounds(&self) -> PolicyLimits {
        self.bounds
    }

    /// Whether the platform has no operating range
    pub const fn is_unsupported(&self) -> bool {
        self.bounds.min_khz == 0 && self.bounds.max_khz == 0
    }

    /// Clamp `requested` into the supported range
    pub fn clamp(&self, requested: PolicyLimits) -> Result<PolicyLimits> {
        if self.is_unsupported() {
            return Err(Error::Unsupported);
        }

        let PolicyLimits {
            min_khz: lo,
            max_khz: hi,
        } = self.bounds;
        let max_khz = requested.max_khz.clamp(lo, hi);
        let min_khz = requested.min_khz.clamp(lo, max_khz);

        Ok(PolicyLimits { min_khz, max_khz })
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    const SC5XX: PolicyVerifier = PolicyVerifier::new(800_000, 1_000_000);

    #[test]
    fn test_clamp_identity() {
        let bounds = SC5XX.bounds();
        assert_eq!(SC5XX.clamp(bounds), Ok(bounds));
    }

    #[test]
    fn test_clamp_wide_request() {
        let clamped = SC5XX.clamp(PolicyLimits::new(0, u32::MAX)).unwrap();
        assert_eq!(clamped, PolicyLimits::new(800_000, 1_000_000));
    }

    #[test]
    fn test_clamp_narrow_request() {
        let clamped = SC5XX.clamp(PolicyLimits::new(850_000, 900_000)).unwrap();
        assert_eq!(clamped, PolicyLimits::new(850_000, 900_000));
    }

    #[test]
    fn test_clamp_never_inverts() {
        // min above the supported max, max below the supported min
        let clamped = SC5XX.clamp(PolicyLimits::new(2_000_000, 100_000)).unwrap();
        assert_eq!(clamped, PolicyLimits::new(800_000, 800_000));
        assert!(clamped.min_khz <= clamped.max_khz);
    }

    #[test]
    fn test_unsupported_platform() {
        let verifier = PolicyVerifier::from_table(&FrequencyTable::from_range(0, 0));
        assert!(verifier.is_unsupported());
        assert_eq!(
            verifier.clamp(PolicyLimits::new(0, 0)),
            Err(Error::Unsupported)
        );
        assert_eq!(
            verifier.clamp(PolicyLimits::new(800_000, 1_000_000)),
            Err(Error::Unsupported)
        );
    }

    #[test]
    fn test_reversed_bounds() {
        assert_eq!(
            PolicyVerifier::new(1_000_000, 800_000).bounds(),
            PolicyLimits::new(800_000, 1_000_000)
        );
    }
}
