//! # SC5xx Platform Constants
//!
//! The ADSP-SC5xx family shares one CGU layout, but not every member exposes
//! the core clock divisor to the ARM core, and only some parts define an
//! operating range for the driver.
//!
//! | Platform  | CGU_DIV       | CCLK range       |
//! |-----------|---------------|------------------|
//! | SC58x     | `0x3108_D00C` | 800 - 1000 MHz   |
//! | SC59x     | none          | 800 - 1000 MHz   |
//! | SC59x-64  | `0x3108_D00C` | 800 - 1000 MHz   |
//! | Generic   | none          | none             |
//!
//! The compile-time default is chosen by the `sc58x`, `sc59x` and `sc59x-64`
//! cargo features.

use crate::divisor::PllConfig;
use crate::Khz;

// =============================================================================
// Constants
// =============================================================================

/// Physical address of the CGU0 divisor register on parts that expose it
pub const CGU_DIV_ADDR: usize = 0x3108_D00C;

/// Size of the CGU_DIV register mapping in bytes
pub const CGU_DIV_SIZE: usize = 4;

/// Lowest supported core clock on the SC5xx family (MHz)
const SC5XX_MIN_MHZ: u32 = 800;

/// Highest supported core clock on the SC5xx family (MHz)
const SC5XX_MAX_MHZ: u32 = 1000;

// =============================================================================
// Platform
// =============================================================================

cfg_if::cfg_if! {
    if #[cfg(feature = "sc58x")] {
        const BUILD_PLATFORM: Platform = Platform::Sc58x;
    } else if #[cfg(feature = "sc59x-64")] {
        const BUILD_PLATFORM: Platform = Platform::Sc59x64;
    } else if #[cfg(feature = "sc59x")] {
        const BUILD_PLATFORM: Platform = Platform::Sc59x;
    } else {
        const BUILD_PLATFORM: Platform = Platform::Generic;
    }
}

/// Processor family the driver runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    /// ADSP-SC58x
    Sc58x,
    /// ADSP-SC59x, 32-bit ARM core
    Sc59x,
    /// ADSP-SC59x, 64-bit ARM core
    Sc59x64,
    /// Any other target: no operating range, no CGU access
    Generic,
}

impl Platform {
    /// Platform selected at build time
    pub const DEFAULT: Platform = BUILD_PLATFORM;

    /// Human readable name
    pub const fn name(self) -> &'static str {
        match self {
            Self::Sc58x => "ADSP-SC58x",
            Self::Sc59x => "ADSP-SC59x",
            Self::Sc59x64 => "ADSP-SC59x (64-bit)",
            Self::Generic => "generic",
        }
    }

    /// Constants for this platform
    pub const fn config(self) -> PlatformConfig {
        match self {
            Self::Sc58x | Self::Sc59x64 => PlatformConfig {
                cgu_div_addr: Some(CGU_DIV_ADDR),
                min_mhz: SC5XX_MIN_MHZ,
                max_mhz: SC5XX_MAX_MHZ,
                pll: PllConfig::SC5XX,
            },
            Self::Sc59x => PlatformConfig {
                cgu_div_addr: None,
                min_mhz: SC5XX_MIN_MHZ,
                max_mhz: SC5XX_MAX_MHZ,
                pll: PllConfig::SC5XX,
            },
            Self::Generic => PlatformConfig {
                cgu_div_addr: None,
                min_mhz: 0,
                max_mhz: 0,
                pll: PllConfig::SC5XX,
            },
        }
    }
}

impl Default for Platform {
    fn default() -> Self {
        Self::DEFAULT
    }
}

// =============================================================================
// Platform Configuration
// =============================================================================

/// Per-platform driver constants
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformConfig {
    /// Physical CGU_DIV address, `None` when the transition path is absent
    pub cgu_div_addr: Option<usize>,
    /// Lowest core clock in MHz (0 when undefined)
    pub min_mhz: u32,
    /// Highest core clock in MHz (0 when undefined)
    pub max_mhz: u32,
    /// PLL multiplier and pre-divider feeding CCLK
    pub pll: PllConfig,
}

impl PlatformConfig {
    /// Lowest core clock in kHz
    pub const fn min_khz(&self) -> Khz {
        self.min_mhz * 1000
    }

    /// Highest core clock in kHz
    pub const fn max_khz(&self) -> Khz {
        self.max_mhz * 1000
    }

    /// Whether the platform defines any operating range
    pub const fn has_range(&self) -> bool {
        self.min_mhz != 0 || self.max_mhz != 0
    }

    /// Whether frequency transitions can be programmed
    pub const fn can_transition(&self) -> bool {
        self.cgu_div_addr.is_some()
    }
}

// =============================================================================
// TESTS
// =============================================================================
