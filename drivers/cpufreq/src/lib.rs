//! # SC5xx cpufreq
//!
//! CPU frequency scaling driver for the Analog Devices ADSP-SC5xx family.
//!
//! The core clock (CCLK) is derived from the `sys_clkin0` reference through
//! the CGU0 PLL and the 4-bit `CSEL` divisor in `CGU_DIV`. Changing CCLK means
//! rewriting `CSEL` and waiting for the hardware to acknowledge the update.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                   driver (CpufreqDriver)                     │
//! │  init / verify / target_index / get / exit, module lifecycle │
//! ├──────────────┬───────────────────────┬───────────────────────┤
//! │    policy    │      transition       │        query          │
//! │ (clamp range)│ (bounded CGU_DIV      │ (CCLK readout)        │
//! │              │  programming)         │                       │
//! ├──────────────┴───────┬───────────────┴───────────────────────┤
//! │  table   divisor     │   cgu     clock     delay             │
//! ├──────────────────────┴───────────────────────────────────────┤
//! │              platform (SC58x / SC59x / SC59x-64)             │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Hardware access goes through the [`CguRegister`], [`ClockProvider`] and
//! [`Delay`] traits, so the whole driver runs against fakes in tests.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod cgu;
pub mod clock;
pub mod delay;
pub mod divisor;
pub mod driver;
pub mod error;
pub mod platform;
pub mod policy;
pub mod query;
pub mod table;
pub mod transition;

#[cfg(test)]
mod testing;

// Re-exports for convenience
pub use cgu::{CguDiv, CguRegister, MmioCguDiv};
pub use clock::{ClockHandle, ClockProvider, ClockSource, SYS_CLKIN};
pub use delay::{Delay, SpinDelay};
pub use divisor::PllConfig;
pub use driver::{
    module_load, module_unload, CpuInfo, CpufreqDriver, CpufreqPolicy, CpufreqRegistry,
    DriverConfig, InvalidIndexPolicy, Sc5xxCpufreq,
};
pub use error::{Error, Result};
pub use platform::{Platform, PlatformConfig};
pub use policy::{PolicyLimits, PolicyVerifier};
pub use query::FrequencyQuery;
pub use table::{FrequencyTable, FrequencyTableEntry};
pub use transition::{
    TransitionConfig, TransitionController, TransitionOutcome, TransitionState, TransitionStats,
};

// =============================================================================
// CONSTANTS
// =============================================================================

/// Frequency in kHz, the unit of the cpufreq framework
pub type Khz = u32;

/// Name the driver registers under
pub const DRIVER_NAME: &str = "adsp-sc5xx cpufreq";

/// Worst-case CCLK transition latency reported to the framework (ns)
pub const TRANSITION_LATENCY_NS: u32 = 50_000;
