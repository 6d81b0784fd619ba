//! # Reference Clock Source
//!
//! CCLK is always derived from SYS_CLKIN0, which is produced by CGU0 and is
//! active on every SC5xx part, including those with several CGUs. The driver
//! looks the clock up once by name and keeps the handle for its lifetime.
//!
//! Handle release is tied to `Drop`: once a [`ClockSource`] is gone, nothing
//! can read from its handle any more.

use crate::error::{Error, Result};
use crate::Khz;

// =============================================================================
// Constants
// =============================================================================

/// Name of the reference clock feeding the core clock
pub const SYS_CLKIN: &str = "sys_clkin0";

// =============================================================================
// Clock Traits
// =============================================================================

/// Handle to a clock producer
///
/// Implementations release the underlying reference when dropped.
pub trait ClockHandle {
    /// Current rate in Hz, `0` when the producer does not know it
    fn rate_hz(&self) -> u64;
}

/// Name-based clock lookup service
pub trait ClockProvider {
    /// Handle type returned by lookups
    type Handle: ClockHandle;

    /// Look up a clock by its consumer name
    fn get(&self, name: &str) -> Option<Self::Handle>;
}

// =============================================================================
// Clock Source
// =============================================================================

/// Held reference to the SYS_CLKIN clock
#[derive(Debug)]
pub struct ClockSource<H: ClockHandle> {
    handle: H,
    name: &'static str,
}

impl<H: ClockHandle> ClockSource<H> {
    /// Acquire the clock named `name` from `provider`
    ///
    /// The lookup result is checked before anything is read from it.
    pub fn acquire<P>(provider: &P, name: &'static str) -> Result<Self>
    where
        P: ClockProvider<Handle = H>,
    {
        match provider.get(name) {
            Some(handle) => Ok(Self { handle, name }),
            None => {
                log::warn!("cpufreq: could not get clk {}", name);
                Err(Error::NoSuchDevice)
            },
        }
    }

    /// Consumer name the clock was acquired under
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Current reference rate in kHz
    pub fn current_rate(&self) -> Result<Khz> {
        let khz = self.handle.rate_hz() / 1000;
        if khz == 0 {
            return Err(Error::NoSuchDevice);
        }
        Ok(khz.min(Khz::MAX as u64) as Khz)
    }
}

// =============================================================================
// TESTS
// =============================================================================
