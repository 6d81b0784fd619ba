//! Effective core clock readout.

use spin::Mutex;

use crate::cgu::CguRegister;
use crate::clock::{ClockHandle, ClockSource};
use crate::divisor::PllConfig;
use crate::error::Result;
use crate::Khz;

/// Read-only view computing CCLK from SYS_CLKIN and the current CSEL
///
/// Takes the register lock only for the single CGU_DIV read.
#[derive(Debug)]
pub struct FrequencyQuery<'a, H: ClockHandle, R: CguRegister> {
    clock: &'a ClockSource<H>,
    cgu: &'a Mutex<R>,
    pll: PllConfig,
}

impl<'a, H: ClockHandle, R: CguRegister> FrequencyQuery<'a, H, R> {
    /// Create a query over a held clock and the shared register
    pub fn new(clock: &'a ClockSource<H>, cgu: &'a Mutex<R>, pll: PllConfig) -> Self {
        Self { clock, cgu, pll }
    }

    /// Current CCLK in kHz, `0` when it cannot be determined
    pub fn current_frequency(&self) -> Khz {
        self.try_current_frequency().unwrap_or(0)
    }

    /// Current CCLK in kHz
    pub fn try_current_frequency(&self) -> Result<Khz> {
        let reference = self.clock.current_rate()?;
        let csel = self.cgu.lock().read_div().csel();
        self.pll.divisor_to_frequency(reference, csel)
    }
}
