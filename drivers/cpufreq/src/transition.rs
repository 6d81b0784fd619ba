//! # Frequency Transition Engine
//!
//! Moves CCLK to a table entry by reprogramming CGU_DIV.CSEL. The sequence is
//! synchronized with the hardware through the UPDT flag:
//!
//! ```text
//!            request_transition(index)
//!                      │
//!          index valid? ── no ──▶ InvalidIndex        (no register access)
//!                      │
//!          cur == 0 && new == 0? ── yes ──▶ Unsupported
//!                      │
//!   ┌──────────────────▼──────────────────┐
//!   │ WaitingForHardware                  │  poll UPDT, delay, re-poll,
//!   │                                     │  at most `max_polls` times
//!   └──────────────────┬──────────────────┘ ──▶ HardwareTimeout
//!   ┌──────────────────▼──────────────────┐
//!   │ Programming                         │  CSEL already there? ──▶ Unchanged
//!   │   write CSEL, then write CSEL|UPDT  │
//!   └──────────────────┬──────────────────┘
//!   ┌──────────────────▼──────────────────┐
//!   │ Verifying (optional)                │  poll UPDT until clear
//!   └──────────────────┬──────────────────┘ ──▶ HardwareTimeout
//!                      ▼
//!                    Idle
//! ```
//!
//! The register lock is held from the first poll to the last one, and is
//! released on every exit path when the guard goes out of scope. Once the
//! divisor has been written there is no rollback: the hardware's own
//! completion signal is authoritative.

use core::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use spin::Mutex;

use crate::cgu::{CguDiv, CguRegister};
use crate::clock::{ClockHandle, ClockSource};
use crate::delay::Delay;
use crate::divisor::PllConfig;
use crate::error::{Error, Result};
use crate::query::FrequencyQuery;
use crate::table::FrequencyTable;
use crate::{Khz, TRANSITION_LATENCY_NS};

// =============================================================================
// Configuration
// =============================================================================

/// Default bound on delayed re-polls of UPDT (about 50 ms at 50 us/poll)
pub const DEFAULT_MAX_POLLS: u32 = 1000;

/// Polling behaviour of the transition engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionConfig {
    /// Delay between two polls of UPDT
    pub poll_interval_ns: u32,
    /// Maximum number of delayed re-polls before `HardwareTimeout`
    pub max_polls: u32,
    /// Wait for UPDT to clear after starting the update
    pub verify_completion: bool,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            poll_interval_ns: TRANSITION_LATENCY_NS,
            max_polls: DEFAULT_MAX_POLLS,
            verify_completion: true,
        }
    }
}

// =============================================================================
// State
// =============================================================================

/// Transition engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TransitionState {
    /// No transition running
    Idle               = 0,
    /// Waiting for a previous update to settle
    WaitingForHardware = 1,
    /// Writing the new divisor
    Programming        = 2,
    /// Waiting for the started update to settle
    Verifying          = 3,
    /// The last transition failed
    Failed             = 4,
}

impl TransitionState {
    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::WaitingForHardware,
            2 => Self::Programming,
            3 => Self::Verifying,
            _ => Self::Failed,
        }
    }
}

/// Result of a successful transition request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// CCLK already ran at the target, nothing was written
    Unchanged {
        /// Current frequency
        khz: Khz,
    },
    /// A new divisor was programmed
    Changed {
        /// Frequency before the transition, `0` if it was unknown
        from_khz: Khz,
        /// Requested frequency
        to_khz: Khz,
        /// CSEL value written
        divisor: u32,
    },
}

impl TransitionOutcome {
    /// Frequency CCLK runs at after the request
    pub const fn frequency(&self) -> Khz {
        match self {
            Self::Unchanged { khz } => *khz,
            Self::Changed { to_khz, .. } => *to_khz,
        }
    }
}

/// Transition counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TransitionStats {
    /// Transitions that programmed a new divisor
    pub transitions: u64,
    /// Requests that found CCLK already at the target
    pub no_ops: u64,
    /// Requests that ran out of poll budget
    pub timeouts: u64,
}

// =============================================================================
// Transition Controller
// =============================================================================

/// Owner of CGU_DIV and the only code allowed to program it
#[derive(Debug)]
pub struct TransitionController<H: ClockHandle, R: CguRegister, D: Delay> {
    table: FrequencyTable,
    clock: ClockSource<H>,
    cgu: Mutex<R>,
    delay: D,
    pll: PllConfig,
    config: TransitionConfig,
    state: AtomicU8,
    transitions: AtomicU64,
    no_ops: AtomicU64,
    timeouts: AtomicU64,
}

impl<H: ClockHandle, R: CguRegister, D: Delay> TransitionController<H, R, D> {
    /// Take ownership of the clock, the register and the delay source
    pub fn new(
        table: FrequencyTable,
        clock: ClockSource<H>,
        cgu: R,
        delay: D,
        pll: PllConfig,
        config: TransitionConfig,
    ) -> Self {
        Self {
            table,
            clock,
            cgu: Mutex::new(cgu),
            delay,
            pll,
            config,
            state: AtomicU8::new(TransitionState::Idle as u8),
            transitions: AtomicU64::new(0),
            no_ops: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
        }
    }

    /// Frequency table the controller indexes into
    pub fn table(&self) -> &FrequencyTable {
        &self.table
    }

    /// Polling configuration
    pub fn config(&self) -> &TransitionConfig {
        &self.config
    }

    /// Current engine state
    pub fn state(&self) -> TransitionState {
        TransitionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Snapshot of the transition counters
    pub fn stats(&self) -> TransitionStats {
        TransitionStats {
            transitions: self.transitions.load(Ordering::Relaxed),
            no_ops: self.no_ops.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }

    /// Readout of the effective core clock
    pub fn query(&self) -> FrequencyQuery<'_, H, R> {
        FrequencyQuery::new(&self.clock, &self.cgu, self.pll)
    }

    /// Release the register, the clock handle and the delay source
    pub fn into_parts(self) -> (ClockSource<H>, R, D) {
        (self.clock, self.cgu.into_inner(), self.delay)
    }

    /// Move CCLK to the frequency at `index`
    ///
    /// An out-of-range index is rejected before anything else and leaves the
    /// engine state untouched. Every other failure moves it to `Failed`.
    pub fn request_transition(&self, index: usize) -> Result<TransitionOutcome> {
        let max = self.table.max_valid_index();
        if index > max {
            return Err(Error::InvalidIndex { index, max });
        }

        let result = self.transition_to(index);
        self.finish(&result);
        result
    }

    fn transition_to(&self, index: usize) -> Result<TransitionOutcome> {
        let target = self.table.frequency_at(index)?;
        let current = self.query().current_frequency();
        if current == 0 && target == 0 {
            return Err(Error::Unsupported);
        }
        let reference = self.clock.current_rate()?;

        let mut cgu = self.cgu.lock();
        self.program(&mut *cgu, reference, target)
    }

    /// Steps run with the register lock held
    fn program(&self, cgu: &mut R, reference: Khz, target: Khz) -> Result<TransitionOutcome> {
        self.set_state(TransitionState::WaitingForHardware);
        let value = self.wait_for_update(cgu)?;

        self.set_state(TransitionState::Programming);
        let current_divisor = value.csel();
        let from_khz = self
            .pll
            .divisor_to_frequency(reference, current_divisor)
            .unwrap_or(0);
        if from_khz == target {
            return Ok(TransitionOutcome::Unchanged { khz: from_khz });
        }

        let divisor = self.pll.frequency_to_divisor(reference, target)?;
        if divisor == current_divisor {
            return Ok(TransitionOutcome::Unchanged { khz: from_khz });
        }

        let staged = value.with_csel(divisor).difference(CguDiv::UPDT);
        cgu.write_div(staged);
        cgu.write_div(staged | CguDiv::UPDT);

        if self.config.verify_completion {
            self.set_state(TransitionState::Verifying);
            self.wait_for_update(cgu)?;
        }

        Ok(TransitionOutcome::Changed {
            from_khz,
            to_khz: target,
            divisor,
        })
    }

    /// Poll until UPDT is clear, returning the settled register value
    fn wait_for_update(&self, cgu: &R) -> Result<CguDiv> {
        let mut value = cgu.read_div();
        let mut polls = 0;

        while value.update_pending() {
            if polls == self.config.max_polls {
                return Err(Error::HardwareTimeout { polls });
            }
            self.delay.delay_ns(self.config.poll_interval_ns);
            polls += 1;
            value = cgu.read_div();
        }

        if polls > 0 {
            log::debug!("cpufreq: CGU update settled after {} polls", polls);
        }
        Ok(value)
    }

    fn finish(&self, result: &Result<TransitionOutcome>) {
        match result {
            Ok(TransitionOutcome::Changed {
                from_khz, to_khz, ..
            }) => {
                self.transitions.fetch_add(1, Ordering::Relaxed);
                self.set_state(TransitionState::Idle);
                log::info!("cpufreq: CCLK {} kHz -> {} kHz", from_khz, to_khz);
            },
            Ok(TransitionOutcome::Unchanged { khz }) => {
                self.no_ops.fetch_add(1, Ordering::Relaxed);
                self.set_state(TransitionState::Idle);
                log::debug!("cpufreq: CCLK already at {} kHz", khz);
            },
            Err(e @ Error::HardwareTimeout { .. }) => {
                self.timeouts.fetch_add(1, Ordering::Relaxed);
                self.set_state(TransitionState::Failed);
                log::warn!("cpufreq: {}", e);
            },
            Err(e) => {
                self.set_state(TransitionState::Failed);
                log::warn!("cpufreq: transition failed: {}", e);
            },
        }
    }

    #[inline]
    fn set_state(&self, state: TransitionState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SYS_CLKIN;
    use crate::testing::{FakeCgu, FakeClock, FakeClockProvider, FakeDelay};

    const MHZ_1000: Khz = 1_000_000;
    const MHZ_800: Khz = 800_000;

    struct Rig {
        controller: TransitionController<FakeClock, FakeCgu, FakeDelay>,
        cgu: FakeCgu,
        delay: FakeDelay,
        provider: FakeClockProvider,
    }

    fn rig(cgu: FakeCgu, config: TransitionConfig) -> Rig {
        let provider = FakeClockProvider::new(SYS_CLKIN, 25_000_000);
        let clock = ClockSource::acquire(&provider, SYS_CLKIN).unwrap();
        let delay = FakeDelay::default();
        let controller = TransitionController::new(
            FrequencyTable::from_range(MHZ_800, MHZ_1000),
            clock,
            cgu.clone(),
            delay.clone(),
            PllConfig::SC5XX,
            config,
        );
        Rig {
            controller,
            cgu,
            delay,
            provider,
        }
    }

    #[test]
    fn test_end_to_end_800_to_1000() {
        let r = rig(FakeCgu::with_csel(5).settle_after(3), TransitionConfig::default());
        assert_eq!(r.controller.query().current_frequency(), MHZ_800);

        let outcome = r.controller.request_transition(0).unwrap();
        assert_eq!(
            outcome,
            TransitionOutcome::Changed {
                from_khz: MHZ_800,
                to_khz: MHZ_1000,
                divisor: 4,
            }
        );

        // CSEL staged first, then UPDT raised
        assert_eq!(r.cgu.writes(), [0x0000_0004, 0x0000_4004]);
        // Three busy polls while the hardware settles
        assert_eq!(r.delay.calls(), 3);
        assert_eq!(r.delay.total_ns(), 3 * TRANSITION_LATENCY_NS as u64);
        assert_eq!(r.cgu.peek(), 0x0000_0004);

        assert_eq!(r.controller.query().current_frequency(), MHZ_1000);
        assert_eq!(r.controller.state(), TransitionState::Idle);
        assert_eq!(r.controller.stats().transitions, 1);
    }

    #[test]
    fn test_transition_to_current_is_noop() {
        let r = rig(FakeCgu::with_csel(5), TransitionConfig::default());

        let outcome = r.controller.request_transition(1).unwrap();
        assert_eq!(outcome, TransitionOutcome::Unchanged { khz: MHZ_800 });
        assert!(r.cgu.writes().is_empty());
        assert_eq!(r.controller.stats().no_ops, 1);
    }

    #[test]
    fn test_out_of_range_index_touches_nothing() {
        let r = rig(FakeCgu::with_csel(5), TransitionConfig::default());
        let max = r.controller.table().max_valid_index();

        assert_eq!(
            r.controller.request_transition(max + 1),
            Err(Error::InvalidIndex { index: max + 1, max })
        );
        assert_eq!(r.cgu.reads(), 0);
        assert!(r.cgu.writes().is_empty());
        assert_eq!(r.controller.state(), TransitionState::Idle);
    }

    #[test]
    fn test_waits_for_previous_update() {
        // One busy read is consumed by the current-frequency query
        let r = rig(FakeCgu::with_csel(5).busy_for(3), TransitionConfig::default());

        r.controller.request_transition(0).unwrap();
        // Two delays before programming, none after (settles immediately)
        assert_eq!(r.delay.calls(), 2);
        assert_eq!(r.cgu.writes().len(), 2);
    }

    #[test]
    fn test_bounded_wait_before_programming() {
        let config = TransitionConfig {
            max_polls: 25,
            ..TransitionConfig::default()
        };
        let r = rig(FakeCgu::with_csel(5).stuck(), config);

        assert_eq!(
            r.controller.request_transition(0),
            Err(Error::HardwareTimeout { polls: 25 })
        );
        assert_eq!(r.delay.calls(), 25);
        assert_eq!(r.cgu.reads(), 1 + 1 + 25); // query + initial poll + re-polls
        assert!(r.cgu.writes().is_empty());
        assert_eq!(r.controller.state(), TransitionState::Failed);
        assert_eq!(r.controller.stats().timeouts, 1);
        // Lock released on the error path
        assert!(r.controller.cgu.try_lock().is_some());
    }

    #[test]
    fn test_bounded_wait_after_programming() {
        let config = TransitionConfig {
            max_polls: 10,
            ..TransitionConfig::default()
        };
        let r = rig(FakeCgu::with_csel(5).settle_after(usize::MAX), config);

        assert_eq!(
            r.controller.request_transition(0),
            Err(Error::HardwareTimeout { polls: 10 })
        );
        // The divisor was written, no rollback
        assert_eq!(r.cgu.writes(), [0x0000_0004, 0x0000_4004]);
        assert_eq!(r.delay.calls(), 10);
    }

    #[test]
    fn test_no_verification() {
        let config = TransitionConfig {
            verify_completion: false,
            ..TransitionConfig::default()
        };
        let r = rig(FakeCgu::with_csel(5).settle_after(usize::MAX), config);

        r.controller.request_transition(0).unwrap();
        assert_eq!(r.delay.calls(), 0);
        assert!(CguDiv::from_raw(r.cgu.peek()).update_pending());
    }

    #[test]
    fn test_unsupported_when_both_zero() {
        let provider = FakeClockProvider::new(SYS_CLKIN, 25_000_000);
        let clock = ClockSource::acquire(&provider, SYS_CLKIN).unwrap();
        let cgu = FakeCgu::with_csel(0);
        let controller = TransitionController::new(
            FrequencyTable::from_range(0, 0),
            clock,
            cgu.clone(),
            FakeDelay::default(),
            PllConfig::SC5XX,
            TransitionConfig::default(),
        );

        assert_eq!(controller.request_transition(0), Err(Error::Unsupported));
        assert!(cgu.writes().is_empty());
        assert_eq!(controller.state(), TransitionState::Failed);
    }

    #[test]
    fn test_lost_reference_clock() {
        let r = rig(FakeCgu::with_csel(5), TransitionConfig::default());
        r.provider.set_rate_hz(0);

        assert_eq!(r.controller.request_transition(0), Err(Error::NoSuchDevice));
        assert!(r.cgu.writes().is_empty());
        assert_eq!(r.controller.state(), TransitionState::Failed);
        assert_eq!(r.controller.stats(), TransitionStats::default());

        // Recovers once the reference is back
        r.provider.set_rate_hz(25_000_000);
        assert!(r.controller.request_transition(1).is_ok());
        assert_eq!(r.controller.state(), TransitionState::Idle);
    }

    #[test]
    fn test_preserves_other_divider_bits() {
        let cgu = FakeCgu::with_csel(5);
        let mut raw = cgu.clone();
        raw.write(0x1234_0005);
        let r = rig(cgu, TransitionConfig::default());

        r.controller.request_transition(0).unwrap();
        assert_eq!(&r.cgu.writes()[1..], [0x1234_0004, 0x1234_4004]);
    }

    #[test]
    fn test_into_parts_releases_clock() {
        let r = rig(FakeCgu::with_csel(5), TransitionConfig::default());
        assert_eq!(r.provider.outstanding(), 1);

        let (clock, _cgu, _delay) = r.controller.into_parts();
        drop(clock);
        assert_eq!(r.provider.outstanding(), 0);
    }
}
