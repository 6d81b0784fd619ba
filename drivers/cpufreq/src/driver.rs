//! # cpufreq Driver Glue
//!
//! Exposes the transition engine through the callback contract of the host
//! power-management framework, and handles registration with it.
//!
//! ## Lifecycle
//!
//! ```text
//!  module_load ──▶ register ──▶ init ──▶ verify / target_index / get ──▶ exit
//!                                 │                                       │
//!                          acquire sys_clkin0                     release sys_clkin0
//!                          take CGU_DIV                           give CGU_DIV back
//! ```
//!
//! `init` and `exit` may run several times (CPU hotplug); the register and the
//! delay source survive between them, the clock handle does not.

use core::mem;

use crate::cgu::CguRegister;
use crate::clock::{ClockHandle, ClockProvider, ClockSource, SYS_CLKIN};
use crate::delay::Delay;
use crate::error::{Error, Result};
use crate::platform::{Platform, PlatformConfig};
use crate::policy::{PolicyLimits, PolicyVerifier};
use crate::table::FrequencyTable;
use crate::transition::{TransitionConfig, TransitionController, TransitionStats};
use crate::{Khz, DRIVER_NAME, TRANSITION_LATENCY_NS};

// =============================================================================
// Framework Types
// =============================================================================

/// Hardware limits reported at `init`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuInfo {
    /// Lowest supported frequency
    pub min_khz: Khz,
    /// Highest supported frequency
    pub max_khz: Khz,
    /// Worst-case duration of a transition
    pub transition_latency_ns: u32,
}

/// Per-CPU policy owned by the host framework
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpufreqPolicy {
    /// CPU the policy applies to
    pub cpu: u32,
    /// Hardware limits
    pub cpuinfo: CpuInfo,
    /// Current policy range
    pub limits: PolicyLimits,
    /// Last known frequency
    pub cur_khz: Khz,
}

/// Callbacks the host framework invokes on a cpufreq driver
pub trait CpufreqDriver {
    /// Driver name
    fn name(&self) -> &'static str;

    /// Frequency table attached to every policy
    fn table(&self) -> &FrequencyTable;

    /// Bring up a policy
    fn init(&mut self, policy: &mut CpufreqPolicy) -> Result<()>;

    /// Clamp a requested range to the supported one
    fn verify(&self, limits: &mut PolicyLimits) -> Result<()>;

    /// Switch to the table entry at `index`
    fn target_index(&self, policy: &mut CpufreqPolicy, index: usize) -> Result<()>;

    /// Current frequency, `0` when unknown
    fn get(&self, cpu: u32) -> Khz;

    /// Tear down a policy
    fn exit(&mut self, _policy: &mut CpufreqPolicy) -> Result<()> {
        Ok(())
    }
}

/// Driver registration service of the host framework
pub trait CpufreqRegistry {
    /// Register a driver
    fn register(&mut self, driver: &dyn CpufreqDriver) -> Result<()>;

    /// Unregister the driver named `name`
    fn unregister(&mut self, name: &str);
}

/// Dump the frequency table and register the driver
pub fn module_load<G: CpufreqRegistry + ?Sized>(
    registry: &mut G,
    driver: &dyn CpufreqDriver,
) -> Result<()> {
    driver.table().dump();
    registry.register(driver)?;
    log::info!("Loaded cpufreq driver {}", driver.name());
    Ok(())
}

/// Unregister the driver
pub fn module_unload<G: CpufreqRegistry + ?Sized>(registry: &mut G, driver: &dyn CpufreqDriver) {
    registry.unregister(driver.name());
    log::info!("Unloaded cpufreq driver {}", driver.name());
}

// =============================================================================
// Configuration
// =============================================================================

/// What `target_index` reports for an index beyond the table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InvalidIndexPolicy {
    /// Log a warning and report success without touching the hardware
    #[default]
    Ignore,
    /// Report `InvalidIndex`
    Reject,
}

/// Driver configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DriverConfig {
    /// Handling of out-of-range indices
    pub invalid_index: InvalidIndexPolicy,
    /// Transition polling behaviour
    pub transition: TransitionConfig,
}

// =============================================================================
// SC5xx Driver
// =============================================================================

enum Backend<H, R, D>
where
    H: ClockHandle,
    R: CguRegister,
    D: Delay,
{
    /// Before `init` or after `exit`
    Detached { cgu: Option<R>, delay: D },
    /// CGU_DIV available, transitions enabled
    Active(TransitionController<H, R, D>),
    /// No CGU_DIV on this platform, clock held but transitions disabled
    ReadOnly { clock: ClockSource<H>, delay: D },
    /// Placeholder while moving between states
    Moving,
}

/// cpufreq driver for ADSP-SC5xx processors
pub struct Sc5xxCpufreq<P: ClockProvider, R: CguRegister, D: Delay> {
    provider: P,
    platform: Platform,
    config: DriverConfig,
    table: FrequencyTable,
    verifier: PolicyVerifier,
    backend: Backend<P::Handle, R, D>,
}

impl<P: ClockProvider, R: CguRegister, D: Delay> core::fmt::Debug for Sc5xxCpufreq<P, R, D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Sc5xxCpufreq")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .field("table", &self.table)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}

impl<P: ClockProvider, R: CguRegister, D: Delay> Sc5xxCpufreq<P, R, D> {
    /// Create the driver
    ///
    /// `cgu` is the mapped CGU_DIV register, `None` on platforms without one.
    pub fn new(
        provider: P,
        platform: Platform,
        cgu: Option<R>,
        delay: D,
        config: DriverConfig,
    ) -> Self {
        let constants = platform.config();
        let table = FrequencyTable::from_range(constants.min_khz(), constants.max_khz());
        let verifier = PolicyVerifier::from_table(&table);
        if cgu.is_some() && !constants.can_transition() {
            log::warn!("cpufreq: {} has no CGU_DIV, register ignored", platform.name());
        }

        Self {
            provider,
            platform,
            config,
            table,
            verifier,
            backend: Backend::Detached { cgu, delay },
        }
    }

    /// Platform the driver was built for
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// Constants of that platform
    pub fn platform_config(&self) -> PlatformConfig {
        self.platform.config()
    }

    /// Driver configuration
    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    /// Whether `init` has run successfully
    pub fn is_initialized(&self) -> bool {
        matches!(self.backend, Backend::Active(_) | Backend::ReadOnly { .. })
    }

    /// Transition counters, `None` when transitions are disabled
    pub fn stats(&self) -> Option<TransitionStats> {
        match &self.backend {
            Backend::Active(controller) => Some(controller.stats()),
            _ => None,
        }
    }

    fn attach(
        &self,
        clock: ClockSource<P::Handle>,
        cgu: Option<R>,
        delay: D,
    ) -> Backend<P::Handle, R, D> {
        match cgu {
            Some(cgu) if self.platform_config().can_transition() => {
                Backend::Active(TransitionController::new(
                    self.table.clone(),
                    clock,
                    cgu,
                    delay,
                    self.platform_config().pll,
                    self.config.transition,
                ))
            },
            _ => Backend::ReadOnly { clock, delay },
        }
    }
}

impl<P: ClockProvider, R: CguRegister, D: Delay> CpufreqDriver for Sc5xxCpufreq<P, R, D> {
    fn name(&self) -> &'static str {
        DRIVER_NAME
    }

    fn table(&self) -> &FrequencyTable {
        &self.table
    }

    fn init(&mut self, policy: &mut CpufreqPolicy) -> Result<()> {
        let bounds = self.verifier.bounds();
        policy.cpuinfo = CpuInfo {
            min_khz: bounds.min_khz,
            max_khz: bounds.max_khz,
            transition_latency_ns: TRANSITION_LATENCY_NS,
        };
        policy.limits = bounds;

        match mem::replace(&mut self.backend, Backend::Moving) {
            Backend::Detached { cgu, delay } => {
                match ClockSource::acquire(&self.provider, SYS_CLKIN) {
                    Ok(clock) => self.backend = self.attach(clock, cgu, delay),
                    Err(e) => {
                        log::error!("cpufreq: could not find clk[{}]", SYS_CLKIN);
                        self.backend = Backend::Detached { cgu, delay };
                        return Err(e);
                    },
                }
            },
            attached => {
                log::debug!("cpufreq: policy for cpu{} already attached", policy.cpu);
                self.backend = attached;
            },
        }

        policy.cur_khz = self.get(policy.cpu);
        Ok(())
    }

    fn verify(&self, limits: &mut PolicyLimits) -> Result<()> {
        match self.verifier.clamp(*limits) {
            Ok(clamped) => {
                *limits = clamped;
                Ok(())
            },
            Err(Error::Unsupported) => Err(Error::NoSuchDevice),
            Err(e) => Err(e),
        }
    }

    fn target_index(&self, policy: &mut CpufreqPolicy, index: usize) -> Result<()> {
        let max = self.table.max_valid_index();
        if index > max {
            log::warn!("cpufreq: invalid frequency index {} (max {})", index, max);
            return match self.config.invalid_index {
                InvalidIndexPolicy::Ignore => Ok(()),
                InvalidIndexPolicy::Reject => Err(Error::InvalidIndex { index, max }),
            };
        }

        let controller = match &self.backend {
            Backend::Active(controller) => controller,
            Backend::ReadOnly { .. } => return Err(Error::Unsupported),
            Backend::Detached { .. } | Backend::Moving => return Err(Error::NotInitialized),
        };

        let outcome = controller.request_transition(index)?;
        policy.cur_khz = outcome.frequency();
        Ok(())
    }

    fn get(&self, cpu: u32) -> Khz {
        match &self.backend {
            Backend::Active(controller) => match controller.query().try_current_frequency() {
                Ok(khz) => khz,
                Err(e) => {
                    log::warn!("cpufreq: cpu{} frequency unavailable: {}", cpu, e);
                    0
                },
            },
            Backend::ReadOnly { .. } => 0,
            Backend::Detached { .. } | Backend::Moving => {
                log::warn!("cpufreq: cpu{} queried before init", cpu);
                0
            },
        }
    }

    fn exit(&mut self, policy: &mut CpufreqPolicy) -> Result<()> {
        self.backend = match mem::replace(&mut self.backend, Backend::Moving) {
            Backend::Active(controller) => {
                let (clock, cgu, delay) = controller.into_parts();
                drop(clock);
                Backend::Detached {
                    cgu: Some(cgu),
                    delay,
                }
            },
            Backend::ReadOnly { clock, delay } => {
                drop(clock);
                Backend::Detached { cgu: None, delay }
            },
            detached => detached,
        };
        policy.cur_khz = 0;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
