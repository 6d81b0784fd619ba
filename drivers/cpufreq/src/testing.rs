//! Test doubles for the hardware-facing traits

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::cgu::{CguDiv, CguRegister};
use crate::clock::{ClockHandle, ClockProvider};
use crate::delay::Delay;

// =============================================================================
// Fake CGU_DIV
// =============================================================================

#[derive(Debug, Default)]
struct FakeCguState {
    value: u32,
    writes: Vec<u32>,
    reads: usize,
    /// Reads that still observe UPDT after an update was started
    settle_reads: usize,
    pending: usize,
    stuck: bool,
}

/// Shared-state CGU_DIV model
///
/// Clones observe the same register, so a test keeps one clone while the
/// controller owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeCgu {
    state: Rc<RefCell<FakeCguState>>,
}

impl FakeCgu {
    /// Idle register holding `csel`
    pub fn with_csel(csel: u32) -> Self {
        let cgu = Self::default();
        cgu.state.borrow_mut().value = csel & CguDiv::CSEL.bits();
        cgu
    }

    /// Number of reads after which a started update completes
    pub fn settle_after(self, reads: usize) -> Self {
        self.state.borrow_mut().settle_reads = reads;
        self
    }

    /// Mark an update as in flight for the next `reads` reads
    pub fn busy_for(self, reads: usize) -> Self {
        {
            let mut s = self.state.borrow_mut();
            s.value |= CguDiv::UPDT.bits();
            s.pending = reads;
        }
        self
    }

    /// Keep UPDT set forever
    pub fn stuck(self) -> Self {
        {
            let mut s = self.state.borrow_mut();
            s.value |= CguDiv::UPDT.bits();
            s.stuck = true;
        }
        self
    }

    /// Raw register value without side effects
    pub fn peek(&self) -> u32 {
        self.state.borrow().value
    }

    /// Every value written so far
    pub fn writes(&self) -> Vec<u32> {
        self.state.borrow().writes.clone()
    }

    /// Number of reads so far
    pub fn reads(&self) -> usize {
        self.state.borrow().reads
    }
}

impl CguRegister for FakeCgu {
    fn read(&self) -> u32 {
        let mut s = self.state.borrow_mut();
        s.reads += 1;
        if s.value & CguDiv::UPDT.bits() != 0 && !s.stuck {
            if s.pending == 0 {
                s.value &= !CguDiv::UPDT.bits();
            } else {
                s.pending -= 1;
            }
        }
        s.value
    }

    fn write(&mut self, value: u32) {
        let mut s = self.state.borrow_mut();
        s.value = value;
        s.writes.push(value);
        if value & CguDiv::UPDT.bits() != 0 {
            s.pending = s.settle_reads;
        }
    }
}

// =============================================================================
// Fake Delay
// =============================================================================

/// Delay that only counts how often and how long it was asked to wait
#[derive(Debug, Clone, Default)]
pub struct FakeDelay {
    calls: Rc<Cell<u32>>,
    total_ns: Rc<Cell<u64>>,
}

impl FakeDelay {
    /// Number of delay calls
    pub fn calls(&self) -> u32 {
        self.calls.get()
    }

    /// Sum of all requested delays
    pub fn total_ns(&self) -> u64 {
        self.total_ns.get()
    }
}

impl Delay for FakeDelay {
    fn delay_ns(&self, ns: u32) {
        self.calls.set(self.calls.get() + 1);
        self.total_ns.set(self.total_ns.get() + ns as u64);
    }
}

// =============================================================================
// Fake Clock
// =============================================================================

/// Clock provider exposing a single named clock
#[derive(Debug, Clone)]
pub struct FakeClockProvider {
    name: &'static str,
    rate_hz: Rc<Cell<u64>>,
    outstanding: Rc<Cell<usize>>,
}

impl FakeClockProvider {
    /// Provider knowing only `name`, running at `rate_hz`
    pub fn new(name: &'static str, rate_hz: u64) -> Self {
        Self {
            name,
            rate_hz: Rc::new(Cell::new(rate_hz)),
            outstanding: Rc::new(Cell::new(0)),
        }
    }

    /// Change the rate seen by every handle
    pub fn set_rate_hz(&self, rate_hz: u64) {
        self.rate_hz.set(rate_hz);
    }

    /// Handles acquired and not yet released
    pub fn outstanding(&self) -> usize {
        self.outstanding.get()
    }
}

/// Handle returned by [`FakeClockProvider`]
#[derive(Debug)]
pub struct FakeClock {
    rate_hz: Rc<Cell<u64>>,
    outstanding: Rc<Cell<usize>>,
}

impl ClockHandle for FakeClock {
    fn rate_hz(&self) -> u64 {
        self.rate_hz.get()
    }
}

impl Drop for FakeClock {
    fn drop(&mut self) {
        self.outstanding.set(self.outstanding.get() - 1);
    }
}

impl ClockProvider for FakeClockProvider {
    type Handle = FakeClock;

    fn get(&self, name: &str) -> Option<FakeClock> {
        if name != self.name {
            return None;
        }
        self.outstanding.set(self.outstanding.get() + 1);
        Some(FakeClock {
            rate_hz: Rc::clone(&self.rate_hz),
            outstanding: Rc::clone(&self.outstanding),
        })
    }
}
