//! # Busy-Wait Delays
//!
//! The transition engine never sleeps: it blocks the calling context and
//! spins for a fixed quantum between register polls.

/// Blocking delay provider
pub trait Delay {
    /// Busy-wait for at least `ns` nanoseconds
    fn delay_ns(&self, ns: u32);
}

/// Calibrated spin-loop delay
///
/// `loops_per_us` comes from the platform's boot-time calibration.
#[derive(Debug, Clone, Copy)]
pub struct SpinDelay {
    loops_per_us: u32,
}

impl SpinDelay {
    /// Create a delay spinning `loops_per_us` iterations per microsecond
    pub const fn new(loops_per_us: u32) -> Self {
        Self { loops_per_us }
    }

    /// Spin iterations needed for `ns` nanoseconds (rounded up)
    pub const fn loops_for(&self, ns: u32) -> u64 {
        (ns as u64 * self.loops_per_us as u64).div_ceil(1000)
    }
}

impl Delay for SpinDelay {
    fn delay_ns(&self, ns: u32) {
        for _ in 0..self.loops_for(ns) {
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_loop_count() {
        let delay = SpinDelay::new(1000);
        assert_eq!(delay.loops_for(50_000), 50_000);
        assert_eq!(delay.loops_for(1), 1);
        assert_eq!(SpinDelay::new(3).loops_for(500), 2);
        assert_eq!(SpinDelay::new(0).loops_for(50_000), 0);
    }
}
