//! # CGU Divisor Register (CGU_DIV)
//!
//! The core clock divisor lives in CGU0's `CGU_DIV` register. Writing `CSEL`
//! only stages the new ratio; the hardware switches over once `UPDT` is set
//! and clears `UPDT` again when CCLK has settled.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ 31            15     14      13                   4   3         0  │
//! ├────────────────────────────────────────────────────────────────────┤
//! │ (other dividers)   │UPDT│   (other dividers)       │     CSEL      │
//! └────────────────────────────────────────────────────────────────────┘
//!
//! UPDT  - Update in progress (write 1 to start, hardware clears)
//! CSEL  - CCLK divisor select, 1..=15
//! ```

use core::ptr::{read_volatile, write_volatile};

use crate::platform::{PlatformConfig, CGU_DIV_SIZE};

// =============================================================================
// Register Bits
// =============================================================================

bitflags::bitflags! {
    /// CGU_DIV fields used by the driver
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CguDiv: u32 {
        /// CCLK divisor select field
        const CSEL = 0x0000_000F;
        /// Update in progress
        const UPDT = 0x0000_4000;
    }
}

static_assertions::const_assert_eq!(CguDiv::CSEL.bits() & CguDiv::UPDT.bits(), 0);
static_assertions::const_assert_eq!(CguDiv::CSEL.bits(), 0xF);
static_assertions::const_assert_eq!(core::mem::size_of::<u32>(), CGU_DIV_SIZE);

impl CguDiv {
    /// Interpret a raw register value, keeping bits the driver does not own
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self::from_bits_retain(raw)
    }

    /// Current CSEL divisor
    #[inline]
    pub const fn csel(self) -> u32 {
        self.bits() & Self::CSEL.bits()
    }

    /// Whether a clock update is still settling
    #[inline]
    pub const fn update_pending(self) -> bool {
        self.bits() & Self::UPDT.bits() != 0
    }

    /// Same value with CSEL replaced, other dividers untouched
    #[inline]
    pub const fn with_csel(self, divisor: u32) -> Self {
        Self::from_bits_retain((self.bits() & !Self::CSEL.bits()) | (divisor & Self::CSEL.bits()))
    }
}

// =============================================================================
// Register Access
// =============================================================================

/// Access to the CGU_DIV register
///
/// Reads return the current hardware bits and writes replace them; nothing is
/// cached in between.
pub trait CguRegister {
    /// Read the register
    fn read(&self) -> u32;

    /// Write the register
    fn write(&mut self, value: u32);

    /// Read and decode the register
    #[inline]
    fn read_div(&self) -> CguDiv {
        CguDiv::from_raw(self.read())
    }

    /// Encode and write the register
    #[inline]
    fn write_div(&mut self, value: CguDiv) {
        self.write(value.bits());
    }
}

// =============================================================================
// MMIO Implementation
// =============================================================================

/// Memory-mapped CGU_DIV register
#[derive(Debug)]
pub struct MmioCguDiv {
    /// Virtual address of the mapped register
    addr: *mut u32,
}

// SAFETY: the register is owned by exactly one MmioCguDiv and every access
// goes through `&self`/`&mut self` behind the controller's lock.
unsafe impl Send for MmioCguDiv {}

static_assertions::assert_impl_all!(MmioCguDiv: Send);

impl MmioCguDiv {
    /// Create a register accessor from a mapped address
    ///
    /// # Safety
    ///
    /// `addr` must be a valid, 4-byte aligned mapping of CGU_DIV
    /// (`CGU_DIV_SIZE` bytes) that stays mapped for the lifetime of the
    /// returned value, and no other code may access the register meanwhile.
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr: addr as *mut u32,
        }
    }

    /// Map the platform's CGU_DIV through `map`
    ///
    /// `map` receives the physical address and `CGU_DIV_SIZE` and returns the
    /// virtual address of the mapping. Returns `None` when the platform has no
    /// CGU_DIV or the mapping fails.
    ///
    /// # Safety
    ///
    /// The address returned by `map` must satisfy the contract of
    /// [`MmioCguDiv::new`].
    pub unsafe fn for_platform<F>(config: &PlatformConfig, map: F) -> Option<Self>
    where
        F: FnOnce(usize, usize) -> Option<usize>,
    {
        let phys = config.cgu_div_addr?;
        let virt = map(phys, CGU_DIV_SIZE)?;
        // SAFETY: forwarded to the caller
        Some(unsafe { Self::new(virt) })
    }

    /// Mapped address
    pub fn addr(&self) -> usize {
        self.addr as usize
    }
}

impl CguRegister for MmioCguDiv {
    #[inline]
    fn read(&self) -> u32 {
        // SAFETY: the mapping is valid by the constructor contract
        unsafe { read_volatile(self.addr) }
    }

    #[inline]
    fn write(&mut self, value: u32) {
        // SAFETY: the mapping is valid by the constructor contract
        unsafe { write_volatile(self.addr, value) }
    }
}

// =============================================================================
// TESTS
// =============================================================================
