//! # Driver Error Handling
//!
//! Every fallible operation in the driver returns [`Result`]. The host
//! power-management framework speaks plain integers, so each error also maps
//! onto a negative errno value through [`Error::errno`] and [`status`].
//!
//! ## Error Categories
//!
//! | Error              | Raised by                  | Hardware touched |
//! |--------------------|----------------------------|------------------|
//! | `NoSuchDevice`     | clock lookup, rate read    | No               |
//! | `Unsupported`      | verify, transition guard   | No               |
//! | `InvalidIndex`     | table lookup, transition   | No               |
//! | `InvalidFrequency` | divisor math               | No               |
//! | `InvalidDivisor`   | divisor math               | No               |
//! | `HardwareTimeout`  | CGU busy polling           | Maybe            |
//! | `NotInitialized`   | callbacks before `init`    | No               |

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Driver result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERRNO VALUES
// =============================================================================

/// Errno values understood by the host framework
pub mod errno {
    /// No such device
    pub const ENODEV: i32 = 19;
    /// Invalid argument
    pub const EINVAL: i32 = 22;
    /// Operation not supported
    pub const EOPNOTSUPP: i32 = 95;
    /// Connection timed out
    pub const ETIMEDOUT: i32 = 110;
}

// =============================================================================
// ERROR ENUM
// =============================================================================

/// CPU frequency driver error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The reference clock handle could not be obtained
    NoSuchDevice,
    /// The platform defines no operating range or has no CGU register
    Unsupported,
    /// Table index beyond the last valid entry
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Maximum valid index of the table
        max: usize,
    },
    /// A zero target frequency reached the divisor math
    InvalidFrequency,
    /// Divisor outside the 4-bit CSEL field
    InvalidDivisor(u32),
    /// The CGU update flag did not clear within the poll budget
    HardwareTimeout {
        /// Number of delayed re-polls performed before giving up
        polls: u32,
    },
    /// A callback that needs `init` ran before it
    NotInitialized,
}

impl Error {
    /// Negative errno value reported to the host framework
    pub const fn errno(&self) -> i32 {
        match self {
            Self::NoSuchDevice | Self::NotInitialized => -errno::ENODEV,
            Self::Unsupported => -errno::EOPNOTSUPP,
            Self::InvalidIndex { .. } | Self::InvalidFrequency | Self::InvalidDivisor(_) => {
                -errno::EINVAL
            },
            Self::HardwareTimeout { .. } => -errno::ETIMEDOUT,
        }
    }

    /// Whether the error was raised before any register write
    pub const fn is_validation(&self) -> bool {
        !matches!(self, Self::HardwareTimeout { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchDevice => write!(f, "reference clock not found"),
            Self::Unsupported => write!(f, "no operating frequency range on this platform"),
            Self::InvalidIndex { index, max } => {
                write!(f, "frequency index {} out of range (max {})", index, max)
            },
            Self::InvalidFrequency => write!(f, "target frequency is zero"),
            Self::InvalidDivisor(divisor) => write!(f, "CSEL divisor {} out of range", divisor),
            Self::HardwareTimeout { polls } => {
                write!(f, "CGU update still pending after {} polls", polls)
            },
            Self::NotInitialized => write!(f, "driver not initialized"),
        }
    }
}

// =============================================================================
// STATUS CONVERSION
// =============================================================================

/// Collapse a callback result into the framework's integer status
///
/// `0` on success, a negative errno otherwise.
pub fn status(result: Result<()>) -> i32 {
    match result {
        Ok(()) => 0,
        Err(e) => e.errno(),
    }
}

// =============================================================================
// TESTS
// =============================================================================
