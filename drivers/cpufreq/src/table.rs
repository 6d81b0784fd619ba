//! # Frequency Table
//!
//! The host framework consumes frequency tables in a sentinel-terminated
//! layout where each entry's auxiliary field counts the entries after it:
//!
//! ```text
//! ┌──────────────────────┬──────────────────────┬──────────────────────┐
//! │ [0] 1_000_000 kHz    │ [1]   800_000 kHz    │ [2] TABLE_END        │
//! │     remaining = 1    │     remaining = 0    │     remaining = -1   │
//! └──────────────────────┴──────────────────────┴──────────────────────┘
//!        ▲
//!        └── head.remaining == maximum valid index
//! ```
//!
//! The layout is kept as-is for [`FrequencyTable::entries`], but the driver
//! itself only goes through [`FrequencyTable::max_valid_index`] and
//! [`FrequencyTable::entry_count`].

use arrayvec::ArrayVec;

use crate::error::{Error, Result};
use crate::Khz;

// =============================================================================
// Constants
// =============================================================================

/// Frequency marker of the terminating entry
pub const TABLE_END: Khz = !1;

/// Auxiliary value of the terminating entry
pub const TABLE_END_REMAINING: i32 = -1;

/// Maximum number of real (non-terminator) entries
pub const MAX_TABLE_ENTRIES: usize = 15;

// =============================================================================
// Table Entry
// =============================================================================

/// One row of the frequency table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(C)]
pub struct FrequencyTableEntry {
    /// Operating frequency in kHz, `0` is a valid "unset" value
    pub frequency_khz: Khz,
    /// Number of entries after this one, `-1` on the terminator
    pub remaining_count: i32,
}

impl FrequencyTableEntry {
    /// The terminating entry
    pub const END: FrequencyTableEntry = FrequencyTableEntry {
        frequency_khz: TABLE_END,
        remaining_count: TABLE_END_REMAINING,
    };

    /// Whether this is the terminating entry
    #[inline]
    pub const fn is_end(&self) -> bool {
        self.frequency_khz == TABLE_END
    }
}

// =============================================================================
// Frequency Table
// =============================================================================

/// Immutable, sentinel-terminated table of supported frequencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    /// Real entries followed by exactly one terminator
    entries: ArrayVec<FrequencyTableEntry, { MAX_TABLE_ENTRIES + 1 }>,
}

impl FrequencyTable {
    /// Build the two-entry table (max, then min) used by the SC5xx driver
    ///
    /// Both bounds are zero on platforms without an operating range; the
    /// table is still well-formed in that case.
    pub fn from_range(min_khz: Khz, max_khz: Khz) -> Self {
        let mut entries = ArrayVec::new();
        entries.push(FrequencyTableEntry {
            frequency_khz: max_khz,
            remaining_count: 1,
        });
        entries.push(FrequencyTableEntry {
            frequency_khz: min_khz,
            remaining_count: 0,
        });
        entries.push(FrequencyTableEntry::END);
        Self { entries }
    }

    /// Build a table from frequencies listed from fastest to slowest
    ///
    /// Fails with `InvalidIndex` when the list is empty or exceeds
    /// [`MAX_TABLE_ENTRIES`], and with `InvalidFrequency` when the terminator
    /// marker appears in the list or a frequency is faster than the one
    /// before it.
    pub fn from_frequencies(frequencies: &[Khz]) -> Result<Self> {
        if frequencies.is_empty() || frequencies.len() > MAX_TABLE_ENTRIES {
            return Err(Error::InvalidIndex {
                index: frequencies.len(),
                max: MAX_TABLE_ENTRIES,
            });
        }
        if frequencies.contains(&TABLE_END) || frequencies.windows(2).any(|w| w[1] > w[0]) {
            return Err(Error::InvalidFrequency);
        }

        let mut entries = ArrayVec::new();
        let last = frequencies.len() - 1;
        for (i, &frequency_khz) in frequencies.iter().enumerate() {
            entries.push(FrequencyTableEntry {
                frequency_khz,
                remaining_count: (last - i) as i32,
            });
        }
        entries.push(FrequencyTableEntry::END);
        Ok(Self { entries })
    }

    /// Number of real entries (terminator excluded)
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.max_valid_index() + 1
    }

    /// Highest index holding a real entry
    ///
    /// Taken from the head entry's `remaining_count`.
    #[inline]
    pub fn max_valid_index(&self) -> usize {
        self.entries[0].remaining_count as usize
    }

    /// Entry at `index`
    ///
    /// `max_valid_index() + 1` addresses the terminator; anything beyond is
    /// `InvalidIndex`.
    pub fn entry_at(&self, index: usize) -> Result<FrequencyTableEntry> {
        self.entries.get(index).copied().ok_or(Error::InvalidIndex {
            index,
            max: self.max_valid_index(),
        })
    }

    /// Frequency of a real entry
    pub fn frequency_at(&self, index: usize) -> Result<Khz> {
        if index > self.max_valid_index() {
            return Err(Error::InvalidIndex {
                index,
                max: self.max_valid_index(),
            });
        }
        Ok(self.entries[index].frequency_khz)
    }

    /// Iterate over the real entries
    pub fn iter(&self) -> impl Iterator<Item = &FrequencyTableEntry> + '_ {
        self.entries[..self.entry_count()].iter()
    }

    /// Raw layout including the terminator, as handed to the host framework
    #[inline]
    pub fn entries(&self) -> &[FrequencyTableEntry] {
        &self.entries
    }

    /// Index of the entry running at exactly `frequency_khz`
    pub fn index_of(&self, frequency_khz: Khz) -> Option<usize> {
        self.iter().position(|e| e.frequency_khz == frequency_khz)
    }

    /// Lowest frequency in the table
    pub fn min_frequency(&self) -> Khz {
        self.iter().map(|e| e.frequency_khz).min().unwrap_or(0)
    }

    /// Highest frequency in the table
    pub fn max_frequency(&self) -> Khz {
        self.iter().map(|e| e.frequency_khz).max().unwrap_or(0)
    }

    /// Whether the table describes no operating range at all
    #[inline]
    pub fn is_unsupported(&self) -> bool {
        self.min_frequency() == 0 && self.max_frequency() == 0
    }

    /// Log every entry at debug level
    pub fn dump(&self) {
        for (i, entry) in self.iter().enumerate() {
            log::debug!("cpufreq table[{}]: {} kHz", i, entry.frequency_khz);
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
