// Copyright (c) 2025 Dimitris Kafetzis
//
// Licensed under the MIT License.
// See LICENSE file in the project root for full license information.
//
// SPDX-License-Identifier: MIT

//! Memory sizes with human-readable parsing.
//!
//! A [`MemoryBudget`] is used both for the capacity of a [`crate::MemoryPool`]
//! and for the size of the scratch arena carved from it.

use crate::MemoryError;
use std::fmt;

const KIB: usize = 1024;
const MIB: usize = 1024 * KIB;
const GIB: usize = 1024 * MIB;

/// A byte count with human-readable parsing.
///
/// # Parsing
/// Supports binary suffixes, case-insensitive:
/// - `"700K"` or `"700KB"` → 700 × 1024 bytes
/// - `"8M"` or `"8MB"` → 8 × 1024² bytes
/// - `"1G"` or `"1GB"` → 1 × 1024³ bytes
/// - `"716800"` or `"716800B"` → raw byte count
///
/// # Examples
/// ```
/// use memory_manager::MemoryBudget;
///
/// let arena = MemoryBudget::parse("700K").unwrap();
/// assert_eq!(arena.as_bytes(), 700 * 1024);
/// assert_eq!(arena.to_string(), "700 KB");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MemoryBudget {
    bytes: usize,
}

impl MemoryBudget {
    /// Creates a budget from a byte count.
    pub const fn from_bytes(bytes: usize) -> Self {
        Self { bytes }
    }

    /// Creates a budget from kibibytes.
    pub const fn from_kb(kb: usize) -> Self {
        Self { bytes: kb * KIB }
    }

    /// Creates a budget from mebibytes.
    pub const fn from_mb(mb: usize) -> Self {
        Self { bytes: mb * MIB }
    }

    /// Returns the budget in bytes.
    pub const fn as_bytes(&self) -> usize {
        self.bytes
    }

    /// Returns the budget in kibibytes (truncated).
    pub const fn as_kb(&self) -> usize {
        self.bytes / KIB
    }

    /// Parses a human-readable size string.
    ///
    /// # Errors
    /// [`MemoryError::InvalidSize`] for unparseable or overflowing input,
    /// [`MemoryError::ZeroSizedAllocation`] for a zero size.
    pub fn parse(s: &str) -> Result<Self, MemoryError> {
        let s = s.trim();
        let invalid = || MemoryError::InvalidSize { input: s.to_string() };
        if s.is_empty() {
            return Err(invalid());
        }

        let upper = s.to_ascii_uppercase();
        let stripped = upper.strip_suffix('B').unwrap_or(&upper);
        let (num_str, multiplier) = match stripped.as_bytes().last() {
            Some(b'K') => (&stripped[..stripped.len() - 1], KIB),
            Some(b'M') => (&stripped[..stripped.len() - 1], MIB),
            Some(b'G') => (&stripped[..stripped.len() - 1], GIB),
            _ => (stripped, 1),
        };

        let value: usize = num_str.trim().parse().map_err(|_| invalid())?;
        let bytes = value.checked_mul(multiplier).ok_or_else(invalid)?;
        if bytes == 0 {
            return Err(MemoryError::ZeroSizedAllocation);
        }
        Ok(Self { bytes })
    }
}

impl fmt::Display for MemoryBudget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = self.bytes;
        if b >= GIB && b % GIB == 0 {
            write!(f, "{} GB", b / GIB)
        } else if b >= MIB && b % MIB == 0 {
            write!(f, "{} MB", b / MIB)
        } else if b >= KIB && b % KIB == 0 {
            write!(f, "{} KB", b / KIB)
        } else {
            write!(f, "{b} B")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructors() {
        assert_eq!(MemoryBudget::from_kb(700).as_bytes(), 716_800);
        assert_eq!(MemoryBudget::from_mb(8).as_kb(), 8192);
    }

    #[test]
    fn test_parse_kilobytes() {
        assert_eq!(MemoryBudget::parse("700K").unwrap().as_bytes(), 700 * 1024);
        assert_eq!(MemoryBudget::parse("700KB").unwrap().as_bytes(), 700 * 1024);
        assert_eq!(MemoryBudget::parse("700kb").unwrap().as_bytes(), 700 * 1024);
    }

    #[test]
    fn test_parse_mega_and_giga() {
        assert_eq!(MemoryBudget::parse("8M").unwrap(), MemoryBudget::from_mb(8));
        assert_eq!(MemoryBudget::parse("8mb").unwrap(), MemoryBudget::from_mb(8));
        assert_eq!(MemoryBudget::parse("1G").unwrap().as_bytes(), GIB);
    }

    #[test]
    fn test_parse_raw_bytes() {
        assert_eq!(MemoryBudget::parse("716800").unwrap().as_kb(), 700);
        assert_eq!(MemoryBudget::parse("64B").unwrap().as_bytes(), 64);
        assert_eq!(MemoryBudget::parse("  512K  ").unwrap().as_kb(), 512);
    }

    #[test]
    fn test_parse_invalid() {
        assert!(matches!(
            MemoryBudget::parse(""),
            Err(MemoryError::InvalidSize { .. })
        ));
        assert!(matches!(
            MemoryBudget::parse("lots"),
            Err(MemoryError::InvalidSize { .. })
        ));
        assert!(matches!(
            MemoryBudget::parse("0K"),
            Err(MemoryError::ZeroSizedAllocation)
        ));
        assert!(MemoryBudget::parse("99999999999999999999G").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(MemoryBudget::from_kb(700).to_string(), "700 KB");
        assert_eq!(MemoryBudget::from_mb(8).to_string(), "8 MB");
        assert_eq!(MemoryBudget::from_bytes(100).to_string(), "100 B");
    }

    #[test]
    fn test_serde_json() {
        let b = MemoryBudget::from_kb(700);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(serde_json::from_str::<MemoryBudget>(&json).unwrap(), b);
    }
}
