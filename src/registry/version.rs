//! Registry build version stamp.

use std::fmt;

use chrono::Utc;

/// Build version derived from UTC time, `YYYYMMDDHHMMSS` as a `u64`.
///
/// The low byte travels in every DATA header so a registry drift
/// between host and firmware is detectable. A mismatch is logged,
/// never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProtocolVersion {
    full: u64,
}

impl ProtocolVersion {
    /// Wrap an existing full stamp.
    #[must_use]
    pub const fn new(full: u64) -> Self {
        Self { full }
    }

    /// Stamp from the current UTC time.
    #[must_use]
    pub fn now() -> Self {
        let stamp = Utc::now().format("%Y%m%d%H%M%S").to_string();
        // Fourteen decimal digits always fit a u64.
        let full = stamp.parse().unwrap_or(0);
        Self { full }
    }

    /// The full `YYYYMMDDHHMMSS` stamp.
    #[must_use]
    pub const fn full(self) -> u64 {
        self.full
    }

    /// Truncated stamp carried in DATA headers.
    #[must_use]
    pub const fn short(self) -> u8 {
        (self.full & 0xFF) as u8
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (short {:#04x})", self.full, self.short())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_is_low_byte() {
        let version = ProtocolVersion::new(20250831120000);
        assert_eq!(version.short(), (20250831120000u64 & 0xFF) as u8);
    }

    #[test]
    fn test_now_is_fourteen_digits() {
        let full = ProtocolVersion::now().full();
        assert!(full >= 10u64.pow(13));
        assert!(full < 10u64.pow(14));
    }
}
