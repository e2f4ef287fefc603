//! MOD format versions.
//!
//! The version string is parsed once at the entry point; everything after
//! that dispatches on [`FormatVersion`].

use std::fmt;
use std::str::FromStr;

use crate::error::ModError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatVersion {
    /// Flat adjunct list with per-material primitives
    V1_06,
    /// Read only
    V1_08,
    /// Packet based
    V1_09,
    /// Packets plus reskins and material attributes
    V1_10,
    /// Binary, 32-bit packet indices
    V2_00,
    /// Binary, 16-bit packet indices, reskins
    V2_10,
    /// Binary, 16-bit packet indices, reskins and material attributes
    V2_12,
}

/// How geometry is grouped under materials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Bounded packets, each with its own adjuncts and matrix list
    Packets,
    /// One global adjunct list and per-material primitive records
    Legacy,
}

impl FormatVersion {
    pub const ALL: [Self; 7] = [
        Self::V1_06,
        Self::V1_08,
        Self::V1_09,
        Self::V1_10,
        Self::V2_00,
        Self::V2_10,
        Self::V2_12,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_06 => "1.06",
            Self::V1_08 => "1.08",
            Self::V1_09 => "1.09",
            Self::V1_10 => "1.10",
            Self::V2_00 => "2.00",
            Self::V2_10 => "2.10",
            Self::V2_12 => "2.12",
        }
    }

    pub fn is_binary(self) -> bool {
        matches!(self, Self::V2_00 | Self::V2_10 | Self::V2_12)
    }

    /// 1.08 files are only ever read
    pub fn can_encode(self) -> bool {
        self != Self::V1_08
    }

    /// Layout produced when encoding this version
    pub fn layout(self) -> Layout {
        match self {
            Self::V1_06 | Self::V1_08 => Layout::Legacy,
            _ => Layout::Packets,
        }
    }

    pub fn has_reskins(self) -> bool {
        matches!(self, Self::V1_10 | Self::V2_10 | Self::V2_12)
    }

    pub fn has_attributes(self) -> bool {
        matches!(self, Self::V1_10 | Self::V2_12)
    }

    /// Packet index fields are 32-bit only in 2.00
    pub fn wide_indices(self) -> bool {
        self == Self::V2_00
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatVersion {
    type Err = ModError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| ModError::UnsupportedVersion(s.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("1.06", FormatVersion::V1_06, false)]
    #[test_case("1.10", FormatVersion::V1_10, false)]
    #[test_case("2.00", FormatVersion::V2_00, true)]
    #[test_case("2.12", FormatVersion::V2_12, true)]
    fn parses_known_versions(text: &str, expected: FormatVersion, binary: bool) {
        let version: FormatVersion = text.parse().unwrap();
        assert_eq!(version, expected);
        assert_eq!(version.is_binary(), binary);
        assert_eq!(version.to_string(), text);
    }

    #[test]
    fn unknown_versions_are_unsupported() {
        assert!(matches!(
            "1.07".parse::<FormatVersion>(),
            Err(ModError::UnsupportedVersion(v)) if v == "1.07"
        ));
    }
}
