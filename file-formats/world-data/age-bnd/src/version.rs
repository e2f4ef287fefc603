use std::fmt;
use std::str::FromStr;

use crate::error::BndError;

/// BND text revisions. The material layout of BBND files follows the same
/// split.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum BndVersion {
    /// Materials carry effect and sound names; no edges
    #[default]
    V1_01,
    /// Typed header, edge list and per-face edge references
    V1_10,
}

impl BndVersion {
    pub const ALL: [Self; 2] = [Self::V1_01, Self::V1_10];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::V1_01 => "1.01",
            Self::V1_10 => "1.10",
        }
    }

    pub fn has_edges(self) -> bool {
        self == Self::V1_10
    }
}

impl FromStr for BndVersion {
    type Err = BndError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|version| version.as_str() == s)
            .ok_or_else(|| BndError::UnsupportedVersion(s.to_owned()))
    }
}

impl fmt::Display for BndVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_versions_only() {
        assert_eq!("1.10".parse::<BndVersion>().unwrap(), BndVersion::V1_10);
        assert!(matches!(
            "1.02".parse::<BndVersion>(),
            Err(BndError::UnsupportedVersion(v)) if v == "1.02"
        ));
    }
}
