use std::fmt;
use std::str::FromStr;

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
    Serializer,
};

use super::parse_human_bytes;
use crate::constants::SIZE_UNLIMITED;
use crate::errors::StorageError;

const UNITS: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// DiskSize is either a byte count or unlimited.
/// Unlimited compares greater than any byte count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiskSize {
    Bytes(u64),
    Unlimited,
}

impl DiskSize {
    pub const ZERO: DiskSize = DiskSize::Bytes(0);

    pub fn parse(s: &str) -> Result<Self, StorageError> {
        let s = s.trim();
        if s.eq_ignore_ascii_case(SIZE_UNLIMITED) {
            return Ok(Self::Unlimited);
        }

        if let Ok(bytes) = s.parse::<u64>() {
            return Ok(Self::Bytes(bytes));
        }

        let bytes = parse_human_bytes(s)?;
        Ok(Self::Bytes(bytes.size() as u64))
    }

    pub fn gib(n: u64) -> Self {
        Self::Bytes(n * 1024 * 1024 * 1024)
    }

    pub fn mib(n: u64) -> Self {
        Self::Bytes(n * 1024 * 1024)
    }

    pub fn is_unlimited(&self) -> bool {
        matches!(self, Self::Unlimited)
    }

    pub fn bytes(&self) -> Option<u64> {
        match self {
            Self::Bytes(n) => Some(*n),
            Self::Unlimited => None,
        }
    }

    /// Saturating sum, unlimited absorbs everything
    pub fn add(self, other: DiskSize) -> DiskSize {
        match (self, other) {
            (Self::Bytes(a), Self::Bytes(b)) => Self::Bytes(a.saturating_add(b)),
            _ => Self::Unlimited,
        }
    }

    pub fn percent(self, percent: u64) -> DiskSize {
        match self {
            Self::Bytes(n) => Self::Bytes(n.saturating_mul(percent) / 100),
            Self::Unlimited => Self::Unlimited,
        }
    }
}

impl Default for DiskSize {
    fn default() -> Self {
        Self::ZERO
    }
}

impl FromStr for DiskSize {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DiskSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = match self {
            Self::Unlimited => return write!(f, "{SIZE_UNLIMITED}"),
            Self::Bytes(bytes) => *bytes,
        };

        let mut unit = 0;
        let mut value = bytes;
        while unit < UNITS.len() - 1 && value >= 1024 && value % 1024 == 0 {
            value /= 1024;
            unit += 1;
        }

        if unit == 0 && bytes >= 1024 {
            // Not a round number of any unit, show an approximation
            let mut approx = bytes as f64;
            while unit < UNITS.len() - 1 && approx >= 1024.0 {
                approx /= 1024.0;
                unit += 1;
            }

            return write!(f, "{approx:.2} {}", UNITS[unit]);
        }

        write!(f, "{value} {}", UNITS[unit])
    }
}

// Sizes are written back as plain byte counts, or "unlimited"
impl Serialize for DiskSize {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Bytes(n) => serializer.serialize_u64(*n),
            Self::Unlimited => serializer.serialize_str(SIZE_UNLIMITED),
        }
    }
}

impl<'de> Deserialize<'de> for DiskSize {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u64),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Bytes(n)),
            Raw::Text(s) => Self::parse(&s).map_err(serde::de::Error::custom),
        }
    }
}
