//! Chain identifier.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An EVM chain id. The single chain identifier used by every stream,
/// auction and one-shot call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
    pub const ETHEREUM: ChainId = ChainId(1);
    pub const OPTIMISM: ChainId = ChainId(10);
    pub const BSC: ChainId = ChainId(56);
    pub const POLYGON: ChainId = ChainId(137);
    pub const BASE: ChainId = ChainId(8453);
    pub const ARBITRUM: ChainId = ChainId(42161);

    const NAMED: [(&'static str, ChainId); 6] = [
        ("ethereum", Self::ETHEREUM),
        ("optimism", Self::OPTIMISM),
        ("bsc", Self::BSC),
        ("polygon", Self::POLYGON),
        ("base", Self::BASE),
        ("arbitrum", Self::ARBITRUM),
    ];

    pub const fn id(self) -> u64 {
        self.0
    }

    /// Human-readable name for well-known chains.
    pub fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, id)| *id == self)
            .map(|(name, _)| *name)
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => write!(f, "{name}"),
            None => write!(f, "{}", self.0),
        }
    }
}

/// Error returned when parsing an unknown chain name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown chain: {0}")]
pub struct UnknownChain(pub String);

impl FromStr for ChainId {
    type Err = UnknownChain;

    /// Accepts a numeric id (`"137"`) or a well-known name (`"polygon"`,
    /// with `"mainnet"` and `"bnb"` as aliases).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<u64>() {
            return Ok(Self(id));
        }
        let lower = s.to_ascii_lowercase();
        let lower = match lower.as_str() {
            "mainnet" => "ethereum",
            "bnb" => "bsc",
            other => other,
        };
        Self::NAMED
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, id)| *id)
            .ok_or_else(|| UnknownChain(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_name_when_known() {
        assert_eq!(ChainId::POLYGON.to_string(), "polygon");
        assert_eq!(ChainId(31337).to_string(), "31337");
    }

    #[test]
    fn parse_names_and_numbers() {
        assert_eq!("ethereum".parse::<ChainId>().unwrap(), ChainId::ETHEREUM);
        assert_eq!("Mainnet".parse::<ChainId>().unwrap(), ChainId::ETHEREUM);
        assert_eq!("bnb".parse::<ChainId>().unwrap(), ChainId::BSC);
        assert_eq!("137".parse::<ChainId>().unwrap(), ChainId::POLYGON);
        assert!("dogechain-x".parse::<ChainId>().is_err());
    }

    #[test]
    fn serde_is_a_plain_number() {
        let json = serde_json::to_string(&ChainId::BSC).unwrap();
        assert_eq!(json, "56");
        let parsed: ChainId = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, ChainId::ETHEREUM);
    }
}
