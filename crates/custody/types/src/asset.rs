use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

/// Longest accepted asset-class code.
pub const MAX_ASSET_CODE_LEN: usize = 16;

/// Asset class identifier, e.g. `USD`, `BTC`, `APT`.
///
/// The code is stored inline so the type stays `Copy`; a ledger treats it as
/// opaque and only compares it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetClass {
    code: [u8; MAX_ASSET_CODE_LEN],
    len: u8,
}

impl AssetClass {
    pub fn new(code: &str) -> Result<Self, TypeError> {
        let invalid = |reason| TypeError::InvalidAssetClass {
            code: code.to_string(),
            reason,
        };

        if code.is_empty() {
            return Err(invalid("code is empty"));
        }
        if code.len() > MAX_ASSET_CODE_LEN {
            return Err(invalid("code is longer than 16 bytes"));
        }
        if !code
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
        {
            return Err(invalid("code must be ASCII alphanumeric, '-', '_' or '.'"));
        }

        let mut buf = [0u8; MAX_ASSET_CODE_LEN];
        buf[..code.len()].copy_from_slice(code.as_bytes());
        Ok(Self {
            code: buf,
            len: code.len() as u8,
        })
    }

    pub fn as_str(&self) -> &str {
        // Construction only admits ASCII.
        std::str::from_utf8(&self.code[..self.len as usize]).unwrap_or_default()
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AssetClass({})", self.as_str())
    }
}

impl FromStr for AssetClass {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl Serialize for AssetClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssetClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::new(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_ticker_codes() {
        let usd = AssetClass::new("USD").unwrap();
        assert_eq!(usd.as_str(), "USD");
        assert_eq!(format!("{}", usd), "USD");
        assert!(AssetClass::new("wrapped.BTC-2").is_ok());
        assert!(AssetClass::new("ABCDEFGHIJKLMNOP").is_ok());
    }

    #[test]
    fn rejects_malformed_codes() {
        assert!(AssetClass::new("").is_err());
        assert!(AssetClass::new("ABCDEFGHIJKLMNOPQ").is_err());
        assert!(AssetClass::new("US D").is_err());
        assert!(AssetClass::new("€UR").is_err());
    }

    #[test]
    fn parse_and_new_agree() {
        assert_eq!(AssetClass::new("USD").unwrap(), "USD".parse().unwrap());
        assert_ne!(AssetClass::new("USD").unwrap(), AssetClass::new("USDC").unwrap());
    }

    #[test]
    fn orders_lexically() {
        let mut codes: Vec<AssetClass> = ["USD", "AB", "Z", "AAA"]
            .iter()
            .map(|c| AssetClass::new(c).unwrap())
            .collect();
        codes.sort();
        let sorted: Vec<&str> = codes.iter().map(|c| c.as_str()).collect();
        assert_eq!(sorted, vec!["AAA", "AB", "USD", "Z"]);
    }

    #[test]
    fn deserialization_validates() {
        let ok: AssetClass = serde_json::from_str("\"EUR\"").unwrap();
        assert_eq!(ok.as_str(), "EUR");
        assert!(serde_json::from_str::<AssetClass>("\"\"").is_err());
    }
}
