use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TypeError;

const DERIVATION_TAG: &[u8] = b"custody-principal-v1:";

/// Identity of a principal: a depositor, a custodian, or any other holder of
/// funds.
///
/// The id is a 32-byte hash. How a host authenticates a caller and maps it to
/// a `PrincipalId` is outside the ledger; the ledger only compares ids.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PrincipalId([u8; 32]);

impl PrincipalId {
    /// Derive a principal id from a stable name (account name, public key
    /// encoding, organization id).
    pub fn derive(material: impl AsRef<[u8]>) -> Self {
        let mut hasher = blake3::Hasher::new();
        hasher.update(DERIVATION_TAG);
        hasher.update(material.as_ref());
        Self(*hasher.finalize().as_bytes())
    }

    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short display form (first 8 bytes hex).
    pub fn short_id(&self) -> String {
        hex::encode(&self.0[..8])
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pr:{}", self.short_id())
    }
}

impl fmt::Debug for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrincipalId({})", self.short_id())
    }
}

impl FromStr for PrincipalId {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes)
            .map_err(|_| TypeError::InvalidPrincipal(s.to_string()))?;
        Ok(Self(bytes))
    }
}

impl Serialize for PrincipalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for PrincipalId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derive_is_deterministic() {
        assert_eq!(PrincipalId::derive("alice"), PrincipalId::derive("alice"));
        assert_ne!(PrincipalId::derive("alice"), PrincipalId::derive("bob"));
    }

    #[test]
    fn hex_parse_matches_bytes() {
        let id = PrincipalId::derive("custodian");
        let parsed: PrincipalId = id.to_hex().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-hex".parse::<PrincipalId>().is_err());
        assert!("abcd".parse::<PrincipalId>().is_err());
    }

    #[test]
    fn display_uses_short_form() {
        let id = PrincipalId::from_bytes([0xab; 32]);
        assert_eq!(id.to_string(), "pr:abababababababab");
    }

    #[test]
    fn serializes_as_full_hex() {
        let id = PrincipalId::from_bytes([1; 32]);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
    }
}
