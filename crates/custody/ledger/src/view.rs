use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use custody_types::{AssetClass, EscrowKey, EscrowVariant, LedgerHandle, PrincipalId};
use serde::{Deserialize, Serialize};

/// Read-only snapshot of one escrow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowView {
    pub key: EscrowKey,
    pub variant: EscrowVariant,
    pub original_owner: PrincipalId,
    /// Escrowed amount in minor units
    pub amount: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlock_time: Option<DateTime<Utc>>,
}

/// Statistics about a ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerStatistics {
    pub ledger: LedgerHandle,
    pub custodian: PrincipalId,
    pub live_escrows: usize,
    pub time_locked_escrows: usize,
    /// Escrowed total per asset class, in minor units
    pub escrowed_by_asset: BTreeMap<AssetClass, u128>,
    /// Escrows settled since the ledger was created
    pub settled_escrows: u64,
}
