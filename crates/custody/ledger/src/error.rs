use chrono::{DateTime, Utc};
use custody_types::{AssetClass, EscrowKey, EscrowVariant, LedgerHandle, PrincipalId, StoreHandle};
use thiserror::Error;

/// Errors from custody ledger operations.
///
/// Every variant aborts the operation that produced it with no side effects.
#[derive(Debug, Error)]
pub enum CustodyError {
    // --- Ledger lifecycle ---
    #[error("ledger already exists for creator {creator}")]
    AlreadyExists { creator: PrincipalId },

    #[error("ledger not found: {0}")]
    NotFound(String),

    // --- Escrow lookup ---
    #[error("no escrow for {key}")]
    NoSuchEscrow { key: EscrowKey },

    // --- Authorization ---
    #[error("{caller} is not authorized to {action}")]
    NotAuthorized {
        caller: PrincipalId,
        action: &'static str,
    },

    // --- State machine / lock policy ---
    #[error("escrow {key} is {existing}; cannot deposit as {requested}")]
    VariantMismatch {
        key: EscrowKey,
        existing: EscrowVariant,
        requested: EscrowVariant,
    },

    #[error("cannot shorten lock on {key}: unlocks at {current}, requested {requested}")]
    CannotShortenLock {
        key: EscrowKey,
        current: DateTime<Utc>,
        requested: DateTime<Utc>,
    },

    #[error("lock on {key} has not expired: unlocks at {unlock_time}, now {now}")]
    LockNotExpired {
        key: EscrowKey,
        unlock_time: DateTime<Utc>,
        now: DateTime<Utc>,
    },

    // --- Deposit validation ---
    #[error("invalid deposit amount {amount}: minimum is {minimum}")]
    InvalidAmount { amount: u64, minimum: u64 },

    #[error("invalid lock duration: {0}")]
    InvalidLockDuration(String),

    #[error("lock duration of {requested_secs}s exceeds maximum of {max_secs}s")]
    LockTooLong { requested_secs: i64, max_secs: u64 },

    // --- Collaborators ---
    #[error("asset transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("ledger integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("configuration error: {0}")]
    Config(String),
}

/// Coarse error category, for clients that only branch on the kind of
/// failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    NoSuchEscrow,
    NotAuthorized,
    VariantMismatch,
    CannotShortenLock,
    LockNotExpired,
    InvalidInput,
    Transfer,
    Internal,
}

impl CustodyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::NoSuchEscrow { .. } => ErrorKind::NoSuchEscrow,
            Self::NotAuthorized { .. } => ErrorKind::NotAuthorized,
            Self::VariantMismatch { .. } => ErrorKind::VariantMismatch,
            Self::CannotShortenLock { .. } => ErrorKind::CannotShortenLock,
            Self::LockNotExpired { .. } => ErrorKind::LockNotExpired,
            Self::InvalidAmount { .. }
            | Self::InvalidLockDuration(_)
            | Self::LockTooLong { .. }
            | Self::Config(_) => ErrorKind::InvalidInput,
            Self::Transfer(_) => ErrorKind::Transfer,
            Self::IntegrityViolation(_) => ErrorKind::Internal,
        }
    }

    pub fn unknown_ledger(handle: LedgerHandle) -> Self {
        Self::NotFound(handle.to_string())
    }
}

/// Errors reported by an asset transfer port.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("insufficient {asset} balance for {principal}: required {required}, available {available}")]
    InsufficientBalance {
        principal: PrincipalId,
        asset: AssetClass,
        required: u64,
        available: u64,
    },

    #[error("unknown store: {0}")]
    UnknownStore(StoreHandle),

    #[error("store {store} still holds {balance}")]
    StoreNotEmpty { store: StoreHandle, balance: u64 },

    #[error("store {store} is not owned by {ledger}")]
    ForeignStore {
        store: StoreHandle,
        ledger: LedgerHandle,
    },

    #[error("asset mismatch: expected {expected}, got {actual}")]
    AssetMismatch {
        expected: AssetClass,
        actual: AssetClass,
    },

    #[error("balance overflow crediting {amount} {asset}")]
    BalanceOverflow { asset: AssetClass, amount: u64 },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> EscrowKey {
        EscrowKey::new(
            AssetClass::new("USD").unwrap(),
            PrincipalId::derive("depositor"),
        )
    }

    #[test]
    fn kinds_are_distinct_for_policy_failures() {
        let now = Utc::now();
        let not_expired = CustodyError::LockNotExpired {
            key: key(),
            unlock_time: now,
            now,
        };
        let shorten = CustodyError::CannotShortenLock {
            key: key(),
            current: now,
            requested: now,
        };
        let unauthorized = CustodyError::NotAuthorized {
            caller: PrincipalId::derive("mallory"),
            action: "claim",
        };

        assert_eq!(not_expired.kind(), ErrorKind::LockNotExpired);
        assert_eq!(shorten.kind(), ErrorKind::CannotShortenLock);
        assert_eq!(unauthorized.kind(), ErrorKind::NotAuthorized);
    }

    #[test]
    fn transfer_errors_convert() {
        let err: CustodyError = TransferError::UnknownStore(StoreHandle::generate()).into();
        assert_eq!(err.kind(), ErrorKind::Transfer);
        assert!(err.to_string().starts_with("asset transfer failed"));
    }

    #[test]
    fn variant_mismatch_display() {
        let err = CustodyError::VariantMismatch {
            key: key(),
            existing: EscrowVariant::TimeLocked,
            requested: EscrowVariant::Simple,
        };
        let s = err.to_string();
        assert!(s.contains("time_locked"));
        assert!(s.contains("simple"));
        assert!(s.contains("USD"));
    }
}
