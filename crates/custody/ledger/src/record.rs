use chrono::{DateTime, Duration, Utc};
use custody_types::{EscrowKey, EscrowVariant, PrincipalId, StoreHandle};
use uuid::Uuid;

use crate::error::CustodyError;

/// Storage location of an [`EscrowRecord`] inside its ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RecordHandle(Uuid);

impl RecordHandle {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for RecordHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "record:{}", self.0)
    }
}

/// One depositor's locked value for one asset class, plus its release
/// policy.
///
/// The record owns exactly one backing store. Deposits add to that store;
/// settlement drains and deletes it together with the record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscrowRecord {
    /// Releasable by the custodian, or by the owner, at any time.
    Simple {
        original_owner: PrincipalId,
        store: StoreHandle,
    },
    /// The owner may only self-return once `now >= unlock_time`. The
    /// custodian is never time-restricted.
    TimeLocked {
        original_owner: PrincipalId,
        unlock_time: DateTime<Utc>,
        store: StoreHandle,
    },
}

impl EscrowRecord {
    pub fn variant(&self) -> EscrowVariant {
        match self {
            Self::Simple { .. } => EscrowVariant::Simple,
            Self::TimeLocked { .. } => EscrowVariant::TimeLocked,
        }
    }

    pub fn original_owner(&self) -> PrincipalId {
        match self {
            Self::Simple { original_owner, .. } | Self::TimeLocked { original_owner, .. } => {
                *original_owner
            }
        }
    }

    pub fn store(&self) -> StoreHandle {
        match self {
            Self::Simple { store, .. } | Self::TimeLocked { store, .. } => *store,
        }
    }

    pub fn unlock_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Simple { .. } => None,
            Self::TimeLocked { unlock_time, .. } => Some(*unlock_time),
        }
    }

    /// Time left until the owner may self-return; zero once unlocked.
    pub fn remaining_lock(&self, now: DateTime<Utc>) -> Duration {
        match self.unlock_time() {
            Some(unlock_time) if unlock_time > now => unlock_time - now,
            _ => Duration::zero(),
        }
    }

    /// Reject a deposit whose entry point does not match this record's
    /// variant.
    pub fn ensure_variant(
        &self,
        key: &EscrowKey,
        requested: EscrowVariant,
    ) -> Result<(), CustodyError> {
        let existing = self.variant();
        if existing != requested {
            return Err(CustodyError::VariantMismatch {
                key: *key,
                existing,
                requested,
            });
        }
        Ok(())
    }

    /// The unlock time a lock deposit would leave behind, or
    /// `CannotShortenLock` when `requested` is strictly earlier than the
    /// current one.
    pub fn extended_unlock(
        &self,
        key: &EscrowKey,
        requested: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, CustodyError> {
        match self {
            Self::TimeLocked { unlock_time, .. } if requested < *unlock_time => {
                Err(CustodyError::CannotShortenLock {
                    key: *key,
                    current: *unlock_time,
                    requested,
                })
            }
            Self::TimeLocked { .. } => Ok(requested),
            Self::Simple { .. } => Err(CustodyError::VariantMismatch {
                key: *key,
                existing: EscrowVariant::Simple,
                requested: EscrowVariant::TimeLocked,
            }),
        }
    }

    /// Move the unlock time to `requested`, never backwards.
    pub fn extend_lock(
        &mut self,
        key: &EscrowKey,
        requested: DateTime<Utc>,
    ) -> Result<(), CustodyError> {
        let next = self.extended_unlock(key, requested)?;
        if let Self::TimeLocked { unlock_time, .. } = self {
            *unlock_time = next;
        }
        Ok(())
    }

    /// Whether the owner may withdraw at `now`.
    pub fn ensure_self_return_allowed(
        &self,
        key: &EscrowKey,
        now: DateTime<Utc>,
    ) -> Result<(), CustodyError> {
        match self {
            Self::Simple { .. } => Ok(()),
            Self::TimeLocked { unlock_time, .. } if now >= *unlock_time => Ok(()),
            Self::TimeLocked { unlock_time, .. } => Err(CustodyError::LockNotExpired {
                key: *key,
                unlock_time: *unlock_time,
                now,
            }),
        }
    }
}
