use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Duration, Utc};
use custody_types::{
    AssetClass, EscrowKey, EscrowVariant, LedgerHandle, PrincipalId, SettlementKind,
};
use tracing::{debug, error, info, warn};

use crate::error::CustodyError;
use crate::index::EscrowIndex;
use crate::journal::{Journal, LedgerEvent, LedgerEventKind};
use crate::port::{AssetTransferPort, RejectedFunds, TransferCapability};
use crate::record::{EscrowRecord, RecordHandle};
use crate::view::{EscrowView, LedgerStatistics};

/// Custody ledger of one custodian.
///
/// Holds at most one escrow per `(asset_class, depositor)`. Deposits create
/// or top up escrows; settlements (`claim`, `return_to_depositor`,
/// `self_return`) drain an escrow completely and delete it together with its
/// backing store and index entry.
///
/// Every mutating operation checks all of its preconditions before its first
/// effect, so a failed call leaves the ledger, the journal and the port
/// untouched.
#[derive(Debug)]
pub struct Ledger {
    handle: LedgerHandle,
    custodian: PrincipalId,
    created_at: DateTime<Utc>,
    index: EscrowIndex,
    records: HashMap<RecordHandle, EscrowRecord>,
    capability: TransferCapability,
    journal: Journal,
    settled: u64,
}

impl Ledger {
    pub(crate) fn new(
        custodian: PrincipalId,
        created_at: DateTime<Utc>,
        journal_capacity: Option<usize>,
    ) -> Self {
        let handle = LedgerHandle::generate();
        Self {
            handle,
            custodian,
            created_at,
            index: EscrowIndex::new(),
            records: HashMap::new(),
            capability: TransferCapability::issue(handle),
            journal: Journal::new(journal_capacity),
            settled: 0,
        }
    }

    pub fn handle(&self) -> LedgerHandle {
        self.handle
    }

    pub fn custodian(&self) -> PrincipalId {
        self.custodian
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn index(&self) -> &EscrowIndex {
        &self.index
    }

    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    pub fn events(&self) -> impl Iterator<Item = &LedgerEvent> {
        self.journal.entries()
    }

    pub fn record(&self, asset: AssetClass, depositor: PrincipalId) -> Option<&EscrowRecord> {
        let key = EscrowKey::new(asset, depositor);
        self.index
            .get(&key)
            .and_then(|handle| self.records.get(&handle))
    }

    /// Deposit into a `Simple` escrow, creating it on first use.
    pub(crate) fn deposit_no_lock<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        asset: AssetClass,
        depositor: PrincipalId,
        amount: u64,
    ) -> Result<(), CustodyError> {
        let key = EscrowKey::new(asset, depositor);
        let Some((_, record)) = self.find(&key)? else {
            return self.open(port, now, key, amount, None);
        };

        record.ensure_variant(&key, EscrowVariant::Simple)?;
        let store = record.store();
        port.deposit(&depositor, store, amount)?;
        let balance = port.balance(store)?;

        debug!(ledger = %self.handle, key = %key, amount, balance, "Escrow topped up");
        self.journal.record(
            now,
            LedgerEventKind::Deposited {
                key,
                amount,
                balance,
            },
        );
        Ok(())
    }

    /// Deposit into a `TimeLocked` escrow unlocking at `now + lock_duration`,
    /// creating it on first use.
    ///
    /// On an existing escrow the unlock time moves to the new value if that is
    /// later, stays if equal, and the call fails with `CannotShortenLock` if it
    /// is earlier.
    pub(crate) fn deposit_with_lock<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        asset: AssetClass,
        depositor: PrincipalId,
        amount: u64,
        lock_duration: Duration,
    ) -> Result<(), CustodyError> {
        let key = EscrowKey::new(asset, depositor);
        let requested_unlock = now.checked_add_signed(lock_duration).ok_or_else(|| {
            CustodyError::InvalidLockDuration(format!(
                "{}s from {} overflows the timestamp range",
                lock_duration.num_seconds(),
                now
            ))
        })?;

        let Some((handle, record)) = self.find(&key)? else {
            return self.open(port, now, key, amount, Some(requested_unlock));
        };

        record.ensure_variant(&key, EscrowVariant::TimeLocked)?;
        let previous = record.unlock_time();
        let next_unlock = match record.extended_unlock(&key, requested_unlock) {
            Ok(next) => next,
            Err(err) => {
                warn!(ledger = %self.handle, key = %key, error = %err, "Lock shortening rejected");
                return Err(err);
            }
        };
        let store = record.store();

        port.deposit(&depositor, store, amount)?;
        let balance = port.balance(store)?;

        if let Some(record) = self.records.get_mut(&handle) {
            record.extend_lock(&key, next_unlock)?;
        }

        debug!(ledger = %self.handle, key = %key, amount, balance, "Escrow topped up");
        self.journal.record(
            now,
            LedgerEventKind::Deposited {
                key,
                amount,
                balance,
            },
        );
        if let Some(previous) = previous.filter(|previous| next_unlock > *previous) {
            debug!(
                ledger = %self.handle,
                key = %key,
                previous = %previous,
                unlock_time = %next_unlock,
                "Lock extended"
            );
            self.journal.record(
                now,
                LedgerEventKind::LockExtended {
                    key,
                    previous,
                    unlock_time: next_unlock,
                },
            );
        }
        Ok(())
    }

    /// Create the backing store and record for a fresh key, then fund it.
    fn open<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        key: EscrowKey,
        amount: u64,
        unlock_time: Option<DateTime<Utc>>,
    ) -> Result<(), CustodyError> {
        let store = port.create_store(&self.capability, key.asset_class)?;
        if let Err(err) = port.deposit(&key.depositor, store, amount) {
            if let Err(cleanup) = port.destroy_store(&self.capability, store) {
                warn!(
                    ledger = %self.handle,
                    store = %store,
                    error = %cleanup,
                    "Failed to discard store after rejected deposit"
                );
            }
            return Err(err.into());
        }

        let record = match unlock_time {
            None => EscrowRecord::Simple {
                original_owner: key.depositor,
                store,
            },
            Some(unlock_time) => EscrowRecord::TimeLocked {
                original_owner: key.depositor,
                unlock_time,
                store,
            },
        };
        let variant = record.variant();
        let handle = RecordHandle::generate();
        self.index.insert(key, handle)?;
        self.records.insert(handle, record);

        info!(
            ledger = %self.handle,
            key = %key,
            variant = %variant,
            amount,
            "Escrow opened"
        );
        self.journal.record(
            now,
            LedgerEventKind::Opened {
                key,
                variant,
                unlock_time,
            },
        );
        self.journal.record(
            now,
            LedgerEventKind::Deposited {
                key,
                amount,
                balance: amount,
            },
        );
        Ok(())
    }

    /// Custodian takes the whole escrow. Never time-restricted.
    pub(crate) fn claim<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        caller: PrincipalId,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<u64, CustodyError> {
        self.ensure_custodian(caller, "claim escrows")?;
        let key = EscrowKey::new(asset, depositor);
        let (handle, _) = self.lookup(&key)?;
        self.settle(port, now, key, handle, self.custodian, SettlementKind::Claim)
    }

    /// Custodian sends the whole escrow back to its original owner. Never
    /// time-restricted.
    pub(crate) fn return_to_depositor<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        caller: PrincipalId,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<u64, CustodyError> {
        self.ensure_custodian(caller, "return escrows")?;
        let key = EscrowKey::new(asset, depositor);
        let (handle, record) = self.lookup(&key)?;
        let recipient = record.original_owner();
        self.settle(port, now, key, handle, recipient, SettlementKind::Return)
    }

    /// Depositor withdraws their own escrow; time-locked escrows only once
    /// unlocked.
    ///
    /// The escrow is looked up under `(asset, caller)`, so a caller without
    /// an escrow of their own gets `NoSuchEscrow`, never access to another
    /// depositor's escrow.
    pub(crate) fn self_return<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        caller: PrincipalId,
        asset: AssetClass,
    ) -> Result<u64, CustodyError> {
        let key = EscrowKey::new(asset, caller);
        let (handle, record) = self.lookup(&key)?;

        if let Err(err) = record.ensure_self_return_allowed(&key, now) {
            warn!(ledger = %self.handle, key = %key, error = %err, "Premature self-return rejected");
            return Err(err);
        }
        if record.original_owner() != caller {
            warn!(ledger = %self.handle, key = %key, caller = %caller, "Self-return by non-owner rejected");
            return Err(CustodyError::NotAuthorized {
                caller,
                action: "withdraw an escrow it does not own",
            });
        }

        self.settle(port, now, key, handle, caller, SettlementKind::SelfReturn)
    }

    /// Drain the escrow to `recipient`, then delete store, record and index
    /// entry. A credit the port refuses puts the funds back into the store
    /// and fails the settlement.
    fn settle<P: AssetTransferPort + ?Sized>(
        &mut self,
        port: &mut P,
        now: DateTime<Utc>,
        key: EscrowKey,
        handle: RecordHandle,
        recipient: PrincipalId,
        kind: SettlementKind,
    ) -> Result<u64, CustodyError> {
        let store = self.lookup(&key)?.1.store();
        let pending = port.balance(store)?;
        port.can_credit(&recipient, key.asset_class, pending)?;

        let funds = port.withdraw_balance(&self.capability, store)?;
        let amount = funds.amount();
        let credited = port.deposit_funds(&recipient, funds);
        if let Err(RejectedFunds {
            error: refused,
            funds,
        }) = credited
        {
            if let Err(restore) = port.restore(&self.capability, store, funds) {
                error!(
                    ledger = %self.handle,
                    key = %key,
                    store = %store,
                    error = %restore,
                    "Withdrawn funds could not be restored"
                );
                return Err(CustodyError::IntegrityViolation(format!(
                    "escrow {} lost {} after a refused credit: {}",
                    key, amount, restore
                )));
            }
            warn!(ledger = %self.handle, key = %key, error = %refused, "Settlement credit refused");
            return Err(refused.into());
        }
        // The value has reached the recipient; an undeletable empty store
        // does not hold the settlement back.
        if let Err(err) = port.destroy_store(&self.capability, store) {
            warn!(ledger = %self.handle, store = %store, error = %err, "Drained store not destroyed");
        }

        self.index.remove(&key);
        self.records.remove(&handle);
        self.settled += 1;

        info!(
            ledger = %self.handle,
            key = %key,
            settlement = %kind,
            recipient = %recipient,
            amount,
            "Escrow settled"
        );
        self.journal.record(
            now,
            LedgerEventKind::Settled {
                key,
                kind,
                recipient,
                amount,
            },
        );
        Ok(amount)
    }

    pub fn escrowed_amount<P: AssetTransferPort + ?Sized>(
        &self,
        port: &P,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<u64>, CustodyError> {
        match self.find(&EscrowKey::new(asset, depositor))? {
            Some((_, record)) => Ok(Some(port.balance(record.store())?)),
            None => Ok(None),
        }
    }

    /// Zero for `Simple` or unlocked escrows, `None` when there is no escrow.
    pub fn remaining_lock_time(
        &self,
        now: DateTime<Utc>,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<Duration>, CustodyError> {
        Ok(self
            .find(&EscrowKey::new(asset, depositor))?
            .map(|(_, record)| record.remaining_lock(now)))
    }

    pub fn escrow<P: AssetTransferPort + ?Sized>(
        &self,
        port: &P,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<EscrowView>, CustodyError> {
        let key = EscrowKey::new(asset, depositor);
        match self.find(&key)? {
            Some((_, record)) => Ok(Some(view_of(port, key, record)?)),
            None => Ok(None),
        }
    }

    /// All live escrows, ordered by key.
    pub fn escrows<P: AssetTransferPort + ?Sized>(
        &self,
        port: &P,
    ) -> Result<Vec<EscrowView>, CustodyError> {
        let mut keys: Vec<EscrowKey> = self.index.iter().map(|(key, _)| *key).collect();
        keys.sort();

        keys.into_iter()
            .map(|key| {
                let (_, record) = self.lookup(&key)?;
                view_of(port, key, record)
            })
            .collect()
    }

    pub fn statistics<P: AssetTransferPort + ?Sized>(
        &self,
        port: &P,
    ) -> Result<LedgerStatistics, CustodyError> {
        let mut escrowed_by_asset: BTreeMap<AssetClass, u128> = BTreeMap::new();
        let mut time_locked_escrows = 0;

        for (key, handle) in self.index.iter() {
            let record = self.records.get(handle).ok_or_else(|| dangling(key))?;
            if record.variant() == EscrowVariant::TimeLocked {
                time_locked_escrows += 1;
            }
            *escrowed_by_asset.entry(key.asset_class).or_insert(0) +=
                port.balance(record.store())? as u128;
        }

        Ok(LedgerStatistics {
            ledger: self.handle,
            custodian: self.custodian,
            live_escrows: self.index.len(),
            time_locked_escrows,
            escrowed_by_asset,
            settled_escrows: self.settled,
        })
    }

    /// Check the index/record bijection: every index entry points at a live
    /// record, every record is indexed exactly once, and no two records share
    /// a backing store.
    pub fn verify_integrity(&self) -> Result<(), CustodyError> {
        let mut seen_handles = HashSet::new();
        let mut seen_stores = HashSet::new();

        for (key, handle) in self.index.iter() {
            let record = self.records.get(handle).ok_or_else(|| dangling(key))?;
            if !seen_handles.insert(*handle) {
                return Err(CustodyError::IntegrityViolation(format!(
                    "{} is indexed under more than one key",
                    handle
                )));
            }
            if !seen_stores.insert(record.store()) {
                return Err(CustodyError::IntegrityViolation(format!(
                    "{} backs more than one escrow",
                    record.store()
                )));
            }
            if record.original_owner() != key.depositor {
                return Err(CustodyError::IntegrityViolation(format!(
                    "escrow {} is owned by {}",
                    key,
                    record.original_owner()
                )));
            }
        }

        if self.records.len() != self.index.len() {
            return Err(CustodyError::IntegrityViolation(format!(
                "{} records but {} index entries",
                self.records.len(),
                self.index.len()
            )));
        }
        Ok(())
    }

    fn ensure_custodian(
        &self,
        caller: PrincipalId,
        action: &'static str,
    ) -> Result<(), CustodyError> {
        if caller != self.custodian {
            warn!(ledger = %self.handle, caller = %caller, action, "Non-custodian rejected");
            return Err(CustodyError::NotAuthorized { caller, action });
        }
        Ok(())
    }

    fn find(&self, key: &EscrowKey) -> Result<Option<(RecordHandle, &EscrowRecord)>, CustodyError> {
        match self.index.get(key) {
            Some(handle) => {
                let record = self.records.get(&handle).ok_or_else(|| dangling(key))?;
                Ok(Some((handle, record)))
            }
            None => Ok(None),
        }
    }

    fn lookup(&self, key: &EscrowKey) -> Result<(RecordHandle, &EscrowRecord), CustodyError> {
        self.find(key)?
            .ok_or(CustodyError::NoSuchEscrow { key: *key })
    }
}

fn view_of<P: AssetTransferPort + ?Sized>(
    port: &P,
    key: EscrowKey,
    record: &EscrowRecord,
) -> Result<EscrowView, CustodyError> {
    Ok(EscrowView {
        key,
        variant: record.variant(),
        original_owner: record.original_owner(),
        amount: port.balance(record.store())?,
        unlock_time: record.unlock_time(),
    })
}

fn dangling(key: &EscrowKey) -> CustodyError {
    CustodyError::IntegrityViolation(format!("index entry {} points at no record", key))
}
