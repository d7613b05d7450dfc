//! Seams to the collaborators the ledger does not implement itself: the
//! fungible-value transfer primitive and the authority to use it on
//! ledger-owned stores.

use custody_types::{AssetClass, LedgerHandle, PrincipalId, StoreHandle};

use crate::error::TransferError;

/// Authority to move value out of the stores owned by one ledger.
///
/// Only a [`Ledger`](crate::Ledger) can obtain one: it is issued when the
/// ledger is constructed, kept inside it, and never returned by any public
/// API. Ports receive it by reference and may only read which ledger it
/// speaks for.
#[derive(Debug)]
pub struct TransferCapability {
    ledger: LedgerHandle,
}

impl TransferCapability {
    pub(crate) fn issue(ledger: LedgerHandle) -> Self {
        Self { ledger }
    }

    pub fn ledger(&self) -> LedgerHandle {
        self.ledger
    }
}

/// Value withdrawn from a store and not yet credited anywhere.
///
/// Not `Clone`: the only way to get rid of it is to hand it to
/// [`AssetTransferPort::deposit_funds`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "withdrawn funds must be deposited"]
pub struct Funds {
    asset: AssetClass,
    amount: u64,
}

impl Funds {
    /// Constructed by port implementations when they drain a store.
    pub fn new(asset: AssetClass, amount: u64) -> Self {
        Self { asset, amount }
    }

    pub fn asset(&self) -> AssetClass {
        self.asset
    }

    pub fn amount(&self) -> u64 {
        self.amount
    }
}

/// A credit the port refused, with the funds handed back to the caller.
#[derive(Debug)]
pub struct RejectedFunds {
    pub error: TransferError,
    pub funds: Funds,
}

/// Fungible-value transfer primitive consumed by the ledger.
///
/// Implementations map these calls onto a concrete asset rail. Each call is
/// expected to be all-or-nothing.
pub trait AssetTransferPort {
    /// Create an empty store for `asset`, owned by the capability's ledger.
    fn create_store(
        &mut self,
        owner: &TransferCapability,
        asset: AssetClass,
    ) -> Result<StoreHandle, TransferError>;

    /// Move `amount` from `from`'s own balance into `to`.
    fn deposit(
        &mut self,
        from: &PrincipalId,
        to: StoreHandle,
        amount: u64,
    ) -> Result<(), TransferError>;

    /// Drain `store` completely. Fails unless the store belongs to the
    /// capability's ledger.
    fn withdraw_balance(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
    ) -> Result<Funds, TransferError>;

    /// Whether `amount` of `asset` could be credited to `to` right now.
    /// Must not change any state.
    fn can_credit(
        &self,
        to: &PrincipalId,
        asset: AssetClass,
        amount: u64,
    ) -> Result<(), TransferError>;

    /// Credit withdrawn funds to `to`'s own balance. A refused credit hands
    /// the funds back untouched.
    fn deposit_funds(&mut self, to: &PrincipalId, funds: Funds) -> Result<(), RejectedFunds>;

    /// Put withdrawn funds back into the store they came from.
    fn restore(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
        funds: Funds,
    ) -> Result<(), TransferError>;

    fn balance(&self, store: StoreHandle) -> Result<u64, TransferError>;

    /// Delete an empty store. Fails if the store still holds value.
    fn destroy_store(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
    ) -> Result<(), TransferError>;
}
