use std::collections::HashMap;

use custody_types::{AssetClass, LedgerHandle, PrincipalId, StoreHandle};
use tracing::debug;

use crate::error::TransferError;
use crate::port::{AssetTransferPort, Funds, RejectedFunds, TransferCapability};

#[derive(Debug, Clone)]
struct StoreSlot {
    owner: LedgerHandle,
    asset: AssetClass,
    balance: u64,
}

/// Process-local asset rail: principal balances per asset class plus
/// ledger-owned stores.
///
/// Used by tests and simulations, and by hosts that keep balances in memory.
#[derive(Debug, Default, Clone)]
pub struct InMemoryAssetBank {
    balances: HashMap<(PrincipalId, AssetClass), u64>,
    stores: HashMap<StoreHandle, StoreSlot>,
}

impl InMemoryAssetBank {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue new units of `asset` to `to`.
    pub fn mint(
        &mut self,
        to: &PrincipalId,
        asset: AssetClass,
        amount: u64,
    ) -> Result<(), TransferError> {
        self.credit(to, asset, amount)
    }

    pub fn balance_of(&self, principal: &PrincipalId, asset: AssetClass) -> u64 {
        self.balances
            .get(&(*principal, asset))
            .copied()
            .unwrap_or(0)
    }

    /// Number of live stores, across all owners.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }

    /// Sum of all principal balances and store balances of `asset`.
    pub fn total_supply(&self, asset: AssetClass) -> u128 {
        let held: u128 = self
            .balances
            .iter()
            .filter(|((_, a), _)| *a == asset)
            .map(|(_, amount)| *amount as u128)
            .sum();
        let escrowed: u128 = self
            .stores
            .values()
            .filter(|slot| slot.asset == asset)
            .map(|slot| slot.balance as u128)
            .sum();
        held + escrowed
    }

    fn credit(
        &mut self,
        to: &PrincipalId,
        asset: AssetClass,
        amount: u64,
    ) -> Result<(), TransferError> {
        let next = self
            .balance_of(to, asset)
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { asset, amount })?;
        self.balances.insert((*to, asset), next);
        Ok(())
    }

    fn owned_slot(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
    ) -> Result<&mut StoreSlot, TransferError> {
        let slot = self
            .stores
            .get_mut(&store)
            .ok_or(TransferError::UnknownStore(store))?;
        if slot.owner != owner.ledger() {
            return Err(TransferError::ForeignStore {
                store,
                ledger: owner.ledger(),
            });
        }
        Ok(slot)
    }
}

impl AssetTransferPort for InMemoryAssetBank {
    fn create_store(
        &mut self,
        owner: &TransferCapability,
        asset: AssetClass,
    ) -> Result<StoreHandle, TransferError> {
        let handle = StoreHandle::generate();
        self.stores.insert(
            handle,
            StoreSlot {
                owner: owner.ledger(),
                asset,
                balance: 0,
            },
        );
        debug!(store = %handle, ledger = %owner.ledger(), asset = %asset, "Store created");
        Ok(handle)
    }

    fn deposit(
        &mut self,
        from: &PrincipalId,
        to: StoreHandle,
        amount: u64,
    ) -> Result<(), TransferError> {
        let slot = self.stores.get(&to).ok_or(TransferError::UnknownStore(to))?;
        let asset = slot.asset;
        let new_store_balance = slot
            .balance
            .checked_add(amount)
            .ok_or(TransferError::BalanceOverflow { asset, amount })?;

        let available = self.balance_of(from, asset);
        if available < amount {
            return Err(TransferError::InsufficientBalance {
                principal: *from,
                asset,
                required: amount,
                available,
            });
        }

        self.balances.insert((*from, asset), available - amount);
        if let Some(slot) = self.stores.get_mut(&to) {
            slot.balance = new_store_balance;
        }
        Ok(())
    }

    fn withdraw_balance(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
    ) -> Result<Funds, TransferError> {
        let slot = self.owned_slot(owner, store)?;
        let amount = std::mem::take(&mut slot.balance);
        Ok(Funds::new(slot.asset, amount))
    }

    fn can_credit(
        &self,
        to: &PrincipalId,
        asset: AssetClass,
        amount: u64,
    ) -> Result<(), TransferError> {
        self.balance_of(to, asset)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(TransferError::BalanceOverflow { asset, amount })
    }

    fn deposit_funds(&mut self, to: &PrincipalId, funds: Funds) -> Result<(), RejectedFunds> {
        match self.credit(to, funds.asset(), funds.amount()) {
            Ok(()) => Ok(()),
            Err(error) => Err(RejectedFunds { error, funds }),
        }
    }

    fn restore(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
        funds: Funds,
    ) -> Result<(), TransferError> {
        let slot = self.owned_slot(owner, store)?;
        if slot.asset != funds.asset() {
            return Err(TransferError::AssetMismatch {
                expected: slot.asset,
                actual: funds.asset(),
            });
        }
        slot.balance = slot
            .balance
            .checked_add(funds.amount())
            .ok_or(TransferError::BalanceOverflow {
                asset: funds.asset(),
                amount: funds.amount(),
            })?;
        debug!(store = %store, amount = funds.amount(), "Funds restored to store");
        Ok(())
    }

    fn balance(&self, store: StoreHandle) -> Result<u64, TransferError> {
        self.stores
            .get(&store)
            .map(|slot| slot.balance)
            .ok_or(TransferError::UnknownStore(store))
    }

    fn destroy_store(
        &mut self,
        owner: &TransferCapability,
        store: StoreHandle,
    ) -> Result<(), TransferError> {
        let slot = self.owned_slot(owner, store)?;
        if slot.balance != 0 {
            return Err(TransferError::StoreNotEmpty {
                store,
                balance: slot.balance,
            });
        }
        self.stores.remove(&store);
        debug!(store = %store, ledger = %owner.ledger(), "Store destroyed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd() -> AssetClass {
        AssetClass::new("USD").unwrap()
    }

    #[test]
    fn deposit_moves_value_into_store() {
        let mut bank = InMemoryAssetBank::new();
        let alice = PrincipalId::derive("alice");
        let cap = TransferCapability::issue(LedgerHandle::generate());
        bank.mint(&alice, usd(), 500).unwrap();

        let store = bank.create_store(&cap, usd()).unwrap();
        bank.deposit(&alice, store, 200).unwrap();

        assert_eq!(bank.balance(store).unwrap(), 200);
        assert_eq!(bank.balance_of(&alice, usd()), 300);
        assert_eq!(bank.total_supply(usd()), 500);
    }

    #[test]
    fn deposit_rejects_overdraft_without_side_effects() {
        let mut bank = InMemoryAssetBank::new();
        let alice = PrincipalId::derive("alice");
        let cap = TransferCapability::issue(LedgerHandle::generate());
        bank.mint(&alice, usd(), 50).unwrap();
        let store = bank.create_store(&cap, usd()).unwrap();

        let err = bank.deposit(&alice, store, 51).unwrap_err();
        assert!(matches!(err, TransferError::InsufficientBalance { available: 50, .. }));
        assert_eq!(bank.balance(store).unwrap(), 0);
        assert_eq!(bank.balance_of(&alice, usd()), 50);
    }

    #[test]
    fn only_owning_capability_can_drain_or_destroy() {
        let mut bank = InMemoryAssetBank::new();
        let alice = PrincipalId::derive("alice");
        let owner = TransferCapability::issue(LedgerHandle::generate());
        let other = TransferCapability::issue(LedgerHandle::generate());
        bank.mint(&alice, usd(), 10).unwrap();
        let store = bank.create_store(&owner, usd()).unwrap();
        bank.deposit(&alice, store, 10).unwrap();

        assert!(matches!(
            bank.withdraw_balance(&other, store),
            Err(TransferError::ForeignStore { .. })
        ));
        assert!(matches!(
            bank.destroy_store(&other, store),
            Err(TransferError::ForeignStore { .. })
        ));
        assert_eq!(bank.balance(store).unwrap(), 10);
    }

    #[test]
    fn destroy_requires_empty_store() {
        let mut bank = InMemoryAssetBank::new();
        let alice = PrincipalId::derive("alice");
        let cap = TransferCapability::issue(LedgerHandle::generate());
        bank.mint(&alice, usd(), 10).unwrap();
        let store = bank.create_store(&cap, usd()).unwrap();
        bank.deposit(&alice, store, 10).unwrap();

        assert!(matches!(
            bank.destroy_store(&cap, store),
            Err(TransferError::StoreNotEmpty { balance: 10, .. })
        ));

        let funds = bank.withdraw_balance(&cap, store).unwrap();
        assert_eq!(funds.amount(), 10);
        bank.deposit_funds(&alice, funds).unwrap();
        bank.destroy_store(&cap, store).unwrap();

        assert_eq!(bank.store_count(), 0);
        assert_eq!(bank.balance_of(&alice, usd()), 10);
        assert!(matches!(
            bank.balance(store),
            Err(TransferError::UnknownStore(_))
        ));
    }

    #[test]
    fn refused_credit_hands_funds_back() {
        let mut bank = InMemoryAssetBank::new();
        let alice = PrincipalId::derive("alice");
        let bob = PrincipalId::derive("bob");
        let cap = TransferCapability::issue(LedgerHandle::generate());
        bank.mint(&alice, usd(), 100).unwrap();
        bank.mint(&bob, usd(), u64::MAX - 50).unwrap();
        let store = bank.create_store(&cap, usd()).unwrap();
        bank.deposit(&alice, store, 100).unwrap();
        let supply = bank.total_supply(usd());

        assert!(matches!(
            bank.can_credit(&bob, usd(), 100),
            Err(TransferError::BalanceOverflow { amount: 100, .. })
        ));
        assert!(bank.can_credit(&bob, usd(), 50).is_ok());

        let funds = bank.withdraw_balance(&cap, store).unwrap();
        let rejected = bank.deposit_funds(&bob, funds).unwrap_err();
        assert!(matches!(rejected.error, TransferError::BalanceOverflow { .. }));
        assert_eq!(rejected.funds.amount(), 100);
        assert_eq!(bank.balance_of(&bob, usd()), u64::MAX - 50);

        bank.restore(&cap, store, rejected.funds).unwrap();
        assert_eq!(bank.balance(store).unwrap(), 100);
        assert_eq!(bank.total_supply(usd()), supply);
    }

    #[test]
    fn restore_checks_owner_and_asset() {
        let mut bank = InMemoryAssetBank::new();
        let eur = AssetClass::new("EUR").unwrap();
        let owner = TransferCapability::issue(LedgerHandle::generate());
        let other = TransferCapability::issue(LedgerHandle::generate());
        let store = bank.create_store(&owner, usd()).unwrap();

        assert!(matches!(
            bank.restore(&other, store, Funds::new(usd(), 5)),
            Err(TransferError::ForeignStore { .. })
        ));
        assert!(matches!(
            bank.restore(&owner, store, Funds::new(eur, 5)),
            Err(TransferError::AssetMismatch { .. })
        ));
        assert_eq!(bank.balance(store).unwrap(), 0);
    }
}
