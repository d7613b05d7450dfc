use std::collections::HashMap;

use chrono::Duration;
use custody_types::{AssetClass, LedgerHandle, PrincipalId};
use tracing::info;

use crate::clock::Clock;
use crate::config::CustodyConfig;
use crate::directory::LedgerDirectory;
use crate::error::CustodyError;
use crate::journal::LedgerEvent;
use crate::ledger::Ledger;
use crate::port::AssetTransferPort;
use crate::view::{EscrowView, LedgerStatistics};

/// Custody engine configuration, directory, ledgers and collaborators in one
/// place.
///
/// Each method is one unit of work: it either applies every effect or
/// returns an error having applied none. Mutations take `&mut self`; hosts
/// sharing an engine across threads put it behind a lock.
pub struct CustodyEngine<P, C> {
    config: CustodyConfig,
    directory: LedgerDirectory,
    ledgers: HashMap<LedgerHandle, Ledger>,
    port: P,
    clock: C,
}

impl<P: AssetTransferPort, C: Clock> CustodyEngine<P, C> {
    pub fn new(config: CustodyConfig, port: P, clock: C) -> Result<Self, CustodyError> {
        config.validate()?;
        Ok(Self {
            config,
            directory: LedgerDirectory::new(),
            ledgers: HashMap::new(),
            port,
            clock,
        })
    }

    pub fn config(&self) -> &CustodyConfig {
        &self.config
    }

    pub fn directory(&self) -> &LedgerDirectory {
        &self.directory
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    /// Host access to the asset rail, e.g. to fund principals. Ledger-owned
    /// stores stay out of reach without their ledger's capability.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ledger(&self, handle: LedgerHandle) -> Result<&Ledger, CustodyError> {
        self.ledgers
            .get(&handle)
            .ok_or_else(|| CustodyError::unknown_ledger(handle))
    }

    /// Create the ledger of `creator`, who becomes its custodian.
    pub fn initialize(&mut self, creator: PrincipalId) -> Result<LedgerHandle, CustodyError> {
        self.directory.ensure_vacant(&creator)?;

        let ledger = Ledger::new(creator, self.clock.now(), self.config.journal_capacity);
        let handle = ledger.handle();
        self.directory.register(creator, handle)?;
        self.ledgers.insert(handle, ledger);

        info!(ledger = %handle, custodian = %creator, "Ledger initialized");
        Ok(handle)
    }

    pub fn ledger_handle_of(&self, creator: &PrincipalId) -> Result<LedgerHandle, CustodyError> {
        self.directory.lookup(creator)
    }

    pub fn custodian_of(&self, ledger: LedgerHandle) -> Result<PrincipalId, CustodyError> {
        Ok(self.ledger(ledger)?.custodian())
    }

    pub fn deposit_no_lock(
        &mut self,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
        amount: u64,
    ) -> Result<(), CustodyError> {
        self.config.check_amount(amount)?;
        let now = self.clock.now();
        resolve_mut(&mut self.ledgers, ledger)?.deposit_no_lock(
            &mut self.port,
            now,
            asset,
            depositor,
            amount,
        )
    }

    pub fn deposit_with_lock(
        &mut self,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
        amount: u64,
        lock_duration: Duration,
    ) -> Result<(), CustodyError> {
        self.config.check_amount(amount)?;
        self.config.check_lock_duration(lock_duration)?;
        let now = self.clock.now();
        resolve_mut(&mut self.ledgers, ledger)?.deposit_with_lock(
            &mut self.port,
            now,
            asset,
            depositor,
            amount,
            lock_duration,
        )
    }

    /// Custodian takes the escrow of `depositor`. Returns the amount moved.
    pub fn claim(
        &mut self,
        caller: PrincipalId,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<u64, CustodyError> {
        let now = self.clock.now();
        resolve_mut(&mut self.ledgers, ledger)?.claim(&mut self.port, now, caller, asset, depositor)
    }

    /// Custodian returns the escrow of `depositor` to its original owner,
    /// regardless of lock state. Returns the amount moved.
    pub fn return_to_depositor(
        &mut self,
        caller: PrincipalId,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<u64, CustodyError> {
        let now = self.clock.now();
        resolve_mut(&mut self.ledgers, ledger)?.return_to_depositor(
            &mut self.port,
            now,
            caller,
            asset,
            depositor,
        )
    }

    /// `caller` withdraws their own escrow. Returns the amount moved.
    pub fn self_return(
        &mut self,
        caller: PrincipalId,
        ledger: LedgerHandle,
        asset: AssetClass,
    ) -> Result<u64, CustodyError> {
        let now = self.clock.now();
        resolve_mut(&mut self.ledgers, ledger)?.self_return(&mut self.port, now, caller, asset)
    }

    pub fn escrowed_amount(
        &self,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<u64>, CustodyError> {
        self.ledger(ledger)?
            .escrowed_amount(&self.port, asset, depositor)
    }

    pub fn remaining_lock_time(
        &self,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<Duration>, CustodyError> {
        self.ledger(ledger)?
            .remaining_lock_time(self.clock.now(), asset, depositor)
    }

    pub fn escrow(
        &self,
        ledger: LedgerHandle,
        asset: AssetClass,
        depositor: PrincipalId,
    ) -> Result<Option<EscrowView>, CustodyError> {
        self.ledger(ledger)?.escrow(&self.port, asset, depositor)
    }

    pub fn escrows(&self, ledger: LedgerHandle) -> Result<Vec<EscrowView>, CustodyError> {
        self.ledger(ledger)?.escrows(&self.port)
    }

    pub fn statistics(&self, ledger: LedgerHandle) -> Result<LedgerStatistics, CustodyError> {
        self.ledger(ledger)?.statistics(&self.port)
    }

    pub fn events(&self, ledger: LedgerHandle) -> Result<Vec<LedgerEvent>, CustodyError> {
        Ok(self.ledger(ledger)?.events().cloned().collect())
    }
}

fn resolve_mut(
    ledgers: &mut HashMap<LedgerHandle, Ledger>,
    handle: LedgerHandle,
) -> Result<&mut Ledger, CustodyError> {
    ledgers
        .get_mut(&handle)
        .ok_or_else(|| CustodyError::unknown_ledger(handle))
}
