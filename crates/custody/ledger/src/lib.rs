//! # custody-ledger
//!
//! Time-locked custody ledger: depositors place fungible value into
//! per-`(asset_class, depositor)` escrows, and a designated custodian (or,
//! after a deadline, the depositor) releases it.
//!
//! - **Escrow records** are either `Simple` (releasable at any time) or
//!   `TimeLocked` (depositor release blocked until the unlock time). A record
//!   never changes variant, and an unlock time only moves forward.
//! - **Custodian** operations (`claim`, `return_to_depositor`) are never
//!   time-restricted. **Depositor** `self_return` is.
//! - **Settlement** drains an escrow completely and deletes its record,
//!   backing store and index entry in one step; a second settlement of the
//!   same key fails with `NoSuchEscrow`.
//!
//! Value moves through an [`AssetTransferPort`]; time comes from a
//! [`Clock`]. [`InMemoryAssetBank`] and [`ManualClock`] are provided for
//! tests, simulations and in-memory hosts.
//!
//! ```
//! use chrono::Duration;
//! use custody_ledger::{CustodyConfig, CustodyEngine, InMemoryAssetBank, ManualClock};
//! use custody_types::{AssetClass, PrincipalId};
//!
//! let clock = ManualClock::epoch();
//! let mut engine =
//!     CustodyEngine::new(CustodyConfig::default(), InMemoryAssetBank::new(), clock.clone())?;
//!
//! let custodian = PrincipalId::derive("custodian");
//! let depositor = PrincipalId::derive("depositor");
//! let usd = AssetClass::new("USD")?;
//! engine.port_mut().mint(&depositor, usd, 100)?;
//!
//! let ledger = engine.initialize(custodian)?;
//! engine.deposit_with_lock(ledger, usd, depositor, 100, Duration::hours(2))?;
//!
//! clock.advance(Duration::hours(2));
//! engine.self_return(depositor, ledger, usd)?;
//! assert_eq!(engine.escrowed_amount(ledger, usd, depositor)?, None);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(unsafe_code)]

pub mod bank;
pub mod clock;
pub mod config;
pub mod directory;
pub mod engine;
pub mod error;
pub mod index;
pub mod journal;
pub mod ledger;
pub mod port;
pub mod record;
pub mod view;

pub use bank::InMemoryAssetBank;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CustodyConfig;
pub use directory::LedgerDirectory;
pub use engine::CustodyEngine;
pub use error::{CustodyError, ErrorKind, TransferError};
pub use index::EscrowIndex;
pub use journal::{Journal, LedgerEvent, LedgerEventKind};
pub use ledger::Ledger;
pub use port::{AssetTransferPort, Funds, RejectedFunds, TransferCapability};
pub use record::{EscrowRecord, RecordHandle};
pub use view::{EscrowView, LedgerStatistics};
