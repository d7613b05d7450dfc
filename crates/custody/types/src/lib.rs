//! # custody-types
//!
//! Value-typed identifiers shared by the custody ledger and its hosts:
//!
//! - [`PrincipalId`]: who deposits, who holds custody, who receives funds
//! - [`AssetClass`]: which fungible asset an escrow holds
//! - [`EscrowKey`]: the `(asset_class, depositor)` slot an escrow lives in
//! - [`LedgerHandle`] / [`StoreHandle`]: opaque storage locations
//!
//! Every identifier here is `Copy`, so keys can be passed around and used as
//! map keys without allocation.

#![deny(unsafe_code)]

pub mod asset;
pub mod error;
pub mod escrow;
pub mod handle;
pub mod principal;

pub use asset::AssetClass;
pub use error::TypeError;
pub use escrow::{EscrowKey, EscrowVariant, SettlementKind};
pub use handle::{LedgerHandle, StoreHandle};
pub use principal::PrincipalId;
