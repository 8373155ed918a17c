//! Client-side pack acquisition for the Chimera collection game.
//!
//! After a pack purchase is submitted on chain, three unreliable signals can
//! reveal which items it minted: the shop's own event log, the token
//! transfer logs, and the catalog backend's recent-packs listing. The
//! [`reconcile::Reconciler`] chains them as ordered fallbacks;
//! [`flow::PurchaseFlow`] drives a whole purchase through the observable
//! [`purchase::PurchaseMachine`].

pub mod catalog;
pub mod chain;
pub mod extract;
pub mod flow;
pub mod notify;
pub mod purchase;
pub mod receipt;
pub mod reconcile;
pub mod retry;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use crate::{
    catalog::{
        CatalogApi,
        CatalogError,
        CatalogItem,
        PackPage,
        PackRecord,
    },
    chain::{
        ChainClient,
        ChainError,
        PaymentMethod,
    },
    flow::{
        PurchaseError,
        PurchaseFlow,
    },
    purchase::{
        PurchaseMachine,
        PurchaseStatus,
    },
    receipt::TransactionReceipt,
    reconcile::{
        PACK_ITEM_COUNT,
        Reconciler,
        ResolutionError,
    },
};
