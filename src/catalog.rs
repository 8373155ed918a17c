use crate::{
    chain::PaymentMethod,
    receipt::Address,
};
use chrono::{
    DateTime,
    Utc,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

pub mod http;

pub type PackId = u64;
pub type ItemId = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    Flame,
    Aqua,
    Terra,
    Volt,
    Gale,
    Frost,
    Shade,
    Glow,
    Venom,
    Mech,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseStats {
    pub attack: u32,
    pub defense: u32,
    pub stamina: u32,
    pub luck: u32,
    /// Derived by the backend from the other four; never computed client-side.
    pub speed: u32,
}

/// One collectible chimera as the catalog describes it. Immutable; the
/// client never fabricates stats.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub id: ItemId,
    pub display_name: String,
    pub category: Category,
    pub rarity: Rarity,
    pub base_stats: BaseStats,
    pub image_ref: String,
    pub fusion_level: u8,
    pub evolution_stage: u8,
}

/// A purchased pack and the items it minted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackRecord {
    pub pack_id: PackId,
    pub purchaser: Address,
    pub payment: PaymentMethod,
    pub purchased_at: DateTime<Utc>,
    pub item_ids: Vec<ItemId>,
    pub items: Vec<CatalogItem>,
}

/// Recent-packs response for one purchaser, newest first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PackPage {
    pub total: u64,
    pub packs: Vec<PackRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CatalogError {
    /// The record is not indexed (yet).
    NotFound,
    /// Transient backend or transport failure.
    Unavailable(String),
}

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound => write!(f, "record not found in catalog"),
            CatalogError::Unavailable(message) => {
                write!(f, "catalog unavailable: {message}")
            }
        }
    }
}

impl std::error::Error for CatalogError {}

/// The backend catalog, keyed by pack and item identifiers.
///
/// `items_by_ids` returns whatever subset is currently indexed and never
/// fails on partial results; `pack_by_id` fails with
/// [`CatalogError::NotFound`] until the pack is indexed.
pub trait CatalogApi {
    fn pack_by_id(
        &self,
        pack_id: PackId,
    ) -> impl Future<Output = Result<PackRecord, CatalogError>>;

    fn items_by_ids(
        &self,
        ids: &[ItemId],
    ) -> impl Future<Output = Result<Vec<CatalogItem>, CatalogError>>;

    fn recent_packs(
        &self,
        purchaser: &Address,
    ) -> impl Future<Output = Result<PackPage, CatalogError>>;
}
