use std::fmt;

use crate::{
    catalog::{
        BaseStats,
        CatalogApi,
        CatalogError,
        CatalogItem,
        Category,
        ItemId,
        PackId,
        PackPage,
        PackRecord,
        Rarity,
    },
    chain::PaymentMethod,
    receipt::Address,
};
use chrono::{
    DateTime,
    Utc,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use itertools::Itertools;
use reqwest::StatusCode;
use serde::Deserialize;

/// Catalog backend over HTTP. Wire payloads use the backend's camelCase
/// field names and are converted into domain types on the way in.
#[derive(Clone)]
pub struct HttpCatalogClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpCatalogClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .build()
            .wrap_err("failed to build HTTP client for catalog")?;
        Ok(Self { base_url, http })
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: String,
    ) -> Result<T, CatalogError> {
        let res = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
        let status = res.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound);
        }
        let bytes = res
            .bytes()
            .await
            .map_err(|error| CatalogError::Unavailable(error.to_string()))?;
        if !status.is_success() {
            let body = String::from_utf8_lossy(&bytes);
            return Err(CatalogError::Unavailable(format!(
                "catalog responded with {status}: {body}"
            )));
        }
        serde_json::from_slice(&bytes).map_err(|error| {
            CatalogError::Unavailable(format!("invalid catalog payload: {error}"))
        })
    }
}

impl CatalogApi for HttpCatalogClient {
    async fn pack_by_id(&self, pack_id: PackId) -> Result<PackRecord, CatalogError> {
        let url = format!("{}/packs/{pack_id}", self.base_url);
        let dto: PackRecordDto = self.get_json(url).await?;
        Ok(dto.into())
    }

    async fn items_by_ids(
        &self,
        ids: &[ItemId],
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let joined = ids.iter().join(",");
        let url = format!("{}/items?ids={joined}", self.base_url);
        let dtos: Vec<CatalogItemDto> = self.get_json(url).await?;
        Ok(dtos.into_iter().map(Into::into).collect())
    }

    async fn recent_packs(
        &self,
        purchaser: &Address,
    ) -> Result<PackPage, CatalogError> {
        let url = format!("{}/purchasers/{purchaser}/packs", self.base_url);
        let dto: RecentPacksDto = self.get_json(url).await?;
        Ok(dto.into())
    }
}

impl fmt::Display for HttpCatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base_url)
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentPacksDto {
    total: u64,
    packs: Vec<PackRecordDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackRecordDto {
    pack_id: PackId,
    purchaser: Address,
    payment_type: PaymentTypeDto,
    purchased_at: DateTime<Utc>,
    #[serde(default)]
    item_ids: Vec<ItemId>,
    #[serde(default)]
    items: Vec<CatalogItemDto>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CatalogItemDto {
    id: ItemId,
    display_name: String,
    category: CategoryDto,
    rarity_tier: RarityDto,
    base_stats: BaseStatsDto,
    image_ref: String,
    fusion_level: u8,
    evolution_stage: u8,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BaseStatsDto {
    primary: u32,
    secondary: u32,
    tertiary: u32,
    quaternary: u32,
    speed_derived: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum PaymentTypeDto {
    Native,
    Essence,
}

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum CategoryDto {
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

#[derive(Deserialize)]
#[serde(rename_all = "lowercase")]
enum RarityDto {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl From<RecentPacksDto> for PackPage {
    fn from(dto: RecentPacksDto) -> Self {
        PackPage {
            total: dto.total,
            packs: dto.packs.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<PackRecordDto> for PackRecord {
    fn from(dto: PackRecordDto) -> Self {
        PackRecord {
            pack_id: dto.pack_id,
            purchaser: dto.purchaser,
            payment: dto.payment_type.into(),
            purchased_at: dto.purchased_at,
            item_ids: dto.item_ids,
            items: dto.items.into_iter().map(Into::into).collect(),
        }
    }
}

impl From<CatalogItemDto> for CatalogItem {
    fn from(dto: CatalogItemDto) -> Self {
        CatalogItem {
            id: dto.id,
            display_name: dto.display_name,
            category: dto.category.into(),
            rarity: dto.rarity_tier.into(),
            base_stats: dto.base_stats.into(),
            image_ref: dto.image_ref,
            fusion_level: dto.fusion_level,
            evolution_stage: dto.evolution_stage,
        }
    }
}

impl From<BaseStatsDto> for BaseStats {
    fn from(dto: BaseStatsDto) -> Self {
        BaseStats {
            attack: dto.primary,
            defense: dto.secondary,
            stamina: dto.tertiary,
            luck: dto.quaternary,
            speed: dto.speed_derived,
        }
    }
}

impl From<PaymentTypeDto> for PaymentMethod {
    fn from(dto: PaymentTypeDto) -> Self {
        match dto {
            PaymentTypeDto::Native => PaymentMethod::Native,
            PaymentTypeDto::Essence => PaymentMethod::Essence,
        }
    }
}

impl From<CategoryDto> for Category {
    fn from(dto: CategoryDto) -> Self {
        match dto {
            CategoryDto::Flame => Category::Flame,
            CategoryDto::Aqua => Category::Aqua,
            CategoryDto::Terra => Category::Terra,
            CategoryDto::Volt => Category::Volt,
            CategoryDto::Gale => Category::Gale,
            CategoryDto::Frost => Category::Frost,
            CategoryDto::Shade => Category::Shade,
            CategoryDto::Glow => Category::Glow,
            CategoryDto::Venom => Category::Venom,
            CategoryDto::Mech => Category::Mech,
        }
    }
}

impl From<RarityDto> for Rarity {
    fn from(dto: RarityDto) -> Self {
        match dto {
            RarityDto::Common => Rarity::Common,
            RarityDto::Uncommon => Rarity::Uncommon,
            RarityDto::Rare => Rarity::Rare,
            RarityDto::Epic => Rarity::Epic,
            RarityDto::Legendary => Rarity::Legendary,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;

    #[test]
    fn pack_record_dto__wire_payload__maps_to_domain() {
        // given
        let raw = r#"{
            "packId": 812,
            "purchaser": "0x0101010101010101010101010101010101010101",
            "paymentType": "essence",
            "purchasedAt": "2026-08-06T10:15:00Z",
            "itemIds": [1, 2],
            "items": [{
                "id": 1,
                "displayName": "Emberwing",
                "category": "flame",
                "rarityTier": "epic",
                "baseStats": {
                    "primary": 61,
                    "secondary": 40,
                    "tertiary": 55,
                    "quaternary": 12,
                    "speedDerived": 42
                },
                "imageRef": "chimeras/emberwing.png",
                "fusionLevel": 0,
                "evolutionStage": 1
            }]
        }"#;

        // when
        let dto: PackRecordDto = serde_json::from_str(raw).unwrap();
        let record: PackRecord = dto.into();

        // then
        assert_eq!(812, record.pack_id);
        assert_eq!(Address([1u8; 20]), record.purchaser);
        assert_eq!(PaymentMethod::Essence, record.payment);
        assert_eq!(vec![1, 2], record.item_ids);
        let item = &record.items[0];
        assert_eq!("Emberwing", item.display_name);
        assert_eq!(Category::Flame, item.category);
        assert_eq!(Rarity::Epic, item.rarity);
        assert_eq!(61, item.base_stats.attack);
        assert_eq!(42, item.base_stats.speed);
    }

    #[test]
    fn pack_record_dto__missing_item_arrays__defaults_to_empty() {
        // given: the recent-packs listing returns thin records
        let raw = r#"{
            "packId": 4,
            "purchaser": "0x0202020202020202020202020202020202020202",
            "paymentType": "native",
            "purchasedAt": "2026-08-06T10:15:00Z"
        }"#;

        // when
        let dto: PackRecordDto = serde_json::from_str(raw).unwrap();
        let record: PackRecord = dto.into();

        // then
        assert!(record.item_ids.is_empty());
        assert!(record.items.is_empty());
    }
}
