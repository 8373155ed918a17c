use crate::{
    catalog::{
        CatalogApi,
        CatalogError,
        CatalogItem,
        ItemId,
        PackId,
        PackRecord,
    },
    extract::{
        extract_item_ids,
        extract_pack_id,
    },
    receipt::{
        Address,
        TransactionReceipt,
    },
    retry::{
        DelayPolicy,
        retry,
    },
};
use chrono::Utc;
use std::{
    fmt,
    time::Duration,
};
use tokio::time;
use tracing::{
    debug,
    warn,
};

#[cfg(test)]
mod tests;

/// Items minted by one pack.
pub const PACK_ITEM_COUNT: usize = 5;

const PACK_FETCH_ATTEMPTS: u32 = 5;
const PACK_FETCH_DELAY: Duration = Duration::from_secs(2);
const ITEM_SETTLE_DELAY: Duration = Duration::from_secs(3);
const ITEM_FETCH_ATTEMPTS: u32 = 8;
const ITEM_FETCH_DELAY: Duration = Duration::from_secs(2);
const RECENT_POLL_ATTEMPTS: u32 = 15;
const RECENT_POLL_STEP: Duration = Duration::from_secs(2);
const FRESH_PACK_WINDOW_MINUTES: i64 = 5;

/// Every lookup strategy was exhausted without a usable item list.
#[derive(Debug)]
pub struct ResolutionError {
    last_error: Option<CatalogError>,
}

impl ResolutionError {
    fn exhausted(last_error: Option<CatalogError>) -> Self {
        ResolutionError { last_error }
    }
}

impl fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "could not resolve the purchased pack's items")?;
        if let Some(last_error) = &self.last_error {
            write!(f, " (last failure: {last_error})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error
            .as_ref()
            .map(|error| error as &(dyn std::error::Error + 'static))
    }
}

/// Resolves a mined pack purchase to the catalog items it minted.
///
/// Three strategies run in strict order, each only when the previous one
/// produced no usable result:
///
/// 1. a pack id recovered from the receipt logs, fetched directly: fast
///    and precise, but requires the expected item count to be fully indexed;
/// 2. the minted token ids from the receipt's transfer logs, batch-fetched
///    after a settling delay: ground truth about *which* ids were minted,
///    so any non-empty subset is accepted;
/// 3. polling the purchaser's recent packs for a fresh arrival above the
///    pre-poll baseline count.
///
/// Every strategy has a bounded attempt budget; the whole resolution either
/// returns items or fails with [`ResolutionError`] within a few minutes.
pub struct Reconciler<C> {
    catalog: C,
}

impl<C: CatalogApi> Reconciler<C> {
    pub fn new(catalog: C) -> Self {
        Reconciler { catalog }
    }

    pub async fn resolve_purchase(
        &self,
        receipt: &TransactionReceipt,
        expected_item_count: usize,
    ) -> Result<Vec<CatalogItem>, ResolutionError> {
        debug!(tx = %receipt.transaction_hash, "resolving pack purchase");

        if let Some(pack_id) = extract_pack_id(receipt) {
            match self.fetch_pack_items(pack_id, expected_item_count).await {
                Ok(items) => {
                    debug!(pack_id, "resolved via pack id");
                    return Ok(items);
                }
                Err(error) => {
                    warn!(pack_id, %error, "pack id lookup exhausted, trying minted item ids");
                }
            }
        } else {
            debug!("no pack id candidate in receipt logs");
        }

        let item_ids = extract_item_ids(receipt);
        if item_ids.is_empty() {
            debug!("no mint logs in receipt, falling back to polling");
        } else {
            time::sleep(ITEM_SETTLE_DELAY).await;
            match self.fetch_items(&item_ids).await {
                Ok(items) => {
                    debug!(minted = item_ids.len(), hydrated = items.len(), "resolved via minted item ids");
                    return Ok(items);
                }
                Err(error) => {
                    warn!(%error, "minted item lookup exhausted, falling back to polling");
                }
            }
        }

        self.poll_recent_packs(&receipt.purchaser, expected_item_count)
            .await
    }

    /// Fetches a pack and requires it to be fully hydrated. A pack with the
    /// wrong item count reads as indexing lag and is retried within the same
    /// budget.
    async fn fetch_pack_items(
        &self,
        pack_id: PackId,
        expected_item_count: usize,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let catalog = &self.catalog;
        retry(
            "pack-by-id",
            PACK_FETCH_ATTEMPTS,
            DelayPolicy::Fixed(PACK_FETCH_DELAY),
            move || async move {
                let pack = catalog.pack_by_id(pack_id).await?;
                if pack.items.len() == expected_item_count {
                    Ok(pack.items)
                } else {
                    Err(CatalogError::Unavailable(format!(
                        "pack {pack_id} has {} of {expected_item_count} items indexed",
                        pack.items.len()
                    )))
                }
            },
        )
        .await
    }

    async fn fetch_items(
        &self,
        item_ids: &[ItemId],
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let catalog = &self.catalog;
        retry(
            "items-by-ids",
            ITEM_FETCH_ATTEMPTS,
            DelayPolicy::Fixed(ITEM_FETCH_DELAY),
            move || async move {
                let items = catalog.items_by_ids(item_ids).await?;
                if items.is_empty() {
                    Err(CatalogError::NotFound)
                } else {
                    Ok(items)
                }
            },
        )
        .await
    }

    async fn poll_recent_packs(
        &self,
        purchaser: &Address,
        expected_item_count: usize,
    ) -> Result<Vec<CatalogItem>, ResolutionError> {
        let baseline = match self.catalog.recent_packs(purchaser).await {
            Ok(page) => page.total,
            Err(error) => {
                warn!(%error, "recent-pack baseline unavailable, treating as zero");
                0
            }
        };
        debug!(baseline, "polling recent packs for a new arrival");

        let catalog = &self.catalog;
        let polled = retry(
            "recent-packs",
            RECENT_POLL_ATTEMPTS,
            DelayPolicy::Linear(RECENT_POLL_STEP),
            move || async move { Self::poll_once(catalog, purchaser, baseline).await },
        )
        .await;

        match polled {
            Ok(pack) => self
                .fetch_pack_items(pack.pack_id, expected_item_count)
                .await
                .map_err(|error| ResolutionError::exhausted(Some(error))),
            Err(error) => Err(ResolutionError::exhausted(Some(error))),
        }
    }

    async fn poll_once(
        catalog: &C,
        purchaser: &Address,
        baseline: u64,
    ) -> Result<PackRecord, CatalogError> {
        let page = catalog.recent_packs(purchaser).await?;
        if page.total <= baseline {
            return Err(CatalogError::Unavailable(format!(
                "pack count still {} (baseline {baseline})",
                page.total
            )));
        }
        let newest = page.packs.into_iter().next().ok_or(CatalogError::NotFound)?;
        let age = Utc::now().signed_duration_since(newest.purchased_at);
        if age > chrono::Duration::minutes(FRESH_PACK_WINDOW_MINUTES) {
            return Err(CatalogError::Unavailable(format!(
                "newest pack {} predates this purchase ({}s old)",
                newest.pack_id,
                age.num_seconds()
            )));
        }
        Ok(newest)
    }
}
