#![allow(non_snake_case)]

use super::*;
use crate::{
    catalog::PackPage,
    test_helpers::{
        FakeCatalog,
        full_pack,
        mint_log,
        pack_minted_log,
        pack_record,
        receipt_with_logs,
        sample_item,
        test_address,
    },
};
use std::time::Duration;
use tokio::time::Instant;

fn page(total: u64, packs: Vec<crate::catalog::PackRecord>) -> PackPage {
    PackPage { total, packs }
}

#[tokio::test(start_paused = true)]
async fn resolve__pack_id_tier_succeeds__later_tiers_never_called() {
    // given
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, vec![pack_minted_log(purchaser, 812)]);
    let catalog = FakeCatalog::new();
    catalog.enqueue_pack(Ok(full_pack(812, purchaser, PACK_ITEM_COUNT)));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(PACK_ITEM_COUNT, items.len());
    assert_eq!(1, catalog.pack_calls());
    assert_eq!(0, catalog.item_calls());
    assert_eq!(0, catalog.recent_calls());
}

#[tokio::test(start_paused = true)]
async fn resolve__pack_never_indexed__falls_to_item_tier_after_five_attempts() {
    // given
    let purchaser = test_address(9);
    let mut logs = vec![pack_minted_log(purchaser, 812)];
    logs.extend((101..=105).map(|id| mint_log(purchaser, id)));
    let receipt = receipt_with_logs(purchaser, logs);

    let catalog = FakeCatalog::new();
    catalog.enqueue_pack(Err(CatalogError::NotFound));
    catalog.enqueue_items(Ok((101..=105).map(sample_item).collect()));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(5, catalog.pack_calls());
    assert_eq!(1, catalog.item_calls());
    assert_eq!(5, items.len());
}

#[tokio::test(start_paused = true)]
async fn resolve__pack_with_wrong_item_count__is_retried_then_falls_through() {
    // given: the pack record exists but only 3 of 5 items are indexed
    let purchaser = test_address(9);
    let short_pack = pack_record(
        812,
        purchaser,
        (1..=3).map(sample_item).collect(),
        chrono::Utc::now(),
    );
    let mut logs = vec![pack_minted_log(purchaser, 812)];
    logs.extend((101..=105).map(|id| mint_log(purchaser, id)));
    let receipt = receipt_with_logs(purchaser, logs);

    let catalog = FakeCatalog::new();
    catalog.enqueue_pack(Ok(short_pack));
    catalog.enqueue_items(Ok((101..=105).map(sample_item).collect()));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(5, catalog.pack_calls());
    assert_eq!(5, items.len());
}

#[tokio::test(start_paused = true)]
async fn resolve__item_tier_partial_subset__is_accepted_as_success() {
    // given: five mints, catalog has only indexed three
    let purchaser = test_address(9);
    let logs = (101..=105).map(|id| mint_log(purchaser, id)).collect();
    let receipt = receipt_with_logs(purchaser, logs);

    let catalog = FakeCatalog::new();
    catalog.enqueue_items(Ok((101..=103).map(sample_item).collect()));
    let reconciler = Reconciler::new(catalog.clone());
    let started = Instant::now();

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then: tolerant tier, no count requirement; only the settling delay ran
    assert_eq!(vec![101, 102, 103], items.iter().map(|i| i.id).collect::<Vec<_>>());
    assert_eq!(1, catalog.item_calls());
    assert_eq!(0, catalog.recent_calls());
    assert_eq!(Duration::from_secs(3), started.elapsed());
}

#[tokio::test(start_paused = true)]
async fn resolve__item_batch_stays_empty__falls_to_polling_after_eight_attempts() {
    // given
    let purchaser = test_address(9);
    let logs = (101..=105).map(|id| mint_log(purchaser, id)).collect();
    let receipt = receipt_with_logs(purchaser, logs);

    let catalog = FakeCatalog::new();
    catalog.enqueue_items(Ok(Vec::new()));
    catalog.enqueue_recent(Ok(page(2, Vec::new())));
    catalog.enqueue_recent(Ok(page(3, vec![full_pack(812, purchaser, 0)])));
    catalog.enqueue_pack(Ok(full_pack(812, purchaser, PACK_ITEM_COUNT)));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(8, catalog.item_calls());
    assert_eq!(PACK_ITEM_COUNT, items.len());
}

#[tokio::test(start_paused = true)]
async fn resolve__polling__only_accepts_totals_above_baseline() {
    // given: the purchaser already owned 7 packs and nothing new arrives
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, Vec::new());

    let catalog = FakeCatalog::new();
    catalog.enqueue_recent(Ok(page(7, vec![full_pack(4, purchaser, 0)])));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let result = reconciler.resolve_purchase(&receipt, PACK_ITEM_COUNT).await;

    // then: one baseline read plus fifteen polls, all rejected
    assert!(result.is_err());
    assert_eq!(16, catalog.recent_calls());
    assert_eq!(0, catalog.pack_calls());
}

#[tokio::test(start_paused = true)]
async fn resolve__polling__rejects_stale_pack_even_when_total_grew() {
    // given: the count went up but the newest pack is 10 minutes old
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, Vec::new());
    let stale = pack_record(
        44,
        purchaser,
        Vec::new(),
        chrono::Utc::now() - chrono::Duration::minutes(10),
    );

    let catalog = FakeCatalog::new();
    catalog.enqueue_recent(Ok(page(7, Vec::new())));
    catalog.enqueue_recent(Ok(page(8, vec![stale])));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let result = reconciler.resolve_purchase(&receipt, PACK_ITEM_COUNT).await;

    // then
    assert!(result.is_err());
    assert_eq!(16, catalog.recent_calls());
}

#[tokio::test(start_paused = true)]
async fn resolve__polling_finds_fresh_pack__fetches_it_fully_hydrated() {
    // given
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, Vec::new());

    let catalog = FakeCatalog::new();
    catalog.enqueue_recent(Ok(page(2, Vec::new())));
    catalog.enqueue_recent(Ok(page(3, vec![full_pack(812, purchaser, 0)])));
    catalog.enqueue_pack(Ok(full_pack(812, purchaser, PACK_ITEM_COUNT)));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(PACK_ITEM_COUNT, items.len());
    assert_eq!(2, catalog.recent_calls());
    assert_eq!(1, catalog.pack_calls());
}

#[tokio::test(start_paused = true)]
async fn resolve__every_tier_exhausted__reports_resolution_error() {
    // given: no usable logs and a catalog that answers nothing
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, Vec::new());
    let catalog = FakeCatalog::new();
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let error = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap_err();

    // then
    assert!(error.to_string().contains("could not resolve"));
    assert_eq!(16, catalog.recent_calls());
}

#[tokio::test(start_paused = true)]
async fn resolve__single_mint_no_pack_log__resolves_through_item_tier() {
    // given: one transfer-from-zero log carrying item id 42
    let purchaser = test_address(9);
    let receipt = receipt_with_logs(purchaser, vec![mint_log(purchaser, 42)]);

    let catalog = FakeCatalog::new();
    catalog.enqueue_items(Ok(vec![sample_item(42)]));
    let reconciler = Reconciler::new(catalog.clone());

    // when
    let items = reconciler
        .resolve_purchase(&receipt, PACK_ITEM_COUNT)
        .await
        .unwrap();

    // then
    assert_eq!(0, catalog.pack_calls());
    assert_eq!(vec![42], items.iter().map(|i| i.id).collect::<Vec<_>>());
}
