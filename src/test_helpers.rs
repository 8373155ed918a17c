//! Shared fakes and builders for exercising the purchase flow without a
//! chain or a catalog backend. Scripted responses are popped in order; the
//! last one sticks, so a single entry acts as an always-on response.

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
    chain::{
        ChainClient,
        ChainError,
        PaymentMethod,
    },
    extract::{
        PACK_MINTED_SIGNATURES,
        TRANSFER_EVENT_SIGNATURE,
    },
    notify::{
        Notification,
        NotificationSink,
    },
    receipt::{
        Address,
        LogEntry,
        Topic,
        TransactionReceipt,
        TxHash,
    },
};
use chrono::{
    DateTime,
    Utc,
};
use std::{
    collections::VecDeque,
    sync::{
        Arc,
        Mutex,
    },
};

pub fn test_address(seed: u8) -> Address {
    Address([seed; 20])
}

pub fn receipt_with_logs(
    purchaser: Address,
    logs: Vec<LogEntry>,
) -> TransactionReceipt {
    TransactionReceipt {
        transaction_hash: TxHash::from("0xfeedbeef"),
        purchaser,
        succeeded: true,
        logs,
    }
}

/// A token transfer from the zero address: the shape the minted-item scan
/// looks for.
pub fn mint_log(recipient: Address, item_id: ItemId) -> LogEntry {
    LogEntry::new(vec![
        TRANSFER_EVENT_SIGNATURE,
        Topic::from_address(Address::ZERO),
        Topic::from_address(recipient),
        Topic::from_u64(item_id),
    ])
}

/// A whitelisted pack-mint event carrying the pack id in the third topic.
pub fn pack_minted_log(purchaser: Address, pack_id: PackId) -> LogEntry {
    LogEntry::new(vec![
        PACK_MINTED_SIGNATURES[0],
        Topic::from_address(purchaser),
        Topic::from_u64(pack_id),
    ])
}

pub fn sample_item(id: ItemId) -> CatalogItem {
    CatalogItem {
        id,
        display_name: format!("Chimera #{id}"),
        category: Category::Flame,
        rarity: Rarity::Common,
        base_stats: BaseStats {
            attack: 40,
            defense: 35,
            stamina: 50,
            luck: 10,
            speed: 33,
        },
        image_ref: format!("chimeras/{id}.png"),
        fusion_level: 0,
        evolution_stage: 0,
    }
}

pub fn pack_record(
    pack_id: PackId,
    purchaser: Address,
    items: Vec<CatalogItem>,
    purchased_at: DateTime<Utc>,
) -> PackRecord {
    PackRecord {
        pack_id,
        purchaser,
        payment: PaymentMethod::Essence,
        purchased_at,
        item_ids: items.iter().map(|item| item.id).collect(),
        items,
    }
}

/// A freshly purchased, fully hydrated pack.
pub fn full_pack(pack_id: PackId, purchaser: Address, item_count: usize) -> PackRecord {
    let items = (0..item_count)
        .map(|offset| sample_item(pack_id * 100 + offset as u64))
        .collect();
    pack_record(pack_id, purchaser, items, Utc::now())
}

fn take<T: Clone>(
    queue: &mut VecDeque<Result<T, CatalogError>>,
) -> Result<T, CatalogError> {
    if queue.len() > 1 {
        queue.pop_front().expect("non-empty queue")
    } else {
        queue
            .front()
            .cloned()
            .unwrap_or_else(|| {
                Err(CatalogError::Unavailable("no scripted response".to_string()))
            })
    }
}

#[derive(Default)]
struct FakeCatalogState {
    pack_responses: VecDeque<Result<PackRecord, CatalogError>>,
    item_responses: VecDeque<Result<Vec<CatalogItem>, CatalogError>>,
    recent_responses: VecDeque<Result<PackPage, CatalogError>>,
    pack_calls: u32,
    item_calls: u32,
    recent_calls: u32,
}

/// Scripted catalog double that counts calls per endpoint.
#[derive(Clone, Default)]
pub struct FakeCatalog {
    state: Arc<Mutex<FakeCatalogState>>,
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_pack(&self, response: Result<PackRecord, CatalogError>) {
        self.state.lock().unwrap().pack_responses.push_back(response);
    }

    pub fn enqueue_items(&self, response: Result<Vec<CatalogItem>, CatalogError>) {
        self.state.lock().unwrap().item_responses.push_back(response);
    }

    pub fn enqueue_recent(&self, response: Result<PackPage, CatalogError>) {
        self.state.lock().unwrap().recent_responses.push_back(response);
    }

    pub fn pack_calls(&self) -> u32 {
        self.state.lock().unwrap().pack_calls
    }

    pub fn item_calls(&self) -> u32 {
        self.state.lock().unwrap().item_calls
    }

    pub fn recent_calls(&self) -> u32 {
        self.state.lock().unwrap().recent_calls
    }
}

impl CatalogApi for FakeCatalog {
    async fn pack_by_id(&self, _pack_id: PackId) -> Result<PackRecord, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.pack_calls += 1;
        take(&mut state.pack_responses)
    }

    async fn items_by_ids(
        &self,
        _ids: &[ItemId],
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.item_calls += 1;
        take(&mut state.item_responses)
    }

    async fn recent_packs(&self, _purchaser: &Address) -> Result<PackPage, CatalogError> {
        let mut state = self.state.lock().unwrap();
        state.recent_calls += 1;
        take(&mut state.recent_responses)
    }
}

#[derive(Default)]
struct FakeChainState {
    submit_responses: VecDeque<Result<TxHash, ChainError>>,
    receipt_responses: VecDeque<Result<TransactionReceipt, ChainError>>,
    submit_calls: u32,
}

/// Scripted chain double.
#[derive(Clone, Default)]
pub struct FakeChain {
    state: Arc<Mutex<FakeChainState>>,
}

impl FakeChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue_submit(&self, response: Result<TxHash, ChainError>) {
        self.state.lock().unwrap().submit_responses.push_back(response);
    }

    pub fn enqueue_receipt(&self, response: Result<TransactionReceipt, ChainError>) {
        self.state
            .lock()
            .unwrap()
            .receipt_responses
            .push_back(response);
    }

    pub fn submit_calls(&self) -> u32 {
        self.state.lock().unwrap().submit_calls
    }
}

impl ChainClient for FakeChain {
    async fn submit_purchase(
        &self,
        _payment: PaymentMethod,
    ) -> Result<TxHash, ChainError> {
        let mut state = self.state.lock().unwrap();
        state.submit_calls += 1;
        match state.submit_responses.pop_front() {
            Some(response) => response,
            None => Ok(TxHash::from("0xfeedbeef")),
        }
    }

    async fn await_receipt(
        &self,
        _transaction_hash: &TxHash,
    ) -> Result<TransactionReceipt, ChainError> {
        let mut state = self.state.lock().unwrap();
        match state.receipt_responses.pop_front() {
            Some(response) => response,
            None => Err(ChainError::Rpc("no scripted receipt".to_string())),
        }
    }
}

/// Captures emitted notifications for assertions.
#[derive(Clone, Default)]
pub struct RecordingSink {
    notifications: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }
}

impl NotificationSink for RecordingSink {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }
}
