use crate::{
    catalog::{
        ItemId,
        PackId,
    },
    receipt::{
        Address,
        LogEntry,
        Topic,
        TransactionReceipt,
    },
};
use hex_literal::hex;
use itertools::Itertools;

/// keccak256("Transfer(address,address,uint256)"), the canonical token
/// transfer topic. A transfer whose `from` field is the zero address is a
/// mint.
pub const TRANSFER_EVENT_SIGNATURE: Topic = Topic(hex!(
    "ddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
));

/// Known first-topic signatures for pack-mint events. The shop contract has
/// shipped two event shapes so far; both carry the pack id in the third
/// topic.
///
/// TODO: confirm these against the deployed shop ABI once it is published;
/// until then the range fallback below keeps older deployments working.
pub const PACK_MINTED_SIGNATURES: [Topic; 2] = [
    Topic(hex!(
        "8fc236c7dbbb48b8600ec23b00c9e5b4f91b5a219bb3f9d5b1a0a528354d38a1"
    )),
    Topic(hex!(
        "41c93ab55a2e85b0a8ae3ebd55a59bcd9d0398a1d7472ff84bdeb2b8a0b26e4c"
    )),
];

/// Pack ids are sequence numbers, so anything at or past this bound cannot
/// be one.
const PACK_ID_UPPER_BOUND: u64 = 1_000_000;

/// Recovers the purchased pack's id from the receipt logs, if any log looks
/// like a pack-mint event.
///
/// A log is a candidate when it carries at least three topics and the third
/// decodes to an integer in `(0, 1_000_000)`. Candidates whose first topic
/// matches [`PACK_MINTED_SIGNATURES`] win; otherwise the first candidate in
/// log order is taken. The range check alone is deliberately permissive
/// (any small integer in topic position three qualifies); that is an
/// accepted weakness of this signal, and callers fall back to the
/// minted-item scan and the catalog poll when the id turns out to be wrong.
pub fn extract_pack_id(receipt: &TransactionReceipt) -> Option<PackId> {
    receipt
        .logs
        .iter()
        .filter_map(|log| Some((log, plausible_pack_id(log)?)))
        .find_or_first(|(log, _)| has_pack_minted_signature(log))
        .map(|(_, pack_id)| pack_id)
}

/// Collects the ids of every token minted to anyone in this transaction, in
/// log order.
///
/// Unlike [`extract_pack_id`] there is no ambiguity here: a transfer log
/// whose `from` topic is the zero address is definitively a mint. Token ids
/// too wide for 64 bits are skipped.
pub fn extract_item_ids(receipt: &TransactionReceipt) -> Vec<ItemId> {
    receipt
        .logs
        .iter()
        .filter_map(|log| {
            if *log.topics.first()? != TRANSFER_EVENT_SIGNATURE {
                return None;
            }
            let from = log.topics.get(1)?.as_address()?;
            if from != Address::ZERO {
                return None;
            }
            log.topics.get(3)?.as_u64()
        })
        .collect()
}

fn plausible_pack_id(log: &LogEntry) -> Option<PackId> {
    let value = log.topics.get(2)?.as_u64()?;
    (value > 0 && value < PACK_ID_UPPER_BOUND).then_some(value)
}

fn has_pack_minted_signature(log: &LogEntry) -> bool {
    log.topics
        .first()
        .is_some_and(|topic| PACK_MINTED_SIGNATURES.contains(topic))
}
