use crate::receipt::{
    TransactionReceipt,
    TxHash,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::fmt;

/// Which currency pays for a pack.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// The chain's native coin.
    Native,
    /// The game's ESSENCE token.
    Essence,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentMethod::Native => write!(f, "native coin"),
            PaymentMethod::Essence => write!(f, "ESSENCE"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChainError {
    /// The user declined the transaction in their wallet.
    WalletRejected,
    /// The node or transport failed.
    Rpc(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChainError::WalletRejected => write!(f, "purchase rejected in wallet"),
            ChainError::Rpc(message) => write!(f, "chain rpc failure: {message}"),
        }
    }
}

impl std::error::Error for ChainError {}

/// Submits purchase transactions and reports their mined outcome.
///
/// `await_receipt` may take arbitrarily long; wallet rejection surfaces as
/// [`ChainError::WalletRejected`] rather than a receipt.
pub trait ChainClient {
    fn submit_purchase(
        &self,
        payment: PaymentMethod,
    ) -> impl Future<Output = Result<TxHash, ChainError>>;

    fn await_receipt(
        &self,
        transaction_hash: &TxHash,
    ) -> impl Future<Output = Result<TransactionReceipt, ChainError>>;
}
