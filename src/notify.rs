use crate::{
    chain::PaymentMethod,
    receipt::TxHash,
};

/// User-facing signals emitted at purchase transitions. Injected rather
/// than global so callers decide how to render them and tests can record
/// them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    PurchaseSubmitted { payment: PaymentMethod },
    PurchaseConfirming { transaction_hash: TxHash },
    ItemsRevealed { count: usize },
    PurchaseFailed { reason: String },
}

pub trait NotificationSink {
    fn notify(&self, notification: Notification);
}
