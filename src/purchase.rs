use crate::{
    catalog::CatalogItem,
    chain::PaymentMethod,
    receipt::TxHash,
};
use tokio::sync::mpsc;
use tracing::warn;

/// Observable lifecycle of one pack purchase.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PurchaseStatus {
    Idle,
    Submitted,
    Confirming,
    Resolving,
    Succeeded,
    Failed,
}

impl PurchaseStatus {
    /// Terminal states stay put until an explicit reset.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PurchaseStatus::Succeeded | PurchaseStatus::Failed)
    }

    /// Whether the UI should offer the purchase action in this state.
    pub fn purchase_allowed(&self) -> bool {
        matches!(self, PurchaseStatus::Idle) || self.is_terminal()
    }
}

#[derive(Clone, Debug)]
pub enum PurchaseEvent {
    Initiate { payment: PaymentMethod },
    WalletAccepted { transaction_hash: TxHash },
    SubmissionFailed { reason: String },
    ReceiptReceived { succeeded: bool, reason: Option<String> },
    Resolved { items: Vec<CatalogItem> },
    ResolutionFailed { reason: String },
    Reset,
}

/// The one live attempt a purchasing session holds.
#[derive(Clone, Debug, PartialEq)]
pub struct PurchaseAttempt {
    pub payment_method: Option<PaymentMethod>,
    pub transaction_hash: Option<TxHash>,
    pub status: PurchaseStatus,
    pub error: Option<String>,
    pub items: Vec<CatalogItem>,
}

impl PurchaseAttempt {
    fn idle() -> Self {
        PurchaseAttempt {
            payment_method: None,
            transaction_hash: None,
            status: PurchaseStatus::Idle,
            error: None,
            items: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StatusChange {
    pub from: PurchaseStatus,
    pub to: PurchaseStatus,
}

/// Event-driven purchase state machine.
///
/// `dispatch` applies one event and reports whether a transition happened;
/// events with no transition from the current state are guarded no-ops.
/// Observers receive every transition through [`PurchaseMachine::subscribe`].
/// The machine itself never times out; dwell-time budgets belong to the
/// reconciler.
pub struct PurchaseMachine {
    attempt: PurchaseAttempt,
    observers: Vec<mpsc::UnboundedSender<StatusChange>>,
}

impl Default for PurchaseMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl PurchaseMachine {
    pub fn new() -> Self {
        PurchaseMachine {
            attempt: PurchaseAttempt::idle(),
            observers: Vec::new(),
        }
    }

    pub fn status(&self) -> PurchaseStatus {
        self.attempt.status
    }

    pub fn attempt(&self) -> &PurchaseAttempt {
        &self.attempt
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StatusChange> {
        let (sender, receiver) = mpsc::unbounded_channel();
        self.observers.push(sender);
        receiver
    }

    pub fn dispatch(&mut self, event: PurchaseEvent) -> bool {
        use PurchaseStatus::*;

        let from = self.attempt.status;
        let to = match (from, &event) {
            (Idle, PurchaseEvent::Initiate { .. }) => Submitted,
            (Submitted, PurchaseEvent::WalletAccepted { .. }) => Confirming,
            (Submitted, PurchaseEvent::SubmissionFailed { .. }) => Failed,
            (Confirming, PurchaseEvent::ReceiptReceived { succeeded: true, .. }) => {
                Resolving
            }
            (Confirming, PurchaseEvent::ReceiptReceived { succeeded: false, .. }) => {
                Failed
            }
            (Resolving, PurchaseEvent::Resolved { .. }) => Succeeded,
            (Resolving, PurchaseEvent::ResolutionFailed { .. }) => Failed,
            (Succeeded | Failed, PurchaseEvent::Reset) => Idle,
            _ => {
                warn!(?from, ?event, "purchase event ignored in current state");
                return false;
            }
        };

        self.apply(event);
        self.attempt.status = to;
        let change = StatusChange { from, to };
        self.observers.retain(|observer| observer.send(change).is_ok());
        true
    }

    fn apply(&mut self, event: PurchaseEvent) {
        match event {
            PurchaseEvent::Initiate { payment } => {
                self.attempt = PurchaseAttempt {
                    payment_method: Some(payment),
                    ..PurchaseAttempt::idle()
                };
            }
            PurchaseEvent::WalletAccepted { transaction_hash } => {
                self.attempt.transaction_hash = Some(transaction_hash);
            }
            PurchaseEvent::SubmissionFailed { reason } => {
                self.attempt.error = Some(reason);
            }
            PurchaseEvent::ReceiptReceived { succeeded: false, reason } => {
                self.attempt.error =
                    Some(reason.unwrap_or_else(|| "transaction failed".to_string()));
            }
            PurchaseEvent::ReceiptReceived { succeeded: true, .. } => {}
            PurchaseEvent::Resolved { items } => {
                self.attempt.items = items;
            }
            PurchaseEvent::ResolutionFailed { reason } => {
                self.attempt.error = Some(reason);
            }
            PurchaseEvent::Reset => {
                self.attempt = PurchaseAttempt::idle();
            }
        }
    }
}
