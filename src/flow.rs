use crate::{
    catalog::{
        CatalogApi,
        CatalogItem,
    },
    chain::{
        ChainClient,
        ChainError,
        PaymentMethod,
    },
    notify::{
        Notification,
        NotificationSink,
    },
    purchase::{
        PurchaseAttempt,
        PurchaseEvent,
        PurchaseMachine,
        PurchaseStatus,
        StatusChange,
    },
    reconcile::{
        PACK_ITEM_COUNT,
        Reconciler,
        ResolutionError,
    },
};
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug)]
pub enum PurchaseError {
    /// A previous attempt is still unresolved.
    PurchaseInFlight,
    WalletRejected,
    TransactionReverted,
    /// Node or transport failure outside the wallet's control.
    Chain(String),
    Resolution(ResolutionError),
}

impl fmt::Display for PurchaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PurchaseError::PurchaseInFlight => {
                write!(f, "a purchase is already in flight")
            }
            PurchaseError::WalletRejected => write!(f, "purchase rejected in wallet"),
            PurchaseError::TransactionReverted => {
                write!(f, "transaction reverted on chain")
            }
            PurchaseError::Chain(message) => write!(f, "chain failure: {message}"),
            PurchaseError::Resolution(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for PurchaseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PurchaseError::Resolution(error) => Some(error),
            _ => None,
        }
    }
}

/// Drives one purchase end to end: submit, confirm, resolve.
///
/// Owns the session's [`PurchaseMachine`] and emits [`Notification`]s at the
/// user-visible transitions. Catalog failures inside the reconciler never
/// surface here; only wallet rejection, a revert, and final resolution
/// exhaustion reach the caller. An attempt abandoned mid-flight
/// (its future dropped) is discarded with the flow instance.
pub struct PurchaseFlow<Chain, Catalog, Sink> {
    chain: Chain,
    reconciler: Reconciler<Catalog>,
    machine: PurchaseMachine,
    sink: Sink,
    expected_item_count: usize,
}

impl<Chain, Catalog, Sink> PurchaseFlow<Chain, Catalog, Sink>
where
    Chain: ChainClient,
    Catalog: CatalogApi,
    Sink: NotificationSink,
{
    pub fn new(chain: Chain, catalog: Catalog, sink: Sink) -> Self {
        PurchaseFlow {
            chain,
            reconciler: Reconciler::new(catalog),
            machine: PurchaseMachine::new(),
            sink,
            expected_item_count: PACK_ITEM_COUNT,
        }
    }

    pub fn with_expected_item_count(mut self, expected_item_count: usize) -> Self {
        self.expected_item_count = expected_item_count;
        self
    }

    pub fn status(&self) -> PurchaseStatus {
        self.machine.status()
    }

    pub fn attempt(&self) -> &PurchaseAttempt {
        self.machine.attempt()
    }

    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<StatusChange> {
        self.machine.subscribe()
    }

    /// Acknowledges a finished attempt, returning the machine to `Idle`.
    pub fn acknowledge(&mut self) -> bool {
        self.machine.dispatch(PurchaseEvent::Reset)
    }

    pub async fn purchase(
        &mut self,
        payment: PaymentMethod,
    ) -> Result<Vec<CatalogItem>, PurchaseError> {
        if self.machine.status().is_terminal() {
            self.machine.dispatch(PurchaseEvent::Reset);
        }
        if !self.machine.dispatch(PurchaseEvent::Initiate { payment }) {
            return Err(PurchaseError::PurchaseInFlight);
        }
        self.sink.notify(Notification::PurchaseSubmitted { payment });
        debug!(%payment, "submitting pack purchase");

        let transaction_hash = match self.chain.submit_purchase(payment).await {
            Ok(transaction_hash) => transaction_hash,
            Err(error) => {
                let reason = error.to_string();
                self.machine.dispatch(PurchaseEvent::SubmissionFailed {
                    reason: reason.clone(),
                });
                self.sink.notify(Notification::PurchaseFailed { reason });
                return Err(match error {
                    ChainError::WalletRejected => PurchaseError::WalletRejected,
                    ChainError::Rpc(message) => PurchaseError::Chain(message),
                });
            }
        };
        self.machine.dispatch(PurchaseEvent::WalletAccepted {
            transaction_hash: transaction_hash.clone(),
        });
        self.sink.notify(Notification::PurchaseConfirming {
            transaction_hash: transaction_hash.clone(),
        });

        let receipt = match self.chain.await_receipt(&transaction_hash).await {
            Ok(receipt) => receipt,
            Err(error) => {
                let reason = error.to_string();
                self.machine.dispatch(PurchaseEvent::ReceiptReceived {
                    succeeded: false,
                    reason: Some(reason.clone()),
                });
                self.sink.notify(Notification::PurchaseFailed { reason });
                return Err(match error {
                    ChainError::WalletRejected => PurchaseError::WalletRejected,
                    ChainError::Rpc(message) => PurchaseError::Chain(message),
                });
            }
        };
        if !receipt.succeeded {
            let reason = "transaction reverted on chain".to_string();
            self.machine.dispatch(PurchaseEvent::ReceiptReceived {
                succeeded: false,
                reason: Some(reason.clone()),
            });
            self.sink.notify(Notification::PurchaseFailed { reason });
            return Err(PurchaseError::TransactionReverted);
        }
        self.machine.dispatch(PurchaseEvent::ReceiptReceived {
            succeeded: true,
            reason: None,
        });

        match self
            .reconciler
            .resolve_purchase(&receipt, self.expected_item_count)
            .await
        {
            Ok(items) => {
                self.machine.dispatch(PurchaseEvent::Resolved {
                    items: items.clone(),
                });
                self.sink.notify(Notification::ItemsRevealed { count: items.len() });
                Ok(items)
            }
            Err(error) => {
                let reason = error.to_string();
                self.machine
                    .dispatch(PurchaseEvent::ResolutionFailed { reason: reason.clone() });
                self.sink.notify(Notification::PurchaseFailed { reason });
                Err(PurchaseError::Resolution(error))
            }
        }
    }
}
