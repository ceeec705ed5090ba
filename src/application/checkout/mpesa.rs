//! MpesaCheckout - drives one M-Pesa push payment to a terminal state.
//!
//! `initiate` validates input and asks the gateway to prompt the customer's
//! phone. `tick` performs exactly one status check. `run` repeats `tick`
//! through the injected scheduler until the payment resolves, the attempt
//! budget runs out, or the flow is cancelled.
//!
//! Every initiation gets its own cancel token. A loop started for one
//! payment never polls or reports for a later one.

use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use rust_decimal::Decimal;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::domain::foundation::{OrderId, TransactionId};
use crate::domain::notification::Notification;
use crate::domain::payment::{
    MpesaTransaction, PaymentOutcome, PaymentStatus, PhoneFormat, PhoneNumber, PollDecision,
    StatusCheck, PAYMENT_FAILED_MESSAGE,
};
use crate::ports::{ApiError, InitiationRequest, NotificationSink, PaymentGateway, Scheduler};

use super::CheckoutError;

/// Shown when the gateway declines without saying why.
pub const INITIATION_FAILED_MESSAGE: &str = "Failed to initiate M-Pesa payment";

/// Shown when the initiation call never reached the gateway.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Polling parameters for one checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub phone_format: PhoneFormat,
}

impl Default for CheckoutSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            max_attempts: 30,
            phone_format: PhoneFormat::default(),
        }
    }
}

/// Stops the poll loop of the payment it was taken for. No result is
/// reported after cancellation.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct MpesaCheckout {
    gateway: Arc<dyn PaymentGateway>,
    scheduler: Arc<dyn Scheduler>,
    sink: Arc<dyn NotificationSink>,
    settings: CheckoutSettings,
    transaction: Mutex<Option<MpesaTransaction>>,
    /// Token of the current payment; replaced on every initiation.
    cancel: StdMutex<Arc<watch::Sender<bool>>>,
}

impl MpesaCheckout {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        scheduler: Arc<dyn Scheduler>,
        sink: Arc<dyn NotificationSink>,
        settings: CheckoutSettings,
    ) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            gateway,
            scheduler,
            sink,
            settings,
            transaction: Mutex::new(None),
            cancel: StdMutex::new(Arc::new(cancel)),
        }
    }

    pub fn settings(&self) -> &CheckoutSettings {
        &self.settings
    }

    /// `Idle` until a payment is initiated.
    pub async fn status(&self) -> PaymentStatus {
        self.transaction
            .lock()
            .await
            .as_ref()
            .map_or(PaymentStatus::Idle, MpesaTransaction::status)
    }

    pub async fn transaction(&self) -> Option<MpesaTransaction> {
        self.transaction.lock().await.clone()
    }

    /// Handle for the current payment.
    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            tx: self.current_token(),
        }
    }

    pub fn cancel(&self) {
        self.current_token().send_replace(true);
    }

    fn current_token(&self) -> Arc<watch::Sender<bool>> {
        Arc::clone(&self.cancel.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Installs a fresh token and cancels the one it replaces.
    fn rotate_token(&self) -> Arc<watch::Sender<bool>> {
        let (fresh, _) = watch::channel(false);
        let fresh = Arc::new(fresh);
        let previous = std::mem::replace(
            &mut *self.cancel.lock().unwrap_or_else(PoisonError::into_inner),
            Arc::clone(&fresh),
        );
        previous.send_replace(true);
        fresh
    }

    /// Starts a push payment.
    ///
    /// The phone number is normalized first; anything that does not match the
    /// configured format is rejected before any network call.
    ///
    /// # Errors
    ///
    /// - `Validation` for a bad phone number, empty order id or non-positive amount
    /// - `AlreadyInFlight` while a previous payment has not reached a terminal state
    /// - `Rejected` when the gateway declines or cannot be reached
    pub async fn initiate(
        &self,
        phone: &str,
        order_id: &str,
        amount: Decimal,
    ) -> Result<TransactionId, CheckoutError> {
        let phone = PhoneNumber::parse_with(phone, &self.settings.phone_format)?;
        let order_id = OrderId::new(order_id)?;

        let (request, token) = {
            let mut slot = self.transaction.lock().await;
            if let Some(current) = slot.as_ref() {
                if current.status().is_in_flight() {
                    warn!(order_id = %current.order_id(), "Payment already in progress");
                    return Err(CheckoutError::AlreadyInFlight {
                        order_id: current.order_id().clone(),
                    });
                }
            }

            let transaction = MpesaTransaction::submit(
                order_id.clone(),
                phone.clone(),
                amount,
                self.settings.max_attempts,
            )?;
            *slot = Some(transaction);
            let token = self.rotate_token();

            let request = InitiationRequest {
                phone_number: phone,
                order_id,
                amount,
            };
            (request, token)
        };

        debug!(order_id = %request.order_id, amount = %request.amount, "Initiating M-Pesa push");
        let result = self.gateway.initiate_push(&request).await;

        let mut slot = self.transaction.lock().await;
        let transaction = match slot.as_mut() {
            Some(t) if Arc::ptr_eq(&token, &self.current_token()) => t,
            other => {
                debug!(order_id = %request.order_id, "Checkout reset during initiation");
                return Err(CheckoutError::NotAwaiting {
                    status: other.map_or(PaymentStatus::Idle, |t| t.status()),
                });
            }
        };

        let reason = match result {
            Ok(response) => match (response.success, response.transaction_id) {
                (true, Some(transaction_id)) => {
                    transaction.mark_initiated(transaction_id.clone())?;
                    info!(
                        order_id = %request.order_id,
                        transaction_id = %transaction_id,
                        "M-Pesa push accepted"
                    );
                    return Ok(transaction_id);
                }
                _ => response
                    .error
                    .filter(|e| !e.trim().is_empty())
                    .unwrap_or_else(|| INITIATION_FAILED_MESSAGE.to_string()),
            },
            Err(e) => initiation_failure_reason(&e),
        };

        let outcome = transaction.mark_rejected(reason.clone())?;
        drop(slot);

        warn!(order_id = %request.order_id, reason = %reason, "M-Pesa push rejected");
        self.publish_outcome(&outcome);
        Err(CheckoutError::Rejected { reason })
    }

    /// Performs exactly one status check and applies it.
    ///
    /// Transport failures and unrecognized statuses count as pending. A
    /// resolution is published unless the payment was cancelled meanwhile.
    ///
    /// # Errors
    ///
    /// `NotAwaiting` when no transaction is awaiting confirmation.
    pub async fn tick(&self) -> Result<PollDecision, CheckoutError> {
        let (transaction_id, token) = {
            let slot = self.transaction.lock().await;
            (awaiting_id(slot.as_ref())?, self.current_token())
        };

        let Some(decision) = self.check(&transaction_id).await? else {
            return Err(CheckoutError::NotAwaiting {
                status: self.status().await,
            });
        };

        if let PollDecision::Resolved(outcome) = &decision {
            if !*token.borrow() {
                self.publish_outcome(outcome);
            }
        }
        Ok(decision)
    }

    /// Polls until the payment resolves and hands the outcome to `on_result`.
    ///
    /// Checks once immediately, then waits `poll_interval` between checks.
    /// The loop is bound to the payment awaiting confirmation when it starts.
    /// Returns `None`, without reporting anything, if that payment is
    /// cancelled, reset or replaced.
    ///
    /// # Errors
    ///
    /// `NotAwaiting` when no transaction is awaiting confirmation.
    pub async fn run<F>(&self, on_result: F) -> Result<Option<PaymentOutcome>, CheckoutError>
    where
        F: FnOnce(&PaymentOutcome) + Send,
    {
        let (transaction_id, token) = {
            let slot = self.transaction.lock().await;
            (awaiting_id(slot.as_ref())?, self.current_token())
        };
        let mut cancelled = token.subscribe();

        loop {
            if *cancelled.borrow_and_update() {
                debug!(transaction_id = %transaction_id, "Payment polling cancelled");
                return Ok(None);
            }

            let Some(decision) = self.check(&transaction_id).await? else {
                debug!(transaction_id = %transaction_id, "Payment replaced; polling stopped");
                return Ok(None);
            };

            if *cancelled.borrow_and_update() {
                debug!(transaction_id = %transaction_id, "Payment polling cancelled; dropping result");
                return Ok(None);
            }

            match decision {
                PollDecision::Resolved(outcome) => {
                    self.publish_outcome(&outcome);
                    on_result(&outcome);
                    return Ok(Some(outcome));
                }
                PollDecision::Continue { .. } => {
                    tokio::select! {
                        _ = self.scheduler.sleep(self.settings.poll_interval) => {}
                        _ = cancelled.wait_for(|c| *c) => {
                            debug!(transaction_id = %transaction_id, "Payment polling cancelled while waiting");
                            return Ok(None);
                        }
                    }
                }
            }
        }
    }

    /// One status check for `transaction_id`, applied only if that
    /// transaction is still the one awaiting confirmation.
    ///
    /// `None` when the transaction was reset, replaced or resolved elsewhere.
    async fn check(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<Option<PollDecision>, CheckoutError> {
        if !is_awaiting(self.transaction.lock().await.as_ref(), transaction_id) {
            return Ok(None);
        }

        let check = match self.gateway.transaction_status(transaction_id).await {
            Ok(report) => report.to_check(),
            Err(e) => {
                warn!(transaction_id = %transaction_id, error = %e, "Status check failed; will retry");
                StatusCheck::Unreachable(e.to_string())
            }
        };

        let mut slot = self.transaction.lock().await;
        let transaction = match slot.as_mut() {
            Some(t) if is_awaiting(Some(t), transaction_id) => t,
            _ => return Ok(None),
        };

        let decision = transaction.record_check(check)?;
        let attempt = transaction.attempts();
        drop(slot);

        match &decision {
            PollDecision::Continue { attempts_left } => {
                debug!(transaction_id = %transaction_id, attempt, attempts_left, "Payment still pending");
            }
            PollDecision::Resolved(outcome) => {
                info!(
                    transaction_id = %transaction_id,
                    attempt,
                    status = ?outcome.status(),
                    "Payment resolved"
                );
            }
        }
        Ok(Some(decision))
    }

    /// Cancels any running loop and forgets the current transaction.
    pub async fn reset(&self) {
        self.cancel();
        let previous = self.transaction.lock().await.take();
        if let Some(t) = previous {
            debug!(order_id = %t.order_id(), status = ?t.status(), "Checkout reset");
        }
    }

    fn publish_outcome(&self, outcome: &PaymentOutcome) {
        let notification = match outcome {
            PaymentOutcome::Succeeded(receipt) => Notification::success(outcome.message())
                .with_message(format!("Transaction {}", receipt.transaction_id)),
            PaymentOutcome::Failed { reason, .. } => {
                Notification::error(PAYMENT_FAILED_MESSAGE).with_message(reason.clone())
            }
            PaymentOutcome::TimedOut { .. } => Notification::error(outcome.message()),
        };
        self.sink.publish(notification);
    }
}

fn awaiting_id(slot: Option<&MpesaTransaction>) -> Result<TransactionId, CheckoutError> {
    match slot {
        Some(t) if t.status().is_awaiting() => t
            .transaction_id()
            .cloned()
            .ok_or(CheckoutError::NotAwaiting { status: t.status() }),
        other => Err(CheckoutError::NotAwaiting {
            status: other.map_or(PaymentStatus::Idle, MpesaTransaction::status),
        }),
    }
}

fn is_awaiting(slot: Option<&MpesaTransaction>, transaction_id: &TransactionId) -> bool {
    slot.is_some_and(|t| t.status().is_awaiting() && t.transaction_id() == Some(transaction_id))
}

fn initiation_failure_reason(error: &ApiError) -> String {
    match error {
        ApiError::Network(_) => NETWORK_ERROR_MESSAGE.to_string(),
        other => other
            .upstream_message()
            .map_or_else(|| INITIATION_FAILED_MESSAGE.to_string(), str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockCommerceApi;
    use crate::adapters::notifications::ToastCenter;
    use crate::adapters::scheduler::RecordingScheduler;
    use crate::domain::notification::NotificationKind;
    use crate::ports::{InitiationResponse, PaymentStatusReport};

    struct Fixture {
        checkout: MpesaCheckout,
        api: Arc<MockCommerceApi>,
        scheduler: Arc<RecordingScheduler>,
        toasts: Arc<ToastCenter>,
    }

    fn fixture() -> Fixture {
        let api = Arc::new(MockCommerceApi::new());
        let scheduler = Arc::new(RecordingScheduler::new());
        let toasts = Arc::new(ToastCenter::new());
        let checkout = MpesaCheckout::new(
            api.clone(),
            scheduler.clone(),
            toasts.clone(),
            CheckoutSettings::default(),
        );
        Fixture {
            checkout,
            api,
            scheduler,
            toasts,
        }
    }

    #[tokio::test]
    async fn initiate_normalizes_phone_and_awaits_confirmation() {
        let f = fixture();

        let id = f
            .checkout
            .initiate("0712 345 678", "ord-1", Decimal::from(1500))
            .await
            .unwrap();

        assert_eq!(f.checkout.status().await, PaymentStatus::AwaitingConfirmation);
        let calls = f.api.calls();
        assert_eq!(calls[0].method, "initiate_push");
        assert_eq!(calls[0].args[0], "254712345678");
        assert_eq!(
            f.checkout.transaction().await.unwrap().transaction_id(),
            Some(&id)
        );
    }

    #[tokio::test]
    async fn short_phone_is_rejected_without_network() {
        let f = fixture();

        let err = f
            .checkout
            .initiate("712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(f.api.total_calls(), 0);
        assert_eq!(f.checkout.status().await, PaymentStatus::Idle);
    }

    #[tokio::test]
    async fn non_positive_amount_is_rejected_without_network() {
        let f = fixture();

        let err = f
            .checkout
            .initiate("254712345678", "ord-1", Decimal::ZERO)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Validation(_)));
        assert_eq!(f.api.total_calls(), 0);
    }

    #[tokio::test]
    async fn declined_initiation_reports_upstream_message() {
        let f = fixture();
        f.api
            .set_initiation(Ok(InitiationResponse::declined("Invalid Access Token")));

        let err = f
            .checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid Access Token");
        assert_eq!(f.checkout.status().await, PaymentStatus::Failed);
        assert_eq!(f.toasts.active()[0].kind, NotificationKind::Error);
    }

    #[tokio::test]
    async fn network_failure_on_initiation_uses_retry_message() {
        let f = fixture();
        f.api.set_initiation(Err(ApiError::network("connection refused")));

        let err = f
            .checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), NETWORK_ERROR_MESSAGE);
    }

    #[tokio::test]
    async fn second_initiate_while_awaiting_is_rejected() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();

        let err = f
            .checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::AlreadyInFlight { .. }));
        assert_eq!(f.api.call_count("initiate_push"), 1);
    }

    #[tokio::test]
    async fn tick_requires_awaiting_transaction() {
        let f = fixture();
        let err = f.checkout.tick().await.unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::NotAwaiting {
                status: PaymentStatus::Idle
            }
        ));
    }

    #[tokio::test]
    async fn failed_status_uses_description_or_fallback() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();
        f.api.push_status(PaymentStatusReport::new("failed"));

        let decision = f.checkout.tick().await.unwrap();

        match decision {
            PollDecision::Resolved(outcome) => assert_eq!(outcome.message(), PAYMENT_FAILED_MESSAGE),
            other => panic!("expected resolution, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn transport_error_during_poll_keeps_polling() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();
        f.api.push_status_error(ApiError::network("reset"));

        let decision = f.checkout.tick().await.unwrap();

        assert_eq!(decision, PollDecision::Continue { attempts_left: 29 });
    }

    #[tokio::test]
    async fn run_waits_poll_interval_between_checks() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();
        f.api.push_statuses("pending", 2);
        f.api.push_status(PaymentStatusReport::new("successful"));

        let outcome = f.checkout.run(|_| {}).await.unwrap().unwrap();

        assert!(outcome.is_success());
        assert_eq!(
            f.scheduler.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(5)]
        );
        assert_eq!(f.toasts.active().last().unwrap().title, "Payment received");
    }

    #[tokio::test]
    async fn reset_allows_a_fresh_initiation() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();

        f.checkout.reset().await;
        assert_eq!(f.checkout.status().await, PaymentStatus::Idle);

        f.checkout
            .initiate("254712345678", "ord-2", Decimal::from(10))
            .await
            .unwrap();
        assert_eq!(f.api.call_count("initiate_push"), 2);
    }

    #[tokio::test]
    async fn tick_after_cancel_records_but_does_not_publish() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();
        f.api.push_status(PaymentStatusReport::new("successful"));

        f.checkout.cancel();
        let decision = f.checkout.tick().await.unwrap();

        assert!(matches!(decision, PollDecision::Resolved(_)));
        assert_eq!(f.checkout.status().await, PaymentStatus::Succeeded);
        assert!(f.toasts.active().is_empty());
    }

    #[tokio::test]
    async fn handle_for_an_earlier_payment_does_not_cancel_a_later_one() {
        let f = fixture();
        f.checkout
            .initiate("254712345678", "ord-1", Decimal::from(10))
            .await
            .unwrap();
        let stale = f.checkout.cancel_handle();
        f.checkout.reset().await;
        assert!(stale.is_cancelled());

        f.checkout
            .initiate("254712345678", "ord-2", Decimal::from(10))
            .await
            .unwrap();
        stale.cancel();
        f.api.push_status(PaymentStatusReport::new("successful"));

        let outcome = f.checkout.run(|_| {}).await.unwrap();

        assert!(outcome.is_some_and(|o| o.is_success()));
        assert!(!f.checkout.cancel_handle().is_cancelled());
    }
}
