//! Integration tests for the M-Pesa confirmation loop.
//!
//! These tests verify the polling contract end to end:
//! 1. The loop stops on the first terminal status and makes no extra calls
//! 2. An exhausted attempt budget resolves as a timeout, distinct from failure
//! 3. Cancellation stops polling and suppresses the result callback
//!
//! Uses the mock backend and a recording scheduler, so no test waits on a
//! real poll interval.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;

use storefront_sync::adapters::{MockCommerceApi, RecordingScheduler, ToastCenter, TokioScheduler};
use storefront_sync::application::checkout::{
    CancelHandle, CheckoutError, CheckoutSettings, MpesaCheckout,
};
use storefront_sync::domain::notification::NotificationKind;
use storefront_sync::domain::payment::{
    PaymentOutcome, PaymentStatus, PAYMENT_FAILED_MESSAGE, PAYMENT_TIMEOUT_MESSAGE,
};
use storefront_sync::ports::{ApiError, PaymentStatusReport, Scheduler};

// =============================================================================
// Test Infrastructure
// =============================================================================

const PHONE: &str = "0712345678";
const ORDER: &str = "ord-1042";

/// Scheduler that cancels the flow once a given number of waits was requested.
struct CancellingScheduler {
    handle: Mutex<Option<CancelHandle>>,
    cancel_after: usize,
    waits: AtomicUsize,
}

impl CancellingScheduler {
    fn new(cancel_after: usize) -> Self {
        Self {
            handle: Mutex::new(None),
            cancel_after,
            waits: AtomicUsize::new(0),
        }
    }

    fn arm(&self, handle: CancelHandle) {
        *self.handle.lock().unwrap() = Some(handle);
    }
}

#[async_trait]
impl Scheduler for CancellingScheduler {
    async fn sleep(&self, _duration: Duration) {
        let waits = self.waits.fetch_add(1, Ordering::SeqCst) + 1;
        if waits >= self.cancel_after {
            if let Some(handle) = self.handle.lock().unwrap().as_ref() {
                handle.cancel();
            }
        }
        tokio::task::yield_now().await;
    }
}

fn checkout_with(
    api: &Arc<MockCommerceApi>,
    scheduler: Arc<dyn Scheduler>,
    toasts: &Arc<ToastCenter>,
) -> MpesaCheckout {
    MpesaCheckout::new(
        api.clone(),
        scheduler,
        toasts.clone(),
        CheckoutSettings::default(),
    )
}

async fn initiated(
    api: &Arc<MockCommerceApi>,
    scheduler: Arc<dyn Scheduler>,
    toasts: &Arc<ToastCenter>,
) -> MpesaCheckout {
    let checkout = checkout_with(api, scheduler, toasts);
    checkout
        .initiate(PHONE, ORDER, Decimal::from(2450))
        .await
        .unwrap();
    checkout
}

// =============================================================================
// Polling
// =============================================================================

#[tokio::test]
async fn success_on_thirtieth_check_makes_exactly_thirty_calls() {
    let api = Arc::new(MockCommerceApi::new());
    let scheduler = Arc::new(RecordingScheduler::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = initiated(&api, scheduler.clone(), &toasts).await;
    api.push_statuses("pending", 29);
    api.push_status(PaymentStatusReport::new("successful"));

    let received = Arc::new(Mutex::new(None));
    let outcome = {
        let received = Arc::clone(&received);
        checkout
            .run(move |o| *received.lock().unwrap() = Some(o.clone()))
            .await
            .unwrap()
    };

    let outcome = outcome.unwrap();
    assert_eq!(outcome.status(), PaymentStatus::Succeeded);
    assert_eq!(api.call_count("transaction_status"), 30);
    assert_eq!(scheduler.sleep_count(), 29);
    assert!(scheduler.sleeps().iter().all(|d| *d == Duration::from_secs(5)));

    match received.lock().unwrap().clone() {
        Some(PaymentOutcome::Succeeded(receipt)) => {
            assert_eq!(receipt.amount, Decimal::from(2450));
            assert_eq!(receipt.phone.as_str(), "254712345678");
            assert_eq!(receipt.order_id.as_str(), ORDER);
        }
        other => panic!("expected success callback, got {other:?}"),
    };
}

#[tokio::test]
async fn thirty_pending_checks_time_out_with_no_further_calls() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await;
    api.push_statuses("pending", 30);

    let outcome = checkout.run(|_| {}).await.unwrap().unwrap();

    assert!(matches!(outcome, PaymentOutcome::TimedOut { attempts: 30, .. }));
    assert_eq!(outcome.message(), PAYMENT_TIMEOUT_MESSAGE);
    assert_eq!(api.call_count("transaction_status"), 30);

    let err = checkout.tick().await.unwrap_err();
    assert!(matches!(
        err,
        CheckoutError::NotAwaiting {
            status: PaymentStatus::TimedOut
        }
    ));
    assert_eq!(api.call_count("transaction_status"), 30);

    let last = toasts.active().pop().unwrap();
    assert_eq!(last.kind, NotificationKind::Error);
    assert_eq!(last.title, PAYMENT_TIMEOUT_MESSAGE);
}

#[tokio::test]
async fn transient_errors_count_against_the_budget() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await;
    api.push_statuses("pending", 3);
    api.push_status_error(ApiError::network("timeout"));
    api.push_status_error(ApiError::rejected(502, "Bad Gateway"));
    api.push_status(PaymentStatusReport::new("processing"));
    api.push_status(PaymentStatusReport::new("successful"));

    let outcome = checkout.run(|_| {}).await.unwrap().unwrap();

    assert!(outcome.is_success());
    assert_eq!(api.call_count("transaction_status"), 7);
    assert_eq!(checkout.transaction().await.unwrap().attempts(), 7);
}

#[tokio::test]
async fn explicit_failure_reports_reason_verbatim() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await;
    api.push_status(PaymentStatusReport::new("pending"));
    api.push_status(
        PaymentStatusReport::new("failed").with_description("Request cancelled by user"),
    );

    let outcome = checkout.run(|_| {}).await.unwrap().unwrap();

    assert_eq!(outcome.status(), PaymentStatus::Failed);
    assert_eq!(outcome.message(), "Request cancelled by user");
    assert_eq!(api.call_count("transaction_status"), 2);

    let last = toasts.active().pop().unwrap();
    assert_eq!(last.title, PAYMENT_FAILED_MESSAGE);
    assert_eq!(last.message.as_deref(), Some("Request cancelled by user"));
}

// =============================================================================
// Cancellation
// =============================================================================

#[tokio::test]
async fn cancel_after_fifth_check_stops_polling_without_callback() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let scheduler = Arc::new(CancellingScheduler::new(5));
    let checkout = initiated(&api, scheduler.clone(), &toasts).await;
    scheduler.arm(checkout.cancel_handle());
    api.push_statuses("pending", 10);
    api.push_status(PaymentStatusReport::new("successful"));

    let called = Arc::new(AtomicBool::new(false));
    let result = {
        let called = Arc::clone(&called);
        checkout
            .run(move |_| called.store(true, Ordering::SeqCst))
            .await
            .unwrap()
    };

    assert!(result.is_none());
    assert!(!called.load(Ordering::SeqCst));
    assert_eq!(api.call_count("transaction_status"), 5);
    assert_eq!(checkout.status().await, PaymentStatus::AwaitingConfirmation);
}

#[tokio::test]
async fn cancel_interrupts_a_real_wait() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = Arc::new(MpesaCheckout::new(
        api.clone(),
        Arc::new(TokioScheduler::new()),
        toasts.clone(),
        CheckoutSettings {
            poll_interval: Duration::from_secs(3600),
            ..CheckoutSettings::default()
        },
    ));
    checkout
        .initiate(PHONE, ORDER, Decimal::from(100))
        .await
        .unwrap();
    let handle = checkout.cancel_handle();

    let running = {
        let checkout = Arc::clone(&checkout);
        tokio::spawn(async move { checkout.run(|_| {}).await })
    };
    while api.call_count("transaction_status") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    handle.cancel();

    let result = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .expect("run should stop promptly after cancel")
        .unwrap()
        .unwrap();

    assert!(result.is_none());
    assert_eq!(api.call_count("transaction_status"), 1);
}

#[tokio::test]
async fn cancel_during_in_flight_check_reports_nothing() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = Arc::new(initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await);
    api.push_status(PaymentStatusReport::new("successful"));
    let gate = api.gate("transaction_status");

    let called = Arc::new(AtomicBool::new(false));
    let running = {
        let checkout = Arc::clone(&checkout);
        let called = Arc::clone(&called);
        tokio::spawn(async move {
            checkout
                .run(move |_| called.store(true, Ordering::SeqCst))
                .await
        })
    };
    gate.entered().await;
    checkout.cancel();
    gate.release();

    let result = running.await.unwrap().unwrap();

    assert!(result.is_none());
    assert!(!called.load(Ordering::SeqCst));
    assert!(toasts.active().is_empty(), "no toast after cancellation");
}

#[tokio::test]
async fn loop_from_reset_payment_never_polls_the_next_one() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = Arc::new(initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await);
    api.push_status(PaymentStatusReport::new("successful"));
    let gate = api.gate("transaction_status");

    let called = Arc::new(AtomicBool::new(false));
    let old_loop = {
        let checkout = Arc::clone(&checkout);
        let called = Arc::clone(&called);
        tokio::spawn(async move {
            checkout
                .run(move |_| called.store(true, Ordering::SeqCst))
                .await
        })
    };
    gate.entered().await;

    checkout.reset().await;
    checkout
        .initiate(PHONE, "ord-2", Decimal::from(900))
        .await
        .unwrap();
    gate.release();

    let result = old_loop.await.unwrap().unwrap();

    assert!(result.is_none());
    assert!(!called.load(Ordering::SeqCst));
    assert!(toasts.active().is_empty());
    assert_eq!(api.call_count("transaction_status"), 1);
    let current = checkout.transaction().await.unwrap();
    assert_eq!(current.order_id().as_str(), "ord-2");
    assert_eq!(current.status(), PaymentStatus::AwaitingConfirmation);
    assert_eq!(current.attempts(), 0);
}

#[tokio::test]
async fn reset_then_initiate_stops_a_sleeping_loop() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = Arc::new(MpesaCheckout::new(
        api.clone(),
        Arc::new(TokioScheduler::new()),
        toasts.clone(),
        CheckoutSettings {
            poll_interval: Duration::from_secs(3600),
            ..CheckoutSettings::default()
        },
    ));
    checkout
        .initiate(PHONE, ORDER, Decimal::from(100))
        .await
        .unwrap();

    let old_loop = {
        let checkout = Arc::clone(&checkout);
        tokio::spawn(async move { checkout.run(|_| {}).await })
    };
    while api.call_count("transaction_status") == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    checkout.reset().await;
    checkout
        .initiate(PHONE, "ord-2", Decimal::from(100))
        .await
        .unwrap();

    let result = tokio::time::timeout(Duration::from_secs(5), old_loop)
        .await
        .expect("old loop should stop once its payment is reset")
        .unwrap()
        .unwrap();

    assert!(result.is_none());
    assert_eq!(api.call_count("transaction_status"), 1);
    assert_eq!(checkout.status().await, PaymentStatus::AwaitingConfirmation);
}

// =============================================================================
// Initiation
// =============================================================================

#[tokio::test]
async fn nine_digit_phone_makes_zero_network_calls() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = checkout_with(&api, Arc::new(RecordingScheduler::new()), &toasts);

    let err = checkout
        .initiate("712345678", ORDER, Decimal::from(100))
        .await
        .unwrap_err();

    assert!(matches!(err, CheckoutError::Validation(_)));
    assert_eq!(api.total_calls(), 0);
}

#[tokio::test]
async fn new_payment_allowed_after_terminal_state() {
    let api = Arc::new(MockCommerceApi::new());
    let toasts = Arc::new(ToastCenter::new());
    let checkout = initiated(&api, Arc::new(RecordingScheduler::new()), &toasts).await;
    api.push_status(PaymentStatusReport::new("failed"));
    checkout.run(|_| {}).await.unwrap();

    checkout
        .initiate(PHONE, ORDER, Decimal::from(2450))
        .await
        .unwrap();

    assert_eq!(checkout.status().await, PaymentStatus::AwaitingConfirmation);
    assert_eq!(api.call_count("initiate_push"), 2);
}
