//! Payment gateway port for M-Pesa push payments.
//!
//! The backend owns the gateway integration; the client only submits the
//! push request and polls the resulting transaction.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrderId, TransactionId};
use crate::domain::payment::{PhoneNumber, StatusCheck};

use super::ApiError;

/// Port for push payment initiation and status polling.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Ask the backend to prompt the customer's phone.
    async fn initiate_push(
        &self,
        request: &InitiationRequest,
    ) -> Result<InitiationResponse, ApiError>;

    /// Current status of a transaction.
    async fn transaction_status(
        &self,
        transaction_id: &TransactionId,
    ) -> Result<PaymentStatusReport, ApiError>;
}

/// Request to start a push payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiationRequest {
    /// Canonical phone number.
    pub phone_number: PhoneNumber,

    /// Order being paid.
    pub order_id: OrderId,

    /// Amount captured at submission.
    pub amount: Decimal,
}

/// Backend answer to an initiation request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InitiationResponse {
    pub success: bool,

    /// Present when `success` is true.
    #[serde(default)]
    pub transaction_id: Option<TransactionId>,

    /// Upstream reason when `success` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl InitiationResponse {
    pub fn accepted(transaction_id: TransactionId) -> Self {
        Self {
            success: true,
            transaction_id: Some(transaction_id),
            error: None,
        }
    }

    pub fn declined(error: impl Into<String>) -> Self {
        Self {
            success: false,
            transaction_id: None,
            error: Some(error.into()),
        }
    }
}

/// Backend answer to a status poll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentStatusReport {
    /// `pending`, `successful`, `failed`, or anything else the backend sends.
    pub status: String,

    #[serde(default)]
    pub result_description: Option<String>,
}

impl PaymentStatusReport {
    pub fn new(status: impl Into<String>) -> Self {
        Self {
            status: status.into(),
            result_description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.result_description = Some(description.into());
        self
    }

    /// Maps the report to the aggregate's check result.
    pub fn to_check(&self) -> StatusCheck {
        StatusCheck::from_report(&self.status, self.result_description.clone())
    }
}
