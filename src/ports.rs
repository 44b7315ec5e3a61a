//! Consumed collaborator interfaces.
//!
//! The engine never owns client, invoice, or notification state. It reaches
//! the surrounding back office only through these two ports, so completion
//! side effects stay swappable in tests and deployments alike.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::PaymentMethod;
use crate::error::AppError;

/// Client/invoice store the engine reads and updates as a completion side
/// effect. Implementations must tolerate repeated calls for the same claim;
/// the transition guard makes repeats unreachable in practice, but the
/// operations themselves are idempotent flag flips plus one append.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    async fn client_exists(&self, client_id: Uuid) -> Result<bool, AppError>;

    async fn client_email(&self, client_id: Uuid) -> Result<Option<String>, AppError>;

    async fn mark_invoice_paid(&self, invoice_id: &str, claim_id: Uuid) -> Result<(), AppError>;

    async fn append_payment_history(
        &self,
        client_id: Uuid,
        amount: &BigDecimal,
        method: PaymentMethod,
    ) -> Result<(), AppError>;

    async fn clear_past_due(&self, client_id: Uuid) -> Result<(), AppError>;
}

/// Receipt payload handed to the notification gateway.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Receipt {
    pub claim_id: Uuid,
    pub amount: BigDecimal,
    pub method: PaymentMethod,
    pub date: DateTime<Utc>,
}

/// Fire-and-forget notification sink. Failures are the caller's to log, never
/// to retry; `dedup_key` lets the gateway drop an accidental second delivery.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    async fn send_receipt(&self, client_email: &str, receipt: &Receipt) -> Result<(), AppError>;

    async fn send_reminder(
        &self,
        staff_channel: &str,
        claim_id: Uuid,
        dedup_key: Uuid,
    ) -> Result<(), AppError>;
}
