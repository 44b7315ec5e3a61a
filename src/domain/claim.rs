//! Payment claim domain entities.
//! Framework-agnostic representation of a tracked payment.

use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Lifecycle state of a payment claim.
///
/// `Completed`, `Failed` and `NotReceived` are terminal: once a claim enters
/// one of them no further transition is permitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClaimStatus {
    Pending,
    Scheduled,
    PendingConfirmation,
    Completed,
    Failed,
    NotReceived,
}

impl ClaimStatus {
    /// The states a bank transaction may still be matched against.
    pub const OPEN: [ClaimStatus; 3] = [
        ClaimStatus::Pending,
        ClaimStatus::Scheduled,
        ClaimStatus::PendingConfirmation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Pending => "pending",
            ClaimStatus::Scheduled => "scheduled",
            ClaimStatus::PendingConfirmation => "pending-confirmation",
            ClaimStatus::Completed => "completed",
            ClaimStatus::Failed => "failed",
            ClaimStatus::NotReceived => "not-received",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ClaimStatus::Completed | ClaimStatus::Failed | ClaimStatus::NotReceived
        )
    }

    pub fn is_open(&self) -> bool {
        !self.is_terminal()
    }
}

impl fmt::Display for ClaimStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClaimStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ClaimStatus::Pending),
            "scheduled" => Ok(ClaimStatus::Scheduled),
            "pending-confirmation" => Ok(ClaimStatus::PendingConfirmation),
            "completed" => Ok(ClaimStatus::Completed),
            "failed" => Ok(ClaimStatus::Failed),
            "not-received" => Ok(ClaimStatus::NotReceived),
            other => Err(format!("unknown claim status: {}", other)),
        }
    }
}

/// How the client pays. Self-reported transfers (Zelle and the like) are the
/// only method that goes through staff confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    SelfReportTransfer,
    Card,
    Ach,
    Check,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::SelfReportTransfer => "self-report-transfer",
            PaymentMethod::Card => "card",
            PaymentMethod::Ach => "ach",
            PaymentMethod::Check => "check",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "self-report-transfer" => Ok(PaymentMethod::SelfReportTransfer),
            "card" => Ok(PaymentMethod::Card),
            "ach" => Ok(PaymentMethod::Ach),
            "check" => Ok(PaymentMethod::Check),
            other => Err(format!("unknown payment method: {}", other)),
        }
    }
}

/// A tracked payment, from report through confirmation or rejection.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentClaim {
    pub id: Uuid,
    pub client_id: Uuid,
    pub invoice_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub method: PaymentMethod,
    pub status: ClaimStatus,
    pub reported_at: Option<DateTime<Utc>>,
    pub destination_handle: Option<String>,
    pub reference_note: Option<String>,
    pub confirmed_by: Option<String>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub external_transaction_id: Option<String>,
    pub not_received_reason: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentClaim {
    /// A freshly self-reported transfer, awaiting staff confirmation.
    pub fn self_reported(
        client_id: Uuid,
        amount: BigDecimal,
        invoice_id: Option<String>,
        destination_handle: Option<String>,
        reference_note: Option<String>,
        created_by: String,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            client_id,
            invoice_id,
            amount,
            currency: "USD".to_string(),
            method: PaymentMethod::SelfReportTransfer,
            status: ClaimStatus::PendingConfirmation,
            reported_at: Some(now),
            destination_handle,
            reference_note,
            confirmed_by: None,
            confirmed_at: None,
            external_transaction_id: None,
            not_received_reason: None,
            created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One settled row out of an imported bank extract. Ephemeral: it either
/// becomes the `external_transaction_id` of a matched claim or is reported
/// back as unmatched, never stored on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct BankTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: BigDecimal,
    pub external_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_strings() {
        for status in [
            ClaimStatus::Pending,
            ClaimStatus::Scheduled,
            ClaimStatus::PendingConfirmation,
            ClaimStatus::Completed,
            ClaimStatus::Failed,
            ClaimStatus::NotReceived,
        ] {
            assert_eq!(status.as_str().parse::<ClaimStatus>(), Ok(status));
        }
    }

    #[test]
    fn unknown_status_is_rejected() {
        assert!("refunded".parse::<ClaimStatus>().is_err());
        assert!("".parse::<ClaimStatus>().is_err());
    }

    #[test]
    fn terminal_states() {
        assert!(ClaimStatus::Completed.is_terminal());
        assert!(ClaimStatus::Failed.is_terminal());
        assert!(ClaimStatus::NotReceived.is_terminal());
        assert!(!ClaimStatus::Pending.is_terminal());
        assert!(!ClaimStatus::Scheduled.is_terminal());
        assert!(!ClaimStatus::PendingConfirmation.is_terminal());
    }

    #[test]
    fn open_set_matches_is_open() {
        for status in ClaimStatus::OPEN {
            assert!(status.is_open());
        }
    }

    #[test]
    fn self_reported_claim_defaults() {
        let claim = PaymentClaim::self_reported(
            Uuid::new_v4(),
            "150.00".parse().unwrap(),
            Some("INV-1".to_string()),
            None,
            None,
            "client-portal".to_string(),
        );
        assert_eq!(claim.status, ClaimStatus::PendingConfirmation);
        assert_eq!(claim.method, PaymentMethod::SelfReportTransfer);
        assert!(claim.reported_at.is_some());
        assert!(claim.external_transaction_id.is_none());
    }
}
