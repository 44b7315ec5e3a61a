use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde_json::json;
use std::time::Duration;
use uuid::Uuid;

use crate::error::AppError;
use crate::ports::{NotificationGateway, Receipt};

type Breaker = StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>;

/// HTTP client for the back office's notification gateway.
///
/// Delivery is fire-and-forget: callers log a failed send and move on, and a
/// circuit breaker keeps a dead gateway from stalling reconciliation or the
/// reminder scan behind connect timeouts.
#[derive(Clone)]
pub struct HttpNotificationGateway {
    client: Client,
    base_url: String,
    circuit_breaker: Breaker,
}

impl HttpNotificationGateway {
    pub fn new(base_url: String) -> Self {
        Self::with_circuit_breaker(base_url, 3, 60)
    }

    pub fn with_circuit_breaker(
        base_url: String,
        failure_threshold: u32,
        reset_timeout_secs: u64,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(
            Duration::from_secs(reset_timeout_secs),
            Duration::from_secs(reset_timeout_secs * 2),
        );
        let policy = failure_policy::consecutive_failures(failure_threshold, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        HttpNotificationGateway {
            client,
            base_url,
            circuit_breaker,
        }
    }

    pub fn circuit_state(&self) -> &'static str {
        if self.circuit_breaker.is_call_permitted() {
            "closed"
        } else {
            "open"
        }
    }

    async fn post_json(&self, path: &str, body: serde_json::Value) -> Result<(), AppError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        let client = self.client.clone();

        let result = self
            .circuit_breaker
            .call(async move {
                let response = client.post(&url).json(&body).send().await?;
                response.error_for_status()?;
                Ok::<_, reqwest::Error>(())
            })
            .await;

        match result {
            Ok(()) => Ok(()),
            Err(FailsafeError::Rejected) => Err(AppError::Internal(
                "notification gateway circuit breaker open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(AppError::Internal(format!(
                "notification gateway request failed: {}",
                e
            ))),
        }
    }
}

#[async_trait]
impl NotificationGateway for HttpNotificationGateway {
    async fn send_receipt(&self, client_email: &str, receipt: &Receipt) -> Result<(), AppError> {
        self.post_json(
            "receipts",
            json!({
                "to": client_email,
                "claim_id": receipt.claim_id,
                "amount": receipt.amount.to_string(),
                "method": receipt.method.as_str(),
                "date": receipt.date.to_rfc3339(),
                "dedup_key": receipt.claim_id,
            }),
        )
        .await
    }

    async fn send_reminder(
        &self,
        staff_channel: &str,
        claim_id: Uuid,
        dedup_key: Uuid,
    ) -> Result<(), AppError> {
        self.post_json(
            "reminders",
            json!({
                "channel": staff_channel,
                "claim_id": claim_id,
                "dedup_key": dedup_key,
            }),
        )
        .await
    }
}
