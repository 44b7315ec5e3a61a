//! Postgres implementation of DirectoryStore.

use async_trait::async_trait;
use bigdecimal::BigDecimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::PaymentMethod;
use crate::error::AppError;
use crate::ports::DirectoryStore;

/// Directory backed by the shared back-office database.
#[derive(Clone)]
pub struct PostgresDirectoryStore {
    pool: PgPool,
}

impl PostgresDirectoryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryStore for PostgresDirectoryStore {
    async fn client_exists(&self, client_id: Uuid) -> Result<bool, AppError> {
        let row: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.is_some())
    }

    async fn client_email(&self, client_id: Uuid) -> Result<Option<String>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT email FROM clients WHERE id = $1")
            .bind(client_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|(email,)| email))
    }

    async fn mark_invoice_paid(&self, invoice_id: &str, claim_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE invoices SET paid = TRUE, paid_by_claim = $2 WHERE id = $1",
        )
        .bind(invoice_id)
        .bind(claim_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!(
                "invoice {} not found",
                invoice_id
            )));
        }

        Ok(())
    }

    async fn append_payment_history(
        &self,
        client_id: Uuid,
        amount: &BigDecimal,
        method: PaymentMethod,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO payment_history (id, client_id, amount, method, recorded_at)
            VALUES ($1, $2, $3, $4, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(client_id)
        .bind(amount)
        .bind(method.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear_past_due(&self, client_id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE clients SET past_due = FALSE WHERE id = $1")
            .bind(client_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
