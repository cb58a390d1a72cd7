use super::models::{Account, AccountInput};
use crate::common::error::is_foreign_key_violation;
use crate::common::{generate_account_id, ApiError};
use sqlx::SqlitePool;
use tracing::{error, info};

pub struct AccountsService {
    db: SqlitePool,
}

impl AccountsService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All live accounts, newest first
    pub async fn list_accounts(&self) -> Result<Vec<Account>, ApiError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, name, balance, created_at, updated_at
            FROM accounts
            WHERE deleted_at IS NULL
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list accounts");
            ApiError::InternalServer("Could not retrieve accounts".to_string())
        })
    }

    pub async fn get_account(&self, account_id: &str) -> Result<Account, ApiError> {
        sqlx::query_as::<_, Account>(
            r#"
            SELECT id, user_id, name, balance, created_at, updated_at
            FROM accounts
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(account_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?
        .ok_or_else(|| ApiError::NotFound("Account not found".to_string()))
    }

    /// Fails with "Invalid user id" unless the owner exists and is not deleted
    async fn ensure_owner_exists(&self, user_id: &str) -> Result<(), ApiError> {
        let exists: Option<(String,)> =
            sqlx::query_as("SELECT id FROM users WHERE id = ? AND deleted_at IS NULL")
                .bind(user_id)
                .fetch_optional(&self.db)
                .await
                .map_err(ApiError::DatabaseError)?;

        match exists {
            Some(_) => Ok(()),
            None => Err(ApiError::BadRequest("Invalid user id".to_string())),
        }
    }

    pub async fn create_account(&self, input: AccountInput) -> Result<Account, ApiError> {
        self.ensure_owner_exists(&input.user_id).await?;

        let account_id = generate_account_id();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO accounts (id, user_id, name, balance, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account_id)
        .bind(&input.user_id)
        .bind(&input.name)
        .bind(input.balance)
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::BadRequest("Invalid user id".to_string())
            } else {
                error!(error = %e, "Failed to create account");
                ApiError::InternalServer("Could not create account".to_string())
            }
        })?;

        info!(account_id = %account_id, user_id = %input.user_id, "Account created");
        self.get_account(&account_id).await
    }

    /// Replaces owner, name and balance of an existing account
    pub async fn update_account(
        &self,
        account_id: &str,
        input: AccountInput,
    ) -> Result<Account, ApiError> {
        self.get_account(account_id).await?;
        self.ensure_owner_exists(&input.user_id).await?;

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE accounts
            SET user_id = ?, name = ?, balance = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&input.user_id)
        .bind(&input.name)
        .bind(input.balance)
        .bind(&now)
        .bind(account_id)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                ApiError::BadRequest("Invalid user id".to_string())
            } else {
                error!(error = %e, account_id = %account_id, "Failed to update account");
                ApiError::InternalServer("Could not update account".to_string())
            }
        })?;

        info!(account_id = %account_id, "Account updated");
        self.get_account(account_id).await
    }
}
