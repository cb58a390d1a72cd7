use super::models::{CreateUserForm, UpdateUserRequest, User};
use crate::common::error::is_unique_violation;
use crate::common::{generate_user_id, ApiError, Validator};
use sqlx::SqlitePool;
use tracing::{error, info};

const DUPLICATE_EMAIL: &str = "User with this email already exists";

pub struct UsersService {
    db: SqlitePool,
}

impl UsersService {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// All users that have not been deleted, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, created_at, updated_at
            FROM users
            WHERE deleted_at IS NULL
            ORDER BY created_at ASC, rowid ASC
            "#,
        )
        .fetch_all(&self.db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list users");
            ApiError::InternalServer("Could not retrieve users".to_string())
        })
    }

    pub async fn find_user(&self, user_id: &str) -> Result<Option<User>, ApiError> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, name, email, phone, created_at, updated_at
            FROM users
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(ApiError::DatabaseError)
    }

    pub async fn get_user(&self, user_id: &str) -> Result<User, ApiError> {
        self.find_user(user_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
    }

    pub async fn create_user(&self, form: CreateUserForm) -> Result<User, ApiError> {
        let validation_result = form.validate(&form);
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        let user_id = generate_user_id();
        let now = chrono::Utc::now().to_rfc3339();

        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, phone, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user_id)
        .bind(form.name.trim())
        .bind(form.email.trim())
        .bind(form.phone.trim())
        .bind(&now)
        .bind(&now)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict(DUPLICATE_EMAIL.to_string())
            } else {
                error!(error = %e, "Failed to create user");
                ApiError::InternalServer("Could not create user".to_string())
            }
        })?;

        info!(user_id = %user_id, "User created");
        self.get_user(&user_id).await
    }

    /// Applies the non-empty fields of `request`
    pub async fn update_user(
        &self,
        user_id: &str,
        request: UpdateUserRequest,
    ) -> Result<User, ApiError> {
        let mut user = self.get_user(user_id).await?;

        let validation_result = request.validate(&request);
        if !validation_result.is_valid {
            return Err(ApiError::from(validation_result));
        }

        if let Some(name) = request.name() {
            user.name = name.trim().to_string();
        }
        if let Some(email) = request.email() {
            user.email = email.trim().to_string();
        }
        if let Some(phone) = request.phone() {
            user.phone = phone.trim().to_string();
        }

        let now = chrono::Utc::now().to_rfc3339();
        sqlx::query(
            r#"
            UPDATE users
            SET name = ?, email = ?, phone = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&now)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                ApiError::Conflict(DUPLICATE_EMAIL.to_string())
            } else {
                error!(error = %e, user_id = %user_id, "Failed to update user");
                ApiError::InternalServer("Could not update user".to_string())
            }
        })?;

        user.updated_at = now;
        info!(user_id = %user_id, "User updated");
        Ok(user)
    }

    /// Soft delete: the row stays but is hidden from every query
    pub async fn delete_user(&self, user_id: &str) -> Result<(), ApiError> {
        let now = chrono::Utc::now().to_rfc3339();
        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&now)
        .bind(&now)
        .bind(user_id)
        .execute(&self.db)
        .await
        .map_err(ApiError::DatabaseError)?;

        if result.rows_affected() == 0 {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        info!(user_id = %user_id, "User deleted");
        Ok(())
    }
}
