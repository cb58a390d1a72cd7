use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const MAX_BALANCE: f64 = 999_999_999.99;
pub const MAX_ACCOUNT_NAME_LENGTH: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub balance: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Form body shared by account creation and update
///
/// Fields arrive as raw strings so that parse failures map to the
/// account-specific error messages.
#[derive(Debug, Default, Deserialize)]
pub struct AccountForm {
    #[serde(rename = "user-id", default)]
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub balance: String,
}

/// An [`AccountForm`] after parsing and validation
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInput {
    pub user_id: String,
    pub name: String,
    pub balance: f64,
}
