use super::models::{AccountForm, AccountInput, MAX_ACCOUNT_NAME_LENGTH, MAX_BALANCE};
use crate::common::{is_valid_id, ApiError, EntityPrefix, ValidationResult};

/// How an empty balance field is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyBalance {
    Zero,
    Reject,
}

pub fn validate_balance(result: &mut ValidationResult, balance: f64) {
    if balance < 0.0 {
        result.add_error("balance", "balance cannot be negative");
    } else if balance > MAX_BALANCE {
        result.add_error(
            "balance",
            &format!("balance cannot exceed {:.2}", MAX_BALANCE),
        );
    }
}

pub fn parse_balance(raw: &str, empty: EmptyBalance) -> Result<f64, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() && empty == EmptyBalance::Zero {
        return Ok(0.0);
    }

    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| ApiError::BadRequest("Invalid balance data".to_string()))
}

impl AccountForm {
    /// Parses and validates the raw form fields
    ///
    /// The user id is only checked for shape here; its existence is checked
    /// against the store by the service.
    pub fn parse(&self, empty_balance: EmptyBalance) -> Result<AccountInput, ApiError> {
        let user_id = self.user_id.trim();
        if !is_valid_id(EntityPrefix::User, user_id) {
            return Err(ApiError::BadRequest("Invalid user id".to_string()));
        }

        let balance = parse_balance(&self.balance, empty_balance)?;

        let mut result = ValidationResult::new();
        result.optional_text("name", Some(&self.name), MAX_ACCOUNT_NAME_LENGTH);
        validate_balance(&mut result, balance);
        if !result.is_valid {
            return Err(ApiError::from(result));
        }

        Ok(AccountInput {
            user_id: user_id.to_string(),
            name: self.name.trim().to_string(),
            balance,
        })
    }
}
