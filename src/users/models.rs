use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Maximum lengths accepted for user fields
pub const MAX_NAME_LENGTH: usize = 100;
pub const MAX_EMAIL_LENGTH: usize = 255;
pub const MAX_PHONE_LENGTH: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Form body of `POST /users`
#[derive(Debug, Default, Deserialize)]
pub struct CreateUserForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// JSON body of `PUT /users/:id`; absent or empty fields are left unchanged
#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

impl UpdateUserRequest {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|v| !v.is_empty())
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref().filter(|v| !v.is_empty())
    }

    pub fn phone(&self) -> Option<&str> {
        self.phone.as_deref().filter(|v| !v.is_empty())
    }
}
