use super::models::{
    CreateUserForm, UpdateUserRequest, MAX_EMAIL_LENGTH, MAX_NAME_LENGTH, MAX_PHONE_LENGTH,
};
use crate::common::validation::looks_like_email;
use crate::common::{ValidationResult, Validator};

pub fn validate_name(result: &mut ValidationResult, name: &str) {
    result.require_text("name", name, MAX_NAME_LENGTH);
}

pub fn validate_email(result: &mut ValidationResult, email: &str) {
    let before = result.errors.len();
    result.require_text("email", email, MAX_EMAIL_LENGTH);
    if result.errors.len() == before && !looks_like_email(email.trim()) {
        result.add_error("email", "invalid email format");
    }
}

pub fn validate_phone(result: &mut ValidationResult, phone: &str) {
    result.require_text("phone", phone, MAX_PHONE_LENGTH);
}

impl Validator<CreateUserForm> for CreateUserForm {
    fn validate(&self, data: &CreateUserForm) -> ValidationResult {
        let mut result = ValidationResult::new();
        validate_name(&mut result, &data.name);
        validate_email(&mut result, &data.email);
        validate_phone(&mut result, &data.phone);
        result
    }
}

impl Validator<UpdateUserRequest> for UpdateUserRequest {
    fn validate(&self, data: &UpdateUserRequest) -> ValidationResult {
        let mut result = ValidationResult::new();

        if let Some(name) = data.name() {
            validate_name(&mut result, name);
        }
        if let Some(email) = data.email() {
            validate_email(&mut result, email);
        }
        if let Some(phone) = data.phone() {
            validate_phone(&mut result, phone);
        }

        result
    }
}
