use crate::errors::{AppError, FieldError};
use crate::models::all_models::{
    Branch, BranchAdmin, Customer, Employee, ForgotPasswordRequest, LoginRequest, PaymentMethod,
    Profile, RegisterRequest, ResetPasswordRequest,
};

pub const MIN_PASSWORD_LEN: usize = 6;

/// Client-side form checks, run before anything reaches the backend.
pub trait Validate {
    fn validate(&self) -> Vec<FieldError>;

    fn check(&self) -> Result<(), AppError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(errors))
        }
    }
}

fn required(errors: &mut Vec<FieldError>, field: &'static str, label: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, format!("{} is required", label)));
    }
}

pub fn is_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

pub fn is_phone(value: &str) -> bool {
    let digits = value.trim().strip_prefix('+').unwrap_or(value.trim());
    (7..=15).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit())
}

fn email(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        errors.push(FieldError::new(field, "Email is required"));
    } else if !is_email(value) {
        errors.push(FieldError::new(field, "Enter a valid email address"));
    }
}

fn optional_phone(errors: &mut Vec<FieldError>, field: &'static str, value: &Option<String>) {
    if let Some(phone) = value.as_deref().filter(|p| !p.trim().is_empty()) {
        if !is_phone(phone) {
            errors.push(FieldError::new(field, "Phone must be 7 to 15 digits"));
        }
    }
}

fn password(errors: &mut Vec<FieldError>, field: &'static str, value: &str) {
    if value.len() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            field,
            format!("Password must be at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
}

impl Validate for Branch {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "name", "Branch name", &self.name);
        required(&mut errors, "address", "Address", &self.address);
        optional_phone(&mut errors, "phone", &self.phone);
        errors
    }
}

impl Validate for BranchAdmin {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "fullName", "Full name", &self.full_name);
        email(&mut errors, "email", &self.email);
        optional_phone(&mut errors, "phone", &self.phone);
        if self.branch_id.is_none() {
            errors.push(FieldError::new("branchId", "Select a branch"));
        }
        errors
    }
}

impl Validate for PaymentMethod {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "name", "Payment method name", &self.name);
        errors
    }
}

impl Validate for Customer {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "fullName", "Full name", &self.full_name);
        email(&mut errors, "email", &self.email);
        optional_phone(&mut errors, "phone", &self.phone);
        errors
    }
}

impl Validate for Employee {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "fullName", "Full name", &self.full_name);
        email(&mut errors, "email", &self.email);
        optional_phone(&mut errors, "phone", &self.phone);
        errors
    }
}

impl Validate for Profile {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "fullName", "Full name", &self.full_name);
        email(&mut errors, "email", &self.email);
        optional_phone(&mut errors, "phone", &self.phone);
        if self.address.as_deref().map_or(true, |a| a.trim().is_empty()) {
            errors.push(FieldError::new("address", "Address is required"));
        }
        errors
    }
}

impl Validate for LoginRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "username", "Username", &self.username);
        required(&mut errors, "password", "Password", &self.password);
        errors
    }
}

impl Validate for RegisterRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        required(&mut errors, "username", "Username", &self.username);
        email(&mut errors, "email", &self.email);
        password(&mut errors, "password", &self.password);
        errors
    }
}

impl Validate for ForgotPasswordRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        email(&mut errors, "email", &self.email);
        errors
    }
}

impl Validate for ResetPasswordRequest {
    fn validate(&self) -> Vec<FieldError> {
        let mut errors = Vec::new();
        email(&mut errors, "email", &self.email);
        required(&mut errors, "token", "Reset token", &self.token);
        password(&mut errors, "newPassword", &self.new_password);
        errors
    }
}
