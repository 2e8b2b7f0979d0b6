//! Onboarding form validation.

use std::sync::LazyLock;

use chrono::Utc;
use regex::Regex;
use serde::Deserialize;

use super::model::OnboardingRecord;
use crate::error::ValidationError;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

/// Minimum digits in a phone number once separators are stripped.
const MIN_PHONE_DIGITS: usize = 10;

/// Raw onboarding form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnboardingForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub company: String,
}

impl OnboardingForm {
    /// Every validation failure, in field order.
    pub fn errors(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::Required { field: "name" });
        }

        let email = self.email.trim();
        if email.is_empty() {
            errors.push(ValidationError::Required { field: "email" });
        } else if !EMAIL_RE.is_match(email) {
            errors.push(ValidationError::Invalid {
                field: "email",
                reason: "expected an address like name@domain.com".into(),
            });
        }

        let digits = self.phone.chars().filter(char::is_ascii_digit).count();
        if self.phone.trim().is_empty() {
            errors.push(ValidationError::Required { field: "phone" });
        } else if digits < MIN_PHONE_DIGITS {
            errors.push(ValidationError::Invalid {
                field: "phone",
                reason: format!("needs at least {MIN_PHONE_DIGITS} digits, got {digits}"),
            });
        }

        if self.company.trim().is_empty() {
            errors.push(ValidationError::Required { field: "company" });
        }

        errors
    }

    /// Validate and build a record stamped with the current time.
    ///
    /// On failure returns every error, in field order.
    pub fn validate(&self) -> Result<OnboardingRecord, Vec<ValidationError>> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(errors);
        }
        Ok(OnboardingRecord {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            company: self.company.trim().to_string(),
            submitted_at: Utc::now(),
        })
    }
}
