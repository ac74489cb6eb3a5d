//! Request body decoding and field validation.
//!
//! Field paths are snake_case and nested objects are joined with dots
//! (`restaurant.contact.phone_prefix`).

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;

use crate::error::{ApiError, AuthError};

pub trait Validate {
    fn validate(&self, errors: &mut FieldErrors);
}

/// Collects human-readable validation failures in field order.
#[derive(Debug, Default)]
pub struct FieldErrors {
    details: Vec<String>,
}

impl FieldErrors {
    pub fn path(prefix: &str, name: &str) -> String {
        if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{prefix}.{name}")
        }
    }

    pub fn is_empty(&self) -> bool {
        self.details.is_empty()
    }

    pub fn into_details(self) -> Vec<String> {
        self.details
    }

    fn push(&mut self, field: &str, rule: impl std::fmt::Display) {
        self.details.push(format!("{field} {rule}"));
    }

    /// Returns whether the value is present, so callers can chain format checks.
    pub fn required(&mut self, field: &str, value: &str) -> bool {
        if value.trim().is_empty() {
            self.push(field, "is required");
            false
        } else {
            true
        }
    }

    pub fn min_len(&mut self, field: &str, value: &str, min: usize) {
        if value.chars().count() < min {
            self.push(field, format_args!("must be at least {min} characters long"));
        }
    }

    pub fn max_len(&mut self, field: &str, value: &str, max: usize) {
        if value.chars().count() > max {
            self.push(field, format_args!("must not exceed {max} characters long"));
        }
    }

    pub fn required_max(&mut self, field: &str, value: &str, max: usize) {
        if self.required(field, value) {
            self.max_len(field, value, max);
        }
    }

    pub fn email(&mut self, field: &str, value: &str) {
        if self.required(field, value) && !is_valid_email(value.trim()) {
            self.push(field, "must be a valid email address");
        }
    }

    pub fn password(&mut self, field: &str, value: &str) {
        if self.required(field, value) && value.chars().count() < 8 {
            self.push(field, "must be a valid password with at least 8 characters long");
        }
    }

    /// Applies `check` to a present value and reports `is invalid` when it fails.
    pub fn matches(&mut self, field: &str, value: &str, check: fn(&str) -> bool) {
        if self.required(field, value) && !check(value) {
            self.invalid(field);
        }
    }

    pub fn invalid(&mut self, field: &str) {
        self.push(field, "is invalid");
    }
}

pub fn is_valid_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !value.chars().any(char::is_whitespace)
}

/// `+` followed by one to four digits.
pub fn is_phone_prefix(value: &str) -> bool {
    value
        .strip_prefix('+')
        .is_some_and(|digits| (1..=4).contains(&digits.len()) && digits.chars().all(|c| c.is_ascii_digit()))
}

pub fn is_phone_number(value: &str) -> bool {
    (4..=14).contains(&value.len()) && value.chars().all(|c| c.is_ascii_digit())
}

const TZ_AREAS: &[&str] = &[
    "Africa", "America", "Antarctica", "Arctic", "Asia", "Atlantic", "Australia", "Etc", "Europe",
    "Indian", "Pacific",
];

/// Shape check for IANA zone names such as `Europe/Rome` or `America/Argentina/Salta`.
pub fn is_iana_timezone(value: &str) -> bool {
    if value == "UTC" {
        return true;
    }
    let mut parts = value.split('/');
    let area_ok = parts.next().is_some_and(|area| TZ_AREAS.contains(&area));
    let rest: Vec<&str> = parts.collect();
    area_ok
        && !rest.is_empty()
        && rest.iter().all(|part| {
            !part.is_empty()
                && part
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '+'))
        })
}

/// JSON body extractor that rejects undecodable bodies with `INVALID_REQUEST`
/// and runs field validation before the handler sees the value.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|rejection| {
            tracing::debug!(error = %rejection, "rejected request body");
            ApiError::from(AuthError::InvalidRequest)
        })?;

        let mut errors = FieldErrors::default();
        value.validate(&mut errors);
        if !errors.is_empty() {
            return Err(AuthError::Validation(errors.into_details()).into());
        }
        Ok(Self(value))
    }
}
