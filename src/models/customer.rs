use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::validation::{FieldErrors, Validate};

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Customer {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a customer, returned by registration and profile reads.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerProfile {
    pub id: String,
    pub email: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
}

impl From<Customer> for CustomerProfile {
    fn from(c: Customer) -> Self {
        Self {
            id: c.id,
            email: c.email,
            name: c.name,
            address: c.address,
            city: c.city,
            postal_code: c.postal_code,
            country_code: c.country_code,
            created_at: c.created_at,
        }
    }
}

/// Editable part of a customer profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerChanges {
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

impl From<UpdateCustomerRequest> for CustomerChanges {
    fn from(body: UpdateCustomerRequest) -> Self {
        Self {
            name: body.name.trim().to_string(),
            address: body.address.address.trim().to_string(),
            city: body.address.city.trim().to_string(),
            postal_code: body.address.postal_code.trim().to_string(),
            country_code: body.address.country_code.trim().to_uppercase(),
        }
    }
}

/// Postal details shared by customers, staff and restaurant contacts.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AddressFields {
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

impl AddressFields {
    pub fn check(&self, errors: &mut FieldErrors, prefix: &str) {
        let field = |name: &str| FieldErrors::path(prefix, name);
        errors.required_max(&field("address"), &self.address, 100);
        errors.required_max(&field("city"), &self.city, 100);
        if errors.required(&field("postal_code"), &self.postal_code) {
            errors.min_len(&field("postal_code"), &self.postal_code, 5);
            errors.max_len(&field("postal_code"), &self.postal_code, 32);
        }
        if errors.required(&field("country_code"), &self.country_code)
            && self.country_code.trim().chars().count() != 2
        {
            errors.invalid(&field("country_code"));
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterCustomerRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(flatten)]
    pub address: AddressFields,
}

impl Validate for RegisterCustomerRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.email("email", &self.email);
        errors.password("password", &self.password);
        errors.required_max("name", &self.name, 100);
        self.address.check(errors, "");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateCustomerRequest {
    pub name: String,
    #[serde(flatten)]
    pub address: AddressFields,
}

impl Validate for UpdateCustomerRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.required_max("name", &self.name, 100);
        self.address.check(errors, "");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.email("email", &self.email);
        errors.required("password", &self.password);
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RefreshTokenRequest {
    pub access_token: String,
    pub refresh_token: String,
}

impl Validate for RefreshTokenRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.required("access_token", &self.access_token);
        errors.required("refresh_token", &self.refresh_token);
    }
}
