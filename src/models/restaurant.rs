use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::customer::AddressFields;
use crate::validation::{is_iana_timezone, is_phone_number, is_phone_prefix, FieldErrors, Validate};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub phone_prefix: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Restaurant {
    pub id: String,
    pub vat_code: String,
    pub name: String,
    pub legal_name: String,
    pub tax_id: Option<String>,
    pub timezone_id: String,
    pub contact: Contact,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// DB row struct: the contact is stored inline in the restaurants table.
#[derive(Debug, Clone, FromRow)]
pub struct RestaurantRow {
    pub id: String,
    pub vat_code: String,
    pub name: String,
    pub legal_name: String,
    pub tax_id: Option<String>,
    pub timezone_id: String,
    pub phone_prefix: String,
    pub phone_number: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<RestaurantRow> for Restaurant {
    fn from(row: RestaurantRow) -> Self {
        Self {
            id: row.id,
            vat_code: row.vat_code,
            name: row.name,
            legal_name: row.legal_name,
            tax_id: row.tax_id,
            timezone_id: row.timezone_id,
            contact: Contact {
                phone_prefix: row.phone_prefix,
                phone_number: row.phone_number,
                email: row.email,
                address: row.address,
                city: row.city,
                postal_code: row.postal_code,
                country_code: row.country_code,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, PartialEq, Eq)]
pub struct Staff {
    pub id: String,
    pub restaurant_id: String,
    pub owner: bool,
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

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StaffProfile {
    pub id: String,
    pub owner: bool,
    pub email: String,
    pub name: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country_code: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Staff> for StaffProfile {
    fn from(s: Staff) -> Self {
        Self {
            id: s.id,
            owner: s.owner,
            email: s.email,
            name: s.name,
            address: s.address,
            city: s.city,
            postal_code: s.postal_code,
            country_code: s.country_code,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ContactRequest {
    pub phone_prefix: String,
    pub phone_number: String,
    pub email: String,
    #[serde(flatten)]
    pub address: AddressFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RestaurantRequest {
    pub vat_code: String,
    pub name: String,
    pub legal_name: String,
    pub tax_id: Option<String>,
    pub timezone_id: String,
    pub contact: ContactRequest,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffOwnerRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(flatten)]
    pub address: AddressFields,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRestaurantRequest {
    pub restaurant: RestaurantRequest,
    pub staff_owner: StaffOwnerRequest,
}

impl Validate for RegisterRestaurantRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        let r = &self.restaurant;
        errors.required_max("restaurant.vat_code", &r.vat_code, 40);
        errors.required_max("restaurant.name", &r.name, 100);
        errors.required_max("restaurant.legal_name", &r.legal_name, 100);
        if let Some(tax_id) = &r.tax_id {
            errors.max_len("restaurant.tax_id", tax_id, 40);
        }
        errors.matches("restaurant.timezone_id", &r.timezone_id, is_iana_timezone);

        let c = &r.contact;
        errors.matches("restaurant.contact.phone_prefix", &c.phone_prefix, is_phone_prefix);
        errors.matches("restaurant.contact.phone_number", &c.phone_number, is_phone_number);
        errors.email("restaurant.contact.email", &c.email);
        c.address.check(errors, "restaurant.contact");

        let o = &self.staff_owner;
        errors.email("staff_owner.email", &o.email);
        errors.password("staff_owner.password", &o.password);
        errors.required_max("staff_owner.name", &o.name, 100);
        o.address.check(errors, "staff_owner");
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StaffLoginRequest {
    pub email: String,
    pub password: String,
    pub restaurant_id: String,
}

impl Validate for StaffLoginRequest {
    fn validate(&self, errors: &mut FieldErrors) {
        errors.email("email", &self.email);
        errors.required("password", &self.password);
        errors.required("restaurant_id", &self.restaurant_id);
    }
}
