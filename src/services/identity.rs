use crate::{db::StoreError, models::auth::UserKind};

/// Failures of the customer and restaurant subject services.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("customer already exists")]
    CustomerAlreadyExists,
    #[error("staff already exists")]
    StaffAlreadyExists,
    #[error("restaurant already exists")]
    RestaurantAlreadyExists,
    #[error("customer not found")]
    CustomerNotFound,
    #[error("restaurant not found")]
    RestaurantNotFound,
    /// Unknown email and wrong password look the same.
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("failed to hash password")]
    Hash(#[from] bcrypt::BcryptError),
    #[error(transparent)]
    Store(StoreError),
}

/// A subject whose credentials checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: String,
    pub kind: UserKind,
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
