use std::sync::Arc;

use crate::{
    db::{new_object_id, restaurants::RestaurantRepository, StoreError},
    models::{
        auth::UserKind,
        restaurant::{Contact, RegisterRestaurantRequest, Restaurant, Staff},
    },
    services::{
        clock::Clock,
        identity::{normalize_email, Identity, IdentityError},
        password::PasswordHasher,
    },
};

pub struct RestaurantService {
    repo: Arc<dyn RestaurantRepository>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl RestaurantService {
    pub fn new(repo: Arc<dyn RestaurantRepository>, hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self { repo, hasher, clock }
    }

    /// Creates a restaurant and its owning staff account.
    ///
    /// If the owner cannot be created the restaurant is removed again.
    pub async fn register(&self, body: RegisterRestaurantRequest) -> Result<(Restaurant, Staff), IdentityError> {
        let now = self.clock.now();
        let RegisterRestaurantRequest { restaurant: r, staff_owner: o } = body;
        let password_hash = self.hasher.hash(&o.password)?;

        let restaurant = Restaurant {
            id: new_object_id(now),
            vat_code: r.vat_code.trim().to_string(),
            name: r.name.trim().to_string(),
            legal_name: r.legal_name.trim().to_string(),
            tax_id: r.tax_id.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()),
            timezone_id: r.timezone_id.trim().to_string(),
            contact: Contact {
                phone_prefix: r.contact.phone_prefix,
                phone_number: r.contact.phone_number,
                email: normalize_email(&r.contact.email),
                address: r.contact.address.address.trim().to_string(),
                city: r.contact.address.city.trim().to_string(),
                postal_code: r.contact.address.postal_code.trim().to_string(),
                country_code: r.contact.address.country_code.trim().to_uppercase(),
            },
            created_at: now,
            updated_at: now,
        };
        self.repo.insert_restaurant(&restaurant).await.map_err(|e| match e {
            StoreError::Duplicate => IdentityError::RestaurantAlreadyExists,
            other => IdentityError::Store(other),
        })?;

        let owner = Staff {
            id: new_object_id(now),
            restaurant_id: restaurant.id.clone(),
            owner: true,
            email: normalize_email(&o.email),
            password_hash,
            name: o.name.trim().to_string(),
            address: o.address.address.trim().to_string(),
            city: o.address.city.trim().to_string(),
            postal_code: o.address.postal_code.trim().to_string(),
            country_code: o.address.country_code.trim().to_uppercase(),
            created_at: now,
            updated_at: now,
        };
        if let Err(e) = self.repo.insert_staff(&owner).await {
            if let Err(cleanup) = self.repo.delete_restaurant(&restaurant.id).await {
                tracing::error!(
                    restaurant_id = %restaurant.id,
                    error = %cleanup,
                    "restaurant left without an owner after failed registration"
                );
            }
            return Err(match e {
                StoreError::Duplicate => IdentityError::StaffAlreadyExists,
                other => IdentityError::Store(other),
            });
        }

        tracing::info!(restaurant_id = %restaurant.id, staff_id = %owner.id, "restaurant registered");
        Ok((restaurant, owner))
    }

    pub async fn authenticate(
        &self,
        restaurant_id: &str,
        email: &str,
        password: &str,
    ) -> Result<Identity, IdentityError> {
        let staff = self
            .repo
            .find_staff_by_email(restaurant_id.trim(), &normalize_email(email))
            .await
            .map_err(|e| match e {
                StoreError::NotFound => IdentityError::InvalidCredentials,
                other => IdentityError::Store(other),
            })?;

        if !self.hasher.verify(password, &staff.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(Identity {
            user_id: staff.id,
            kind: UserKind::Staff { tenant: staff.restaurant_id },
        })
    }

    pub async fn get(&self, id: &str) -> Result<Restaurant, IdentityError> {
        self.repo.find_restaurant(id).await.map_err(not_found)
    }

    /// Removes a restaurant and all of its staff.
    pub async fn purge(&self, id: &str) -> Result<(), IdentityError> {
        self.repo.delete_restaurant(id).await.map_err(not_found)
    }
}

fn not_found(err: StoreError) -> IdentityError {
    match err {
        StoreError::NotFound => IdentityError::RestaurantNotFound,
        other => IdentityError::Store(other),
    }
}
