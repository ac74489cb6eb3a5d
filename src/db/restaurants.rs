use async_trait::async_trait;
use sqlx::PgPool;

use super::StoreError;
use crate::models::restaurant::{Restaurant, RestaurantRow, Staff};

/// Restaurants and the staff accounts that belong to them.
#[async_trait]
pub trait RestaurantRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the VAT code is taken.
    async fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<(), StoreError>;
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_staff(&self, staff: &Staff) -> Result<(), StoreError>;
    async fn find_restaurant(&self, id: &str) -> Result<Restaurant, StoreError>;
    async fn find_staff_by_email(&self, restaurant_id: &str, email: &str) -> Result<Staff, StoreError>;
    /// Removes the restaurant together with its staff.
    async fn delete_restaurant(&self, id: &str) -> Result<(), StoreError>;
}

pub struct PgRestaurantRepository {
    pool: PgPool,
}

impl PgRestaurantRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RestaurantRepository for PgRestaurantRepository {
    async fn insert_restaurant(&self, r: &Restaurant) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO restaurants
                (id, vat_code, name, legal_name, tax_id, timezone_id,
                 phone_prefix, phone_number, email, address, city, postal_code, country_code,
                 created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
        )
        .bind(&r.id)
        .bind(&r.vat_code)
        .bind(&r.name)
        .bind(&r.legal_name)
        .bind(&r.tax_id)
        .bind(&r.timezone_id)
        .bind(&r.contact.phone_prefix)
        .bind(&r.contact.phone_number)
        .bind(&r.contact.email)
        .bind(&r.contact.address)
        .bind(&r.contact.city)
        .bind(&r.contact.postal_code)
        .bind(&r.contact.country_code)
        .bind(r.created_at)
        .bind(r.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(())
    }

    async fn insert_staff(&self, s: &Staff) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO staff
                (id, restaurant_id, owner, email, password_hash, name,
                 address, city, postal_code, country_code, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(&s.id)
        .bind(&s.restaurant_id)
        .bind(s.owner)
        .bind(&s.email)
        .bind(&s.password_hash)
        .bind(&s.name)
        .bind(&s.address)
        .bind(&s.city)
        .bind(&s.postal_code)
        .bind(&s.country_code)
        .bind(s.created_at)
        .bind(s.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(())
    }

    async fn find_restaurant(&self, id: &str) -> Result<Restaurant, StoreError> {
        let row = sqlx::query_as::<_, RestaurantRow>(
            "SELECT id, vat_code, name, legal_name, tax_id, timezone_id,
                    phone_prefix, phone_number, email, address, city, postal_code, country_code,
                    created_at, updated_at
             FROM restaurants WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;
        Ok(row.into())
    }

    async fn find_staff_by_email(&self, restaurant_id: &str, email: &str) -> Result<Staff, StoreError> {
        sqlx::query_as::<_, Staff>(
            "SELECT id, restaurant_id, owner, email, password_hash, name,
                    address, city, postal_code, country_code, created_at, updated_at
             FROM staff WHERE restaurant_id = $1 AND email = $2",
        )
        .bind(restaurant_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete_restaurant(&self, id: &str) -> Result<(), StoreError> {
        // staff rows go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM restaurants WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
