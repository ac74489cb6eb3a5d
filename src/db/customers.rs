use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::StoreError;
use crate::models::customer::{Customer, CustomerChanges};

#[async_trait]
pub trait CustomerRepository: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError>;
    async fn find_by_id(&self, id: &str) -> Result<Customer, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Customer, StoreError>;
    async fn update(&self, id: &str, changes: &CustomerChanges, now: DateTime<Utc>) -> Result<Customer, StoreError>;
    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}

pub struct PgCustomerRepository {
    pool: PgPool,
}

impl PgCustomerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const COLUMNS: &str = "id, email, password_hash, name, address, city, postal_code, country_code, created_at, updated_at";

#[async_trait]
impl CustomerRepository for PgCustomerRepository {
    async fn insert(&self, c: &Customer) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO customers
                (id, email, password_hash, name, address, city, postal_code, country_code, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(&c.id)
        .bind(&c.email)
        .bind(&c.password_hash)
        .bind(&c.name)
        .bind(&c.address)
        .bind(&c.city)
        .bind(&c.postal_code)
        .bind(&c.country_code)
        .bind(c.created_at)
        .bind(c.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Customer, StoreError> {
        sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Customer, StoreError> {
        sqlx::query_as::<_, Customer>(&format!("SELECT {COLUMNS} FROM customers WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, changes: &CustomerChanges, now: DateTime<Utc>) -> Result<Customer, StoreError> {
        sqlx::query_as::<_, Customer>(&format!(
            "UPDATE customers
             SET name = $2, address = $3, city = $4, postal_code = $5, country_code = $6, updated_at = $7
             WHERE id = $1
             RETURNING {COLUMNS}"
        ))
        .bind(id)
        .bind(&changes.name)
        .bind(&changes.address)
        .bind(&changes.city)
        .bind(&changes.postal_code)
        .bind(&changes.country_code)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM customers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
