//! In-process stores with the same semantics as the Postgres ones.
//!
//! Used when no `DATABASE_URL` is configured and throughout the test suite.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{
    customers::CustomerRepository,
    refresh::{materialize, RefreshStore},
    restaurants::RestaurantRepository,
    StoreError,
};
use crate::models::{
    customer::{Customer, CustomerChanges},
    refresh::{NewRefreshRecord, RefreshRecord},
    restaurant::{Restaurant, Staff},
};

/// Refresh records keyed by token value, which also gives token uniqueness.
#[derive(Default)]
pub struct MemoryRefreshStore {
    records: RwLock<HashMap<String, RefreshRecord>>,
}

impl MemoryRefreshStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw lookup ignoring usability.
    pub async fn get(&self, token: &str) -> Option<RefreshRecord> {
        self.records.read().await.get(token).cloned()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl RefreshStore for MemoryRefreshStore {
    async fn insert(&self, record: NewRefreshRecord, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.token) {
            return Err(StoreError::Duplicate);
        }
        let record = materialize(record, now);
        records.insert(record.token.clone(), record.clone());
        Ok(record)
    }

    async fn find_usable(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
        self.records
            .read()
            .await
            .get(token)
            .filter(|r| r.is_usable(now))
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn expire_usable(
        &self,
        token: &str,
        new_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut records = self.records.write().await;
        match records.get_mut(token) {
            Some(r) if r.is_usable(now) && r.expires_at > new_expires_at => {
                r.expires_at = new_expires_at;
                r.updated_at = now;
                Ok(())
            }
            _ => Err(StoreError::NotFound),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryCustomerRepository {
    customers: RwLock<HashMap<String, Customer>>,
}

impl MemoryCustomerRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CustomerRepository for MemoryCustomerRepository {
    async fn insert(&self, customer: &Customer) -> Result<(), StoreError> {
        let mut customers = self.customers.write().await;
        if customers.values().any(|c| c.email == customer.email) {
            return Err(StoreError::Duplicate);
        }
        customers.insert(customer.id.clone(), customer.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Customer, StoreError> {
        self.customers.read().await.get(id).cloned().ok_or(StoreError::NotFound)
    }

    async fn find_by_email(&self, email: &str) -> Result<Customer, StoreError> {
        self.customers
            .read()
            .await
            .values()
            .find(|c| c.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update(&self, id: &str, changes: &CustomerChanges, now: DateTime<Utc>) -> Result<Customer, StoreError> {
        let mut customers = self.customers.write().await;
        let customer = customers.get_mut(id).ok_or(StoreError::NotFound)?;
        customer.name = changes.name.clone();
        customer.address = changes.address.clone();
        customer.city = changes.city.clone();
        customer.postal_code = changes.postal_code.clone();
        customer.country_code = changes.country_code.clone();
        customer.updated_at = now;
        Ok(customer.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.customers
            .write()
            .await
            .remove(id)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }
}

#[derive(Default)]
struct RestaurantTables {
    restaurants: HashMap<String, Restaurant>,
    staff: HashMap<String, Staff>,
}

#[derive(Default)]
pub struct MemoryRestaurantRepository {
    tables: RwLock<RestaurantTables>,
}

impl MemoryRestaurantRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn staff_count(&self) -> usize {
        self.tables.read().await.staff.len()
    }
}

#[async_trait]
impl RestaurantRepository for MemoryRestaurantRepository {
    async fn insert_restaurant(&self, restaurant: &Restaurant) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if tables.restaurants.values().any(|r| r.vat_code == restaurant.vat_code) {
            return Err(StoreError::Duplicate);
        }
        tables.restaurants.insert(restaurant.id.clone(), restaurant.clone());
        Ok(())
    }

    async fn insert_staff(&self, staff: &Staff) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if !tables.restaurants.contains_key(&staff.restaurant_id) {
            return Err(StoreError::NotFound);
        }
        if tables.staff.values().any(|s| s.email == staff.email) {
            return Err(StoreError::Duplicate);
        }
        tables.staff.insert(staff.id.clone(), staff.clone());
        Ok(())
    }

    async fn find_restaurant(&self, id: &str) -> Result<Restaurant, StoreError> {
        self.tables
            .read()
            .await
            .restaurants
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn find_staff_by_email(&self, restaurant_id: &str, email: &str) -> Result<Staff, StoreError> {
        self.tables
            .read()
            .await
            .staff
            .values()
            .find(|s| s.restaurant_id == restaurant_id && s.email == email)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete_restaurant(&self, id: &str) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        tables.restaurants.remove(id).ok_or(StoreError::NotFound)?;
        tables.staff.retain(|_, s| s.restaurant_id != id);
        Ok(())
    }
}
