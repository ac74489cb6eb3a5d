use std::sync::Arc;

use crate::{
    db::{customers::CustomerRepository, new_object_id, StoreError},
    models::{
        auth::UserKind,
        customer::{Customer, CustomerChanges, RegisterCustomerRequest},
    },
    services::{
        clock::Clock,
        identity::{normalize_email, Identity, IdentityError},
        password::PasswordHasher,
    },
};

pub struct CustomerService {
    repo: Arc<dyn CustomerRepository>,
    hasher: PasswordHasher,
    clock: Arc<dyn Clock>,
}

impl CustomerService {
    pub fn new(repo: Arc<dyn CustomerRepository>, hasher: PasswordHasher, clock: Arc<dyn Clock>) -> Self {
        Self { repo, hasher, clock }
    }

    pub async fn register(&self, body: RegisterCustomerRequest) -> Result<Customer, IdentityError> {
        let now = self.clock.now();
        let customer = Customer {
            id: new_object_id(now),
            email: normalize_email(&body.email),
            password_hash: self.hasher.hash(&body.password)?,
            name: body.name.trim().to_string(),
            address: body.address.address.trim().to_string(),
            city: body.address.city.trim().to_string(),
            postal_code: body.address.postal_code.trim().to_string(),
            country_code: body.address.country_code.trim().to_uppercase(),
            created_at: now,
            updated_at: now,
        };

        self.repo.insert(&customer).await.map_err(|e| match e {
            StoreError::Duplicate => IdentityError::CustomerAlreadyExists,
            other => IdentityError::Store(other),
        })?;

        tracing::info!(customer_id = %customer.id, "customer registered");
        Ok(customer)
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let customer = self.repo.find_by_email(&normalize_email(email)).await.map_err(|e| match e {
            StoreError::NotFound => IdentityError::InvalidCredentials,
            other => IdentityError::Store(other),
        })?;

        if !self.hasher.verify(password, &customer.password_hash) {
            return Err(IdentityError::InvalidCredentials);
        }
        Ok(Identity { user_id: customer.id, kind: UserKind::Customer })
    }

    pub async fn get(&self, id: &str) -> Result<Customer, IdentityError> {
        self.repo.find_by_id(id).await.map_err(not_found)
    }

    pub async fn update(&self, id: &str, changes: &CustomerChanges) -> Result<Customer, IdentityError> {
        self.repo.update(id, changes, self.clock.now()).await.map_err(not_found)
    }

    /// Removes a customer outright. Only used to undo a half-finished registration.
    pub async fn purge(&self, id: &str) -> Result<(), IdentityError> {
        self.repo.delete(id).await.map_err(not_found)
    }
}

fn not_found(err: StoreError) -> IdentityError {
    match err {
        StoreError::NotFound => IdentityError::CustomerNotFound,
        other => IdentityError::Store(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::memory::MemoryCustomerRepository,
        models::customer::AddressFields,
        services::clock::ManualClock,
    };

    fn service() -> CustomerService {
        CustomerService::new(
            Arc::new(MemoryCustomerRepository::new()),
            PasswordHasher::new(4),
            Arc::new(ManualClock::default()),
        )
    }

    fn registration(email: &str) -> RegisterCustomerRequest {
        RegisterCustomerRequest {
            email: email.into(),
            password: "password123".into(),
            name: "Ada Lovelace".into(),
            address: AddressFields {
                address: "12 St James's Square".into(),
                city: "London".into(),
                postal_code: "SW1Y 4JH".into(),
                country_code: "gb".into(),
            },
        }
    }

    #[tokio::test]
    async fn register_hashes_the_password_and_normalizes_fields() {
        let svc = service();
        let customer = svc.register(registration(" Ada@Example.com ")).await.unwrap();

        assert_eq!(customer.email, "ada@example.com");
        assert_eq!(customer.country_code, "GB");
        assert_ne!(customer.password_hash, "password123");
        assert_eq!(svc.get(&customer.id).await.unwrap(), customer);
    }

    #[tokio::test]
    async fn duplicate_email_is_a_conflict() {
        let svc = service();
        svc.register(registration("ada@example.com")).await.unwrap();
        let again = svc.register(registration("ADA@example.com")).await;
        assert!(matches!(again, Err(IdentityError::CustomerAlreadyExists)));
    }

    #[tokio::test]
    async fn unknown_email_and_wrong_password_fail_identically() {
        let svc = service();
        let customer = svc.register(registration("ada@example.com")).await.unwrap();

        let ok = svc.authenticate("ada@example.com", "password123").await.unwrap();
        assert_eq!(ok, Identity { user_id: customer.id, kind: UserKind::Customer });

        assert!(matches!(
            svc.authenticate("ada@example.com", "wrong-password").await,
            Err(IdentityError::InvalidCredentials)
        ));
        assert!(matches!(
            svc.authenticate("bob@example.com", "password123").await,
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn update_and_purge() {
        let svc = service();
        let customer = svc.register(registration("ada@example.com")).await.unwrap();
        let changes = CustomerChanges {
            name: "Ada King".into(),
            address: "Ockham Park".into(),
            city: "Ockham".into(),
            postal_code: "GU23 6NT".into(),
            country_code: "GB".into(),
        };

        let updated = svc.update(&customer.id, &changes).await.unwrap();
        assert_eq!(updated.name, "Ada King");
        assert_eq!(updated.email, customer.email);

        svc.purge(&customer.id).await.unwrap();
        assert!(matches!(svc.get(&customer.id).await, Err(IdentityError::CustomerNotFound)));
        assert!(matches!(svc.update(&customer.id, &changes).await, Err(IdentityError::CustomerNotFound)));
    }
}
