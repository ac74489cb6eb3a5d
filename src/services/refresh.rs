use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};

use crate::{
    db::{refresh::RefreshStore, StoreError},
    models::{
        auth::UserKind,
        refresh::{ClientInfo, DeviceInfo, NewRefreshRecord, RefreshRecord},
    },
    services::clock::Clock,
};

/// Bytes of OS randomness behind every refresh token.
pub const REFRESH_TOKEN_BYTES: usize = 32;
pub const DEFAULT_TOKEN_EXPIRATION_DAYS: i64 = 7;
const MAX_INSERT_ATTEMPTS: u32 = 3;

#[derive(Debug, thiserror::Error)]
pub enum RefreshError {
    /// Missing, revoked and expired records are indistinguishable to callers.
    #[error("refresh token not found")]
    NotFound,
    #[error("refresh token already exists")]
    AlreadyExists,
    #[error("failed to read OS randomness")]
    Entropy(#[from] rand::Error),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for RefreshError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => RefreshError::NotFound,
            StoreError::Duplicate => RefreshError::AlreadyExists,
            other => RefreshError::Store(other),
        }
    }
}

/// Issues opaque refresh tokens and manages the lifecycle of their records.
pub struct RefreshTokenService {
    store: Arc<dyn RefreshStore>,
    clock: Arc<dyn Clock>,
    lifetime: Duration,
}

impl RefreshTokenService {
    pub fn new(store: Arc<dyn RefreshStore>, clock: Arc<dyn Clock>, lifetime: Duration) -> Self {
        Self { store, clock, lifetime }
    }

    /// Persists a new active record and returns its token.
    ///
    /// A token collision is retried with fresh randomness a bounded number of times.
    pub async fn generate(
        &self,
        user_id: &str,
        kind: &UserKind,
        client: &ClientInfo,
    ) -> Result<String, RefreshError> {
        let mut attempt = 1;
        loop {
            let token = new_token_value()?;
            let now = self.clock.now();
            let record = NewRefreshRecord {
                user_id: user_id.to_string(),
                role: kind.role(),
                tenant_id: kind.tenant().to_string(),
                token: token.clone(),
                device_info: DeviceInfo::first_seen(client, now),
                expires_at: now + self.lifetime,
            };

            match self.store.insert(record, now).await {
                Ok(_) => return Ok(token),
                Err(StoreError::Duplicate) if attempt < MAX_INSERT_ATTEMPTS => {
                    tracing::warn!(attempt, "refresh token collision, regenerating");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn find_active_token(&self, token: &str) -> Result<RefreshRecord, RefreshError> {
        Ok(self.store.find_usable(token, self.clock.now()).await?)
    }

    pub async fn expire(&self, token: &str, new_expires_at: DateTime<Utc>) -> Result<(), RefreshError> {
        Ok(self.store.expire_usable(token, new_expires_at, self.clock.now()).await?)
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.store.ping().await
    }
}

fn new_token_value() -> Result<String, rand::Error> {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::{
        db::memory::MemoryRefreshStore,
        models::{auth::Role, refresh::RefreshStatus},
        services::clock::ManualClock,
    };

    const USER: &str = "64b7f0c2a1b2c3d4e5f60718";

    fn client() -> ClientInfo {
        ClientInfo {
            ip: "203.0.113.7".into(),
            user_agent: "okhttp/4.12".into(),
        }
    }

    fn service() -> (RefreshTokenService, Arc<MemoryRefreshStore>, Arc<ManualClock>) {
        let store = Arc::new(MemoryRefreshStore::new());
        let clock = Arc::new(ManualClock::default());
        let svc = RefreshTokenService::new(
            store.clone(),
            clock.clone(),
            Duration::days(DEFAULT_TOKEN_EXPIRATION_DAYS),
        );
        (svc, store, clock)
    }

    #[tokio::test]
    async fn generated_tokens_are_url_safe_and_persisted() {
        let (svc, store, clock) = service();
        let kind = UserKind::Staff { tenant: "64b7f0c2a1b2c3d4e5f60799".into() };
        let token = svc.generate(USER, &kind, &client()).await.unwrap();

        // 32 bytes -> 43 base64 characters without padding
        assert_eq!(token.len(), 43);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let record = store.get(&token).await.unwrap();
        let now = clock.now();
        assert_eq!(record.user_id, USER);
        assert_eq!(record.role, Role::Staff);
        assert_eq!(record.tenant_id, "64b7f0c2a1b2c3d4e5f60799");
        assert_eq!(record.status, RefreshStatus::Active);
        assert_eq!(record.expires_at, now + Duration::days(7));
        assert_eq!(record.device_info.device_id, client().device_id());
        assert_eq!(record.device_info.first_used_at, now);
        assert_eq!(record.device_info.last_used_at, now);
    }

    #[tokio::test]
    async fn tokens_differ_between_calls() {
        let (svc, store, _) = service();
        let a = svc.generate(USER, &UserKind::Customer, &client()).await.unwrap();
        let b = svc.generate(USER, &UserKind::Customer, &client()).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn find_active_reports_expired_records_as_not_found() {
        let (svc, _, clock) = service();
        let token = svc.generate(USER, &UserKind::Customer, &client()).await.unwrap();
        assert!(svc.find_active_token(&token).await.is_ok());

        clock.advance(Duration::days(7));
        assert!(matches!(svc.find_active_token(&token).await, Err(RefreshError::NotFound)));
    }

    #[tokio::test]
    async fn expire_shortens_the_record_lifetime() {
        let (svc, _, clock) = service();
        let token = svc.generate(USER, &UserKind::Customer, &client()).await.unwrap();

        svc.expire(&token, clock.now() + Duration::seconds(3)).await.unwrap();
        clock.advance(Duration::seconds(3));
        assert!(matches!(svc.find_active_token(&token).await, Err(RefreshError::NotFound)));
        assert!(matches!(
            svc.expire(&token, clock.now()).await,
            Err(RefreshError::NotFound)
        ));
    }

    /// Reports a duplicate for the first `collisions` inserts.
    struct CollidingStore {
        inner: MemoryRefreshStore,
        collisions: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl RefreshStore for CollidingStore {
        async fn insert(&self, record: NewRefreshRecord, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) < self.collisions {
                return Err(StoreError::Duplicate);
            }
            self.inner.insert(record, now).await
        }

        async fn find_usable(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
            self.inner.find_usable(token, now).await
        }

        async fn expire_usable(&self, token: &str, at: DateTime<Utc>, now: DateTime<Utc>) -> Result<(), StoreError> {
            self.inner.expire_usable(token, at, now).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn colliding(collisions: u32) -> (RefreshTokenService, Arc<CollidingStore>) {
        let store = Arc::new(CollidingStore {
            inner: MemoryRefreshStore::new(),
            collisions,
            calls: AtomicU32::new(0),
        });
        let svc = RefreshTokenService::new(store.clone(), Arc::new(ManualClock::default()), Duration::days(7));
        (svc, store)
    }

    #[tokio::test]
    async fn collisions_are_retried_with_a_new_token() {
        let (svc, store) = colliding(2);
        let token = svc.generate(USER, &UserKind::Customer, &client()).await.unwrap();
        assert_eq!(store.calls.load(Ordering::SeqCst), 3);
        assert!(store.inner.get(&token).await.is_some());
    }

    #[tokio::test]
    async fn collision_retries_are_bounded() {
        let (svc, store) = colliding(u32::MAX);
        let result = svc.generate(USER, &UserKind::Customer, &client()).await;
        assert!(matches!(result, Err(RefreshError::AlreadyExists)));
        assert_eq!(store.calls.load(Ordering::SeqCst), MAX_INSERT_ATTEMPTS);
    }
}
