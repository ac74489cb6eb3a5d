use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};

use super::{new_object_id, StoreError};
use crate::models::refresh::{DeviceInfo, NewRefreshRecord, RefreshRecord, RefreshStatus};

/// Persistence of refresh records.
///
/// Usability (`status = active AND expires_at > now`) is always evaluated by the
/// store itself against the caller's `now`.
#[async_trait]
pub trait RefreshStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the token value is taken.
    async fn insert(&self, record: NewRefreshRecord, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError>;

    async fn find_usable(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError>;

    /// Moves `expires_at` of a usable record to `new_expires_at`.
    ///
    /// Only ever shortens a lifetime: a record already expiring at or before
    /// `new_expires_at` is left alone and reported as [`StoreError::NotFound`].
    async fn expire_usable(
        &self,
        token: &str,
        new_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

#[derive(Debug, FromRow)]
struct RefreshTokenRow {
    id: String,
    user_id: String,
    role: String,
    tenant_id: String,
    token: String,
    status: String,
    device_id: String,
    user_agent: String,
    ip: String,
    first_used_at: DateTime<Utc>,
    last_used_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<RefreshTokenRow> for RefreshRecord {
    type Error = StoreError;

    fn try_from(row: RefreshTokenRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            role: row.role.parse().map_err(|e| StoreError::Corrupt(format!("{e}")))?,
            tenant_id: row.tenant_id,
            token: row.token,
            status: row.status.parse().map_err(|e| StoreError::Corrupt(format!("{e}")))?,
            device_info: DeviceInfo {
                device_id: row.device_id,
                user_agent: row.user_agent,
                ip: row.ip,
                first_used_at: row.first_used_at,
                last_used_at: row.last_used_at,
            },
            expires_at: row.expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Builds the full record an insert persists.
pub(crate) fn materialize(record: NewRefreshRecord, now: DateTime<Utc>) -> RefreshRecord {
    RefreshRecord {
        id: new_object_id(now),
        user_id: record.user_id,
        role: record.role,
        tenant_id: record.tenant_id,
        token: record.token,
        status: RefreshStatus::Active,
        device_info: record.device_info,
        expires_at: record.expires_at,
        created_at: now,
        updated_at: now,
    }
}

pub struct PgRefreshStore {
    pool: PgPool,
}

impl PgRefreshStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshStore for PgRefreshStore {
    async fn insert(&self, record: NewRefreshRecord, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
        let record = materialize(record, now);
        sqlx::query(
            "INSERT INTO refresh_tokens
                (id, user_id, role, tenant_id, token, status,
                 device_id, user_agent, ip, first_used_at, last_used_at,
                 expires_at, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(&record.id)
        .bind(&record.user_id)
        .bind(record.role.as_str())
        .bind(&record.tenant_id)
        .bind(&record.token)
        .bind(record.status.as_str())
        .bind(&record.device_info.device_id)
        .bind(&record.device_info.user_agent)
        .bind(&record.device_info.ip)
        .bind(record.device_info.first_used_at)
        .bind(record.device_info.last_used_at)
        .bind(record.expires_at)
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(StoreError::from_insert)?;

        Ok(record)
    }

    async fn find_usable(&self, token: &str, now: DateTime<Utc>) -> Result<RefreshRecord, StoreError> {
        let row = sqlx::query_as::<_, RefreshTokenRow>(
            "SELECT id, user_id, role, tenant_id, token, status,
                    device_id, user_agent, ip, first_used_at, last_used_at,
                    expires_at, created_at, updated_at
             FROM refresh_tokens
             WHERE token = $1 AND status = 'active' AND expires_at > $2",
        )
        .bind(token)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn expire_usable(
        &self,
        token: &str,
        new_expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens
             SET expires_at = $2, updated_at = $3
             WHERE token = $1 AND status = 'active' AND expires_at > $3 AND expires_at > $2",
        )
        .bind(token)
        .bind(new_expires_at)
        .bind(now)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
