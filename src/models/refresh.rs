use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::auth::Role;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RefreshStatus {
    Active,
    Revoked,
}

impl RefreshStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RefreshStatus::Active => "active",
            RefreshStatus::Revoked => "revoked",
        }
    }
}

impl std::str::FromStr for RefreshStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RefreshStatus::Active),
            "revoked" => Ok(RefreshStatus::Revoked),
            _ => Err(anyhow::anyhow!("Unknown refresh token status: {s}")),
        }
    }
}

/// Caller details read off the inbound request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientInfo {
    pub ip: String,
    pub user_agent: String,
}

impl ClientInfo {
    /// Stable fingerprint of the user agent and address pair.
    pub fn device_id(&self) -> String {
        let digest = Sha256::digest(format!("{}|{}", self.user_agent, self.ip).as_bytes());
        hex::encode(digest)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub device_id: String,
    pub user_agent: String,
    pub ip: String,
    pub first_used_at: DateTime<Utc>,
    pub last_used_at: DateTime<Utc>,
}

impl DeviceInfo {
    pub fn first_seen(client: &ClientInfo, now: DateTime<Utc>) -> Self {
        Self {
            device_id: client.device_id(),
            user_agent: client.user_agent.clone(),
            ip: client.ip.clone(),
            first_used_at: now,
            last_used_at: now,
        }
    }
}

/// A refresh record as handed to the store; id and timestamps are assigned on insert.
#[derive(Debug, Clone)]
pub struct NewRefreshRecord {
    pub user_id: String,
    pub role: Role,
    pub tenant_id: String,
    pub token: String,
    pub device_info: DeviceInfo,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshRecord {
    pub id: String,
    pub user_id: String,
    pub role: Role,
    pub tenant_id: String,
    pub token: String,
    pub status: RefreshStatus,
    pub device_info: DeviceInfo,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RefreshRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.status == RefreshStatus::Active && self.expires_at > now
    }
}
