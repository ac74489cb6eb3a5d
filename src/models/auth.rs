use serde::{Deserialize, Serialize};

/// Kinds of principals a credential can attest to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Customer,
    Staff,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "customer",
            Role::Staff => "staff",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Role::Customer),
            "staff" => Ok(Role::Staff),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// A principal's kind together with the data only that kind carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserKind {
    Customer,
    Staff { tenant: String },
}

impl UserKind {
    pub fn role(&self) -> Role {
        match self {
            UserKind::Customer => Role::Customer,
            UserKind::Staff { .. } => Role::Staff,
        }
    }

    /// Owning restaurant id, empty for customers.
    pub fn tenant(&self) -> &str {
        match self {
            UserKind::Customer => "",
            UserKind::Staff { tenant } => tenant,
        }
    }

    /// Rebuilds a kind from its persisted `(role, tenant)` projection.
    /// Returns `None` when the pair breaks the staff/tenant invariant.
    pub fn from_parts(role: Role, tenant: &str) -> Option<Self> {
        match (role, tenant.is_empty()) {
            (Role::Customer, true) => Some(UserKind::Customer),
            (Role::Staff, false) => Some(UserKind::Staff { tenant: tenant.to_string() }),
            _ => None,
        }
    }
}

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    #[serde(default)]
    pub tenant: String, // restaurant id for staff, "" otherwise
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn kind(&self) -> Option<UserKind> {
        UserKind::from_parts(self.role, &self.tenant)
    }
}

/// Subject attached to a request once the auth gate let it through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
    pub role: Role,
    pub tenant: String,
}

impl From<Claims> for AuthenticatedUser {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
            tenant: claims.tenant,
        }
    }
}

pub const TOKEN_TYPE_BEARER: &str = "Bearer";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_in: i64,
    pub token_type: String,
}
