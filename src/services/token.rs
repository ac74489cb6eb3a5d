use std::sync::Arc;

use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    models::auth::{Claims, UserKind},
    services::{clock::Clock, secret::SecretProvider},
};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Any verification failure, expiry included.
    #[error("invalid token")]
    InvalidToken,
    #[error("access token lifetime out of range: {0}s")]
    InvalidExpiration(i64),
    #[error("failed to sign access token")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

/// Mints and verifies HS256 access tokens. Holds no mutable state.
pub struct AccessTokenService {
    secrets: Arc<dyn SecretProvider>,
    clock: Arc<dyn Clock>,
}

impl AccessTokenService {
    pub fn new(secrets: Arc<dyn SecretProvider>, clock: Arc<dyn Clock>) -> Self {
        Self { secrets, clock }
    }

    pub fn generate_token(
        &self,
        user_id: &str,
        kind: &UserKind,
        expiration_seconds: i64,
    ) -> Result<String, TokenError> {
        if expiration_seconds <= 0 {
            return Err(TokenError::InvalidExpiration(expiration_seconds));
        }
        let now = self.clock.now().timestamp();
        let exp = now
            .checked_add(expiration_seconds)
            .ok_or(TokenError::InvalidExpiration(expiration_seconds))?;
        let claims = Claims {
            sub: user_id.to_string(),
            role: kind.role(),
            tenant: kind.tenant().to_string(),
            exp,
            iat: now,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secrets.current()),
        )
        .map_err(TokenError::Signing)
    }

    /// Verifies signature, algorithm, claim shape and expiry (`exp > now`).
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.get_claims(token)?;
        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::InvalidToken);
        }
        Ok(claims)
    }

    /// Same checks as [`validate_access_token`](Self::validate_access_token) except expiry.
    pub fn get_claims(&self, token: &str) -> Result<Claims, TokenError> {
        // Expiry is checked against the injected clock, not by jsonwebtoken.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let current = self.secrets.current();
        let keys = std::iter::once(current).chain(self.secrets.previous());
        for key in keys {
            match decode::<Claims>(token, &DecodingKey::from_secret(key), &validation) {
                Ok(data) => return well_formed(data.claims),
                Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature) => continue,
                Err(e) => {
                    tracing::debug!(error = %e, "rejected access token");
                    return Err(TokenError::InvalidToken);
                }
            }
        }
        tracing::debug!("access token signature did not match any known secret");
        Err(TokenError::InvalidToken)
    }
}

fn well_formed(claims: Claims) -> Result<Claims, TokenError> {
    if claims.sub.is_empty() || claims.kind().is_none() || claims.exp <= claims.iat {
        return Err(TokenError::InvalidToken);
    }
    Ok(claims)
}
