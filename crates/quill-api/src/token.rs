use chrono::{DateTime, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};

use quill_types::api::Claims;

use crate::error::ApiError;

/// Caller identity recovered from a valid token. Handlers receive it as a
/// request extension set by [`crate::middleware::require_auth`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub login: String,
}

/// Issues and validates HS256 identity tokens.
///
/// Built once at startup from the configured secret and never mutated.
/// Tokens are stateless: nothing is stored server-side and there is no
/// revocation, a token stays valid until `exp`.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl TokenService {
    pub fn new(secret: &str, ttl: TimeDelta) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat", "sub"]);

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn issue(&self, login: &str) -> Result<String, ApiError> {
        self.issue_at(login, Utc::now())
    }

    fn issue_at(&self, login: &str, now: DateTime<Utc>) -> Result<String, ApiError> {
        let claims = Claims {
            sub: login.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding).map_err(ApiError::internal)
    }

    pub fn validate(&self, token: &str) -> Result<Identity, ApiError> {
        let data = decode::<Claims>(token, &self.decoding, &self.validation)
            .map_err(|_| ApiError::Unauthenticated)?;

        Ok(Identity {
            login: data.claims.sub,
        })
    }
}
