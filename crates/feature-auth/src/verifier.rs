//! Turning credentials into a principal.

use crate::error::AuthError;
use crate::extractor::Credentials;
use async_trait::async_trait;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// An authenticated caller.
#[derive(Debug, Clone, PartialEq)]
pub struct Principal {
    pub subject: String,
    pub claims: Map<String, Value>,
}

impl Principal {
    pub fn claim(&self, name: &str) -> Option<&Value> {
        self.claims.get(name)
    }
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, credentials: &Credentials) -> Result<Principal, AuthError>;
}

/// HS256 JWT verification with a shared secret.
#[derive(Clone)]
pub struct JwtVerifier {
    key: DecodingKey,
}

impl std::fmt::Debug for JwtVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtVerifier").finish_non_exhaustive()
    }
}

impl JwtVerifier {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            key: DecodingKey::from_secret(secret),
        }
    }

    fn validation(credentials: &Credentials) -> Validation {
        let options = &credentials.options;
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_nbf = false;

        if options.ignore_expiration {
            validation.validate_exp = false;
            validation.required_spec_claims = HashSet::new();
        }
        if options.audience.is_empty() {
            validation.validate_aud = false;
        } else {
            validation.set_audience(&options.audience);
        }
        if let Some(issuer) = &options.issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        let validation = Self::validation(credentials);
        let data = decode::<Map<String, Value>>(&credentials.token, &self.key, &validation)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                ErrorKind::InvalidAudience => AuthError::InvalidAudience,
                ErrorKind::InvalidIssuer => AuthError::InvalidIssuer,
                ErrorKind::MissingRequiredClaim(claim) => AuthError::MissingClaim(claim.clone()),
                _ => AuthError::InvalidToken(e.to_string()),
            })?;

        let claims = data.claims;
        let subject = claims
            .get("sub")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AuthError::MissingClaim("sub".to_string()))?
            .to_string();

        Ok(Principal { subject, claims })
    }
}
