use crate::error::AuthError;
use crate::extractor::{CredentialExtractor, JwtOptions};
use crate::request::RequestParts;
use crate::verifier::{CredentialVerifier, Principal};
use tracing::debug;

/// Ordered extractors in front of one verifier.
///
/// Extractors are tried in order; the first one that finds credentials wins
/// and its credentials are verified. Later extractors are not consulted, even
/// when verification fails.
#[derive(Debug, Clone)]
pub struct Authenticator<V> {
    extractors: Vec<CredentialExtractor>,
    options: JwtOptions,
    verifier: V,
}

impl<V: CredentialVerifier> Authenticator<V> {
    pub fn new(verifier: V) -> Self {
        Self {
            extractors: Vec::new(),
            options: JwtOptions::default(),
            verifier,
        }
    }

    pub fn with_extractor(mut self, extractor: CredentialExtractor) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn with_options(mut self, options: JwtOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &JwtOptions {
        &self.options
    }

    pub async fn authenticate(&self, parts: &RequestParts) -> Result<Principal, AuthError> {
        for extractor in &self.extractors {
            match extractor.extract(parts, &self.options) {
                Ok(credentials) => {
                    let principal = self.verifier.verify(&credentials).await?;
                    debug!("Authenticated {} via {:?}", principal.subject, extractor);
                    return Ok(principal);
                }
                Err(AuthError::MissingCredentials) => continue,
                Err(e) => return Err(e),
            }
        }
        Err(AuthError::MissingCredentials)
    }
}
