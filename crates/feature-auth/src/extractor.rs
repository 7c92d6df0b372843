//! Pulling credentials out of a request.

use crate::error::AuthError;
use crate::request::RequestParts;
use tracing::debug;

/// Query parameter read by [`CredentialExtractor::QueryParamToken`] by default.
pub const DEFAULT_TOKEN_PARAM: &str = "access_token";

/// Verification options that travel with extracted credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JwtOptions {
    /// Accepted audiences. Empty disables the audience check.
    pub audience: Vec<String>,
    pub issuer: Option<String>,
    pub ignore_expiration: bool,
}

impl JwtOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn with_ignore_expiration(mut self, ignore: bool) -> Self {
        self.ignore_expiration = ignore;
        self
    }
}

/// A raw token plus the options it must be verified with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub options: JwtOptions,
}

/// Where a token is looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialExtractor {
    /// `Authorization: Bearer <token>`.
    HeaderBearer,
    /// First value of the query parameter `name`.
    QueryParamToken { name: String },
}

impl CredentialExtractor {
    pub fn query_param() -> Self {
        Self::QueryParamToken {
            name: DEFAULT_TOKEN_PARAM.to_string(),
        }
    }

    /// Extract credentials from `parts`.
    ///
    /// Returns [`AuthError::MissingCredentials`] when this extractor finds
    /// nothing to work with, so callers can fall through to the next one.
    pub fn extract(
        &self,
        parts: &RequestParts,
        options: &JwtOptions,
    ) -> Result<Credentials, AuthError> {
        let token = match self {
            Self::HeaderBearer => {
                let header = parts
                    .header("authorization")
                    .ok_or(AuthError::MissingCredentials)?;
                let (scheme, rest) = header.split_once(' ').unwrap_or((header, ""));
                if !scheme.eq_ignore_ascii_case("bearer") {
                    debug!("Ignoring authorization header with scheme {}", scheme);
                    return Err(AuthError::MissingCredentials);
                }
                let token = rest.trim();
                if token.is_empty() {
                    return Err(AuthError::MalformedCredentials(
                        "empty bearer token".to_string(),
                    ));
                }
                token
            }
            Self::QueryParamToken { name } => parts
                .query_param(name)
                .filter(|t| !t.is_empty())
                .ok_or(AuthError::MissingCredentials)?,
        };

        Ok(Credentials {
            token: token.to_string(),
            options: options.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_bearer() {
        let parts = RequestParts::new().with_header("authorization", "Bearer abc.def.ghi");
        let creds = CredentialExtractor::HeaderBearer
            .extract(&parts, &JwtOptions::new())
            .unwrap();
        assert_eq!(creds.token, "abc.def.ghi");
    }

    #[test]
    fn test_header_other_scheme_is_missing() {
        let parts = RequestParts::new().with_header("Authorization", "Basic dXNlcjpwYXNz");
        let err = CredentialExtractor::HeaderBearer
            .extract(&parts, &JwtOptions::new())
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingCredentials));
    }

    #[test]
    fn test_header_empty_bearer_is_malformed() {
        let parts = RequestParts::new().with_header("Authorization", "Bearer   ");
        let err = CredentialExtractor::HeaderBearer
            .extract(&parts, &JwtOptions::new())
            .unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[test]
    fn test_query_param_carries_options() {
        let options = JwtOptions::new()
            .with_audience(["hub"])
            .with_issuer("issuer")
            .with_ignore_expiration(true);
        let parts = RequestParts::new().with_query_string("access_token=t1&access_token=t2");

        let creds = CredentialExtractor::query_param()
            .extract(&parts, &options)
            .unwrap();
        assert_eq!(creds.token, "t1");
        assert_eq!(creds.options, options);
    }

    #[test]
    fn test_query_param_missing() {
        let err = CredentialExtractor::query_param()
            .extract(&RequestParts::new(), &JwtOptions::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing auth credentials.");
        assert_eq!(err.status_code(), 401);
    }
}
