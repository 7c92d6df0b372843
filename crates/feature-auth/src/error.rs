use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing auth credentials.")]
    MissingCredentials,

    #[error("Malformed credentials: {0}")]
    MalformedCredentials(String),

    #[error("Token has expired")]
    TokenExpired,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Missing claim: {0}")]
    MissingClaim(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

impl AuthError {
    /// HTTP status a front end should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            AuthError::MalformedCredentials(_) => 400,
            _ => 401,
        }
    }
}
