//! Authentication building blocks for the feature store.
//!
//! A request is seen through [`RequestParts`], a framework-free view of its
//! headers and query string. [`CredentialExtractor`]s pull a token out of it,
//! a [`CredentialVerifier`] turns the token into a [`Principal`], and an
//! [`Authenticator`] ties an ordered list of extractors to one verifier.

mod authenticator;
mod error;
mod extractor;
mod request;
mod verifier;

pub use authenticator::Authenticator;
pub use error::AuthError;
pub use extractor::{CredentialExtractor, Credentials, JwtOptions, DEFAULT_TOKEN_PARAM};
pub use request::RequestParts;
pub use verifier::{CredentialVerifier, JwtVerifier, Principal};
