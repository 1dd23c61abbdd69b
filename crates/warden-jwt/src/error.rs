//! Error types for the token engine.

use thiserror::Error;

/// Errors produced while constructing, issuing, or verifying tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// Required key material is absent, empty, or bound to the wrong algorithm family.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// Requested time-to-live does not place `exp` after the issuance instant.
    #[error("token expiration invalid: ttl of {ttl_ms}ms does not yield a future expiry")]
    ExpirationInvalid { ttl_ms: i64 },

    /// The random source for `jti` failed.
    #[error("failed to generate token id: {0}")]
    IdGenerationFailed(String),

    /// Issuance failed; the cause is available through `source()` and [`TokenError::cause`].
    #[error("token issuance failed: {source}")]
    IssuanceFailed {
        #[source]
        source: Box<TokenError>,
    },

    /// The signing primitive or payload encoding failed.
    #[error("signing failed: {0}")]
    Signing(String),

    /// Structural problem: segment count, base64url, or JSON.
    #[error("token is malformed: {0}")]
    Malformed(String),

    /// Algorithm mismatch or bad signature. The token is untrusted.
    #[error("token verification failed: {0}")]
    VerificationFailed(String),

    /// Signature is valid but the token is expired or not yet valid.
    #[error("token has invalid claims: {0}")]
    ClaimsInvalid(String),

    /// Engine option outside its allowed range.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl TokenError {
    pub(crate) fn issuance(cause: TokenError) -> Self {
        match cause {
            already @ TokenError::IssuanceFailed { .. } => already,
            other => TokenError::IssuanceFailed {
                source: Box::new(other),
            },
        }
    }

    /// The innermost error, looking through [`TokenError::IssuanceFailed`].
    pub fn cause(&self) -> &TokenError {
        match self {
            TokenError::IssuanceFailed { source } => source.cause(),
            other => other,
        }
    }

    /// Whether retrying the same input can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self.cause(), TokenError::IdGenerationFailed(_))
    }
}

/// Errors from reading or generating key material.
///
/// Kept apart from [`TokenError`]: a bad PEM file is an operator problem, not a
/// verdict on a token.
#[derive(Debug, Error)]
pub enum KeyError {
    /// Bad armor, base64, or DER structure.
    #[error("invalid key format: {0}")]
    FormatInvalid(String),

    /// Well-formed key of a type other than RSA.
    #[error("key type mismatch: {0}")]
    TypeMismatch(String),

    /// Key generation failed.
    #[error("failed to generate key: {0}")]
    GenerationFailed(String),

    /// IO error (reading/writing keys).
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn issuance_wraps_cause_once() {
        let err = TokenError::issuance(TokenError::ExpirationInvalid { ttl_ms: -1000 });
        let err = TokenError::issuance(err);

        assert!(matches!(err, TokenError::IssuanceFailed { .. }));
        assert!(matches!(err.cause(), TokenError::ExpirationInvalid { ttl_ms: -1000 }));
        assert!(err.source().is_some());
    }

    #[test]
    fn only_id_generation_is_retryable() {
        let err = TokenError::issuance(TokenError::IdGenerationFailed("rng".into()));
        assert!(err.is_retryable());
        assert!(!TokenError::VerificationFailed("sig".into()).is_retryable());
        assert!(!TokenError::Malformed("segments".into()).is_retryable());
    }
}
