//! Token issuance: unsigned, shared-secret (HMAC), and RSA issuers.

use crate::algorithm::{Algorithm, AlgorithmFamily};
use crate::claims::{Claims, ClaimsBuilder, ClaimsRequest};
use crate::clock::Clock;
use crate::codec::{Header, assemble, signing_input};
use crate::error::TokenError;
use crate::id::IdGenerator;
use crate::keys::{SymmetricKey, check_private_key};
use crate::sign::{RsaSigner, hmac_sign};
use chrono::{DateTime, Duration, Utc};
use rsa::RsaPrivateKey;
use serde_json::{Map, Value};

/// Something that turns a claims request into an encoded token.
pub trait TokenIssuer: Send + Sync {
    /// The algorithm written to every issued header.
    fn algorithm(&self) -> Algorithm;

    /// Build, sign, and encode a token.
    ///
    /// Any failure is reported as [`TokenError::IssuanceFailed`]; use
    /// [`TokenError::cause`] to match on the underlying error.
    fn issue(&self, request: &ClaimsRequest) -> Result<String, TokenError>;

    /// Positional form of [`TokenIssuer::issue`].
    fn issue_token(
        &self,
        subject: &str,
        audience: &[String],
        custom: Map<String, Value>,
        ttl: Option<Duration>,
        not_before: Option<DateTime<Utc>>,
    ) -> Result<String, TokenError> {
        let request = ClaimsRequest {
            subject: subject.to_string(),
            audience: audience.to_vec(),
            custom,
            ttl,
            not_before,
        };
        self.issue(&request)
    }
}

/// Shared issuance pipeline; `sign` is the only per-variant step.
fn encode_token<F>(
    builder: &ClaimsBuilder,
    algorithm: Algorithm,
    request: &ClaimsRequest,
    sign: F,
) -> Result<String, TokenError>
where
    F: FnOnce(&[u8]) -> Result<Vec<u8>, TokenError>,
{
    let issue = || -> Result<(String, Claims), TokenError> {
        let claims = builder.build(request)?;
        let input = signing_input(&Header::new(algorithm), &claims)?;
        let signature = sign(input.as_bytes())?;
        Ok((assemble(&input, &signature), claims))
    };
    let (token, claims) = issue().map_err(TokenError::issuance)?;

    tracing::debug!(
        alg = %algorithm,
        jti = claims.jwt_id().unwrap_or_default(),
        sub = claims.subject().unwrap_or_default(),
        "Token issued"
    );
    Ok(token)
}

/// Issues unsigned (`alg: none`) tokens.
///
/// Only for same-process hand-off where no trust boundary is crossed.
#[derive(Debug, Clone)]
pub struct UnsignedIssuer {
    claims: ClaimsBuilder,
}

impl UnsignedIssuer {
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            claims: ClaimsBuilder::new(issuer),
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.claims = self.claims.with_clock(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.claims = self.claims.with_id_generator(ids);
        self
    }

    pub fn issuer(&self) -> &str {
        self.claims.issuer()
    }
}

impl TokenIssuer for UnsignedIssuer {
    fn algorithm(&self) -> Algorithm {
        Algorithm::None
    }

    fn issue(&self, request: &ClaimsRequest) -> Result<String, TokenError> {
        encode_token(&self.claims, Algorithm::None, request, |_| Ok(Vec::new()))
    }
}

/// Issues HMAC-signed tokens with a shared secret.
#[derive(Debug, Clone)]
pub struct SymmetricIssuer {
    claims: ClaimsBuilder,
    algorithm: Algorithm,
    key: SymmetricKey,
}

impl SymmetricIssuer {
    /// HS256 issuer. Fails with `InvalidKeyMaterial` if `secret` is empty.
    pub fn new(issuer: impl Into<String>, secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        Self::with_algorithm(issuer, secret, AlgorithmFamily::Hmac.default_algorithm())
    }

    /// Issuer bound to a specific HS* algorithm.
    pub fn with_algorithm(
        issuer: impl Into<String>,
        secret: impl Into<Vec<u8>>,
        algorithm: Algorithm,
    ) -> Result<Self, TokenError> {
        algorithm.require_family(AlgorithmFamily::Hmac)?;
        Ok(Self {
            claims: ClaimsBuilder::new(issuer),
            algorithm,
            key: SymmetricKey::new(secret)?,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.claims = self.claims.with_clock(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.claims = self.claims.with_id_generator(ids);
        self
    }

    pub fn issuer(&self) -> &str {
        self.claims.issuer()
    }
}

impl TokenIssuer for SymmetricIssuer {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn issue(&self, request: &ClaimsRequest) -> Result<String, TokenError> {
        encode_token(&self.claims, self.algorithm, request, |input| {
            hmac_sign(self.algorithm, self.key.as_bytes(), input)
        })
    }
}

/// Issues RSA (PKCS#1 v1.5) signed tokens.
#[derive(Debug, Clone)]
pub struct AsymmetricIssuer {
    claims: ClaimsBuilder,
    algorithm: Algorithm,
    signer: RsaSigner,
}

impl AsymmetricIssuer {
    /// RS256 issuer. Fails with `InvalidKeyMaterial` if the key is absent or
    /// smaller than 2048 bits.
    pub fn new(
        issuer: impl Into<String>,
        key: impl Into<Option<RsaPrivateKey>>,
    ) -> Result<Self, TokenError> {
        Self::with_algorithm(issuer, key, AlgorithmFamily::Rsa.default_algorithm())
    }

    pub fn with_algorithm(
        issuer: impl Into<String>,
        key: impl Into<Option<RsaPrivateKey>>,
        algorithm: Algorithm,
    ) -> Result<Self, TokenError> {
        algorithm.require_family(AlgorithmFamily::Rsa)?;
        let key = key.into().ok_or_else(|| {
            TokenError::InvalidKeyMaterial("RSA private key is required".to_string())
        })?;
        check_private_key(&key)?;

        Ok(Self {
            claims: ClaimsBuilder::new(issuer),
            algorithm,
            signer: RsaSigner::new(algorithm, key)?,
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.claims = self.claims.with_clock(clock);
        self
    }

    pub fn with_id_generator(mut self, ids: impl IdGenerator + 'static) -> Self {
        self.claims = self.claims.with_id_generator(ids);
        self
    }

    pub fn issuer(&self) -> &str {
        self.claims.issuer()
    }
}

impl TokenIssuer for AsymmetricIssuer {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn issue(&self, request: &ClaimsRequest) -> Result<String, TokenError> {
        encode_token(&self.claims, self.algorithm, request, |input| {
            self.signer.sign(input)
        })
    }
}

/// Any of the three issuers, chosen at runtime (e.g. from configuration).
#[derive(Debug, Clone)]
pub enum Issuer {
    Unsigned(UnsignedIssuer),
    Symmetric(SymmetricIssuer),
    Asymmetric(AsymmetricIssuer),
}

impl Issuer {
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        match self {
            Issuer::Unsigned(inner) => Issuer::Unsigned(inner.with_clock(clock)),
            Issuer::Symmetric(inner) => Issuer::Symmetric(inner.with_clock(clock)),
            Issuer::Asymmetric(inner) => Issuer::Asymmetric(inner.with_clock(clock)),
        }
    }

    pub fn issuer(&self) -> &str {
        match self {
            Issuer::Unsigned(inner) => inner.issuer(),
            Issuer::Symmetric(inner) => inner.issuer(),
            Issuer::Asymmetric(inner) => inner.issuer(),
        }
    }
}

impl TokenIssuer for Issuer {
    fn algorithm(&self) -> Algorithm {
        match self {
            Issuer::Unsigned(inner) => inner.algorithm(),
            Issuer::Symmetric(inner) => inner.algorithm(),
            Issuer::Asymmetric(inner) => inner.algorithm(),
        }
    }

    fn issue(&self, request: &ClaimsRequest) -> Result<String, TokenError> {
        match self {
            Issuer::Unsigned(inner) => inner.issue(request),
            Issuer::Symmetric(inner) => inner.issue(request),
            Issuer::Asymmetric(inner) => inner.issue(request),
        }
    }
}

impl From<UnsignedIssuer> for Issuer {
    fn from(inner: UnsignedIssuer) -> Self {
        Issuer::Unsigned(inner)
    }
}

impl From<SymmetricIssuer> for Issuer {
    fn from(inner: SymmetricIssuer) -> Self {
        Issuer::Symmetric(inner)
    }
}

impl From<AsymmetricIssuer> for Issuer {
    fn from(inner: AsymmetricIssuer) -> Self {
        Issuer::Asymmetric(inner)
    }
}
