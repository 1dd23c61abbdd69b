//! Token verification: unsigned, shared-secret (HMAC), and RSA verifiers.
//!
//! Every verifier is pinned to one algorithm at construction. The `alg` a token
//! declares is compared against that binding and never used to pick a key.

use crate::algorithm::{Algorithm, AlgorithmFamily};
use crate::claims::{Claims, EXPIRATION, NOT_BEFORE};
use crate::clock::{Clock, SystemClock};
use crate::codec::RawToken;
use crate::error::TokenError;
use crate::keys::{SymmetricKey, check_public_key};
use crate::sign::{RsaVerifier, hmac_verify};
use chrono::Duration;
use rsa::RsaPublicKey;
use std::fmt;
use std::sync::Arc;

/// Largest clock-skew allowance a verifier accepts.
pub const MAX_LEEWAY: Duration = Duration::minutes(5);

/// Something that turns an encoded token into trusted claims.
pub trait TokenVerifier: Send + Sync {
    /// The only algorithm this verifier accepts.
    fn algorithm(&self) -> Algorithm;

    /// Verify `token` and return its claims.
    fn verify(&self, token: &str) -> Result<Claims, TokenError>;
}

/// Time-validation settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationOptions {
    leeway: Duration,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            leeway: Duration::zero(),
        }
    }
}

impl ValidationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow `leeway` of clock skew on `exp` and `nbf`.
    ///
    /// Must be between zero and [`MAX_LEEWAY`]; otherwise `InvalidConfiguration`.
    pub fn with_leeway(mut self, leeway: Duration) -> Result<Self, TokenError> {
        if leeway < Duration::zero() || leeway > MAX_LEEWAY {
            return Err(TokenError::InvalidConfiguration(format!(
                "leeway must be between 0s and {}s, got {}s",
                MAX_LEEWAY.num_seconds(),
                leeway.num_seconds()
            )));
        }
        self.leeway = leeway;
        Ok(self)
    }

    pub fn leeway(&self) -> Duration {
        self.leeway
    }
}

/// Clock and options shared by all verifier variants.
#[derive(Clone)]
struct Validation {
    clock: Arc<dyn Clock>,
    options: ValidationOptions,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            clock: Arc::new(SystemClock),
            options: ValidationOptions::default(),
        }
    }
}

impl fmt::Debug for Validation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validation")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Validation {
    /// Reject tokens outside their `[nbf, exp)` window, widened by the leeway.
    fn check_time(&self, claims: &Claims) -> Result<(), TokenError> {
        let now = self.clock.now().timestamp();
        let leeway = self.options.leeway.num_seconds();

        if let Some(exp) = claims.numeric_date(EXPIRATION)? {
            if now >= exp.saturating_add(leeway) {
                return Err(TokenError::ClaimsInvalid("token has expired".to_string()));
            }
        }
        if let Some(nbf) = claims.numeric_date(NOT_BEFORE)? {
            if now < nbf.saturating_sub(leeway) {
                return Err(TokenError::ClaimsInvalid(
                    "token is not yet valid".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// parse → algorithm pin → signature check → claims decode → time check.
    fn run<F>(&self, token: &str, expected: Algorithm, signature_ok: F) -> Result<Claims, TokenError>
    where
        F: FnOnce(&[u8], &[u8]) -> bool,
    {
        let raw = RawToken::split(token)?;
        let header = raw.header()?;

        if header.alg != expected.as_str() {
            return Err(TokenError::VerificationFailed(format!(
                "algorithm mismatch: expected {expected}, token declares {}",
                header.alg
            )));
        }

        if !signature_ok(raw.signing_input().as_bytes(), raw.signature()) {
            return Err(TokenError::VerificationFailed(
                "signature does not match".to_string(),
            ));
        }

        let claims = raw.claims()?;
        self.check_time(&claims)?;

        tracing::debug!(
            alg = %expected,
            jti = claims.jwt_id().unwrap_or_default(),
            "Token verified"
        );
        Ok(claims)
    }
}

/// Accepts only unsigned (`alg: none`) tokens with an empty signature segment.
#[derive(Debug, Clone, Default)]
pub struct UnsignedVerifier {
    validation: Validation,
}

impl UnsignedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.validation.clock = Arc::new(clock);
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.validation.options = options;
        self
    }
}

impl TokenVerifier for UnsignedVerifier {
    fn algorithm(&self) -> Algorithm {
        Algorithm::None
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.validation
            .run(token, Algorithm::None, |_, signature| signature.is_empty())
    }
}

/// Verifies HMAC-signed tokens with a shared secret.
#[derive(Debug, Clone)]
pub struct SymmetricVerifier {
    algorithm: Algorithm,
    key: SymmetricKey,
    validation: Validation,
}

impl SymmetricVerifier {
    /// HS256 verifier. Fails with `InvalidKeyMaterial` if `secret` is empty.
    pub fn new(secret: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        Self::with_algorithm(secret, AlgorithmFamily::Hmac.default_algorithm())
    }

    pub fn with_algorithm(
        secret: impl Into<Vec<u8>>,
        algorithm: Algorithm,
    ) -> Result<Self, TokenError> {
        algorithm.require_family(AlgorithmFamily::Hmac)?;
        Ok(Self {
            algorithm,
            key: SymmetricKey::new(secret)?,
            validation: Validation::default(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.validation.clock = Arc::new(clock);
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.validation.options = options;
        self
    }
}

impl TokenVerifier for SymmetricVerifier {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.validation.run(token, self.algorithm, |input, signature| {
            hmac_verify(self.algorithm, self.key.as_bytes(), input, signature)
        })
    }
}

/// Verifies RSA (PKCS#1 v1.5) signed tokens with a public key.
#[derive(Debug, Clone)]
pub struct AsymmetricVerifier {
    algorithm: Algorithm,
    key: RsaVerifier,
    validation: Validation,
}

impl AsymmetricVerifier {
    /// RS256 verifier. Fails with `InvalidKeyMaterial` if the key is absent or
    /// smaller than 2048 bits.
    pub fn new(key: impl Into<Option<RsaPublicKey>>) -> Result<Self, TokenError> {
        Self::with_algorithm(key, AlgorithmFamily::Rsa.default_algorithm())
    }

    pub fn with_algorithm(
        key: impl Into<Option<RsaPublicKey>>,
        algorithm: Algorithm,
    ) -> Result<Self, TokenError> {
        algorithm.require_family(AlgorithmFamily::Rsa)?;
        let key = key.into().ok_or_else(|| {
            TokenError::InvalidKeyMaterial("RSA public key is required".to_string())
        })?;
        check_public_key(&key)?;

        Ok(Self {
            algorithm,
            key: RsaVerifier::new(algorithm, key)?,
            validation: Validation::default(),
        })
    }

    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.validation.clock = Arc::new(clock);
        self
    }

    pub fn with_options(mut self, options: ValidationOptions) -> Self {
        self.validation.options = options;
        self
    }
}

impl TokenVerifier for AsymmetricVerifier {
    fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.validation.run(token, self.algorithm, |input, signature| {
            self.key.verify(input, signature)
        })
    }
}

/// Any of the three verifiers, chosen at runtime (e.g. from configuration).
#[derive(Debug, Clone)]
pub enum Verifier {
    Unsigned(UnsignedVerifier),
    Symmetric(SymmetricVerifier),
    Asymmetric(AsymmetricVerifier),
}

impl Verifier {
    pub fn with_clock(self, clock: impl Clock + 'static) -> Self {
        match self {
            Verifier::Unsigned(inner) => Verifier::Unsigned(inner.with_clock(clock)),
            Verifier::Symmetric(inner) => Verifier::Symmetric(inner.with_clock(clock)),
            Verifier::Asymmetric(inner) => Verifier::Asymmetric(inner.with_clock(clock)),
        }
    }

    pub fn with_options(self, options: ValidationOptions) -> Self {
        match self {
            Verifier::Unsigned(inner) => Verifier::Unsigned(inner.with_options(options)),
            Verifier::Symmetric(inner) => Verifier::Symmetric(inner.with_options(options)),
            Verifier::Asymmetric(inner) => Verifier::Asymmetric(inner.with_options(options)),
        }
    }
}

impl TokenVerifier for Verifier {
    fn algorithm(&self) -> Algorithm {
        match self {
            Verifier::Unsigned(inner) => inner.algorithm(),
            Verifier::Symmetric(inner) => inner.algorithm(),
            Verifier::Asymmetric(inner) => inner.algorithm(),
        }
    }

    fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        match self {
            Verifier::Unsigned(inner) => inner.verify(token),
            Verifier::Symmetric(inner) => inner.verify(token),
            Verifier::Asymmetric(inner) => inner.verify(token),
        }
    }
}

impl From<UnsignedVerifier> for Verifier {
    fn from(inner: UnsignedVerifier) -> Self {
        Verifier::Unsigned(inner)
    }
}

impl From<SymmetricVerifier> for Verifier {
    fn from(inner: SymmetricVerifier) -> Self {
        Verifier::Symmetric(inner)
    }
}

impl From<AsymmetricVerifier> for Verifier {
    fn from(inner: AsymmetricVerifier) -> Self {
        Verifier::Asymmetric(inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::codec::encode_segment;
    use crate::sign::hmac_sign;
    use serde_json::{Value, json};

    const NOW: i64 = 1_700_000_000;
    const SECRET: &[u8] = b"0123456789abcdef0123456789abcdef";

    fn clock() -> FixedClock {
        FixedClock::at_timestamp(NOW).unwrap()
    }

    fn hs256_token(header: Value, payload: Value) -> String {
        let input = format!(
            "{}.{}",
            encode_segment(header.to_string().as_bytes()),
            encode_segment(payload.to_string().as_bytes())
        );
        let tag = hmac_sign(Algorithm::HS256, SECRET, input.as_bytes()).unwrap();
        format!("{input}.{}", encode_segment(&tag))
    }

    fn verifier() -> SymmetricVerifier {
        SymmetricVerifier::new(SECRET.to_vec())
            .unwrap()
            .with_clock(clock())
    }

    #[test]
    fn test_accepts_valid_token() {
        let token = hs256_token(json!({"alg": "HS256"}), json!({"sub": "a", "exp": NOW + 1}));
        let claims = verifier().verify(&token).unwrap();
        assert_eq!(claims.subject(), Some("a"));
    }

    #[test]
    fn test_leeway_bounds() {
        assert!(
            ValidationOptions::new()
                .with_leeway(Duration::seconds(-1))
                .is_err()
        );
        assert!(
            ValidationOptions::new()
                .with_leeway(MAX_LEEWAY + Duration::seconds(1))
                .is_err()
        );
        let options = ValidationOptions::new().with_leeway(MAX_LEEWAY).unwrap();
        assert_eq!(options.leeway(), MAX_LEEWAY);
    }

    #[test]
    fn test_leeway_widens_window() {
        let options = ValidationOptions::new()
            .with_leeway(Duration::seconds(30))
            .unwrap();
        let verifier = verifier().with_options(options);

        let expired = hs256_token(json!({"alg": "HS256"}), json!({"exp": NOW - 29}));
        assert!(verifier.verify(&expired).is_ok());
        let expired = hs256_token(json!({"alg": "HS256"}), json!({"exp": NOW - 30}));
        assert!(matches!(
            verifier.verify(&expired),
            Err(TokenError::ClaimsInvalid(_))
        ));

        let early = hs256_token(json!({"alg": "HS256"}), json!({"nbf": NOW + 30}));
        assert!(verifier.verify(&early).is_ok());
        let early = hs256_token(json!({"alg": "HS256"}), json!({"nbf": NOW + 31}));
        assert!(matches!(
            verifier.verify(&early),
            Err(TokenError::ClaimsInvalid(_))
        ));
    }

    #[test]
    fn test_non_numeric_exp_is_claims_error() {
        let token = hs256_token(json!({"alg": "HS256"}), json!({"exp": "never"}));
        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::ClaimsInvalid(_))
        ));
    }

    #[test]
    fn test_unknown_algorithm_is_verification_failure() {
        let token = hs256_token(json!({"alg": "ES256"}), json!({}));
        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_algorithm_pin_is_exact() {
        let token = hs256_token(json!({"alg": "HS256"}), json!({}));
        let hs512 = SymmetricVerifier::with_algorithm(SECRET.to_vec(), Algorithm::HS512).unwrap();
        assert!(matches!(
            hs512.verify(&token),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_signature_checked_before_claims_decode() {
        let input = format!(
            "{}.{}",
            encode_segment(json!({"alg": "HS256"}).to_string().as_bytes()),
            encode_segment(b"not json")
        );
        let token = format!("{input}.{}", encode_segment(b"garbage"));
        assert!(matches!(
            verifier().verify(&token),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_unsigned_rejects_nonempty_signature() {
        let input = format!(
            "{}.{}",
            encode_segment(json!({"alg": "none"}).to_string().as_bytes()),
            encode_segment(json!({}).to_string().as_bytes())
        );
        let verifier = UnsignedVerifier::new().with_clock(clock());

        assert!(verifier.verify(&format!("{input}.")).is_ok());
        assert!(matches!(
            verifier.verify(&format!("{input}.c2ln")),
            Err(TokenError::VerificationFailed(_))
        ));
    }

    #[test]
    fn test_asymmetric_requires_key() {
        assert!(matches!(
            AsymmetricVerifier::new(None),
            Err(TokenError::InvalidKeyMaterial(_))
        ));
        assert!(matches!(
            SymmetricVerifier::new(Vec::<u8>::new()),
            Err(TokenError::InvalidKeyMaterial(_))
        ));
    }
}
