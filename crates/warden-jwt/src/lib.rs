//! # warden-jwt
//!
//! JWT issuance and verification engine for Warden.
//!
//! This crate provides functionality for:
//! - Building the canonical claim set (`iss`, `sub`, `aud`, `iat`, `exp`, `nbf`, `jti`)
//! - Issuing unsigned, HMAC-signed, or RSA-signed tokens
//! - Verifying tokens against a pinned algorithm and key
//! - Reading RSA keys from PKCS#8 / X.509 PEM
//!
//! ## Trust Strategies
//!
//! | Strategy | Algorithms | Issuer key | Verifier key |
//! |----------|------------|------------|--------------|
//! | **Unsigned** | `none` | none | none |
//! | **Symmetric** | `HS256`, `HS384`, `HS512` | shared secret | same secret |
//! | **Asymmetric** | `RS256`, `RS384`, `RS512` | RSA private key | RSA public key |
//!
//! ## Algorithm Pinning
//!
//! A verifier is bound to exactly one algorithm when it is constructed. A token
//! whose header declares anything else is rejected before any key is touched,
//! so a `none` token never reaches an HMAC verifier and an HMAC token is never
//! checked against an RSA public key.
//!
//! ```ignore
//! use warden_jwt::{ClaimsRequest, SymmetricIssuer, SymmetricVerifier, TokenIssuer, TokenVerifier};
//!
//! let issuer = SymmetricIssuer::new("auth.example.dev", secret.clone())?;
//! let token = issuer.issue(&ClaimsRequest::new().with_subject("user-42").expires_in(ttl))?;
//!
//! let claims = SymmetricVerifier::new(secret)?.verify(&token)?;
//! assert_eq!(claims.subject(), Some("user-42"));
//! ```

pub mod algorithm;
pub mod claims;
pub mod clock;
pub mod codec;
pub mod error;
pub mod id;
pub mod issuer;
pub mod keys;
mod sign;
pub mod verifier;

pub use algorithm::{Algorithm, AlgorithmFamily, UnsupportedAlgorithm};
pub use claims::{Claims, ClaimsBuilder, ClaimsRequest, MIN_TTL, REGISTERED_CLAIMS};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::{Header, TokenInfo, inspect_token_unverified};
pub use error::{KeyError, TokenError};
pub use id::{IdGenerator, RandomUuid};
pub use issuer::{AsymmetricIssuer, Issuer, SymmetricIssuer, TokenIssuer, UnsignedIssuer};
pub use keys::{
    SymmetricKey, load_rsa_private_key_file, load_rsa_public_key_file, read_rsa_private_key_pkcs8,
    read_rsa_public_key_x509,
};
pub use rsa::{RsaPrivateKey, RsaPublicKey};
pub use verifier::{
    AsymmetricVerifier, MAX_LEEWAY, SymmetricVerifier, TokenVerifier, UnsignedVerifier,
    ValidationOptions, Verifier,
};
