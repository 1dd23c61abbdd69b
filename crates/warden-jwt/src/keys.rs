//! Key material: symmetric secrets, RSA key reading, and key generation.

use crate::error::{KeyError, TokenError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use rand::TryRngCore;
use rand::rngs::OsRng;
use rsa::pkcs8::spki::SubjectPublicKeyInfoRef;
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey, LineEnding, PrivateKeyInfo};
use rsa::traits::PublicKeyParts;
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Smallest RSA modulus accepted for signing or verification, in bits.
pub const MIN_RSA_BITS: usize = 2048;

/// A shared HMAC secret. Never empty; wiped from memory on drop.
#[derive(Clone)]
pub struct SymmetricKey(Zeroizing<Vec<u8>>);

impl SymmetricKey {
    /// Wrap secret bytes. Fails with `InvalidKeyMaterial` if empty.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.is_empty() {
            return Err(TokenError::InvalidKeyMaterial(
                "symmetric key must not be empty".to_string(),
            ));
        }
        Ok(Self(bytes))
    }

    /// Decode a standard-alphabet base64 secret.
    pub fn from_base64(encoded: &str) -> Result<Self, KeyError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| KeyError::FormatInvalid(format!("failed to decode base64: {e}")))?;
        Self::new(bytes).map_err(|e| KeyError::FormatInvalid(e.to_string()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the key holds no bytes. Never true for a constructed key.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.as_bytes())
    }
}

impl fmt::Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymmetricKey([REDACTED; {} bytes])", self.len())
    }
}

pub(crate) fn check_rsa_size(modulus_bytes: usize) -> Result<(), TokenError> {
    let bits = modulus_bytes * 8;
    if bits < MIN_RSA_BITS {
        return Err(TokenError::InvalidKeyMaterial(format!(
            "RSA key must be at least {MIN_RSA_BITS} bits, got {bits}"
        )));
    }
    Ok(())
}

pub(crate) fn check_private_key(key: &RsaPrivateKey) -> Result<(), TokenError> {
    check_rsa_size(key.size())
}

pub(crate) fn check_public_key(key: &RsaPublicKey) -> Result<(), TokenError> {
    check_rsa_size(key.size())
}

/// Strip the PEM armor for `label` and decode the base64 body into DER.
fn pem_body(content: &str, label: &str) -> Result<Vec<u8>, KeyError> {
    let begin = format!("-----BEGIN {label}-----");
    let end = format!("-----END {label}-----");
    let body: String = content
        .replace(&begin, "")
        .replace(&end, "")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    STANDARD
        .decode(body)
        .map_err(|e| KeyError::FormatInvalid(format!("failed to decode base64: {e}")))
}

/// Read an RSA private key from a PKCS#8 PEM document (`BEGIN PRIVATE KEY`).
pub fn read_rsa_private_key_pkcs8(content: &str) -> Result<RsaPrivateKey, KeyError> {
    let der = pem_body(content, "PRIVATE KEY")?;
    let info = PrivateKeyInfo::try_from(der.as_slice())
        .map_err(|e| KeyError::FormatInvalid(format!("failed to parse private key: {e}")))?;

    let oid = info.algorithm.oid;
    if oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(KeyError::TypeMismatch(format!(
            "expected RSA private key, got algorithm {oid}"
        )));
    }

    let key = RsaPrivateKey::try_from(info)
        .map_err(|e| KeyError::FormatInvalid(format!("failed to parse private key: {e}")))?;
    key.validate()
        .map_err(|e| KeyError::FormatInvalid(format!("invalid RSA private key: {e}")))?;
    Ok(key)
}

/// Read an RSA public key from an X.509 SubjectPublicKeyInfo PEM document (`BEGIN PUBLIC KEY`).
pub fn read_rsa_public_key_x509(content: &str) -> Result<RsaPublicKey, KeyError> {
    let der = pem_body(content, "PUBLIC KEY")?;
    let spki = SubjectPublicKeyInfoRef::try_from(der.as_slice())
        .map_err(|e| KeyError::FormatInvalid(format!("failed to parse public key: {e}")))?;

    let oid = spki.algorithm.oid;
    if oid != rsa::pkcs1::ALGORITHM_OID {
        return Err(KeyError::TypeMismatch(format!(
            "expected RSA public key, got algorithm {oid}"
        )));
    }

    RsaPublicKey::try_from(spki)
        .map_err(|e| KeyError::FormatInvalid(format!("failed to parse public key: {e}")))
}

/// Load an RSA private key from a PKCS#8 PEM file.
pub fn load_rsa_private_key_file(path: &Path) -> Result<RsaPrivateKey, KeyError> {
    let pem = std::fs::read_to_string(path)?;
    read_rsa_private_key_pkcs8(&pem)
}

/// Load an RSA public key from an X.509 PEM file.
pub fn load_rsa_public_key_file(path: &Path) -> Result<RsaPublicKey, KeyError> {
    let pem = std::fs::read_to_string(path)?;
    read_rsa_public_key_x509(&pem)
}

/// Generate a random symmetric secret of `len` bytes.
pub fn generate_symmetric_key(len: usize) -> Result<SymmetricKey, KeyError> {
    let mut bytes = Zeroizing::new(vec![0u8; len]);
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
    SymmetricKey::new(bytes.to_vec()).map_err(|e| KeyError::GenerationFailed(e.to_string()))
}

/// Generate an RSA keypair with a modulus of `bits` bits.
pub fn generate_rsa_keypair(bits: usize) -> Result<(RsaPrivateKey, RsaPublicKey), KeyError> {
    if bits < MIN_RSA_BITS {
        return Err(KeyError::GenerationFailed(format!(
            "RSA key must be at least {MIN_RSA_BITS} bits, got {bits}"
        )));
    }
    let mut rng = rsa::rand_core::OsRng;
    let private_key = RsaPrivateKey::new(&mut rng, bits)
        .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
    let public_key = private_key.to_public_key();
    Ok((private_key, public_key))
}

/// Encode a private key as PKCS#8 PEM.
pub fn private_key_to_pem(key: &RsaPrivateKey) -> Result<Zeroizing<String>, KeyError> {
    key.to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::FormatInvalid(format!("failed to encode private key: {e}")))
}

/// Encode a public key as X.509 SubjectPublicKeyInfo PEM.
pub fn public_key_to_pem(key: &RsaPublicKey) -> Result<String, KeyError> {
    key.to_public_key_pem(LineEnding::LF)
        .map_err(|e| KeyError::FormatInvalid(format!("failed to encode public key: {e}")))
}
