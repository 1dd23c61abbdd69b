//! Signing primitives behind the issuer and verifier.

use crate::algorithm::Algorithm;
use crate::error::TokenError;
use hmac::digest::KeyInit;
use hmac::{Hmac, Mac};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::signature::{SignatureEncoding, Signer, Verifier};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};
use subtle::ConstantTimeEq;

fn mac<M: Mac + KeyInit>(key: &[u8], message: &[u8]) -> Result<Vec<u8>, TokenError> {
    let mut mac = <M as KeyInit>::new_from_slice(key)
        .map_err(|e| TokenError::Signing(format!("invalid HMAC key: {e}")))?;
    mac.update(message);
    Ok(mac.finalize().into_bytes().to_vec())
}

/// HMAC tag over `message` for an HS* algorithm.
pub(crate) fn hmac_sign(
    algorithm: Algorithm,
    key: &[u8],
    message: &[u8],
) -> Result<Vec<u8>, TokenError> {
    match algorithm {
        Algorithm::HS256 => mac::<Hmac<Sha256>>(key, message),
        Algorithm::HS384 => mac::<Hmac<Sha384>>(key, message),
        Algorithm::HS512 => mac::<Hmac<Sha512>>(key, message),
        other => Err(TokenError::Signing(format!(
            "{other} is not an HMAC algorithm"
        ))),
    }
}

/// Recompute the tag and compare in constant time.
pub(crate) fn hmac_verify(algorithm: Algorithm, key: &[u8], message: &[u8], tag: &[u8]) -> bool {
    match hmac_sign(algorithm, key, message) {
        Ok(expected) => expected.as_slice().ct_eq(tag).into(),
        Err(_) => false,
    }
}

/// RSASSA-PKCS1-v1_5 signer bound to one digest.
#[derive(Debug, Clone)]
pub(crate) enum RsaSigner {
    Rs256(SigningKey<rsa::sha2::Sha256>),
    Rs384(SigningKey<rsa::sha2::Sha384>),
    Rs512(SigningKey<rsa::sha2::Sha512>),
}

impl RsaSigner {
    pub(crate) fn new(algorithm: Algorithm, key: RsaPrivateKey) -> Result<Self, TokenError> {
        match algorithm {
            Algorithm::RS256 => Ok(Self::Rs256(SigningKey::new(key))),
            Algorithm::RS384 => Ok(Self::Rs384(SigningKey::new(key))),
            Algorithm::RS512 => Ok(Self::Rs512(SigningKey::new(key))),
            other => Err(TokenError::InvalidKeyMaterial(format!(
                "{other} is not an RSA algorithm"
            ))),
        }
    }

    pub(crate) fn sign(&self, message: &[u8]) -> Result<Vec<u8>, TokenError> {
        let signature: Signature = match self {
            Self::Rs256(key) => key.try_sign(message),
            Self::Rs384(key) => key.try_sign(message),
            Self::Rs512(key) => key.try_sign(message),
        }
        .map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(signature.to_vec())
    }
}

/// RSASSA-PKCS1-v1_5 verifier bound to one digest.
#[derive(Debug, Clone)]
pub(crate) enum RsaVerifier {
    Rs256(VerifyingKey<rsa::sha2::Sha256>),
    Rs384(VerifyingKey<rsa::sha2::Sha384>),
    Rs512(VerifyingKey<rsa::sha2::Sha512>),
}

impl RsaVerifier {
    pub(crate) fn new(algorithm: Algorithm, key: RsaPublicKey) -> Result<Self, TokenError> {
        match algorithm {
            Algorithm::RS256 => Ok(Self::Rs256(VerifyingKey::new(key))),
            Algorithm::RS384 => Ok(Self::Rs384(VerifyingKey::new(key))),
            Algorithm::RS512 => Ok(Self::Rs512(VerifyingKey::new(key))),
            other => Err(TokenError::InvalidKeyMaterial(format!(
                "{other} is not an RSA algorithm"
            ))),
        }
    }

    pub(crate) fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(signature) = Signature::try_from(signature) else {
            return false;
        };
        match self {
            Self::Rs256(key) => key.verify(message, &signature).is_ok(),
            Self::Rs384(key) => key.verify(message, &signature).is_ok(),
            Self::Rs512(key) => key.verify(message, &signature).is_ok(),
        }
    }
}
