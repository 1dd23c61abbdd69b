//! Signing algorithms and the families an issuer or verifier binds to.

use crate::error::TokenError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A JOSE `alg` value supported by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Algorithm {
    /// Unsigned token (`alg: none`).
    #[serde(rename = "none")]
    None,
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
}

/// The trust strategy an algorithm belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmFamily {
    Unsigned,
    Hmac,
    Rsa,
}

impl Algorithm {
    /// The JOSE name written to the token header.
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::None => "none",
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }

    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Algorithm::None => AlgorithmFamily::Unsigned,
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => AlgorithmFamily::Hmac,
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => AlgorithmFamily::Rsa,
        }
    }

    /// Fails with `InvalidKeyMaterial` unless this algorithm belongs to `family`.
    pub fn require_family(&self, family: AlgorithmFamily) -> Result<(), TokenError> {
        if self.family() != family {
            return Err(TokenError::InvalidKeyMaterial(format!(
                "{self} cannot be used with a {family} key"
            )));
        }
        Ok(())
    }

    /// Size in bytes of the HMAC output, used as the recommended minimum secret length.
    pub fn hmac_output_len(&self) -> Option<usize> {
        match self {
            Algorithm::HS256 => Some(32),
            Algorithm::HS384 => Some(48),
            Algorithm::HS512 => Some(64),
            _ => None,
        }
    }
}

impl AlgorithmFamily {
    /// The algorithm used when a caller does not pick one.
    pub fn default_algorithm(&self) -> Algorithm {
        match self {
            AlgorithmFamily::Unsigned => Algorithm::None,
            AlgorithmFamily::Hmac => Algorithm::HS256,
            AlgorithmFamily::Rsa => Algorithm::RS256,
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for AlgorithmFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmFamily::Unsigned => "unsigned",
            AlgorithmFamily::Hmac => "HMAC",
            AlgorithmFamily::Rsa => "RSA",
        };
        f.write_str(name)
    }
}

/// Error returned when parsing an unknown algorithm name.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported algorithm: {0}")]
pub struct UnsupportedAlgorithm(pub String);

impl FromStr for Algorithm {
    type Err = UnsupportedAlgorithm;

    /// Names are matched exactly, as they appear in a JOSE header.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Algorithm::None),
            "HS256" => Ok(Algorithm::HS256),
            "HS384" => Ok(Algorithm::HS384),
            "HS512" => Ok(Algorithm::HS512),
            "RS256" => Ok(Algorithm::RS256),
            "RS384" => Ok(Algorithm::RS384),
            "RS512" => Ok(Algorithm::RS512),
            other => Err(UnsupportedAlgorithm(other.to_string())),
        }
    }
}
