//! Signing strategy and key-source configuration.

use super::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use warden_jwt::{
    Algorithm, AlgorithmFamily, RsaPrivateKey, RsaPublicKey, read_rsa_private_key_pkcs8,
    read_rsa_public_key_x509,
};

/// Trust strategy for issued and accepted tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// Unsigned tokens. Never use across a trust boundary.
    None,
    /// Shared-secret HMAC.
    #[default]
    Hmac,
    /// RSA private/public key pair.
    Rsa,
}

impl Strategy {
    pub fn family(&self) -> AlgorithmFamily {
        match self {
            Strategy::None => AlgorithmFamily::Unsigned,
            Strategy::Hmac => AlgorithmFamily::Hmac,
            Strategy::Rsa => AlgorithmFamily::Rsa,
        }
    }

    pub fn for_family(family: AlgorithmFamily) -> Self {
        match family {
            AlgorithmFamily::Unsigned => Strategy::None,
            AlgorithmFamily::Hmac => Strategy::Hmac,
            AlgorithmFamily::Rsa => Strategy::Rsa,
        }
    }
}

/// Key material supplied at runtime, e.g. from command-line flags.
///
/// Never read from or written to YAML. Takes precedence over the environment
/// variables and files named in [`SigningConfig`].
#[derive(Clone, Default)]
pub struct InlineKeys {
    /// HMAC secret; its UTF-8 bytes are the key.
    pub secret: Option<String>,
    /// PKCS#8 PEM private key.
    pub private_key: Option<String>,
    /// X.509 PEM public key.
    pub public_key: Option<String>,
}

impl fmt::Debug for InlineKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("InlineKeys")
            .field("secret", &redact(&self.secret))
            .field("private_key", &redact(&self.private_key))
            .field("public_key", &redact(&self.public_key))
            .finish()
    }
}

/// Configuration for token signing keys.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SigningConfig {
    #[serde(default)]
    pub strategy: Strategy,

    /// Algorithm override. Defaults to HS256 / RS256 for the strategy.
    #[serde(default)]
    pub algorithm: Option<Algorithm>,

    /// Environment variable containing the HMAC secret.
    #[serde(default)]
    pub secret_env: Option<String>,

    /// Path to a file containing the HMAC secret.
    #[serde(default)]
    pub secret_file: Option<PathBuf>,

    /// Environment variable containing the PKCS#8 PEM private key.
    #[serde(default)]
    pub private_key_env: Option<String>,

    /// Path to the PKCS#8 PEM private key.
    #[serde(default)]
    pub private_key_file: Option<PathBuf>,

    /// Environment variable containing the X.509 PEM public key.
    #[serde(default)]
    pub public_key_env: Option<String>,

    /// Path to the X.509 PEM public key.
    #[serde(default)]
    pub public_key_file: Option<PathBuf>,

    #[serde(skip)]
    pub inline: InlineKeys,
}

impl SigningConfig {
    /// The configured algorithm, checked against the strategy.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let family = self.strategy.family();
        match self.algorithm {
            None => Ok(family.default_algorithm()),
            Some(alg) if alg.family() == family => Ok(alg),
            Some(alg) => Err(ConfigError::Config(format!(
                "algorithm {alg} does not match signing strategy {family}"
            ))),
        }
    }

    /// Pin `algorithm` and switch to the strategy of its family.
    pub fn set_algorithm(&mut self, algorithm: Algorithm) {
        self.strategy = Strategy::for_family(algorithm.family());
        self.algorithm = Some(algorithm);
    }

    /// Resolve the HMAC secret from inline value, environment or file.
    pub fn resolve_secret(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(secret) = &self.inline.secret {
            return Ok(Some(secret.clone()));
        }
        resolve(self.secret_env.as_deref(), self.secret_file.as_deref())
    }

    /// Resolve the private key PEM from inline value, environment or file.
    pub fn resolve_private_key(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(pem) = &self.inline.private_key {
            return Ok(Some(pem.clone()));
        }
        resolve(
            self.private_key_env.as_deref(),
            self.private_key_file.as_deref(),
        )
    }

    /// Resolve the public key PEM from inline value, environment or file.
    pub fn resolve_public_key(&self) -> Result<Option<String>, std::io::Error> {
        if let Some(pem) = &self.inline.public_key {
            return Ok(Some(pem.clone()));
        }
        resolve(
            self.public_key_env.as_deref(),
            self.public_key_file.as_deref(),
        )
    }

    /// HMAC secret bytes for `algorithm`. Warns when shorter than the digest output.
    pub(crate) fn hmac_secret(&self, algorithm: Algorithm) -> Result<Vec<u8>, ConfigError> {
        let secret = self.resolve_secret()?.ok_or_else(|| {
            ConfigError::Config(
                "no HMAC secret provided (inline, signing.secret_env or signing.secret_file)"
                    .to_string(),
            )
        })?;

        if let Some(recommended) = algorithm.hmac_output_len() {
            if secret.len() < recommended {
                tracing::warn!(
                    alg = %algorithm,
                    len = secret.len(),
                    recommended,
                    "HMAC secret is shorter than the digest output"
                );
            }
        }
        Ok(secret.into_bytes())
    }

    pub(crate) fn rsa_private_key(&self) -> Result<RsaPrivateKey, ConfigError> {
        let pem = self.resolve_private_key()?.ok_or_else(|| {
            ConfigError::Config(
                "no RSA private key provided (inline, signing.private_key_env or signing.private_key_file)"
                    .to_string(),
            )
        })?;
        Ok(read_rsa_private_key_pkcs8(&pem)?)
    }

    pub(crate) fn rsa_public_key(&self) -> Result<RsaPublicKey, ConfigError> {
        let pem = self.resolve_public_key()?.ok_or_else(|| {
            ConfigError::Config(
                "no RSA public key provided (inline, signing.public_key_env or signing.public_key_file)"
                    .to_string(),
            )
        })?;
        Ok(read_rsa_public_key_x509(&pem)?)
    }

    /// Make relative key file paths relative to `base`.
    pub(crate) fn rebase_paths(&mut self, base: &Path) {
        for path in [
            &mut self.secret_file,
            &mut self.private_key_file,
            &mut self.public_key_file,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

/// Environment variable first, then file (trimmed).
fn resolve(env_var: Option<&str>, file: Option<&Path>) -> Result<Option<String>, std::io::Error> {
    if let Some(var) = env_var {
        if let Ok(value) = std::env::var(var) {
            return Ok(Some(value));
        }
    }

    if let Some(path) = file {
        if path.exists() {
            let value = std::fs::read_to_string(path)?;
            return Ok(Some(value.trim().to_string()));
        }
    }

    Ok(None)
}
