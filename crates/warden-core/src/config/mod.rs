//! Configuration types for Warden.
//!
//! Configuration is loaded from a YAML file (warden.yaml) and wires key
//! material into token issuers and verifiers.
//!
//! # Example
//!
//! ```yaml
//! issuer: auth.example.dev
//! signing:
//!   strategy: rsa
//!   algorithm: RS256
//!   private_key_file: keys/private.pem
//!   public_key_file: keys/public.pem
//! validation:
//!   leeway: 30s
//! defaults:
//!   ttl: 15m
//! ```

pub mod duration;
pub mod signing;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use warden_jwt::{
    AsymmetricIssuer, AsymmetricVerifier, Issuer, KeyError, SymmetricIssuer, SymmetricVerifier,
    TokenError, UnsignedIssuer, UnsignedVerifier, ValidationOptions, Verifier,
};

pub use duration::parse_duration;
pub use signing::{InlineKeys, SigningConfig, Strategy};

/// Complete Warden configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WardenConfig {
    /// Value stamped into the `iss` claim.
    #[serde(default = "default_issuer")]
    pub issuer: String,

    /// Signing strategy and key sources.
    #[serde(default)]
    pub signing: SigningConfig,

    /// Verification settings.
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Defaults for newly issued tokens.
    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl Default for WardenConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            signing: SigningConfig::default(),
            validation: ValidationConfig::default(),
            defaults: DefaultsConfig::default(),
        }
    }
}

/// Verification settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ValidationConfig {
    /// Clock skew allowed on `exp` and `nbf` (e.g., "30s"). At most 5 minutes.
    #[serde(default, with = "duration::serde_opt")]
    pub leeway: Option<chrono::Duration>,
}

impl ValidationConfig {
    pub fn options(&self) -> Result<ValidationOptions, ConfigError> {
        let options = ValidationOptions::new();
        match self.leeway {
            Some(leeway) => Ok(options.with_leeway(leeway)?),
            None => Ok(options),
        }
    }
}

/// Defaults for newly issued tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Token lifetime when the caller does not give one (e.g., "15m", "24h").
    #[serde(default = "default_ttl", with = "duration::serde_opt")]
    pub ttl: Option<chrono::Duration>,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { ttl: default_ttl() }
    }
}

fn default_issuer() -> String {
    "warden".to_string()
}

fn default_ttl() -> Option<chrono::Duration> {
    chrono::Duration::try_minutes(15)
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Key error: {0}")]
    Key(#[from] KeyError),

    #[error("Token engine error: {0}")]
    Token(#[from] TokenError),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl WardenConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(content).map_err(ConfigError::from)
    }

    /// Load configuration, resolving relative key paths against the file's directory.
    pub fn load_with_context(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let mut config = Self::from_file(path)?;

        if let Some(base_dir) = path.parent() {
            config.signing.rebase_paths(base_dir);
        }

        Ok(config)
    }

    /// Build the issuer described by the signing section.
    pub fn build_issuer(&self) -> Result<Issuer, ConfigError> {
        let algorithm = self.signing.algorithm()?;

        let issuer: Issuer = match self.signing.strategy {
            Strategy::None => UnsignedIssuer::new(&self.issuer).into(),
            Strategy::Hmac => {
                let secret = self.signing.hmac_secret(algorithm)?;
                SymmetricIssuer::with_algorithm(&self.issuer, secret, algorithm)?.into()
            }
            Strategy::Rsa => {
                let key = self.signing.rsa_private_key()?;
                AsymmetricIssuer::with_algorithm(&self.issuer, key, algorithm)?.into()
            }
        };

        tracing::debug!(issuer = %self.issuer, alg = %algorithm, "Token issuer configured");
        Ok(issuer)
    }

    /// Build the verifier described by the signing and validation sections.
    pub fn build_verifier(&self) -> Result<Verifier, ConfigError> {
        let algorithm = self.signing.algorithm()?;
        let options = self.validation.options()?;

        let verifier: Verifier = match self.signing.strategy {
            Strategy::None => UnsignedVerifier::new().into(),
            Strategy::Hmac => {
                let secret = self.signing.hmac_secret(algorithm)?;
                SymmetricVerifier::with_algorithm(secret, algorithm)?.into()
            }
            Strategy::Rsa => {
                let key = self.signing.rsa_public_key()?;
                AsymmetricVerifier::with_algorithm(key, algorithm)?.into()
            }
        };

        tracing::debug!(alg = %algorithm, leeway_secs = options.leeway().num_seconds(), "Token verifier configured");
        Ok(verifier.with_options(options))
    }
}
