//! Token commands.
//!
//! `warden token issue` - Issue a signed (or unsigned) token.
//! `warden token verify` - Verify a token and print its claims.
//! `warden token inspect` - Decode a token without verification.

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use warden_core::{WardenConfig, parse_duration};
use warden_jwt::{Algorithm, ClaimsRequest, TokenIssuer, TokenVerifier, inspect_token_unverified};

/// Key material flags shared by `issue` and `verify`.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct KeyArgs {
    /// Signing algorithm (none, HS256, HS384, HS512, RS256, RS384, RS512)
    #[arg(long)]
    pub algorithm: Option<Algorithm>,

    /// HMAC secret
    #[arg(long, env = "WARDEN_SECRET", hide_env_values = true)]
    pub secret: Option<String>,

    /// RSA private key for `issue` (path or PEM)
    #[arg(long, env = "WARDEN_PRIVATE_KEY", hide_env_values = true)]
    pub private_key: Option<String>,

    /// RSA public key for `verify` (path or PEM)
    #[arg(long, env = "WARDEN_PUBLIC_KEY", hide_env_values = true)]
    pub public_key: Option<String>,
}

/// Claim and output options for `issue`.
#[derive(Debug, Clone, Default)]
pub struct IssueArgs {
    pub issuer: Option<String>,
    pub subject: Option<String>,
    pub audience: Vec<String>,
    pub claims: Vec<String>,
    pub ttl: Option<String>,
    pub not_before: Option<String>,
    pub output: Option<PathBuf>,
}

impl KeyArgs {
    /// Configuration with these flags layered over `config`.
    fn apply(&self, config: &WardenConfig) -> anyhow::Result<WardenConfig> {
        let mut config = config.clone();
        if let Some(algorithm) = self.algorithm {
            config.signing.set_algorithm(algorithm);
        }
        if let Some(secret) = &self.secret {
            config.signing.inline.secret = Some(secret.clone());
        }
        if let Some(value) = &self.private_key {
            config.signing.inline.private_key = Some(resolve_key_source(value)?);
        }
        if let Some(value) = &self.public_key {
            config.signing.inline.public_key = Some(resolve_key_source(value)?);
        }
        Ok(config)
    }
}

/// Read a key from a file path, or take the value itself as PEM.
fn resolve_key_source(value: &str) -> anyhow::Result<String> {
    let path = Path::new(value);
    if path.exists() {
        return fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file: {}", path.display()));
    }
    Ok(value.to_string())
}

/// Token string, or the contents of the file it names.
fn resolve_token(token: String) -> anyhow::Result<String> {
    if Path::new(&token).exists() {
        return Ok(fs::read_to_string(&token)?.trim().to_string());
    }
    Ok(token.trim().to_string())
}

const KEY_HINT: &str = "Pass --secret / --private-key / --public-key, \
    set WARDEN_SECRET / WARDEN_PRIVATE_KEY / WARDEN_PUBLIC_KEY, or configure the signing section";

/// Parse `key=value`; the value is JSON when it parses, otherwise a string.
fn parse_claim(spec: &str) -> anyhow::Result<(String, Value)> {
    let (name, raw) = spec
        .split_once('=')
        .with_context(|| format!("Invalid claim {spec:?}. Expected key=value"))?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "Invalid claim {spec:?}. Claim name is empty");

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((name.to_string(), value))
}

/// Issue a new token.
pub fn issue(config: &WardenConfig, keys: &KeyArgs, args: IssueArgs) -> anyhow::Result<()> {
    let mut config = keys.apply(config)?;
    if let Some(name) = &args.issuer {
        config.issuer = name.clone();
    }
    let issuer = config
        .build_issuer()
        .with_context(|| format!("Failed to configure token issuer. {KEY_HINT}"))?;

    let mut custom = Map::new();
    for spec in &args.claims {
        let (claim, value) = parse_claim(spec)?;
        custom.insert(claim, value);
    }

    let ttl = match &args.ttl {
        Some(ttl) => Some(parse_duration(ttl)?),
        None => config.defaults.ttl,
    };
    let not_before = args
        .not_before
        .as_deref()
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("Invalid --nbf {s:?}. Expected RFC 3339"))
        })
        .transpose()?;

    let request = ClaimsRequest {
        subject: args.subject.clone().unwrap_or_default(),
        audience: args.audience.clone(),
        custom,
        ttl,
        not_before,
    };
    let token = issuer.issue(&request).context("Failed to issue token")?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &token)?;
        println!("✔ Token written to: {}", output_path.display());
        println!("  Algorithm: {}", issuer.algorithm());
        println!("  Issuer: {}", config.issuer);
        if let Some(sub) = &args.subject {
            println!("  Subject: {sub}");
        }
        if let Some(ttl) = &args.ttl {
            println!("  Expires in: {ttl}");
        }
    } else {
        println!("{token}");
    }

    Ok(())
}

/// Verify a token and print its claims.
pub fn verify(
    config: &WardenConfig,
    keys: &KeyArgs,
    leeway: Option<String>,
    token: String,
) -> anyhow::Result<()> {
    let mut config = keys.apply(config)?;
    if let Some(leeway) = leeway {
        config.validation.leeway = Some(parse_duration(&leeway)?);
    }
    let verifier = config
        .build_verifier()
        .with_context(|| format!("Failed to configure token verifier. {KEY_HINT}"))?;
    let token = resolve_token(token)?;

    match verifier.verify(&token) {
        Ok(claims) => {
            println!("✔ Token is valid");
            println!();
            println!("Claims:");
            println!("{}", serde_json::to_string_pretty(&claims)?);
            if let Some(exp) = claims.expires_at() {
                println!();
                println!("  Expires: {}", exp.to_rfc3339());
            }
            Ok(())
        }
        Err(e) => anyhow::bail!("✖ Token verification failed: {e}"),
    }
}

/// Decode a token without verification.
pub fn inspect(token: String) -> anyhow::Result<()> {
    let token = resolve_token(token)?;
    let info = inspect_token_unverified(&token)?;

    println!("⚠️  Signature NOT verified. Do not trust these contents.");
    println!();
    println!("Header:");
    println!("{}", serde_json::to_string_pretty(&info.header)?);
    println!();
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(&info.claims)?);
    println!();
    println!("  Signed: {}", if info.signed { "yes" } else { "no" });

    Ok(())
}
