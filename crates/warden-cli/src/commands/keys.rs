//! Key management commands.
//!
//! `warden keys generate` - Generate an HMAC secret or an RSA keypair.

use anyhow::Context;
use clap::ValueEnum;
use std::fs;
use std::path::PathBuf;
use warden_jwt::keys::{
    generate_rsa_keypair, generate_symmetric_key, private_key_to_pem, public_key_to_pem,
};

/// Kind of key material to generate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KeyKind {
    /// Shared secret for HS256 / HS384 / HS512
    Hmac,
    /// RSA keypair for RS256 / RS384 / RS512
    Rsa,
}

/// Generate new key material.
pub fn generate(
    kind: KeyKind,
    bits: usize,
    length: usize,
    output: Option<PathBuf>,
) -> anyhow::Result<()> {
    match kind {
        KeyKind::Hmac => generate_hmac(length, output),
        KeyKind::Rsa => generate_rsa(bits, output),
    }
}

fn generate_hmac(length: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let secret = generate_symmetric_key(length).context("Failed to generate HMAC secret")?;
    let encoded = secret.to_base64();

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let secret_path = output_dir.join("hmac.key");
        fs::write(&secret_path, &encoded)?;

        println!("✔ Generated HMAC secret ({length} bytes):");
        println!("  Secret: {}", secret_path.display());
        println!();
        println!("⚠️  Keep your secret secure! Never commit it to version control.");
        println!();
        println!("Set as environment variable:");
        println!("  export WARDEN_SECRET=$(cat {})", secret_path.display());
    } else {
        println!("HMAC secret (keep secure!):");
        println!("{encoded}");
        println!();
        println!("Use --output <dir> to save the secret to a file.");
    }

    Ok(())
}

fn generate_rsa(bits: usize, output: Option<PathBuf>) -> anyhow::Result<()> {
    let (private_key, public_key) =
        generate_rsa_keypair(bits).context("Failed to generate RSA keypair")?;
    let private_pem = private_key_to_pem(&private_key)?;
    let public_pem = public_key_to_pem(&public_key)?;

    if let Some(output_dir) = output {
        fs::create_dir_all(&output_dir)?;

        let private_path = output_dir.join("private.pem");
        let public_path = output_dir.join("public.pem");

        fs::write(&private_path, private_pem.as_bytes())?;
        fs::write(&public_path, &public_pem)?;

        println!("✔ Generated RSA-{bits} keypair:");
        println!("  Private key: {}", private_path.display());
        println!("  Public key:  {}", public_path.display());
        println!();
        println!("⚠️  Keep your private key secure! Never commit it to version control.");
        println!();
        println!("Set as environment variables:");
        println!(
            "  export WARDEN_PRIVATE_KEY=\"$(cat {})\"",
            private_path.display()
        );
        println!(
            "  export WARDEN_PUBLIC_KEY=\"$(cat {})\"",
            public_path.display()
        );
    } else {
        println!("Private key (keep secure!):");
        println!("{}", private_pem.as_str());
        println!("Public key:");
        println!("{public_pem}");
        println!("Use --output <dir> to save keys to files.");
    }

    Ok(())
}
