use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::keys::KeyKind;
use commands::token::KeyArgs;

#[derive(Parser, Debug)]
#[command(name = "warden", version, about = "Warden token CLI")]
struct Cli {
    /// Path to warden.yaml. Flags override values from the file.
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Key management
    Keys {
        #[command(subcommand)]
        cmd: KeysCommand,
    },

    /// Issue, verify, and inspect tokens
    Token {
        #[command(subcommand)]
        cmd: TokenCommand,
    },
}

#[derive(Subcommand, Debug)]
enum KeysCommand {
    /// Generate an HMAC secret or an RSA keypair.
    Generate {
        #[arg(long, value_enum, default_value_t = KeyKind::Hmac)]
        kind: KeyKind,

        /// RSA modulus size in bits
        #[arg(long, default_value_t = 2048)]
        bits: usize,

        /// HMAC secret length in bytes
        #[arg(long, default_value_t = 64)]
        length: usize,

        /// Directory to write key files into. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    /// Issue a new token.
    Issue {
        #[command(flatten)]
        keys: KeyArgs,

        /// Issuer name (`iss`)
        #[arg(long)]
        issuer: Option<String>,

        /// Subject (`sub`)
        #[arg(long)]
        sub: Option<String>,

        /// Audience (`aud`); repeatable
        #[arg(long)]
        aud: Vec<String>,

        /// Custom claim as key=value; the value is parsed as JSON when possible
        #[arg(long)]
        claim: Vec<String>,

        /// Lifetime (e.g., "15m", "24h", "7d")
        #[arg(long)]
        ttl: Option<String>,

        /// Not-before instant (RFC 3339)
        #[arg(long)]
        nbf: Option<String>,

        /// Write the token to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Verify a token and print its claims.
    Verify {
        #[command(flatten)]
        keys: KeyArgs,

        /// Clock skew allowance (e.g., "30s"), at most 5m
        #[arg(long)]
        leeway: Option<String>,

        /// Token string or path to a file containing it
        token: String,
    },

    /// Decode a token WITHOUT verifying it.
    Inspect {
        /// Token string or path to a file containing it
        token: String,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_deref())?;

    match cli.cmd {
        Command::Keys { cmd } => match cmd {
            KeysCommand::Generate {
                kind,
                bits,
                length,
                output,
            } => commands::keys::generate(kind, bits, length, output)?,
        },

        Command::Token { cmd } => match cmd {
            TokenCommand::Issue {
                keys,
                issuer,
                sub,
                aud,
                claim,
                ttl,
                nbf,
                output,
            } => commands::token::issue(
                &config,
                &keys,
                commands::token::IssueArgs {
                    issuer,
                    subject: sub,
                    audience: aud,
                    claims: claim,
                    ttl,
                    not_before: nbf,
                    output,
                },
            )?,
            TokenCommand::Verify {
                keys,
                leeway,
                token,
            } => commands::token::verify(&config, &keys, leeway, token)?,
            TokenCommand::Inspect { token } => commands::token::inspect(token)?,
        },
    }

    Ok(())
}
