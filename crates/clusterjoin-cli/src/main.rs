//! clusterjoin CLI - issue and inspect enrollment tokens.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgGroup, Parser, Subcommand};
use semver::Version;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use clusterjoin_core::{ApiKey, EnrollmentToken, Fingerprint};

mod error;
mod fingerprint;

use error::CliError;
use fingerprint::fingerprint_from_pem;

/// clusterjoin CLI - Enrollment token tool
#[derive(Parser, Debug)]
#[command(name = "clusterjoin")]
#[command(about = "Issue and inspect node enrollment tokens", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an enrollment token for a new node
    #[command(name = "create-token")]
    #[command(group(ArgGroup::new("anchor").required(true).args(["ca_cert", "fingerprint"])))]
    CreateToken {
        /// API key authorized to enroll nodes
        #[arg(long)]
        api_key: String,

        /// PEM file holding the cluster's HTTP CA certificate
        #[arg(long)]
        ca_cert: Option<PathBuf>,

        /// SHA-256 fingerprint of the cluster's HTTP CA certificate
        #[arg(long)]
        fingerprint: Option<String>,

        /// Version of the issuing cluster
        #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
        node_version: Version,

        /// Cluster address (host:port); repeat for more, in the order nodes should try them
        #[arg(long = "address", required = true)]
        addresses: Vec<String>,
    },

    /// Show the non-secret contents of an enrollment token
    #[command(name = "inspect-token")]
    InspectToken {
        /// Encoded enrollment token
        token: String,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("clusterjoin=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli.command) {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Command failed");
            eprintln!("ERROR: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn run(command: Commands) -> Result<String, CliError> {
    match command {
        Commands::CreateToken {
            api_key,
            ca_cert,
            fingerprint,
            node_version,
            addresses,
        } => create_token(api_key, ca_cert, fingerprint, node_version, addresses),
        Commands::InspectToken { token } => inspect_token(&token),
    }
}

fn create_token(
    api_key: String,
    ca_cert: Option<PathBuf>,
    fingerprint: Option<String>,
    node_version: Version,
    addresses: Vec<String>,
) -> Result<String, CliError> {
    let api_key = ApiKey::new(api_key).ok_or(CliError::EmptyApiKey)?;

    let fingerprint = match (ca_cert, fingerprint) {
        (Some(path), _) => {
            let pem_text = std::fs::read_to_string(&path)
                .map_err(|source| CliError::Read { path: path.clone(), source })?;
            debug!(path = %path.display(), "Fingerprinting CA certificate");
            fingerprint_from_pem(&pem_text)?
        }
        (None, Some(hex)) => Fingerprint::parse(&hex).ok_or(CliError::InvalidFingerprint)?,
        (None, None) => return Err(CliError::InvalidFingerprint),
    };

    let token = EnrollmentToken::new(api_key, fingerprint, node_version, addresses)
        .map_err(|_| CliError::InvalidAddress)?;

    Ok(format!("{}\n", token.encode()))
}

fn inspect_token(raw: &str) -> Result<String, CliError> {
    let token = EnrollmentToken::decode(raw.trim())?;

    let addresses: String = token
        .bound_addresses()
        .iter()
        .map(|address| format!("  {}\n", address))
        .collect();

    Ok(format!(
        "Version:     {}\nFingerprint: {}\nAddresses:\n{}",
        token.version(),
        token.fingerprint(),
        addresses
    ))
}
