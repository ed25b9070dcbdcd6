//! clusterjoin node startup

use std::process::ExitCode;
use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use clusterjoin_node::{
    parse_args, Config, EnrollmentDecisionEngine, ExitClass, FsConfigurationState,
    HttpEnrollmentClient, DEFAULT_LOG_FILTER,
};

#[tokio::main]
async fn main() -> ExitCode {
    // Logs go to stderr so stdout carries only the outcome
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let (args, flag) = match parse_args(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(e) => {
            if let Err(print_err) = e.print() {
                tracing::warn!(error = %print_err, "Failed to print usage");
            }
            return if e.use_stderr() {
                ExitClass::Usage.into()
            } else {
                ExitClass::Ok.into()
            };
        }
    };

    let config = Config::from(&args);
    info!(
        config_dir = %config.config_dir.display(),
        node_version = %config.node_version,
        enrollment_requested = flag.is_present(),
        "Starting clusterjoin node"
    );

    let engine = EnrollmentDecisionEngine::new(
        Arc::new(FsConfigurationState::new(&config.config_dir)),
        Arc::new(HttpEnrollmentClient::new(&config)),
    );
    let outcome = engine.run(&flag).await;

    if let Some(message) = &outcome.message {
        if outcome.class.is_failure() {
            eprintln!("ERROR: {}", message);
        } else {
            println!("{}", message);
        }
    }

    info!(class = ?outcome.class, code = outcome.class.code(), "Node startup finished");
    outcome.class.into()
}
