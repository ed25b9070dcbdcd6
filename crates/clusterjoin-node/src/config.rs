//! Node enrollment configuration.

use std::path::PathBuf;
use std::time::Duration;

use semver::Version;

use crate::args::Args;

/// Log filter used when `RUST_LOG` is unset. Matches every `clusterjoin*` crate.
pub const DEFAULT_LOG_FILTER: &str = "clusterjoin=info";

/// Node enrollment configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the node's configuration and security material.
    pub config_dir: PathBuf,

    /// Version of this node.
    pub node_version: Version,

    /// Connect timeout per cluster address (seconds).
    pub connect_timeout_secs: u64,

    /// Request timeout per cluster address (seconds).
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("config"),
            node_version: Version::parse(env!("CARGO_PKG_VERSION"))
                .unwrap_or_else(|_| Version::new(0, 0, 0)),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl From<&Args> for Config {
    fn from(args: &Args) -> Self {
        Self {
            config_dir: args.config_dir.clone(),
            node_version: args.node_version.clone(),
            connect_timeout_secs: args.connect_timeout_secs,
            request_timeout_secs: args.request_timeout_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::Level;
    use tracing_subscriber::filter::Targets;

    #[test]
    fn test_default_log_filter_covers_workspace_crates() {
        assert!(tracing_subscriber::EnvFilter::try_new(DEFAULT_LOG_FILTER).is_ok());

        let targets: Targets = DEFAULT_LOG_FILTER.parse().unwrap();
        for target in ["clusterjoin_node::decision", "clusterjoin_core::token", "clusterjoin"] {
            assert!(targets.would_enable(target, &Level::INFO), "target: {}", target);
            assert!(!targets.would_enable(target, &Level::DEBUG), "target: {}", target);
        }
        assert!(!targets.would_enable("reqwest::connect", &Level::INFO));
    }

    #[test]
    fn test_config_from_args() {
        let (args, _) = crate::args::parse_args([
            "clusterjoin-node",
            "--config-dir",
            "/etc/node",
            "--connect-timeout-secs",
            "3",
        ])
        .unwrap();
        let config = Config::from(&args);
        assert_eq!(config.config_dir, PathBuf::from("/etc/node"));
        assert_eq!(config.connect_timeout(), Duration::from_secs(3));
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }
}
