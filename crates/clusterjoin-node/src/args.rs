//! Command line arguments for node startup.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{ArgAction, ArgMatches, CommandFactory, FromArgMatches, Parser};
use semver::Version;

/// Clap id of the enrollment token argument.
const ENROLLMENT_TOKEN_ID: &str = "enrollment_token";

/// clusterjoin node startup.
#[derive(Parser, Debug)]
#[command(
    name = "clusterjoin-node",
    about = "Start a node, optionally enrolling it into an existing secured cluster"
)]
pub struct Args {
    /// Node configuration directory
    #[arg(long, default_value = "config")]
    pub config_dir: PathBuf,

    /// Version of this node, checked against the enrollment token
    #[arg(long, default_value = env!("CARGO_PKG_VERSION"))]
    pub node_version: Version,

    /// Connect timeout per cluster address (seconds)
    #[arg(long, default_value_t = 10)]
    pub connect_timeout_secs: u64,

    /// Request timeout per cluster address (seconds)
    #[arg(long, default_value_t = 30)]
    pub request_timeout_secs: u64,

    /// Enrollment token generated by an existing cluster node
    #[arg(
        long = "enrollment-token",
        value_name = "TOKEN",
        num_args = 0..,
        default_missing_value = "",
        action = ArgAction::Append
    )]
    pub enrollment_token: Vec<String>,
}

/// How `--enrollment-token` appeared on the command line.
///
/// The number of times the flag was given and the values that followed its
/// first occurrence are kept apart, so that `--enrollment-token A B` and
/// `--enrollment-token A --enrollment-token B` stay distinguishable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnrollmentFlag {
    pub occurrence_count: usize,
    pub first_occurrence_values: Vec<String>,
}

impl EnrollmentFlag {
    /// Build from already parsed matches.
    pub fn from_matches(matches: &ArgMatches) -> Self {
        let Some(occurrences) = matches.get_occurrences::<String>(ENROLLMENT_TOKEN_ID) else {
            return Self::default();
        };

        let mut flag = Self::default();
        for values in occurrences {
            if flag.occurrence_count == 0 {
                flag.first_occurrence_values = values.cloned().collect();
            }
            flag.occurrence_count += 1;
        }
        flag
    }

    /// Returns true if the flag was given at all.
    pub fn is_present(&self) -> bool {
        self.occurrence_count > 0
    }
}

/// Parse the process arguments into [`Args`] and the raw [`EnrollmentFlag`].
pub fn parse_args<I, T>(argv: I) -> Result<(Args, EnrollmentFlag), clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command().try_get_matches_from(argv)?;
    let args = Args::from_arg_matches(&matches)?;
    let flag = EnrollmentFlag::from_matches(&matches);
    Ok((args, flag))
}
