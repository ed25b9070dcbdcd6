//! clusterjoin Node Library
//!
//! Startup-time enrollment of a fresh node into a secured cluster: parsing
//! of the `--enrollment-token` flag, the decision of whether enrollment
//! proceeds, and the collaborators that report local state and talk to the
//! cluster.

pub mod args;
pub mod client;
pub mod config;
pub mod decision;
pub mod exit;
pub mod state;

pub use args::{parse_args, Args, EnrollmentFlag};
pub use client::{EnrollmentAttempt, EnrollmentError, EnrollmentReport, HttpEnrollmentClient};
pub use config::{Config, DEFAULT_LOG_FILTER};
pub use decision::{Decision, EnrollmentDecisionEngine, Outcome};
pub use exit::ExitClass;
pub use state::{ConfigurationStateProvider, FsConfigurationState, StateError};
