//! Startup enrollment decision.
//!
//! Rules are applied in order:
//!
//! 1. flag repeated → generic failure, nothing is decoded
//! 2. only the first value after the flag is the token, the rest are ignored
//! 3. empty value → usage error
//! 4. token does not decode → data error
//! 5. node already configured → no-op
//! 6. otherwise enroll, and the client's result decides the exit class

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use clusterjoin_core::EnrollmentToken;

use crate::args::EnrollmentFlag;
use crate::client::EnrollmentAttempt;
use crate::exit::ExitClass;
use crate::state::ConfigurationStateProvider;

/// Message reported when the enrollment flag is given more than once.
pub const MULTIPLE_TOKENS_MESSAGE: &str = "Multiple --enrollment-token parameters are not allowed";

/// Outcome of evaluating the enrollment flag against local state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Flag absent; the node starts normally.
    NotRequested,
    /// Flag given more than once.
    MultipleOccurrences,
    /// Flag given without a value.
    UsageError(String),
    /// Value is not a valid enrollment token.
    DataError(String),
    /// Local configuration state could not be read.
    StateUnavailable(String),
    /// Node is already configured; enrollment does not apply.
    NoOp(String),
    /// Enroll with this token.
    Proceed(EnrollmentToken),
}

impl Decision {
    /// Exit class of a terminal decision. `Proceed` has none until the client has run.
    pub fn exit_class(&self) -> Option<ExitClass> {
        match self {
            Self::NotRequested => Some(ExitClass::Ok),
            Self::MultipleOccurrences => Some(ExitClass::Failure),
            Self::UsageError(_) => Some(ExitClass::Usage),
            Self::DataError(_) => Some(ExitClass::DataError),
            Self::StateUnavailable(_) => Some(ExitClass::IoError),
            Self::NoOp(_) => Some(ExitClass::Noop),
            Self::Proceed(_) => None,
        }
    }

    /// Operator-facing message, if any.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::MultipleOccurrences => Some(MULTIPLE_TOKENS_MESSAGE),
            Self::UsageError(msg)
            | Self::DataError(msg)
            | Self::StateUnavailable(msg)
            | Self::NoOp(msg) => Some(msg),
            Self::NotRequested | Self::Proceed(_) => None,
        }
    }
}

/// Final result of a startup run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub class: ExitClass,
    pub message: Option<String>,
}

impl Outcome {
    fn new(class: ExitClass, message: Option<String>) -> Self {
        Self { class, message }
    }
}

/// Decides whether a starting node enrolls, and runs the enrollment.
pub struct EnrollmentDecisionEngine {
    state: Arc<dyn ConfigurationStateProvider>,
    attempt: Arc<dyn EnrollmentAttempt>,
}

impl EnrollmentDecisionEngine {
    pub fn new(
        state: Arc<dyn ConfigurationStateProvider>,
        attempt: Arc<dyn EnrollmentAttempt>,
    ) -> Self {
        Self { state, attempt }
    }

    /// Evaluate the flag without contacting the cluster.
    pub fn decide(&self, flag: &EnrollmentFlag) -> Decision {
        if !flag.is_present() {
            debug!("No enrollment token supplied");
            return Decision::NotRequested;
        }

        if flag.occurrence_count > 1 {
            warn!(occurrences = flag.occurrence_count, "{}", MULTIPLE_TOKENS_MESSAGE);
            return Decision::MultipleOccurrences;
        }

        let raw = flag
            .first_occurrence_values
            .first()
            .map(String::as_str)
            .unwrap_or_default();
        let ignored = flag.first_occurrence_values.len().saturating_sub(1);
        if ignored > 0 {
            debug!(ignored, "Ignoring extra values after the enrollment token");
        }

        if raw.is_empty() {
            return Decision::UsageError(
                "--enrollment-token requires a token value".to_string(),
            );
        }

        let token = match EnrollmentToken::decode(raw) {
            Ok(token) => token,
            Err(e) => {
                error!(kind = ?e.kind(), field = ?e.field(), "Invalid enrollment token");
                return Decision::DataError(format!("Invalid enrollment token: {}", e));
            }
        };

        match self.state.is_auto_configured() {
            Ok(true) => {
                info!("Skipping enrollment: node already has security configured");
                Decision::NoOp(
                    "Skipping enrollment because this node is already configured".to_string(),
                )
            }
            Ok(false) => Decision::Proceed(token),
            Err(e) => {
                error!(error = %e, "Unable to determine node configuration state");
                Decision::StateUnavailable(format!(
                    "Unable to determine node configuration state: {}",
                    e
                ))
            }
        }
    }

    /// Decide, then enroll if the decision is to proceed.
    pub async fn run(&self, flag: &EnrollmentFlag) -> Outcome {
        let token = match self.decide(flag) {
            Decision::Proceed(token) => token,
            decision => {
                let class = decision.exit_class().unwrap_or(ExitClass::Failure);
                return Outcome::new(class, decision.message().map(str::to_owned));
            }
        };

        info!(
            version = %token.version(),
            addresses = token.bound_addresses().len(),
            "Enrolling node into cluster"
        );

        match self.attempt.enroll(&token).await {
            Ok(report) => Outcome::new(
                ExitClass::Ok,
                Some(format!("Node enrolled via {}", report.address)),
            ),
            Err(e) => {
                error!(error = %e, "Enrollment failed");
                Outcome::new(
                    ExitClass::EnrollmentFailed,
                    Some(format!("Enrollment failed: {}", e)),
                )
            }
        }
    }
}
