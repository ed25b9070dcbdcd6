//! Process exit classes.
//!
//! The class is what callers rely on. The numeric codes follow the BSD
//! sysexits convention, but a launcher wrapping the process may collapse
//! them (some Windows service wrappers report every failure as 1).

use std::process::ExitCode;

/// Terminal classification of a node startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitClass {
    /// Enrollment not requested, or enrollment succeeded.
    Ok,
    /// Generic failure, e.g. the enrollment flag was repeated.
    Failure,
    /// The enrollment flag was given without a value.
    Usage,
    /// The enrollment token could not be decoded.
    DataError,
    /// The cluster could not be enrolled with.
    EnrollmentFailed,
    /// Local configuration state could not be read.
    IoError,
    /// The node is already configured; nothing was done.
    Noop,
}

impl ExitClass {
    /// Numeric process exit code.
    pub fn code(&self) -> u8 {
        match self {
            Self::Ok => 0,
            Self::Failure => 1,
            Self::Usage => 64,
            Self::DataError => 65,
            Self::EnrollmentFailed => 69,
            Self::IoError => 74,
            Self::Noop => 80,
        }
    }

    /// Returns true for classes that indicate the process did not do its job.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Ok | Self::Noop)
    }
}

impl From<ExitClass> for ExitCode {
    fn from(class: ExitClass) -> Self {
        ExitCode::from(class.code())
    }
}
