//! Application error type.
//!
//! Every failure that reaches `main` is an `AppError`: a message for stderr and
//! the process exit code.
//!
//! Exit codes:
//! - `2`: invalid input, configuration, or file I/O
//! - `3`: missing data (no histogram in a file, too few populated bins)
//! - `4`: numeric failure (fit did not converge, singular covariance)
//! - `5`: chart rendering failure

use crate::fit::FitError;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<FitError> for AppError {
    fn from(err: FitError) -> Self {
        let code = match err {
            FitError::TooFewPoints { .. } => 3,
            _ => 4,
        };
        AppError::new(code, format!("Gaussian fit failed: {err}"))
    }
}
