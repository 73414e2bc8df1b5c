use thiserror::Error;

/// Errors raised by the curve core (autodiff, segments, chains, training).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// A node was about to be created with a NaN value.
    ///
    /// This signals corrupted arithmetic upstream and is not recoverable.
    #[error("invalid value: `{op}` produced NaN")]
    InvalidValue { op: &'static str },

    /// Strict evaluation was requested outside the chain's covered x-range.
    #[error("x={x} lies outside the chain domain [{start}, {end}]")]
    DomainExceeded { x: f64, start: f64, end: f64 },

    /// Training inputs are unusable (length mismatch, too few samples, ...).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every exploration restart diverged.
    #[error("none of the {restarts} exploration restarts produced a finite score")]
    NoCandidate { restarts: usize },
}

/// Application-level error carrying the process exit code.
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
}

impl From<CurveError> for AppError {
    fn from(err: CurveError) -> Self {
        let exit_code = match err {
            CurveError::InvalidInput(_) => 3,
            CurveError::InvalidValue { .. }
            | CurveError::DomainExceeded { .. }
            | CurveError::NoCandidate { .. } => 4,
        };
        AppError::new(exit_code, err.to_string())
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn curve_errors_map_to_exit_codes() {
        let input: AppError = CurveError::InvalidInput("no samples".to_string()).into();
        assert_eq!(input.exit_code(), 3);
        assert_eq!(input.to_string(), "invalid input: no samples");

        let nan: AppError = CurveError::InvalidValue { op: "div" }.into();
        assert_eq!(nan.exit_code(), 4);
        assert_eq!(nan.to_string(), "invalid value: `div` produced NaN");
    }
}
