use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid grid dimensions: {rows}x{cols}")]
    InvalidDimensions { rows: usize, cols: usize },

    #[error("cell ({row}, {col}) is outside the grid")]
    OutOfBounds { row: usize, col: usize },

    #[error("start and end cannot share cell ({row}, {col})")]
    EndpointsOverlap { row: usize, col: usize },

    #[error("step index {index} out of range for a trace of {len} steps")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("solve request failed: {0}")]
    SolveRequestFailed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid configuration: {message}")]
    Config { message: String },
}

impl AppError {
    #[must_use]
    pub fn solve_failed(message: impl Into<String>) -> Self {
        Self::SolveRequestFailed(message.into())
    }

    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Errors the user is expected to see and recover from. Everything else is
    /// a broken invariant and should stop the program.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::SolveRequestFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::AppError;

    #[test]
    fn only_solve_failures_are_recoverable() {
        assert!(AppError::solve_failed("connection refused").is_recoverable());
        assert!(!AppError::OutOfBounds { row: 9, col: 9 }.is_recoverable());
        assert!(!AppError::IndexOutOfRange { index: 3, len: 3 }.is_recoverable());
    }

    #[test]
    fn messages_name_the_offending_values() {
        let error = AppError::InvalidDimensions { rows: 0, cols: 4 };
        assert_eq!(error.to_string(), "invalid grid dimensions: 0x4");

        let error = AppError::solve_failed("backend returned 500");
        assert_eq!(error.to_string(), "solve request failed: backend returned 500");
    }
}
