use thiserror::Error;

/// Application-level error: a process exit code plus a human-readable message.
///
/// Exit codes:
/// - `2`: bad input (arguments, files, malformed tables or intervals)
/// - `3`: an event fell outside pointing coverage under the strict policy
/// - `4`: internal/state errors in the response builder
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

/// Failures raised by the interval, cursor, binning and response components.
///
/// These are always reported to the immediate caller; nothing in the core
/// retries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Interval or partition bounds are malformed.
    #[error("invalid range [{start}, {stop}): {reason}")]
    InvalidRange {
        start: f64,
        stop: f64,
        reason: &'static str,
    },

    /// Bound query on an interval set with no intervals.
    #[error("interval set is empty")]
    EmptySet,

    /// Time not covered by the pointing table.
    #[error("{reason} (t={time})")]
    Coverage { time: f64, reason: &'static str },

    /// Response queried before normalization.
    #[error("response matrix has not been finalized")]
    NotFinalized,

    /// Response mutated or normalized after normalization.
    #[error("response matrix is already finalized")]
    AlreadyFinalized,

    /// Value outside the binner domain.
    #[error("value {value} is outside bin range [{lo}, {hi}]")]
    BinRange { value: f64, lo: f64, hi: f64 },

    /// Normalization of a true-energy bin with no generated events.
    #[error("no generated events recorded for true-energy bin {bin}")]
    ZeroGenerated { bin: usize },

    /// Row override with the wrong number of measured bins.
    #[error("response row has {got} entries, expected {expected}")]
    RowLength { expected: usize, got: usize },

    /// Generated-event totals exceed `u64::MAX`.
    #[error("generated event count overflows for true-energy bin {bin}")]
    GeneratedOverflow { bin: usize },

    /// Spectral weight of a true-energy bin is not a positive finite number.
    #[error("spectral weight {weight} of true-energy bin {bin} is not positive and finite")]
    InvalidWeight { bin: usize, weight: f64 },

    /// Two builders with different binnings cannot be merged.
    #[error("cannot merge response builders with different binnings")]
    BinningMismatch,

    /// A pointing table needs at least one record.
    #[error("pointing table has no records")]
    EmptyTable,

    /// Pointing records must be sorted by start time.
    #[error("pointing record {index} starts before its predecessor")]
    UnsortedTable { index: usize },
}

impl CoreError {
    /// Exit code used when this error aborts a run.
    pub fn exit_code(&self) -> u8 {
        match self {
            CoreError::InvalidRange { .. }
            | CoreError::EmptySet
            | CoreError::BinRange { .. }
            | CoreError::RowLength { .. }
            | CoreError::GeneratedOverflow { .. }
            | CoreError::InvalidWeight { .. }
            | CoreError::EmptyTable
            | CoreError::UnsortedTable { .. } => 2,
            CoreError::Coverage { .. } => 3,
            CoreError::NotFinalized
            | CoreError::AlreadyFinalized
            | CoreError::ZeroGenerated { .. }
            | CoreError::BinningMismatch => 4,
        }
    }
}

impl From<CoreError> for AppError {
    fn from(err: CoreError) -> Self {
        AppError::new(err.exit_code(), err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coverage_errors_map_to_exit_code_3() {
        let err: AppError = CoreError::Coverage {
            time: 12.5,
            reason: "time exceeds pointing coverage",
        }
        .into();
        assert_eq!(err.exit_code(), 3);
        assert!(err.message().contains("t=12.5"));
    }

    #[test]
    fn construction_errors_map_to_exit_code_2() {
        let err = CoreError::InvalidRange {
            start: 5.0,
            stop: 1.0,
            reason: "start must precede stop",
        };
        assert_eq!(AppError::from(err).exit_code(), 2);
        assert_eq!(AppError::from(CoreError::EmptySet).exit_code(), 2);
    }
}
