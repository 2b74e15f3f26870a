//! Error type for sequence operations.

use thiserror::Error;

/// Errors reported by [`PersistentSequence`](super::PersistentSequence)
/// operations.
///
/// Every error is reported synchronously at the call site and the receiver
/// sequence is left untouched; there is no partial mutation to undo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// An index fell outside `[-len, len)` for an operation that requires
    /// an existing element.
    #[error("index {index} out of range for sequence of length {length}")]
    IndexOutOfRange {
        /// The index as given by the caller, before normalization.
        index: isize,
        /// The length of the sequence at the time of the call.
        length: usize,
    },

    /// A stepped operation was given a step (or chunk size) of zero.
    #[error("step must be nonzero")]
    ZeroStep,

    /// The positions passed to a multi-way view were not strictly
    /// ascending.
    #[error("view positions must be in ascending order")]
    UnsortedIndices,

    /// A value-based search found no matching element.
    #[error("value not found in sequence")]
    ValueAbsent,

    /// A stepped replacement received a number of values different from
    /// the number of selected positions.
    #[error("expected {expected} replacement values but got {actual}")]
    LengthMismatch {
        /// Number of positions selected by the slice.
        expected: usize,
        /// Number of replacement values supplied.
        actual: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::SequenceError;
    use rstest::rstest;

    #[rstest]
    fn test_error_display() {
        let error = SequenceError::IndexOutOfRange {
            index: -5,
            length: 3,
        };
        assert_eq!(
            error.to_string(),
            "index -5 out of range for sequence of length 3"
        );
        assert_eq!(SequenceError::ZeroStep.to_string(), "step must be nonzero");
        assert_eq!(
            SequenceError::LengthMismatch {
                expected: 3,
                actual: 1
            }
            .to_string(),
            "expected 3 replacement values but got 1"
        );
    }

    #[rstest]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<SequenceError>();
    }
}
