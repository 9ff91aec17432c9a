use std::path::PathBuf;
use thiserror::Error;

pub mod beam;
pub mod ffi;
pub mod logging;
pub mod modelica;
pub mod study;
pub mod test_utils;

/// Broad classes of evaluation failure.
///
/// Hosts that receive a status code can use this to decide whether a failure is worth retrying.
/// A shape error is a caller bug and will fail again with the same buffers, whereas an external
/// failure depends on the filesystem or the embedded runtime.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied buffers of the wrong size or invalid pointers.
    Shape,
    /// The study archive, the framework module or the loaded function failed.
    External,
    /// A panic was caught before it reached the C boundary.
    Internal,
}

#[derive(Error, Debug)]
pub enum EvaluatorError {
    #[error("expected an input vector of length {expected}, found {found}")]
    InputDimension { expected: usize, found: usize },
    #[error("expected an output vector of length {expected}, found {found}")]
    OutputDimension { expected: usize, found: usize },
    #[error("negative length `{length}` given for the {argument} buffer")]
    NegativeLength { argument: &'static str, length: i64 },
    #[error("null pointer given for the {argument} buffer of length {length}")]
    NullPointer { argument: &'static str, length: usize },
    #[error("study archive not found: `{}`", .path.display())]
    StudyNotFound { path: PathBuf },
    #[cfg(feature = "pyo3")]
    #[error("Python error while {context}: {py_error}")]
    Python {
        context: String,
        #[source]
        py_error: Box<pyo3::PyErr>,
    },
    #[error("evaluation panicked: {message}")]
    Panic { message: String },
}

impl EvaluatorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InputDimension { .. }
            | Self::OutputDimension { .. }
            | Self::NegativeLength { .. }
            | Self::NullPointer { .. } => ErrorKind::Shape,
            Self::StudyNotFound { .. } => ErrorKind::External,
            #[cfg(feature = "pyo3")]
            Self::Python { .. } => ErrorKind::External,
            Self::Panic { .. } => ErrorKind::Internal,
        }
    }
}

/// A function of a fixed-size real input vector to a real output vector.
///
/// Implementations write into a caller-owned output buffer and never keep a reference to either
/// buffer after returning. On error the output buffer is left untouched.
pub trait Evaluator {
    /// A short name used in log messages.
    fn name(&self) -> &str;

    fn evaluate(&self, x: &[f64], y: &mut [f64]) -> Result<(), EvaluatorError>;

    /// Evaluate into a newly allocated vector of length `nout`.
    fn evaluate_point(&self, x: &[f64], nout: usize) -> Result<Vec<f64>, EvaluatorError> {
        let mut y = vec![0.0; nout];
        self.evaluate(x, &mut y)?;
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        let shape = EvaluatorError::OutputDimension { expected: 2, found: 1 };
        assert_eq!(shape.kind(), ErrorKind::Shape);

        let external = EvaluatorError::StudyNotFound {
            path: PathBuf::from("/no/such/study.xml"),
        };
        assert_eq!(external.kind(), ErrorKind::External);
        assert_eq!(external.to_string(), "study archive not found: `/no/such/study.xml`");

        let internal = EvaluatorError::Panic {
            message: "boom".to_string(),
        };
        assert_eq!(internal.kind(), ErrorKind::Internal);
    }
}
