//! Evaluation of a function object stored in an external study archive.
//!
//! The function itself lives behind a [`StudyBackend`], which knows how to load it from a study
//! and how to call it. [`StudyEvaluator`] owns a backend together with the loaded handle and
//! guarantees that, however many threads call it, the study is loaded once.
mod config;
#[cfg(feature = "pyo3")]
mod py;

pub use config::{
    ConfigError, DEFAULT_MODULE, DEFAULT_OBJECT_NAME, DEFAULT_STUDY_PATH, MODULE_ENV, OBJECT_NAME_ENV, STUDY_PATH_ENV,
    StudyConfig,
};
#[cfg(feature = "pyo3")]
pub use py::OpenTurnsBackend;

use crate::{Evaluator, EvaluatorError};
use std::sync::{Mutex, OnceLock, PoisonError};
use tracing::{debug, info};

/// Boundary to whatever runtime actually computes the function.
pub trait StudyBackend {
    type Handle;

    /// Load the function object described by `config`.
    fn load(&self, config: &StudyConfig) -> Result<Self::Handle, EvaluatorError>;

    /// Call the loaded function with `x` and return its output vector.
    fn invoke(&self, handle: &Self::Handle, x: &[f64]) -> Result<Vec<f64>, EvaluatorError>;

    /// The input dimension of the loaded function, if the backend can tell.
    fn input_dimension(&self, _handle: &Self::Handle) -> Option<usize> {
        None
    }
}

/// Evaluator context for a function stored in a study archive.
///
/// The study is loaded on the first evaluation, or earlier through [`StudyEvaluator::initialise`].
/// A failed load leaves the context uninitialised so that a later call tries again.
pub struct StudyEvaluator<B: StudyBackend> {
    backend: B,
    config: StudyConfig,
    handle: OnceLock<B::Handle>,
    init_lock: Mutex<()>,
}

impl<B: StudyBackend> StudyEvaluator<B> {
    pub fn new(backend: B, config: StudyConfig) -> Self {
        Self {
            backend,
            config,
            handle: OnceLock::new(),
            init_lock: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &StudyConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_initialised(&self) -> bool {
        self.handle.get().is_some()
    }

    /// Load the study if it has not been loaded yet and return the function handle.
    pub fn initialise(&self) -> Result<&B::Handle, EvaluatorError> {
        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        // The lock only serialises loading; nothing behind it can be left inconsistent.
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(handle) = self.handle.get() {
            return Ok(handle);
        }

        if !self.config.path.exists() {
            return Err(EvaluatorError::StudyNotFound {
                path: self.config.path.clone(),
            });
        }

        info!(
            "Loading `{}` from study `{}` with module `{}`.",
            self.config.object_name,
            self.config.path.display(),
            self.config.module
        );
        let handle = self.backend.load(&self.config)?;

        Ok(self.handle.get_or_init(|| handle))
    }
}

impl<B: StudyBackend> Evaluator for StudyEvaluator<B> {
    fn name(&self) -> &str {
        &self.config.object_name
    }

    fn evaluate(&self, x: &[f64], y: &mut [f64]) -> Result<(), EvaluatorError> {
        let handle = self.initialise()?;

        if let Some(expected) = self.backend.input_dimension(handle) {
            if expected != x.len() {
                return Err(EvaluatorError::InputDimension {
                    expected,
                    found: x.len(),
                });
            }
        }

        debug!("Evaluating `{}` at {x:?}.", self.config.object_name);
        let values = self.backend.invoke(handle, x)?;

        if values.len() != y.len() {
            return Err(EvaluatorError::OutputDimension {
                expected: y.len(),
                found: values.len(),
            });
        }

        y.copy_from_slice(&values);
        Ok(())
    }
}
