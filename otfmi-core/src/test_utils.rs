/// Utilities for unit and integration tests.
use crate::EvaluatorError;
use crate::study::{StudyBackend, StudyConfig};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

type FakeFunction = Box<dyn Fn(&[f64]) -> Vec<f64> + Send + Sync>;

/// A [`StudyBackend`] that "loads" a Rust closure and counts how often it is used.
pub struct FakeBackend {
    function: FakeFunction,
    input_dimension: Option<usize>,
    loads: AtomicUsize,
    calls: AtomicUsize,
}

impl FakeBackend {
    pub fn new<F>(function: F) -> Self
    where
        F: Fn(&[f64]) -> Vec<f64> + Send + Sync + 'static,
    {
        Self {
            function: Box::new(function),
            input_dimension: None,
            loads: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_input_dimension(mut self, input_dimension: usize) -> Self {
        self.input_dimension = Some(input_dimension);
        self
    }

    /// Number of times the study has been loaded.
    pub fn loads(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of times the loaded function has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl StudyBackend for FakeBackend {
    type Handle = usize;

    fn load(&self, _config: &StudyConfig) -> Result<Self::Handle, EvaluatorError> {
        Ok(self.loads.fetch_add(1, Ordering::SeqCst))
    }

    fn invoke(&self, _handle: &Self::Handle, x: &[f64]) -> Result<Vec<f64>, EvaluatorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((self.function)(x))
    }

    fn input_dimension(&self, _handle: &Self::Handle) -> Option<usize> {
        self.input_dimension
    }
}

/// Write a placeholder study archive into `dir` and return its path.
pub fn study_file(dir: &Path) -> PathBuf {
    let path = dir.join("function.xml");
    std::fs::write(&path, "function\n").unwrap();
    path
}

/// Python source of an importable stand-in for the study framework.
///
/// A study file lists the names of the objects it stores, one per line, and every stored
/// object is the cantilever beam.
pub const FAKE_FRAMEWORK_SOURCE: &str = r#"
import os


class Function:
    def __init__(self):
        self._impl = None

    def getInputDimension(self):
        return 4

    def __call__(self, x):
        return self._impl(x)


class Study:
    def __init__(self, path):
        self.path = path
        self.names = set()

    def load(self):
        if not os.path.exists(self.path):
            raise FileNotFoundError(self.path)
        with open(self.path) as f:
            self.names = {line.strip() for line in f}

    def fillObject(self, name, function):
        if name not in self.names:
            raise KeyError(name)
        function._impl = lambda x: [x[1] * x[2] ** 3 / (3.0 * x[0] * x[3])]
"#;
