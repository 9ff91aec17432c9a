use super::{StudyBackend, StudyConfig};
use crate::EvaluatorError;
use pyo3::prelude::*;
use pyo3::types::PyTuple;
use tracing::debug;

/// Loads the function object through an embedded Python interpreter.
///
/// The framework module is expected to provide `Study(path)` with `load()` and
/// `fillObject(name, object)`, and a default-constructible `Function` that is called with a
/// sequence of floats and returns a sequence of floats.
#[derive(Debug, Default, Copy, Clone)]
pub struct OpenTurnsBackend;

impl OpenTurnsBackend {
    fn load_function(py: Python<'_>, config: &StudyConfig) -> PyResult<Py<PyAny>> {
        let module = py.import(config.module.as_str())?;

        let path = config.path.to_string_lossy().into_owned();
        let study = module.call_method1("Study", (path,))?;
        study.call_method0("load")?;

        let function = module.call_method0("Function")?;
        study.call_method1("fillObject", (config.object_name.as_str(), &function))?;

        Ok(function.unbind())
    }

    fn call_function(py: Python<'_>, function: &Py<PyAny>, x: &[f64]) -> PyResult<Vec<f64>> {
        let point = PyTuple::new(py, x)?;
        let values = function.bind(py).call1((point,))?;

        let n = values.len()?;
        let mut y = Vec::with_capacity(n);
        for i in 0..n {
            y.push(values.get_item(i)?.extract::<f64>()?);
        }

        Ok(y)
    }
}

impl StudyBackend for OpenTurnsBackend {
    type Handle = Py<PyAny>;

    fn load(&self, config: &StudyConfig) -> Result<Self::Handle, EvaluatorError> {
        Python::initialize();

        Python::attach(|py| Self::load_function(py, config)).map_err(|py_error| EvaluatorError::Python {
            context: format!(
                "loading `{}` from `{}`",
                config.object_name,
                config.path.display()
            ),
            py_error: Box::new(py_error),
        })
    }

    fn invoke(&self, handle: &Self::Handle, x: &[f64]) -> Result<Vec<f64>, EvaluatorError> {
        Python::attach(|py| Self::call_function(py, handle, x)).map_err(|py_error| EvaluatorError::Python {
            context: format!("calling `{handle}`"),
            py_error: Box::new(py_error),
        })
    }

    fn input_dimension(&self, handle: &Self::Handle) -> Option<usize> {
        Python::attach(|py| {
            handle
                .bind(py)
                .call_method0("getInputDimension")
                .and_then(|dimension| dimension.extract::<usize>())
                .inspect_err(|py_error| debug!("Input dimension unavailable: {py_error}"))
                .ok()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::study::StudyEvaluator;
    use crate::test_utils::FAKE_FRAMEWORK_SOURCE;
    use crate::{ErrorKind, Evaluator};
    use float_cmp::assert_approx_eq;
    use pyo3::ffi::c_str;
    use std::ffi::CString;
    use std::path::Path;
    use tempfile::TempDir;

    const FAKE_MODULE: &str = "fake_study_framework";

    fn register_fake_framework() {
        Python::initialize();

        let code = CString::new(FAKE_FRAMEWORK_SOURCE).unwrap();
        Python::attach(|py| {
            let module = PyModule::from_code(
                py,
                &code,
                c_str!("fake_study_framework.py"),
                c_str!("fake_study_framework"),
            )
            .unwrap();
            py.import("sys")
                .unwrap()
                .getattr("modules")
                .unwrap()
                .set_item(FAKE_MODULE, module)
                .unwrap();
        });
    }

    fn write_study(dir: &Path, names: &str) -> StudyConfig {
        let path = dir.join("function.xml");
        std::fs::write(&path, names).unwrap();
        StudyConfig::new(path).with_module(FAKE_MODULE)
    }

    #[test]
    fn test_load_and_invoke() {
        register_fake_framework();
        let temp_dir = TempDir::new().unwrap();
        let config = write_study(temp_dir.path(), "function\n");

        let evaluator = StudyEvaluator::new(OpenTurnsBackend, config);
        let x = [3.0e7, 3.0e4, 250.0, 400.0];

        let first = evaluator.evaluate_point(&x, 1).unwrap();
        let second = evaluator.evaluate_point(&x, 1).unwrap();

        assert_eq!(first, second);
        assert_approx_eq!(f64, first[0], crate::beam::deflection(3.0e7, 3.0e4, 250.0, 400.0), ulps = 4);
    }

    #[test]
    fn test_input_dimension() {
        register_fake_framework();
        let temp_dir = TempDir::new().unwrap();
        let config = write_study(temp_dir.path(), "function\n");

        let evaluator = StudyEvaluator::new(OpenTurnsBackend, config);
        let handle = evaluator.initialise().unwrap();
        assert_eq!(evaluator.backend().input_dimension(handle), Some(4));

        let err = evaluator.evaluate_point(&[1.0, 2.0], 1).unwrap_err();
        assert!(matches!(err, EvaluatorError::InputDimension { expected: 4, found: 2 }));
    }

    #[test]
    fn test_output_dimension_mismatch() {
        register_fake_framework();
        let temp_dir = TempDir::new().unwrap();
        let config = write_study(temp_dir.path(), "function\n");

        let evaluator = StudyEvaluator::new(OpenTurnsBackend, config);
        let mut y = [7.0, 7.0];
        let err = evaluator.evaluate(&[1.0; 4], &mut y).unwrap_err();

        assert!(matches!(err, EvaluatorError::OutputDimension { expected: 2, found: 1 }));
        assert_eq!(y, [7.0, 7.0]);
    }

    #[test]
    fn test_missing_object() {
        register_fake_framework();
        let temp_dir = TempDir::new().unwrap();
        let config = write_study(temp_dir.path(), "other\n");

        let evaluator = StudyEvaluator::new(OpenTurnsBackend, config);
        let err = evaluator.initialise().unwrap_err();

        assert!(matches!(err, EvaluatorError::Python { .. }));
        assert_eq!(err.kind(), ErrorKind::External);
        assert!(!evaluator.is_initialised());
    }

    #[test]
    fn test_missing_module() {
        Python::initialize();
        let temp_dir = TempDir::new().unwrap();
        let config = write_study(temp_dir.path(), "function\n").with_module("no_such_framework_module");

        let err = OpenTurnsBackend.load(&config).unwrap_err();
        assert!(matches!(err, EvaluatorError::Python { .. }));
    }
}
