use float_cmp::assert_approx_eq;
use otfmi_core::beam::{CantileverBeam, deflection};
use otfmi_core::study::{StudyConfig, StudyEvaluator};
use otfmi_core::test_utils::{FakeBackend, study_file};
use otfmi_core::{ErrorKind, Evaluator};
use tempfile::TempDir;

fn beam_function(x: &[f64]) -> Vec<f64> {
    vec![deflection(x[0], x[1], x[2], x[3])]
}

/// A study holding the beam formula must agree with the closed-form evaluator.
#[test]
fn test_study_matches_closed_form() {
    let temp_dir = TempDir::new().unwrap();
    let study = StudyEvaluator::new(
        FakeBackend::new(beam_function).with_input_dimension(4),
        StudyConfig::new(study_file(temp_dir.path())),
    );

    let evaluators: [&dyn Evaluator; 2] = [&CantileverBeam, &study];
    let points = [
        [1.0, 1.0, 1.0, 1.0],
        [200e9, 1000.0, 2.0, 8e-6],
        [3.0e7, 3.0e4, 250.0, 400.0],
        [2.8e7, 2.1e4, 255.0, 350.0],
    ];

    for x in points {
        let values: Vec<f64> = evaluators
            .iter()
            .map(|evaluator| evaluator.evaluate_point(&x, 1).unwrap()[0])
            .collect();
        assert_approx_eq!(f64, values[0], values[1], ulps = 0);
    }

    assert_eq!(study.backend().loads(), 1);
    assert_eq!(study.backend().calls(), points.len());
}

#[test]
fn test_shape_errors_are_distinguished() {
    let temp_dir = TempDir::new().unwrap();
    let study = StudyEvaluator::new(
        FakeBackend::new(beam_function),
        StudyConfig::new(temp_dir.path().join("absent.xml")),
    );

    let beam_error = CantileverBeam.evaluate_point(&[1.0], 1).unwrap_err();
    let study_error = study.evaluate_point(&[1.0; 4], 1).unwrap_err();

    assert_eq!(beam_error.kind(), ErrorKind::Shape);
    assert_eq!(study_error.kind(), ErrorKind::External);
}
