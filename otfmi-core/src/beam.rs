//! Closed-form deflection of a cantilever beam loaded at its free end.
use crate::{Evaluator, EvaluatorError};

/// Names of the input variables, in the order they are read from the input vector.
pub const INPUT_NAMES: [&str; 4] = ["E", "F", "L", "I"];
/// Names of the output variables.
pub const OUTPUT_NAMES: [&str; 1] = ["y0"];

/// Deflection `F·L³ / (3·E·I)` of a cantilever beam.
///
/// `e` is the modulus of elasticity, `f` the load, `l` the length and `i` the second moment of
/// area of the section. No checks are made; a zero `e` or `i` gives an infinite or NaN result.
pub fn deflection(e: f64, f: f64, l: f64, i: f64) -> f64 {
    f * l * l * l / (3.0 * e * i)
}

/// Named view over the first four slots of an input vector.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct BeamInput {
    pub e: f64,
    pub f: f64,
    pub l: f64,
    pub i: f64,
}

impl BeamInput {
    /// Read the beam variables from `x`. Slots past the fourth are ignored.
    pub fn from_slice(x: &[f64]) -> Result<Self, EvaluatorError> {
        match x {
            [e, f, l, i, ..] => Ok(Self {
                e: *e,
                f: *f,
                l: *l,
                i: *i,
            }),
            _ => Err(EvaluatorError::InputDimension {
                expected: INPUT_NAMES.len(),
                found: x.len(),
            }),
        }
    }

    pub fn deflection(&self) -> f64 {
        deflection(self.e, self.f, self.l, self.i)
    }
}

/// [`Evaluator`] for the cantilever beam.
///
/// Requires at least four inputs and at least one output; only `y[0]` is written.
#[derive(Debug, Default, Copy, Clone)]
pub struct CantileverBeam;

impl Evaluator for CantileverBeam {
    fn name(&self) -> &str {
        "cantilever-beam"
    }

    fn evaluate(&self, x: &[f64], y: &mut [f64]) -> Result<(), EvaluatorError> {
        let input = BeamInput::from_slice(x)?;

        let Some(y0) = y.first_mut() else {
            return Err(EvaluatorError::OutputDimension {
                expected: OUTPUT_NAMES.len(),
                found: 0,
            });
        };

        *y0 = input.deflection();
        Ok(())
    }
}
