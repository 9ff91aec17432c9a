//! Modelica source for wrapping a plugin into an FMU.
//!
//! An FMU compiler such as OpenModelica can turn the generated model into an FMU whose equations
//! call the plugin's `c_func` entry point through Modelica's external function interface.
use crate::beam;
use std::collections::HashSet;
use std::fmt::Write;
use std::path::PathBuf;
use thiserror::Error;

/// Name of the external C symbol the wrapper calls.
pub const ENTRY_POINT: &str = "c_func";

/// Start values of the beam inputs, in the order of [`beam::INPUT_NAMES`].
pub const BEAM_START_VALUES: [f64; 4] = [3.0e7, 3.0e4, 250.0, 400.0];

#[derive(Error, Debug, PartialEq)]
pub enum ExportError {
    #[error("`{0}` is not a valid Modelica identifier")]
    InvalidIdentifier(String),
    #[error("variable `{0}` is declared more than once")]
    DuplicateName(String),
    #[error("at least one input is required")]
    NoInputs,
    #[error("at least one output is required")]
    NoOutputs,
    #[error("start value of input `{0}` is not finite")]
    NonFiniteStart(String),
    #[error("library directory `{0}` contains a double quote")]
    InvalidLibraryDir(String),
}

/// Parse an input declaration of the form `NAME=START`.
pub fn parse_input(declaration: &str) -> Result<(String, f64), String> {
    let (name, start) = declaration
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=START, found `{declaration}`"))?;
    let start = start
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("invalid start value for `{name}`: {e}"))?;
    Ok((name.trim().to_string(), start))
}

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

/// A Modelica model whose outputs are computed by a native library.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelicaWrapper {
    model_name: String,
    library: String,
    library_dir: PathBuf,
    inputs: Vec<(String, f64)>,
    outputs: Vec<String>,
}

impl ModelicaWrapper {
    /// Create an empty wrapper that links against `library` found in `library_dir`.
    pub fn new<P: Into<PathBuf>>(model_name: &str, library: &str, library_dir: P) -> Self {
        Self {
            model_name: model_name.to_string(),
            library: library.to_string(),
            library_dir: library_dir.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Wrapper for the cantilever beam plugin with its reference start values.
    pub fn beam<P: Into<PathBuf>>(model_name: &str, library: &str, library_dir: P) -> Self {
        let mut wrapper = Self::new(model_name, library, library_dir);
        for (name, start) in beam::INPUT_NAMES.iter().zip(BEAM_START_VALUES) {
            wrapper = wrapper.with_input(name, start);
        }
        for name in beam::OUTPUT_NAMES {
            wrapper = wrapper.with_output(name);
        }
        wrapper
    }

    pub fn with_input(mut self, name: &str, start: f64) -> Self {
        self.inputs.push((name.to_string(), start));
        self
    }

    pub fn with_output(mut self, name: &str) -> Self {
        self.outputs.push(name.to_string());
        self
    }

    fn validate(&self) -> Result<(), ExportError> {
        if self.inputs.is_empty() {
            return Err(ExportError::NoInputs);
        }
        if self.outputs.is_empty() {
            return Err(ExportError::NoOutputs);
        }

        if let Some((name, _)) = self.inputs.iter().find(|(_, start)| !start.is_finite()) {
            return Err(ExportError::NonFiniteStart(name.clone()));
        }

        if !is_identifier(&self.library) {
            return Err(ExportError::InvalidIdentifier(self.library.clone()));
        }

        let library_dir = self.library_dir.display().to_string();
        if library_dir.contains('"') {
            return Err(ExportError::InvalidLibraryDir(library_dir));
        }

        let mut seen = HashSet::new();
        let variables = self.inputs.iter().map(|(name, _)| name).chain(self.outputs.iter());

        for name in std::iter::once(&self.model_name).chain(variables) {
            if !is_identifier(name) {
                return Err(ExportError::InvalidIdentifier(name.clone()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ExportError::DuplicateName(name.clone()));
            }
        }

        Ok(())
    }

    /// Render the model source.
    pub fn render(&self) -> Result<String, ExportError> {
        self.validate()?;

        let input_names: Vec<&str> = self.inputs.iter().map(|(name, _)| name.as_str()).collect();
        let output_names: Vec<&str> = self.outputs.iter().map(String::as_str).collect();

        // Writing to a `String` cannot fail.
        let mut mo = String::new();
        let _ = writeln!(mo, "model {}", self.model_name);
        let _ = writeln!(mo);
        let _ = writeln!(mo, "  function ExternalFunc");
        let _ = writeln!(mo, "    input Real x[{}];", self.inputs.len());
        let _ = writeln!(mo, "    output Real y[{}];", self.outputs.len());
        let _ = writeln!(mo, "  external \"C\" {ENTRY_POINT}(size(x, 1), x, size(y, 1), y)");
        let _ = writeln!(
            mo,
            "    annotation(Library=\"{}\", LibraryDirectory=\"file://{}\");",
            self.library,
            self.library_dir.display()
        );
        let _ = writeln!(mo, "  end ExternalFunc;");
        let _ = writeln!(mo);
        for (name, start) in &self.inputs {
            let _ = writeln!(mo, "  input Real {name}(start={start:?});");
        }
        for name in &self.outputs {
            let _ = writeln!(mo, "  output Real {name};");
        }
        let _ = writeln!(mo, "equation");
        let _ = writeln!(
            mo,
            "  {{{}}} = ExternalFunc({{{}}});",
            output_names.join(", "),
            input_names.join(", ")
        );
        let _ = writeln!(mo, "end {};", self.model_name);

        Ok(mo)
    }

    /// Render the OpenModelica script that loads `<model>.mo` and translates it into a
    /// co-simulation FMU.
    pub fn render_script(&self) -> Result<String, ExportError> {
        self.validate()?;

        let name = &self.model_name;
        Ok(format!(
            "loadFile(\"{name}.mo\"); getErrorString();\n\
             translateModelFMU({name}, version=\"2.0\", fmuType=\"cs\"); getErrorString();\n"
        ))
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }
}
