use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_STUDY_PATH: &str = "/tmp/function.xml";
pub const DEFAULT_OBJECT_NAME: &str = "function";
pub const DEFAULT_MODULE: &str = "openturns";

pub const STUDY_PATH_ENV: &str = "OTFMI_STUDY_PATH";
pub const OBJECT_NAME_ENV: &str = "OTFMI_STUDY_OBJECT";
pub const MODULE_ENV: &str = "OTFMI_STUDY_MODULE";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error on path `{}`: {error}", .path.display())]
    IO { path: PathBuf, error: std::io::Error },
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where to find the function object and which framework module reads it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct StudyConfig {
    /// Path to the study archive.
    pub path: PathBuf,
    /// Name under which the function object is stored in the study.
    pub object_name: String,
    /// Python module providing the `Study` and `Function` types.
    pub module: String,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from(DEFAULT_STUDY_PATH),
            object_name: DEFAULT_OBJECT_NAME.to_string(),
            module: DEFAULT_MODULE.to_string(),
        }
    }
}

impl StudyConfig {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_object_name(mut self, object_name: &str) -> Self {
        self.object_name = object_name.to_string();
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.module = module.to_string();
        self
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path).map_err(|error| ConfigError::IO {
            path: path.to_path_buf(),
            error,
        })?;
        Self::from_json_str(&data)
    }

    pub fn from_json_str(data: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(data)?)
    }

    /// The defaults, overridden by any of the `OTFMI_STUDY_*` environment variables that are set.
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(path) = var(STUDY_PATH_ENV) {
            config.path = PathBuf::from(path);
        }
        if let Some(object_name) = var(OBJECT_NAME_ENV) {
            config.object_name = object_name;
        }
        if let Some(module) = var(MODULE_ENV) {
            config.module = module;
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = StudyConfig::default();
        assert_eq!(config.path, Path::new("/tmp/function.xml"));
        assert_eq!(config.object_name, "function");
        assert_eq!(config.module, "openturns");
    }

    #[test]
    fn test_partial_json() {
        let config = StudyConfig::from_json_str(r#"{"path": "/data/beam.xml"}"#).unwrap();
        assert_eq!(config, StudyConfig::new("/data/beam.xml"));
    }

    #[test]
    fn test_unknown_field() {
        let result = StudyConfig::from_json_str(r#"{"path": "/data/beam.xml", "name": "f"}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_from_path() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("study.json");
        std::fs::write(
            &path,
            r#"{"path": "/data/beam.xml", "object_name": "model", "module": "my_ot"}"#,
        )
        .unwrap();

        let config = StudyConfig::from_path(&path).unwrap();
        assert_eq!(
            config,
            StudyConfig::new("/data/beam.xml").with_object_name("model").with_module("my_ot")
        );

        let missing = StudyConfig::from_path(temp_dir.path().join("missing.json"));
        assert!(matches!(missing, Err(ConfigError::IO { .. })));
    }

    #[test]
    fn test_env_overrides() {
        let vars = HashMap::from([(STUDY_PATH_ENV, "/elsewhere.xml"), (OBJECT_NAME_ENV, "g")]);
        let config = StudyConfig::from_vars(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.path, Path::new("/elsewhere.xml"));
        assert_eq!(config.object_name, "g");
        assert_eq!(config.module, DEFAULT_MODULE);
    }
}
