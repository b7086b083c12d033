//! Tree configuration files
//!
//! A tree can be described in TOML:
//!
//! ```toml
//! name = "kernel_acc"
//! operation = "add-signed"
//! input_width = 8
//! num_stages = 3
//! reg_in = true
//! ```

use crate::error::{Result, TreeError};
use crate::operation::Operation;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Construction parameters of a tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeConfig {
    /// Top-level module name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Operation name, e.g. `max-unsigned`
    pub operation: String,

    /// Bit width of each tree input
    pub input_width: usize,

    /// Number of reduction stages
    pub num_stages: usize,

    /// Declared number of inputs, checked against `2^num_stages`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_count: Option<usize>,

    /// Register stage inputs
    #[serde(default)]
    pub reg_in: bool,

    /// Register stage outputs
    #[serde(default)]
    pub reg_out: bool,
}

impl TreeConfig {
    pub fn new(operation: Operation, input_width: usize, num_stages: usize) -> Self {
        Self {
            name: None,
            operation: operation.name().to_string(),
            input_width,
            num_stages,
            input_count: None,
            reg_in: false,
            reg_out: false,
        }
    }

    /// Resolve the configured operation name
    pub fn operation(&self) -> Result<Operation> {
        self.operation.parse()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string(self).map_err(|e| TreeError::Config(e.to_string()))
    }
}

/// Parse a tree configuration from a string
pub fn from_str(s: &str) -> Result<TreeConfig> {
    toml::from_str(s).map_err(|e| TreeError::Config(e.to_string()))
}

/// Parse a tree configuration from a file path
pub fn from_path(path: impl AsRef<Path>) -> Result<TreeConfig> {
    let contents =
        std::fs::read_to_string(path.as_ref()).map_err(|e| TreeError::Io(e.to_string()))?;
    from_str(&contents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_config_parse() {
        let toml = r#"
            operation = "max-signed"
            input_width = 8
            num_stages = 1
        "#;

        let config = from_str(toml).unwrap();
        assert_eq!(config.operation().unwrap(), Operation::MaxSigned);
        assert_eq!(config.input_width, 8);
        assert!(!config.reg_in);
        assert!(!config.reg_out);
        assert_eq!(config.input_count, None);
    }

    #[test]
    fn test_unknown_operation_surfaces_on_resolve() {
        let config = from_str("operation = \"xor\"\ninput_width = 4\nnum_stages = 2").unwrap();
        assert!(matches!(config.operation(), Err(TreeError::UnknownOperation(_))));
    }

    #[test]
    fn test_negative_stage_count_is_a_parse_error() {
        let err = from_str("operation = \"add-signed\"\ninput_width = 4\nnum_stages = -1").unwrap_err();
        assert!(matches!(err, TreeError::Config(_)));
    }

    #[test]
    fn test_toml_round_trip() {
        let mut config = TreeConfig::new(Operation::AddUnsigned, 4, 2);
        config.name = Some("acc".to_string());
        config.reg_out = true;
        let text = config.to_toml().unwrap();
        assert_eq!(from_str(&text).unwrap(), config);
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tree.toml");
        std::fs::write(&path, "operation = \"min-unsigned\"\ninput_width = 16\nnum_stages = 4\n")
            .unwrap();
        let config = from_path(&path).unwrap();
        assert_eq!(config.num_stages, 4);

        assert!(matches!(
            from_path(dir.path().join("missing.toml")),
            Err(TreeError::Io(_))
        ));
    }
}
