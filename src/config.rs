//! Engine configuration
//!
//! Where templates live and how they are rendered. Every field has a
//! default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! [templates]
//! template_path = "es-templates/"
//! group_path = "query-templates/"
//! group_extension = "yml"
//!
//! [render]
//! escape = "none"
//! ```

use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::renderer::RenderConfig;

/// Errors that can occur when loading or parsing configuration
#[derive(Error, Debug)]
pub enum ConfigFileError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Location conventions for template resources
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TemplatePaths {
    /// Prefix of ad-hoc templates: `<template_path><schema>/<template>`
    pub template_path: String,
    /// Prefix of group definitions: `<group_path><operation type>.<group_extension>`
    pub group_path: String,
    pub group_extension: String,
}

impl Default for TemplatePaths {
    fn default() -> Self {
        Self {
            template_path: "es-templates/".to_string(),
            group_path: "query-templates/".to_string(),
            group_extension: "yml".to_string(),
        }
    }
}

impl TemplatePaths {
    /// Create paths with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the ad-hoc template prefix
    pub fn with_template_path(mut self, path: impl Into<String>) -> Self {
        self.template_path = path.into();
        self
    }

    /// Set the group definition prefix
    pub fn with_group_path(mut self, path: impl Into<String>) -> Self {
        self.group_path = path.into();
        self
    }

    /// Set the group definition file extension
    pub fn with_group_extension(mut self, extension: impl Into<String>) -> Self {
        self.group_extension = extension.into();
        self
    }

    /// Resource path of an ad-hoc template
    pub fn template(&self, schema_name: &str, template_name: &str) -> String {
        format!("{}{}/{}", self.template_path, schema_name, template_name)
    }

    /// Resource path of a group definition; the operation type is lowercased
    pub fn group(&self, operation_type: &str) -> String {
        format!(
            "{}{}.{}",
            self.group_path,
            operation_type.to_lowercase(),
            self.group_extension
        )
    }
}

/// Configuration for the complete engine
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Template locations
    pub templates: TemplatePaths,
    /// Rendering options
    pub render: RenderConfig,
}

impl EngineConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigFileError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Load configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigFileError> {
        Ok(toml::from_str(content)?)
    }

    /// Set the template locations
    pub fn with_templates(mut self, templates: TemplatePaths) -> Self {
        self.templates = templates;
        self
    }

    /// Set the rendering options
    pub fn with_render(mut self, render: RenderConfig) -> Self {
        self.render = render;
        self
    }
}
