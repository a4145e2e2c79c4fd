//! Generator configuration (`bindgen.toml`)
//!
//! Every field has a default, so an empty file and no file behave the same.
//! Command line flags are applied on top of the loaded values.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use interop_core::{ConfigurationError, GenerationError};
use interop_generator::{CyclePolicy, GeneratorOptions};

use crate::error::{BindgenError, Result};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub output: OutputConfig,
    pub resolution: ResolutionConfig,
    pub ordering: OrderingConfig,
    pub emit: EmitConfig,
}

/// Output directories, relative to the output root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OutputConfig {
    pub native_dir: PathBuf,
    pub managed_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            native_dir: PathBuf::from("Source"),
            managed_dir: PathBuf::from("Managed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResolutionConfig {
    /// Unknown names become opaque native types instead of errors.
    pub opaque_fallback: bool,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            opaque_fallback: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnCycle {
    #[default]
    Abort,
    Continue,
}

impl From<OnCycle> for CyclePolicy {
    fn from(on_cycle: OnCycle) -> Self {
        match on_cycle {
            OnCycle::Abort => CyclePolicy::Abort,
            OnCycle::Continue => CyclePolicy::Continue,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderingConfig {
    pub on_cycle: OnCycle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EmitConfig {
    pub managed_indent: String,
    pub native_indent: String,
}

impl Default for EmitConfig {
    fn default() -> Self {
        let options = GeneratorOptions::default();
        Self {
            managed_indent: options.managed_indent,
            native_indent: options.native_indent,
        }
    }
}

impl GeneratorConfig {
    /// Read and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| BindgenError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text).map_err(|source| BindgenError::Config {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate().map_err(GenerationError::from)?;
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(text: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Indents must be non-empty whitespace; output directories must differ.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        for (name, indent) in [
            ("emit.managed_indent", &self.emit.managed_indent),
            ("emit.native_indent", &self.emit.native_indent),
        ] {
            if indent.is_empty() || !indent.chars().all(|c| c == ' ' || c == '\t') {
                return Err(ConfigurationError::Invalid {
                    message: format!("{name} must be spaces or tabs"),
                });
            }
        }
        if self.output.native_dir == self.output.managed_dir {
            return Err(ConfigurationError::Invalid {
                message: "output.native_dir and output.managed_dir must differ".into(),
            });
        }
        Ok(())
    }

    pub fn options(&self) -> GeneratorOptions {
        GeneratorOptions {
            opaque_fallback: self.resolution.opaque_fallback,
            on_cycle: self.ordering.on_cycle.into(),
            native_indent: self.emit.native_indent.clone(),
            managed_indent: self.emit.managed_indent.clone(),
        }
    }
}
