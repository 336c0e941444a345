//! Configuration schema for lambdacheck.
//!
//! Settings live in `lambdacheck.yaml`. Every field is optional; a missing
//! file means defaults.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analysis::{
    CompilationOptions, MetadataReference, OutputKind, DEFAULT_REGISTRATION_METHODS,
};
use crate::detect::{MisplacedAttributeAnalyzer, ReservedNamespace, Severity, DEFAULT_RESERVED_NAMESPACE};

/// File names probed by [`Config::discover`], in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["lambdacheck.yaml", "lambdacheck.yml", ".lambdacheck.yaml"];

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("reserved_namespace must not be empty")]
    EmptyReservedNamespace,
    #[error("registration_methods must list at least one method")]
    NoRegistrationMethods,
    #[error("invalid excluded_paths pattern {pattern:?}: {source}")]
    InvalidGlob {
        pattern: String,
        #[source]
        source: globset::Error,
    },
}

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Attributes from namespaces starting with this prefix are reported.
    #[serde(default = "default_reserved_namespace")]
    pub reserved_namespace: String,
    /// Severity of reported diagnostics.
    #[serde(default = "default_severity")]
    pub severity: Severity,
    /// Callee names that register a route handler.
    #[serde(default = "default_registration_methods")]
    pub registration_methods: Vec<String>,
    /// Glob patterns for paths to exclude from analysis (e.g., "**/Migrations/**")
    #[serde(default)]
    pub excluded_paths: Vec<String>,
    /// Extra metadata reference manifests, relative to the config file.
    #[serde(default)]
    pub references: Vec<String>,
    /// Whether to analyze generated sources under `obj/`, `bin/` and `*.g.cs`.
    #[serde(default)]
    pub include_generated: bool,
    #[serde(default = "default_output_kind")]
    pub output_kind: OutputKind,
}

fn default_reserved_namespace() -> String {
    DEFAULT_RESERVED_NAMESPACE.to_string()
}

fn default_severity() -> Severity {
    Severity::Warning
}

fn default_registration_methods() -> Vec<String> {
    DEFAULT_REGISTRATION_METHODS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

/// Linted projects are usually applications with top-level statements.
fn default_output_kind() -> OutputKind {
    OutputKind::ConsoleApplication
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reserved_namespace: default_reserved_namespace(),
            severity: default_severity(),
            registration_methods: default_registration_methods(),
            excluded_paths: Vec::new(),
            references: Vec::new(),
            include_generated: false,
            output_kind: default_output_kind(),
        }
    }
}

impl Config {
    /// Parse a config from a YAML file.
    pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Parse a config from YAML text. Empty text yields the defaults.
    pub fn parse_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(|source| ConfigError::Parse {
            path: PathBuf::from("<inline>"),
            source,
        })
    }

    /// Find a config file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    /// Load an explicit config, else a discovered one, else defaults.
    pub fn load(explicit: Option<&Path>, search_dir: &Path) -> anyhow::Result<(Self, Option<PathBuf>)> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Self::discover(search_dir),
        };
        let config = match &path {
            Some(path) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::parse_file(path)?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok((config, path))
    }

    /// Validate the config for correctness.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reserved_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyReservedNamespace);
        }
        if self.registration_methods.iter().all(|m| m.trim().is_empty()) {
            return Err(ConfigError::NoRegistrationMethods);
        }
        for pattern in &self.excluded_paths {
            globset::Glob::new(pattern).map_err(|source| ConfigError::InvalidGlob {
                pattern: pattern.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Check if a path should be excluded based on excluded_paths patterns.
    /// Uses globset for matching, which supports `**` for recursive directory matching.
    pub fn is_path_excluded(&self, path: &Path) -> bool {
        if self.excluded_paths.is_empty() {
            return false;
        }

        let path_str = path.to_string_lossy();

        for pattern in &self.excluded_paths {
            if let Ok(glob) = globset::Glob::new(pattern) {
                let matcher = glob.compile_matcher();
                if matcher.is_match(&*path_str) {
                    return true;
                }
            }
        }
        false
    }

    /// Whether the path is build output or generated code that is skipped
    /// unless `include_generated` is set.
    pub fn is_generated(&self, path: &Path) -> bool {
        if self.include_generated {
            return false;
        }
        let in_build_dir = path.components().any(|c| {
            let part = c.as_os_str().to_string_lossy();
            part == "obj" || part == "bin"
        });
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        in_build_dir || name.ends_with(".g.cs") || name.ends_with(".g.i.cs") || name.ends_with(".designer.cs")
    }

    pub fn reserved(&self) -> ReservedNamespace {
        ReservedNamespace::new(self.reserved_namespace.trim())
    }

    pub fn analyzer(&self) -> MisplacedAttributeAnalyzer {
        MisplacedAttributeAnalyzer::new(self.reserved(), self.severity)
    }

    pub fn compilation_options(&self) -> CompilationOptions {
        CompilationOptions::default()
            .with_output_kind(self.output_kind)
            .with_registration_methods(
                self.registration_methods
                    .iter()
                    .map(|m| m.trim().to_string())
                    .filter(|m| !m.is_empty())
                    .collect(),
            )
    }

    /// Load the configured reference manifests, resolved against `base_dir`.
    pub fn load_references(&self, base_dir: &Path) -> anyhow::Result<Vec<MetadataReference>> {
        self.references
            .iter()
            .map(|r| {
                let path = base_dir.join(r);
                MetadataReference::from_file(&path).map_err(anyhow::Error::from)
            })
            .collect()
    }
}

/// Commented default config written by `lambdacheck init`.
pub const DEFAULT_TEMPLATE: &str = include_str!("templates/default.yaml");
