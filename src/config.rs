//! Project configuration (goshim.toml) parsing and types.

use std::fs;
use std::path::{Path, PathBuf};

use goshim_reexport::GenerateOptions;
use serde::Deserialize;

/// Root configuration structure for goshim.toml.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct GoshimConfig {
    /// Settings shared by every shim entry.
    #[serde(default)]
    pub defaults: Defaults,
    /// Shims regenerated by `goshim update`.
    #[serde(default)]
    pub shim: Vec<ShimEntry>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Defaults {
    /// Local name of the original package's import.
    pub alias: Option<String>,
    /// Forward every function through a wrapper.
    pub wrap_functions: Option<bool>,
    /// Emit the generated-code header line.
    pub header: Option<bool>,
}

/// A single `[[shim]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct ShimEntry {
    /// Label used by `goshim update NAME`.
    pub name: Option<String>,
    /// Directory of the original package.
    pub dir: Option<String>,
    /// Import path of the original package.
    pub pkg: Option<String>,
    /// Output file, relative to the config file.
    pub out: String,
    pub alias: Option<String>,
    /// Package clause of the shim.
    pub package: Option<String>,
    pub wrap_functions: Option<bool>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    Io(String, String),
    #[error("invalid config {path}: {message}")]
    Parse { path: String, message: String },
}

impl GoshimConfig {
    /// Load `path`; a missing file yields `Ok(None)`.
    pub fn load_from_path(path: &Path) -> Result<Option<Self>, ConfigError> {
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(path)
            .map_err(|e| {
                ConfigError::Io(path.display().to_string(), e.to_string())
            })?;
        Self::parse(&content)
            .map(Some)
            .map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                message: e.message().to_string(),
            })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path(path)?.unwrap_or_default())
    }

    /// Entries matching `name`, or all of them.
    pub fn select(&self, name: Option<&str>) -> Vec<&ShimEntry> {
        self.shim
            .iter()
            .filter(|entry| {
                name.map_or(true, |n| entry.name.as_deref() == Some(n))
            })
            .collect()
    }
}

impl Defaults {
    pub fn wrap_functions(&self) -> bool {
        self.wrap_functions.unwrap_or(false)
    }

    pub fn header(&self) -> bool {
        self.header.unwrap_or(true)
    }

    pub fn options(&self) -> GenerateOptions {
        GenerateOptions {
            alias: self.alias.clone(),
            package_name: None,
            wrap_functions: self.wrap_functions(),
            header: self.header(),
        }
    }
}

impl ShimEntry {
    /// Name shown in logs and errors.
    pub fn label(&self) -> &str {
        self.name
            .as_deref()
            .or(self.pkg.as_deref())
            .or(self.dir.as_deref())
            .unwrap_or(&self.out)
    }

    /// Generation options with this entry's values over `defaults`.
    pub fn options(&self, defaults: &Defaults) -> GenerateOptions {
        let base = defaults.options();
        GenerateOptions {
            alias: self.alias.clone().or(base.alias),
            package_name: self.package.clone(),
            wrap_functions: self.wrap_functions.unwrap_or(base.wrap_functions),
            header: base.header,
        }
    }

    /// `dir` resolved against `root`, the directory holding the config file.
    pub fn dir_in(&self, root: &Path) -> Option<PathBuf> {
        self.dir.as_ref().map(|dir| root.join(dir))
    }

    pub fn out_in(&self, root: &Path) -> PathBuf {
        root.join(&self.out)
    }
}
