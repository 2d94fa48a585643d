// Configuration providers
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "COPAY_";
pub const ENV_SEPARATOR: &str = "__";

/// One layer of configuration. Later layers override earlier ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    Yaml { path: PathBuf, required: bool },
    Toml { path: PathBuf, required: bool },
    Env { prefix: String },
}

impl ConfigSource {
    pub fn yaml(path: impl Into<PathBuf>) -> Self {
        Self::Yaml { path: path.into(), required: true }
    }

    pub fn toml(path: impl Into<PathBuf>) -> Self {
        Self::Toml { path: path.into(), required: true }
    }

    /// A YAML or TOML file chosen by extension that may be absent
    pub fn optional_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if is_toml(&path) {
            Self::Toml { path, required: false }
        } else {
            Self::Yaml { path, required: false }
        }
    }

    /// A YAML or TOML file chosen by extension that must exist
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if is_toml(&path) {
            Self::toml(path)
        } else {
            Self::yaml(path)
        }
    }

    pub fn env() -> Self {
        Self::Env { prefix: ENV_PREFIX.to_string() }
    }
}

fn is_toml(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("toml")
}

/// Per-user config directory, e.g. `~/.config/copay-autofill` on Linux
pub fn config_dir() -> Option<PathBuf> {
    ProjectDirs::from("dev", "rustcare", "copay-autofill").map(|dirs| dirs.config_dir().to_path_buf())
}

/// `config.yaml` and `config.toml` in the user's config directory
pub fn default_sources() -> Vec<ConfigSource> {
    let mut sources = Vec::new();
    if let Some(dir) = config_dir() {
        sources.push(ConfigSource::optional_file(dir.join("config.yaml")));
        sources.push(ConfigSource::optional_file(dir.join("config.toml")));
    }
    sources.push(ConfigSource::env());
    sources
}
