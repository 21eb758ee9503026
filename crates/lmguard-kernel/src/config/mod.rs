//! Settings loading.
//!
//! Settings files may be YAML, TOML, JSON, INI, RON or JSON5; the format is
//! detected from the extension. `${VAR}` and `$VAR` references are
//! substituted from the environment before parsing, and `LMGUARD__SECTION__KEY`
//! environment variables override file values.

mod settings;

pub use settings::{
    AdvancedSettings, ApiFlavor, FeatureSettings, GuardSettings, LmStudioSettings,
    SecuritySettings, ServerSettings, SettingsStore, SharedSettings,
};

use config::{Config as Cfg, Environment, File, FileFormat};
use regex::Regex;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

/// Prefix for environment overrides (`LMGUARD__SERVER__PORT=9000`).
pub const ENV_PREFIX: &str = "LMGUARD";

static BRACED_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid regex"));
static BARE_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)\b").expect("valid regex"));

#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config parsing error: {0}")]
    Parse(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Detect the settings format from a file extension.
pub fn detect_format(path: &str) -> ConfigResult<FileFormat> {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .ok_or_else(|| ConfigError::UnsupportedFormat("No file extension found".to_string()))?;

    match ext.to_lowercase().as_str() {
        "yaml" | "yml" => Ok(FileFormat::Yaml),
        "toml" => Ok(FileFormat::Toml),
        "json" => Ok(FileFormat::Json),
        "ini" => Ok(FileFormat::Ini),
        "ron" => Ok(FileFormat::Ron),
        "json5" => Ok(FileFormat::Json5),
        _ => Err(ConfigError::UnsupportedFormat(ext.to_string())),
    }
}

/// Replace `${VAR}` and `$VAR` with environment values. Unset variables are
/// left untouched.
pub fn substitute_env_vars(content: &str) -> String {
    let braced = BRACED_VAR.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
    });
    BARE_VAR
        .replace_all(&braced, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_else(|_| caps[0].to_string())
        })
        .into_owned()
}

fn finish<T: DeserializeOwned>(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> ConfigResult<T> {
    builder
        .build()
        .map_err(|e| ConfigError::Parse(e.to_string()))?
        .try_deserialize()
        .map_err(|e| ConfigError::Serialization(e.to_string()))
}

/// Parse settings from a string in an explicit format.
pub fn from_str<T: DeserializeOwned>(content: &str, format: FileFormat) -> ConfigResult<T> {
    let substituted = substitute_env_vars(content);
    finish(Cfg::builder().add_source(File::from_str(&substituted, format)))
}

/// Load settings from a file.
pub fn load_config<T: DeserializeOwned>(path: &str) -> ConfigResult<T> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    from_str(&content, format)
}

/// Merge several sources; later sources override earlier ones.
pub fn merge_configs<T: DeserializeOwned>(sources: &[(&str, FileFormat)]) -> ConfigResult<T> {
    let mut builder = Cfg::builder();
    for (content, format) in sources {
        let substituted = substitute_env_vars(content);
        builder = builder.add_source(File::from_str(&substituted, *format));
    }
    finish(builder)
}

/// Load a file and apply `{prefix}__SECTION__KEY` environment overrides.
pub fn load_with_env<T: DeserializeOwned>(path: &str, env_prefix: &str) -> ConfigResult<T> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    let substituted = substitute_env_vars(&content);

    finish(
        Cfg::builder()
            .add_source(File::from_str(&substituted, format))
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ),
    )
}

/// Load [`GuardSettings`] from an optional file plus `LMGUARD__*` overrides.
/// Without a file, defaults apply before the overrides.
pub fn load_settings(path: Option<&str>) -> ConfigResult<GuardSettings> {
    debug!(path = ?path, "loading settings");
    match path {
        Some(path) => load_with_env(path, ENV_PREFIX),
        None => finish(
            Cfg::builder().add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            ),
        ),
    }
}

#[cfg(test)]
mod tests;
