//! Application configuration for toolvault.
//!
//! User config lives at `~/.toolvault/toolvault.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ToolVaultError};
use crate::types::{CategoryRule, DEFAULT_CATEGORY, default_rules};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "toolvault.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".toolvault";

// ---------------------------------------------------------------------------
// Config structs (matching toolvault.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Source, archive and vault locations.
    #[serde(default)]
    pub paths: PathsConfig,

    /// What kind of script is archived and how its note is rendered.
    #[serde(default)]
    pub script: ScriptProfile,

    /// Keyword classification rules.
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

/// `[paths]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    /// Directory scanned for new scripts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_dir: Option<String>,

    /// Flat directory receiving archived copies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archive_dir: Option<String>,

    /// Root of the note vault.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vault_dir: Option<String>,

    /// Notes area inside the vault; holds one directory per category.
    #[serde(default = "default_resources_subdir")]
    pub resources_subdir: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_dir: None,
            archive_dir: None,
            vault_dir: None,
            resources_subdir: default_resources_subdir(),
        }
    }
}

fn default_resources_subdir() -> String {
    "300-Resources/Python-Tools".into()
}

/// `[script]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptProfile {
    /// Extension (without the dot) of the files to archive.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Language tag used for the code fence and the note tags.
    #[serde(default = "default_language")]
    pub language: String,

    /// Command shown in the note's usage hint.
    #[serde(default = "default_interpreter")]
    pub interpreter: String,

    /// Runtime line listed under Dependencies.
    #[serde(default = "default_runtime")]
    pub runtime: String,

    /// Extension of the generated note files.
    #[serde(default = "default_doc_extension")]
    pub doc_extension: String,

    /// Text encodings tried in order when reading a source file.
    #[serde(default = "default_encodings")]
    pub encodings: Vec<String>,
}

impl Default for ScriptProfile {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            language: default_language(),
            interpreter: default_interpreter(),
            runtime: default_runtime(),
            doc_extension: default_doc_extension(),
            encodings: default_encodings(),
        }
    }
}

fn default_extension() -> String {
    "py".into()
}
fn default_language() -> String {
    "python".into()
}
fn default_interpreter() -> String {
    "python".into()
}
fn default_runtime() -> String {
    "Python 3.x".into()
}
fn default_doc_extension() -> String {
    "md".into()
}
fn default_encodings() -> Vec<String> {
    vec!["utf-8".into(), "gbk".into()]
}

/// `[classifier]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Category for tool names no rule matches.
    #[serde(default = "default_category")]
    pub default_category: String,

    /// Ordered `[[classifier.rules]]` list; first match wins.
    #[serde(default = "default_rules")]
    pub rules: Vec<CategoryRule>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            default_category: default_category(),
            rules: default_rules(),
        }
    }
}

fn default_category() -> String {
    DEFAULT_CATEGORY.into()
}

// ---------------------------------------------------------------------------
// Archive config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Path overrides coming from CLI flags or environment variables.
#[derive(Debug, Clone, Default)]
pub struct PathOverrides {
    pub source_dir: Option<PathBuf>,
    pub archive_dir: Option<PathBuf>,
    pub vault_dir: Option<PathBuf>,
}

/// Runtime archive configuration — merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct ArchiveConfig {
    /// Directory scanned for new scripts.
    pub source_dir: PathBuf,
    /// Flat archive directory; a same-named entry marks a file as done.
    pub archive_dir: PathBuf,
    /// `<vault>/<resources_subdir>`, parent of the category directories.
    pub resources_dir: PathBuf,
    /// Script kind and note rendering options.
    pub profile: ScriptProfile,
    /// Resolved decoders for `profile.encodings`, same order.
    pub encodings: Vec<&'static Encoding>,
    /// Ordered classification rules.
    pub rules: Vec<CategoryRule>,
    /// Category used when no rule matches.
    pub default_category: String,
}

impl ArchiveConfig {
    /// Merge the file config with CLI overrides and validate the result.
    pub fn resolve(config: &AppConfig, overrides: &PathOverrides) -> Result<Self> {
        let source_dir = pick_path(
            overrides.source_dir.as_ref(),
            config.paths.source_dir.as_deref(),
            "source_dir",
        )?;
        let archive_dir = pick_path(
            overrides.archive_dir.as_ref(),
            config.paths.archive_dir.as_deref(),
            "archive_dir",
        )?;
        let vault_dir = pick_path(
            overrides.vault_dir.as_ref(),
            config.paths.vault_dir.as_deref(),
            "vault_dir",
        )?;

        let extension = config.script.extension.trim_start_matches('.').to_string();
        if extension.is_empty() {
            return Err(ToolVaultError::config("script.extension must not be empty"));
        }
        let profile = ScriptProfile {
            extension,
            ..config.script.clone()
        };

        let encodings = resolve_encodings(&profile.encodings)?;

        if let Some(rule) = config.classifier.rules.iter().find(|r| r.keyword.is_empty()) {
            return Err(ToolVaultError::config(format!(
                "classifier rule for category '{}' has an empty keyword",
                rule.category
            )));
        }
        if config.classifier.default_category.trim().is_empty() {
            return Err(ToolVaultError::config(
                "classifier.default_category must not be empty",
            ));
        }

        Ok(Self {
            source_dir,
            archive_dir,
            resources_dir: vault_dir.join(&config.paths.resources_subdir),
            profile,
            encodings,
            rules: config.classifier.rules.clone(),
            default_category: config.classifier.default_category.clone(),
        })
    }
}

fn pick_path(flag: Option<&PathBuf>, file: Option<&str>, key: &str) -> Result<PathBuf> {
    match (flag, file) {
        (Some(p), _) => Ok(p.clone()),
        (None, Some(s)) if !s.trim().is_empty() => Ok(expand_home(s)),
        _ => Err(ToolVaultError::config(format!(
            "{key} is not set. Pass it on the command line or set paths.{key} in {CONFIG_FILE_NAME}"
        ))),
    }
}

fn resolve_encodings(labels: &[String]) -> Result<Vec<&'static Encoding>> {
    if labels.is_empty() {
        return Err(ToolVaultError::config(
            "script.encodings must list at least one encoding",
        ));
    }
    labels
        .iter()
        .map(|label| {
            Encoding::for_label(label.trim().as_bytes())
                .ok_or_else(|| ToolVaultError::config(format!("unknown text encoding '{label}'")))
        })
        .collect()
}

/// Expand a leading `~` to the user's home directory.
pub fn expand_home(path: &str) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => rest,
        _ => return PathBuf::from(path),
    };
    match dirs::home_dir() {
        Some(home) => home.join(rest.trim_start_matches(['/', '\\'])),
        None => PathBuf::from(path),
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.toolvault/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| ToolVaultError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.toolvault/toolvault.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| ToolVaultError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        ToolVaultError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let path = config_file_path()?;
    init_config_at(&path)?;
    Ok(path)
}

/// Write a default config file at `path`, refusing to replace an existing one.
pub fn init_config_at(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(ToolVaultError::config(format!(
            "{} already exists; edit it or remove it first",
            path.display()
        )));
    }
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ToolVaultError::io(dir, e))?;
    }

    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| ToolVaultError::config(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ToolVaultError::io(path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(())
}
