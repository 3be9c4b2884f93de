//! Shared types, error model, and configuration for toolvault.
//!
//! This crate is the foundation depended on by all other toolvault crates.
//! It provides:
//! - [`ToolVaultError`] — the unified error type
//! - Domain types ([`SourceFile`], [`CategoryRule`])
//! - Configuration ([`AppConfig`], [`ArchiveConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, ArchiveConfig, ClassifierConfig, PathOverrides, PathsConfig, ScriptProfile,
    config_dir, config_file_path, expand_home, init_config, init_config_at, load_config,
    load_config_from,
};
pub use error::{Result, ToolVaultError};
pub use types::{CategoryRule, DEFAULT_CATEGORY, SourceFile, default_rules};
