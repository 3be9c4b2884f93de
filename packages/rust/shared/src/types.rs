//! Core domain types shared by the toolvault crates.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Category used when no keyword rule matches a tool name.
pub const DEFAULT_CATEGORY: &str = "Utility";

// ---------------------------------------------------------------------------
// CategoryRule
// ---------------------------------------------------------------------------

/// A single `keyword → category` classification rule.
///
/// Rules are always kept in an ordered list: the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    /// Substring looked for (case-insensitively) in the tool name.
    pub keyword: String,
    /// Category label, also the name of the note subdirectory.
    pub category: String,
}

impl CategoryRule {
    pub fn new(keyword: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            category: category.into(),
        }
    }
}

/// The built-in rule list, in match order.
pub fn default_rules() -> Vec<CategoryRule> {
    [
        ("jsonc", "Data-Processing"),
        ("packagelock", "Data-Processing"),
        ("checkword", "Text-Processing"),
        ("edjc", "Text-Processing"),
        ("850dic", "Data-Processing"),
        ("merge", "Utility"),
        ("digit", "Utility"),
        ("rpatxt", "Text-Processing"),
        ("import", "Utility"),
        ("claude", "Utility"),
    ]
    .into_iter()
    .map(|(keyword, category)| CategoryRule::new(keyword, category))
    .collect()
}

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// A candidate script found in the source directory during discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// File name including extension (e.g. `merge_files.py`).
    pub file_name: String,
    /// File name without its extension (e.g. `merge_files`).
    pub tool_name: String,
    /// Full path inside the source directory.
    pub path: PathBuf,
}

impl SourceFile {
    /// Build a source file entry for `file_name` inside `source_dir`.
    pub fn new(source_dir: &Path, file_name: impl Into<String>) -> Self {
        let file_name = file_name.into();
        let tool_name = Path::new(&file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| file_name.clone());
        Self {
            path: source_dir.join(&file_name),
            tool_name,
            file_name,
        }
    }
}
