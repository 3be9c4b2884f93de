//! Writing the vault note for an archived script.

use std::path::{Path, PathBuf};

use chrono::Local;
use tracing::debug;

use toolvault_markdown::DocumentRecord;
use toolvault_shared::{ArchiveConfig, Result, ToolVaultError};

use crate::source::read_source_text;

/// Render and write `<output_dir>/<tool_name>.<doc_extension>`.
///
/// The source text is read from `original_path`; `archive_path` is only
/// recorded in the note. An existing note with the same name is overwritten.
pub fn write_document(
    tool_name: &str,
    category: &str,
    original_path: &Path,
    archive_path: &Path,
    output_dir: &Path,
    config: &ArchiveConfig,
) -> Result<PathBuf> {
    let source_text = read_source_text(original_path, &config.encodings)?;

    let record = DocumentRecord {
        tool_name,
        category,
        archive_path,
        source_text: &source_text,
        created_at: Local::now().naive_local(),
    };
    let note = toolvault_markdown::render(&record, &config.profile);

    let doc_path = output_dir.join(format!("{tool_name}.{}", config.profile.doc_extension));
    std::fs::write(&doc_path, note).map_err(|e| ToolVaultError::io(&doc_path, e))?;

    debug!(path = %doc_path.display(), "wrote note");
    Ok(doc_path)
}
