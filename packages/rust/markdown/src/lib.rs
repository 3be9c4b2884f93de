//! Note rendering for archived scripts.
//!
//! Builds the Markdown note stored in the vault for each archived script:
//! YAML-style frontmatter, file information, usage hint, the full source in a
//! fenced block, and placeholder sections meant to be filled in by hand.

use std::path::Path;

use chrono::NaiveDateTime;
use tracing::instrument;

use toolvault_shared::ScriptProfile;

/// Date format used for `created`, `last_used` and the history entry.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Timestamp format used for the "Creation Time" line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Heading that opens the fenced source block.
const SOURCE_HEADING: &str = "## Source Code";

/// Heading that follows the fenced source block.
const DESCRIPTION_HEADING: &str = "## Description";

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Everything that goes into one generated note.
#[derive(Debug, Clone)]
pub struct DocumentRecord<'a> {
    /// Script file name without extension; note title and file name.
    pub tool_name: &'a str,
    /// Category the script was filed under.
    pub category: &'a str,
    /// Where the archived copy lives.
    pub archive_path: &'a Path,
    /// Decoded source text, embedded verbatim.
    pub source_text: &'a str,
    /// Local time the note was rendered.
    pub created_at: NaiveDateTime,
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

/// Render the note for `record`.
///
/// Layout, top to bottom: frontmatter (`type`, `name`, `created`,
/// `last_used`, `archive_path`, `tags`), title, File Information, Usage,
/// Source Code, Description, Dependencies, Update History.
#[instrument(skip_all, fields(tool = %record.tool_name, category = %record.category))]
pub fn render(record: &DocumentRecord<'_>, profile: &ScriptProfile) -> String {
    let date = record.created_at.format(DATE_FORMAT).to_string();
    let timestamp = record.created_at.format(TIMESTAMP_FORMAT);
    let archive_path = record.archive_path.display();
    let tool = record.tool_name;
    let lang = &profile.language;

    let mut out = String::with_capacity(record.source_text.len() + 512);

    out.push_str("---\n");
    out.push_str(&format!("type: {lang}-tool\n"));
    out.push_str(&format!("name: {tool}\n"));
    out.push_str(&format!("created: {date}\n"));
    out.push_str(&format!("last_used: {date}\n"));
    out.push_str(&format!("archive_path: {archive_path}\n"));
    out.push_str(&format!("tags: #{lang} #tool #{}\n", record.category));
    out.push_str("---\n\n");

    out.push_str(&format!("# {tool}\n\n"));

    out.push_str("## File Information\n");
    out.push_str(&format!("- Archive Location: {archive_path}\n"));
    out.push_str(&format!("- Creation Time: {timestamp}\n\n"));

    out.push_str("## Usage\n");
    out.push_str(&format!(
        "Run in terminal: `{} {tool}.{}`\n\n",
        profile.interpreter, profile.extension
    ));

    out.push_str(&format!("{SOURCE_HEADING}\n```{lang}\n"));
    out.push_str(record.source_text);
    out.push_str("\n```\n\n");

    out.push_str(&format!("{DESCRIPTION_HEADING}\n"));
    out.push_str("[Add main functionality description here]\n\n");

    out.push_str("## Dependencies\n");
    out.push_str(&format!("- {}\n", profile.runtime));
    out.push_str("- [Other dependencies]\n\n");

    out.push_str("## Update History\n");
    out.push_str(&format!("- {date}: Initial import\n"));

    out
}

/// Recover the embedded source text from a rendered note.
///
/// Returns `None` if the note does not contain a Source Code block for
/// `language`.
pub fn extract_source<'a>(note: &'a str, language: &str) -> Option<&'a str> {
    let open = format!("{SOURCE_HEADING}\n```{language}\n");
    let close = format!("\n```\n\n{DESCRIPTION_HEADING}");

    let start = note.find(&open)? + open.len();
    // The closing fence is searched from the end: the source itself may
    // contain fences.
    let end = note.rfind(&close)?;
    (end >= start).then(|| &note[start..end])
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
