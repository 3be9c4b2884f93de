//! Reading script sources with an encoding fallback chain.

use std::path::Path;

use encoding_rs::Encoding;
use tracing::{debug, warn};

use toolvault_shared::{Result, ToolVaultError};

/// Text embedded in the note when no configured encoding can decode a source.
pub const UNREADABLE_PLACEHOLDER: &str = "Unable to read file content, encoding issue detected.";

/// Decode `bytes` with the first encoding that accepts them without
/// replacement characters. Line endings come back as `\n`.
pub fn decode(bytes: &[u8], encodings: &[&'static Encoding]) -> Option<String> {
    encodings.iter().find_map(|encoding| {
        let text = encoding.decode_without_bom_handling_and_without_replacement(bytes)?;
        debug!(encoding = encoding.name(), "decoded source");
        Some(normalize_newlines(&text))
    })
}

/// Turn `\r\n` and lone `\r` into `\n`.
pub fn normalize_newlines(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Read the text of a source file.
///
/// I/O failures are errors; undecodable content is not, it is replaced by
/// [`UNREADABLE_PLACEHOLDER`].
pub fn read_source_text(path: &Path, encodings: &[&'static Encoding]) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ToolVaultError::io(path, e))?;
    Ok(decode(&bytes, encodings).unwrap_or_else(|| {
        warn!(path = %path.display(), "no configured encoding could decode source");
        UNREADABLE_PLACEHOLDER.to_string()
    }))
}
