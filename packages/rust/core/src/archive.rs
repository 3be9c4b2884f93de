//! The flat archive directory: membership index and metadata-preserving copy.

use std::collections::BTreeSet;
use std::fs::{File, FileTimes, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use toolvault_shared::{Result, SourceFile, ToolVaultError};

/// Names of the entries currently in the archive directory.
///
/// A missing archive directory is an empty archive, not an error.
pub fn archived_names(archive_dir: &Path) -> Result<BTreeSet<String>> {
    let entries = match std::fs::read_dir(archive_dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %archive_dir.display(), "archive directory missing, treating as empty");
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(ToolVaultError::io(archive_dir, e)),
    };

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.map_err(|e| ToolVaultError::io(archive_dir, e))?;
        match entry.file_name().into_string() {
            Ok(name) => {
                names.insert(name);
            }
            Err(raw) => warn!(name = ?raw, "skipping archive entry with non UTF-8 name"),
        }
    }
    Ok(names)
}

/// Copy `file` into `archive_dir` under its original name.
///
/// Returns the path of the archived copy.
pub fn archive_file(file: &SourceFile, archive_dir: &Path) -> Result<PathBuf> {
    let dest = archive_dir.join(&file.file_name);
    copy_preserving_times(&file.path, &dest)?;
    debug!(from = %file.path.display(), to = %dest.display(), "archived source");
    Ok(dest)
}

/// Copy contents and permissions, then carry over access and modification
/// times.
pub fn copy_preserving_times(from: &Path, to: &Path) -> Result<()> {
    std::fs::copy(from, to).map_err(|e| ToolVaultError::io(to, e))?;

    let meta = std::fs::metadata(from).map_err(|e| ToolVaultError::io(from, e))?;
    let mut times = FileTimes::new();
    if let Ok(modified) = meta.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = meta.accessed() {
        times = times.set_accessed(accessed);
    }

    // A read-only source yields a read-only copy; owners may still set its times.
    let dest = OpenOptions::new()
        .write(true)
        .open(to)
        .or_else(|_| File::open(to))
        .map_err(|e| ToolVaultError::io(to, e))?;
    dest.set_times(times).map_err(|e| ToolVaultError::io(to, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tv-archive-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_archive_is_empty() {
        let tmp = temp_dir();
        let names = archived_names(&tmp.join("does-not-exist")).unwrap();
        assert!(names.is_empty());
        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn lists_existing_names() {
        let tmp = temp_dir();
        std::fs::write(tmp.join("a.py"), "a").unwrap();
        std::fs::write(tmp.join("notes.txt"), "n").unwrap();
        std::fs::create_dir(tmp.join("old")).unwrap();

        let names = archived_names(&tmp).unwrap();
        let names: Vec<_> = names.into_iter().collect();
        assert_eq!(names, vec!["a.py", "notes.txt", "old"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn archive_index_on_a_file_is_an_error() {
        let tmp = temp_dir();
        let not_a_dir = tmp.join("archive");
        std::fs::write(&not_a_dir, "").unwrap();

        assert!(archived_names(&not_a_dir).is_err());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn archive_file_copies_under_original_name() {
        let tmp = temp_dir();
        let src_dir = tmp.join("src");
        let archive = tmp.join("archive");
        std::fs::create_dir_all(&src_dir).unwrap();
        std::fs::create_dir_all(&archive).unwrap();
        std::fs::write(src_dir.join("merge_files.py"), "print('merge')\n").unwrap();

        let file = SourceFile::new(&src_dir, "merge_files.py");
        let dest = archive_file(&file, &archive).unwrap();

        assert_eq!(dest, archive.join("merge_files.py"));
        assert_eq!(std::fs::read_to_string(&dest).unwrap(), "print('merge')\n");
        assert!(file.path.exists(), "source must be left in place");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_keeps_modification_time() {
        let tmp = temp_dir();
        let src = tmp.join("old.py");
        let dst = tmp.join("copy.py");
        std::fs::write(&src, "x = 1").unwrap();

        let past = SystemTime::now() - Duration::from_secs(86_400 * 30);
        let f = OpenOptions::new().write(true).open(&src).unwrap();
        f.set_times(FileTimes::new().set_modified(past)).unwrap();
        drop(f);

        copy_preserving_times(&src, &dst).unwrap();

        let src_mtime = std::fs::metadata(&src).unwrap().modified().unwrap();
        let dst_mtime = std::fs::metadata(&dst).unwrap().modified().unwrap();
        assert_eq!(src_mtime, dst_mtime);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn copy_missing_source_fails() {
        let tmp = temp_dir();
        let err = copy_preserving_times(&tmp.join("nope.py"), &tmp.join("out.py")).unwrap_err();
        assert!(matches!(err, ToolVaultError::Io { .. }));
        let _ = std::fs::remove_dir_all(&tmp);
    }
}
