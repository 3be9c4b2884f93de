//! End-to-end archive run: setup → discovery → filtering → per-file archive + note.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use serde::Serialize;
use tracing::{info, instrument, warn};

use toolvault_shared::{ArchiveConfig, Result, SourceFile, ToolVaultError};

use crate::archive::{archive_file, archived_names};
use crate::classify::Classifier;
use crate::document::write_document;

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// A script that was archived and documented.
#[derive(Debug, Clone, Serialize)]
pub struct ProcessedFile {
    pub file_name: String,
    pub tool_name: String,
    pub category: String,
    pub archive_path: PathBuf,
    pub document_path: PathBuf,
}

/// A script whose processing failed; the run went on without it.
#[derive(Debug, Clone, Serialize)]
pub struct FailedFile {
    pub file_name: String,
    pub error: String,
}

/// Summary of a run that processed at least one new file.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Matching files found in the source directory.
    pub discovered: usize,
    /// Of those, how many were already archived.
    pub already_archived: usize,
    pub processed: Vec<ProcessedFile>,
    pub failed: Vec<FailedFile>,
    /// Wall time of the whole run, in milliseconds.
    pub elapsed_ms: u64,
}

/// How a run ended. All three are normal terminations.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RunOutcome {
    /// The source directory holds no file with the script extension.
    NoSourceFiles,
    /// Every matching file is already in the archive.
    NothingNew { discovered: usize },
    /// New files were processed (some may have failed).
    Completed(RunSummary),
}

/// A new file and the category it would be filed under.
#[derive(Debug, Clone, Serialize)]
pub struct PendingFile {
    pub file_name: String,
    pub category: String,
}

/// Result of a dry scan.
#[derive(Debug, Clone, Serialize)]
pub struct PendingReport {
    pub discovered: usize,
    pub already_archived: usize,
    pub pending: Vec<PendingFile>,
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting run status.
pub trait ProgressReporter {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called for each directory created or confirmed during setup.
    fn directory_ready(&self, path: &Path);
    /// Called after a file was archived and documented.
    fn file_processed(&self, file: &ProcessedFile);
    /// Called when processing a file failed.
    fn file_failed(&self, file: &FailedFile);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn directory_ready(&self, _path: &Path) {}
    fn file_processed(&self, _file: &ProcessedFile) {}
    fn file_failed(&self, _file: &FailedFile) {}
}

// ---------------------------------------------------------------------------
// Phases
// ---------------------------------------------------------------------------

/// Create the archive directory and one note directory per category.
///
/// Existing directories are left alone. Returns the directories, in creation
/// order.
pub fn ensure_directories(
    config: &ArchiveConfig,
    classifier: &Classifier,
    progress: &dyn ProgressReporter,
) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<PathBuf> = classifier
        .categories()
        .into_iter()
        .map(|category| config.resources_dir.join(category))
        .collect();
    dirs.push(config.archive_dir.clone());

    for dir in &dirs {
        std::fs::create_dir_all(dir).map_err(|e| ToolVaultError::io(dir, e))?;
        info!(path = %dir.display(), "created/confirmed directory");
        progress.directory_ready(dir);
    }
    Ok(dirs)
}

/// List regular files in the source directory carrying the script extension,
/// sorted by name.
pub fn discover_sources(config: &ArchiveConfig) -> Result<Vec<SourceFile>> {
    let source_dir = &config.source_dir;
    let suffix = format!(".{}", config.profile.extension);

    let entries = std::fs::read_dir(source_dir).map_err(|e| ToolVaultError::io(source_dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ToolVaultError::io(source_dir, e))?;
        let Ok(name) = entry.file_name().into_string() else {
            warn!(name = ?entry.file_name(), "skipping source with non UTF-8 name");
            continue;
        };
        if name.ends_with(&suffix) && entry.path().is_file() {
            files.push(SourceFile::new(source_dir, name));
        }
    }
    files.sort_by(|a, b| a.file_name.cmp(&b.file_name));
    Ok(files)
}

/// Keep the files whose name is not in the archive snapshot.
pub fn filter_new(discovered: Vec<SourceFile>, archived: &BTreeSet<String>) -> Vec<SourceFile> {
    discovered
        .into_iter()
        .filter(|f| !archived.contains(&f.file_name))
        .collect()
}

/// Archive one file and write its note.
pub fn process_file(
    file: &SourceFile,
    config: &ArchiveConfig,
    classifier: &Classifier,
) -> Result<ProcessedFile> {
    let category = classifier.classify(&file.tool_name);
    let target_dir = config.resources_dir.join(category);

    let archive_path = archive_file(file, &config.archive_dir)?;
    let document_path = write_document(
        &file.tool_name,
        category,
        &file.path,
        &archive_path,
        &target_dir,
        config,
    )?;

    Ok(ProcessedFile {
        file_name: file.file_name.clone(),
        tool_name: file.tool_name.clone(),
        category: category.to_string(),
        archive_path,
        document_path,
    })
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Show which files a run would process, without touching the filesystem.
pub fn pending(config: &ArchiveConfig) -> Result<PendingReport> {
    let classifier = Classifier::from_config(config);
    let archived = archived_names(&config.archive_dir)?;
    let discovered = discover_sources(config)?;
    let total = discovered.len();
    let new_files = filter_new(discovered, &archived);

    Ok(PendingReport {
        discovered: total,
        already_archived: total - new_files.len(),
        pending: new_files
            .iter()
            .map(|f| PendingFile {
                file_name: f.file_name.clone(),
                category: classifier.classify(&f.tool_name).to_string(),
            })
            .collect(),
    })
}

/// Run the full archive pipeline.
///
/// 1. Setup: archive and category directories
/// 2. Discovery: scripts in the source directory
/// 3. Filtering: drop names already archived (snapshot taken once)
/// 4. Per file: classify, copy, write note. Failures are recorded and the
///    loop continues.
#[instrument(skip_all, fields(source = %config.source_dir.display()))]
pub fn run(config: &ArchiveConfig, progress: &dyn ProgressReporter) -> Result<RunOutcome> {
    let start = Instant::now();
    let classifier = Classifier::from_config(config);

    // --- Phase 1: Setup ---
    progress.phase("Preparing directories");
    ensure_directories(config, &classifier, progress)?;

    // --- Phase 2: Discovery + filtering ---
    progress.phase("Scanning sources");
    let archived = archived_names(&config.archive_dir)?;
    let discovered = discover_sources(config)?;

    if discovered.is_empty() {
        info!(extension = %config.profile.extension, "no source files found");
        return Ok(RunOutcome::NoSourceFiles);
    }

    let total = discovered.len();
    let new_files = filter_new(discovered, &archived);
    if new_files.is_empty() {
        info!(discovered = total, "no new files to process");
        return Ok(RunOutcome::NothingNew { discovered: total });
    }

    info!(
        discovered = total,
        new = new_files.len(),
        "processing new files"
    );

    // --- Phase 3: Per-file processing ---
    progress.phase("Processing files");
    let mut processed = Vec::new();
    let mut failed = Vec::new();

    for file in &new_files {
        match process_file(file, config, &classifier) {
            Ok(done) => {
                info!(file = %done.file_name, category = %done.category, "processed");
                progress.file_processed(&done);
                processed.push(done);
            }
            Err(e) => {
                warn!(file = %file.file_name, error = %e, "processing failed, skipping file");
                let failure = FailedFile {
                    file_name: file.file_name.clone(),
                    error: e.to_string(),
                };
                progress.file_failed(&failure);
                failed.push(failure);
            }
        }
    }

    Ok(RunOutcome::Completed(RunSummary {
        discovered: total,
        already_archived: total - new_files.len(),
        processed,
        failed,
        elapsed_ms: u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX),
    }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use toolvault_shared::{AppConfig, PathOverrides};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("tv-pipeline-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(dir.join("src")).unwrap();
        dir
    }

    fn make_config(root: &Path) -> ArchiveConfig {
        let overrides = PathOverrides {
            source_dir: Some(root.join("src")),
            archive_dir: Some(root.join("archive")),
            vault_dir: Some(root.join("vault")),
        };
        ArchiveConfig::resolve(&AppConfig::default(), &overrides).unwrap()
    }

    fn write_source(root: &Path, name: &str, content: &str) {
        std::fs::write(root.join("src").join(name), content).unwrap();
    }

    fn dir_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = match std::fs::read_dir(dir) {
            Ok(entries) => entries
                .map(|e| e.unwrap().file_name().into_string().unwrap())
                .collect(),
            Err(_) => Vec::new(),
        };
        names.sort();
        names
    }

    fn completed(outcome: RunOutcome) -> RunSummary {
        match outcome {
            RunOutcome::Completed(summary) => summary,
            other => panic!("expected a completed run, got {other:?}"),
        }
    }

    #[derive(Default)]
    struct Recorder {
        dirs: RefCell<Vec<PathBuf>>,
        ok: RefCell<Vec<String>>,
        failed: RefCell<Vec<String>>,
    }

    impl ProgressReporter for Recorder {
        fn phase(&self, _name: &str) {}
        fn directory_ready(&self, path: &Path) {
            self.dirs.borrow_mut().push(path.to_path_buf());
        }
        fn file_processed(&self, file: &ProcessedFile) {
            self.ok.borrow_mut().push(file.file_name.clone());
        }
        fn file_failed(&self, file: &FailedFile) {
            self.failed.borrow_mut().push(file.file_name.clone());
        }
    }

    #[test]
    fn end_to_end_two_files() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "checkword_en.py", "WORDS = ['a', 'b']\n");
        write_source(&tmp, "merge_files.py", "print('merging')\n");

        let summary = completed(run(&config, &SilentProgress).unwrap());
        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.already_archived, 0);
        assert_eq!(summary.processed.len(), 2);
        assert!(summary.failed.is_empty());

        assert_eq!(
            dir_names(&config.archive_dir),
            vec!["checkword_en.py", "merge_files.py"]
        );

        let checkword = config.resources_dir.join("Text-Processing/checkword_en.md");
        let note = std::fs::read_to_string(&checkword).unwrap();
        assert!(note.contains("Text-Processing"));
        assert_eq!(
            toolvault_markdown::extract_source(&note, "python"),
            Some("WORDS = ['a', 'b']\n")
        );

        let merge = config.resources_dir.join("Utility/merge_files.md");
        let note = std::fs::read_to_string(&merge).unwrap();
        let usage = note
            .split("## Usage\n")
            .nth(1)
            .and_then(|rest| rest.lines().next())
            .unwrap();
        assert!(usage.contains("merge"));

        // Second run: nothing new
        let second = run(&config, &SilentProgress).unwrap();
        assert!(matches!(second, RunOutcome::NothingNew { discovered: 2 }));
        assert_eq!(dir_names(&config.archive_dir).len(), 2);
        assert_eq!(
            dir_names(&config.resources_dir.join("Text-Processing")),
            vec!["checkword_en.md"]
        );
        assert_eq!(
            dir_names(&config.resources_dir.join("Utility")),
            vec!["merge_files.md"]
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn empty_source_reports_no_files() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "readme.txt", "not a script");

        let outcome = run(&config, &SilentProgress).unwrap();
        assert!(matches!(outcome, RunOutcome::NoSourceFiles));

        assert!(dir_names(&config.archive_dir).is_empty());
        for category in ["Data-Processing", "Text-Processing", "Utility"] {
            assert!(dir_names(&config.resources_dir.join(category)).is_empty());
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn unmatched_name_goes_to_default_category() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "xyzzy.py", "pass\n");

        let summary = completed(run(&config, &SilentProgress).unwrap());
        assert_eq!(summary.processed[0].category, "Utility");
        assert!(config.resources_dir.join("Utility/xyzzy.md").exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn already_archived_files_are_skipped() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "jsonc_strip.py", "new content\n");
        write_source(&tmp, "edjc_fix.py", "print(1)\n");
        std::fs::create_dir_all(&config.archive_dir).unwrap();
        std::fs::write(config.archive_dir.join("jsonc_strip.py"), "old content\n").unwrap();

        let summary = completed(run(&config, &SilentProgress).unwrap());
        assert_eq!(summary.discovered, 2);
        assert_eq!(summary.already_archived, 1);
        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.processed[0].file_name, "edjc_fix.py");

        // Archived copy untouched, no note rendered
        assert_eq!(
            std::fs::read_to_string(config.archive_dir.join("jsonc_strip.py")).unwrap(),
            "old content\n"
        );
        assert!(dir_names(&config.resources_dir.join("Data-Processing")).is_empty());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn failure_does_not_stop_the_run() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "claude_export.py", "print('a')\n");
        write_source(&tmp, "rpatxt_scan.py", "print('b')\n");

        // A directory squatting on the note path makes the write fail
        std::fs::create_dir_all(config.resources_dir.join("Text-Processing/rpatxt_scan.md"))
            .unwrap();

        let recorder = Recorder::default();
        let summary = completed(run(&config, &recorder).unwrap());

        assert_eq!(summary.processed.len(), 1);
        assert_eq!(summary.processed[0].file_name, "claude_export.py");
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].file_name, "rpatxt_scan.py");
        assert!(summary.failed[0].error.contains("rpatxt_scan.md"));

        assert_eq!(*recorder.ok.borrow(), vec!["claude_export.py"]);
        assert_eq!(*recorder.failed.borrow(), vec!["rpatxt_scan.py"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn missing_source_dir_aborts_run() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        std::fs::remove_dir_all(&config.source_dir).unwrap();

        let err = run(&config, &SilentProgress).unwrap_err();
        assert!(matches!(err, ToolVaultError::Io { .. }));

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn setup_is_idempotent() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        let classifier = Classifier::from_config(&config);

        let recorder = Recorder::default();
        let first = ensure_directories(&config, &classifier, &recorder).unwrap();
        std::fs::write(config.resources_dir.join("Utility/keep.md"), "keep").unwrap();
        let second = ensure_directories(&config, &classifier, &recorder).unwrap();

        assert_eq!(first, second);
        assert_eq!(first.len(), 4);
        assert_eq!(recorder.dirs.borrow().len(), 8);
        assert_eq!(
            std::fs::read_to_string(config.resources_dir.join("Utility/keep.md")).unwrap(),
            "keep"
        );

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn discovery_ignores_directories_and_other_extensions() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "b_tool.py", "");
        write_source(&tmp, "a_tool.py", "");
        write_source(&tmp, "notes.pyc", "");
        std::fs::create_dir_all(tmp.join("src").join("package.py")).unwrap();

        let found: Vec<_> = discover_sources(&config)
            .unwrap()
            .into_iter()
            .map(|f| f.file_name)
            .collect();
        assert_eq!(found, vec!["a_tool.py", "b_tool.py"]);

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn pending_does_not_touch_filesystem() {
        let tmp = temp_dir();
        let config = make_config(&tmp);
        write_source(&tmp, "850dic_build.py", "");
        write_source(&tmp, "import_notes.py", "");

        let report = pending(&config).unwrap();
        assert_eq!(report.discovered, 2);
        assert_eq!(report.already_archived, 0);
        let pairs: Vec<_> = report
            .pending
            .iter()
            .map(|p| (p.file_name.as_str(), p.category.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("850dic_build.py", "Data-Processing"),
                ("import_notes.py", "Utility")
            ]
        );

        assert!(!config.archive_dir.exists());
        assert!(!config.resources_dir.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let json = serde_json::to_value(RunOutcome::NothingNew { discovered: 3 }).unwrap();
        assert_eq!(json["status"], "nothing_new");
        assert_eq!(json["discovered"], 3);

        let json = serde_json::to_value(RunOutcome::NoSourceFiles).unwrap();
        assert_eq!(json["status"], "no_source_files");
    }
}
