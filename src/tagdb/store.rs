//! # Database Files on Disk
//!
//! One database is one JSON file. Opening yields a [`Session`] that
//! exclusively owns the in-memory [`Document`] until it is flushed back:
//! [`Session::close`] persists explicitly, and a `Drop` fallback flushes
//! best-effort so no exit path loses state. Persistence is always a
//! whole-file overwrite; there is no incremental diffing and no file
//! locking (two processes racing on one file means last writer wins).
//!
//! If the document has backups enabled, `open` copies the raw file bytes
//! into a per-database backup directory before anything can mutate, then
//! prunes old backups past the retention count. Whether a failed backup
//! aborts the open is the caller's choice via [`BackupPolicy`].

use chrono::Utc;
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config;
use crate::error::{Result, TagdbError};
use crate::model::{Document, FORMAT_VERSION};

/// File extension for database files, without the dot.
pub const DB_EXTENSION: &str = "tagdb";

const BACKUP_DIR_PREFIX: &str = ".tagdb_backups_";

static CURRENT_VERSION: Lazy<(u32, u32, u32)> =
    Lazy::new(|| parse_version(FORMAT_VERSION).expect("package version is MAJOR.MINOR.PATCH"));

/// What to do when the pre-mutation backup cannot be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Abort the open; no session without a backup.
    #[default]
    Required,
    /// Record a warning on the session and continue.
    BestEffort,
}

/// Create a new, empty database file.
///
/// Appends the `.tagdb` extension when `name` doesn't already carry it.
/// Fails with `AlreadyExists` if the target file is present.
pub fn create(name: &str, dir: impl AsRef<Path>) -> Result<PathBuf> {
    let file_name = if name.ends_with(&format!(".{}", DB_EXTENSION)) {
        name.to_string()
    } else {
        format!("{}.{}", name, DB_EXTENSION)
    };
    let path = dir.as_ref().join(file_name);
    if path.exists() {
        return Err(TagdbError::AlreadyExists(path));
    }
    fs::create_dir_all(dir.as_ref())?;
    save(&path, &Document::new())?;
    Ok(path)
}

/// Serialize `doc` to `path`, fully overwriting prior content.
pub fn save(path: impl AsRef<Path>, doc: &Document) -> Result<()> {
    let json = serde_json::to_string(doc)?;
    fs::write(path.as_ref(), json)?;
    Ok(())
}

/// An open database: the document plus the path it flushes back to.
///
/// Exactly one session owns a document at a time. Warnings collected while
/// opening (version skew, best-effort backup failure) are for the caller to
/// surface; the engine never prints.
#[derive(Debug)]
pub struct Session {
    path: PathBuf,
    doc: Document,
    warnings: Vec<String>,
    flushed: bool,
}

impl Session {
    /// Open the database at `path`.
    ///
    /// Fails with `DatabaseMissing` if the file is absent and `Corrupt` if
    /// its content doesn't deserialize per the document format. A stored
    /// version newer than this build warns and proceeds.
    pub fn open(path: impl AsRef<Path>, policy: BackupPolicy) -> Result<Session> {
        let path = path.as_ref().to_path_buf();
        if !path.exists() {
            return Err(TagdbError::DatabaseMissing(path));
        }
        let raw = fs::read_to_string(&path)?;
        let doc: Document = serde_json::from_str(&raw).map_err(|e| TagdbError::Corrupt {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        let mut warnings = Vec::new();
        let stored = parse_version(&doc.version).ok_or_else(|| TagdbError::Corrupt {
            path: path.clone(),
            reason: format!("unrecognized version string '{}'", doc.version),
        })?;
        if stored > *CURRENT_VERSION {
            warnings.push(format!(
                "The database at {} was last modified by tagdb version {}, which is \
                 newer than the currently installed ({}). Please consider upgrading.",
                path.display(),
                doc.version,
                FORMAT_VERSION
            ));
        }

        if doc.backups_enabled {
            if let Err(e) = write_backup(&path, &raw) {
                match policy {
                    BackupPolicy::Required => return Err(e),
                    BackupPolicy::BestEffort => {
                        warnings.push(format!("Backup could not be written: {}", e));
                    }
                }
            }
        }

        Ok(Session {
            path,
            doc,
            warnings,
            flushed: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &Document {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Flush the document back to its file and end the session.
    pub fn close(mut self) -> Result<()> {
        self.flushed = true;
        save(&self.path, &self.doc)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.flushed {
            let _ = save(&self.path, &self.doc);
        }
    }
}

/// Copy the raw file content into the per-database backup directory, then
/// prune backups beyond the retention count.
fn write_backup(db_path: &Path, raw: &str) -> Result<()> {
    let stem = db_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(DB_EXTENSION);
    let parent = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent.join(format!("{}{}", BACKUP_DIR_PREFIX, stem));
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Utc::now().timestamp();
    let backup_path = backup_dir.join(format!("{}_{}.{}", stem, timestamp, DB_EXTENSION));
    fs::write(&backup_path, raw)?;

    prune_backups(&backup_dir, config::backup_keep_count());
    Ok(())
}

/// Remove the oldest backups until at most `keep` remain. Pruning is
/// best-effort: a backup that can't be removed is left behind.
fn prune_backups(dir: &Path, keep: usize) {
    let Ok(read) = fs::read_dir(dir) else {
        return;
    };
    let mut files: Vec<PathBuf> = read
        .flatten()
        .map(|e| e.path())
        .filter(|p| p.is_file())
        .collect();
    // Names embed a Unix timestamp, so lexicographic order is age order.
    files.sort();
    while files.len() > keep {
        let oldest = files.remove(0);
        let _ = fs::remove_file(oldest);
    }
}

fn parse_version(version: &str) -> Option<(u32, u32, u32)> {
    let mut parts = version.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Attrs;
    use tempfile::tempdir;

    #[test]
    fn test_create_writes_empty_document() {
        let dir = tempdir().unwrap();
        let path = create("notes", dir.path()).unwrap();

        assert_eq!(path, dir.path().join("notes.tagdb"));
        let session = Session::open(&path, BackupPolicy::Required).unwrap();
        assert!(session.document().is_empty());
        assert_eq!(session.document().version, FORMAT_VERSION);
    }

    #[test]
    fn test_create_keeps_existing_extension() {
        let dir = tempdir().unwrap();
        let path = create("notes.tagdb", dir.path()).unwrap();
        assert_eq!(path, dir.path().join("notes.tagdb"));
    }

    #[test]
    fn test_create_fails_on_existing_file() {
        let dir = tempdir().unwrap();
        create("notes", dir.path()).unwrap();
        assert!(matches!(
            create("notes", dir.path()),
            Err(TagdbError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.tagdb");
        assert!(matches!(
            Session::open(&missing, BackupPolicy::Required),
            Err(TagdbError::DatabaseMissing(_))
        ));
    }

    #[test]
    fn test_open_corrupt_content() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.tagdb");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Session::open(&path, BackupPolicy::Required),
            Err(TagdbError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_open_unparseable_version() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("odd.tagdb");
        fs::write(
            &path,
            r#"{"tags":[],"enforce_tags":false,"backups_enabled":false,"data":[],"version":"latest"}"#,
        )
        .unwrap();
        assert!(matches!(
            Session::open(&path, BackupPolicy::Required),
            Err(TagdbError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_open_newer_version_warns_but_proceeds() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("future.tagdb");
        fs::write(
            &path,
            r#"{"tags":[],"enforce_tags":false,"backups_enabled":false,"data":[],"version":"99.0.0"}"#,
        )
        .unwrap();

        let session = Session::open(&path, BackupPolicy::Required).unwrap();
        assert_eq!(session.warnings().len(), 1);
        assert!(session.warnings()[0].contains("99.0.0"));
    }

    #[test]
    fn test_open_same_version_no_warning() {
        let dir = tempdir().unwrap();
        let path = create("now", dir.path()).unwrap();
        let session = Session::open(&path, BackupPolicy::Required).unwrap();
        assert!(session.warnings().is_empty());
    }

    #[test]
    fn test_close_persists_mutations() {
        let dir = tempdir().unwrap();
        let path = create("roundtrip", dir.path()).unwrap();

        let mut session = Session::open(&path, BackupPolicy::Required).unwrap();
        session
            .document_mut()
            .set_entry("hello".into(), vec!["t".into()], Attrs::new())
            .unwrap();
        session.close().unwrap();

        let reopened = Session::open(&path, BackupPolicy::Required).unwrap();
        assert_eq!(reopened.document().len(), 1);
        assert_eq!(reopened.document().entry_at(0).unwrap().text, "hello");
    }

    #[test]
    fn test_drop_flushes_when_close_is_forgotten() {
        let dir = tempdir().unwrap();
        let path = create("dropped", dir.path()).unwrap();

        {
            let mut session = Session::open(&path, BackupPolicy::Required).unwrap();
            session
                .document_mut()
                .set_entry("still here".into(), Vec::new(), Attrs::new())
                .unwrap();
            // No close: the Drop impl must flush.
        }

        let reopened = Session::open(&path, BackupPolicy::Required).unwrap();
        assert_eq!(reopened.document().len(), 1);
    }

    #[test]
    fn test_backup_written_before_session_starts() {
        let dir = tempdir().unwrap();
        let path = create("backed", dir.path()).unwrap();

        let mut session = Session::open(&path, BackupPolicy::Required).unwrap();
        session.document_mut().backups_enabled = true;
        session.close().unwrap();
        let raw = fs::read_to_string(&path).unwrap();

        let _session = Session::open(&path, BackupPolicy::Required).unwrap();

        let backup_dir = dir.path().join(format!("{}backed", BACKUP_DIR_PREFIX));
        let backups: Vec<_> = fs::read_dir(&backup_dir).unwrap().flatten().collect();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read_to_string(backups[0].path()).unwrap(), raw);
    }

    #[test]
    fn test_backup_failure_required_aborts() {
        let dir = tempdir().unwrap();
        let path = create("blocked", dir.path()).unwrap();
        let mut session = Session::open(&path, BackupPolicy::Required).unwrap();
        session.document_mut().backups_enabled = true;
        session.close().unwrap();

        // Occupy the backup directory's name with a file to force a failure.
        fs::write(dir.path().join(format!("{}blocked", BACKUP_DIR_PREFIX)), "x").unwrap();

        assert!(Session::open(&path, BackupPolicy::Required).is_err());
    }

    #[test]
    fn test_backup_failure_best_effort_warns() {
        let dir = tempdir().unwrap();
        let path = create("tolerant", dir.path()).unwrap();
        let mut session = Session::open(&path, BackupPolicy::Required).unwrap();
        session.document_mut().backups_enabled = true;
        session.close().unwrap();

        fs::write(dir.path().join(format!("{}tolerant", BACKUP_DIR_PREFIX)), "x").unwrap();

        let session = Session::open(&path, BackupPolicy::BestEffort).unwrap();
        assert!(session
            .warnings()
            .iter()
            .any(|w| w.contains("Backup could not be written")));
    }

    #[test]
    fn test_prune_backups_drops_oldest() {
        let dir = tempdir().unwrap();
        for ts in 1000..1025 {
            fs::write(dir.path().join(format!("db_{}.tagdb", ts)), "x").unwrap();
        }

        prune_backups(dir.path(), 20);

        let mut names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names.len(), 20);
        assert_eq!(names[0], "db_1005.tagdb");
    }

    #[test]
    fn test_parse_version() {
        assert_eq!(parse_version("1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_version("0.3.0"), Some((0, 3, 0)));
        assert_eq!(parse_version("1.2"), None);
        assert_eq!(parse_version("1.2.3.4"), None);
        assert_eq!(parse_version("a.b.c"), None);
    }
}
