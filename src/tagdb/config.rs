//! Home directory resolution and environment switches.
//!
//! Tagdb keeps its registry file and default database directory in one
//! per-user "home". The location is resolved in priority order:
//!
//! 1. `TAGDB_HOME` environment variable (also how tests isolate themselves)
//! 2. OS-appropriate data directory (via the `directories` crate)
//! 3. The current directory, as a last resort

use directories::ProjectDirs;
use std::path::PathBuf;

/// Overrides the data/registry directory.
pub const HOME_ENV: &str = "TAGDB_HOME";

/// Any non-empty value silences advisory warnings.
pub const SUPPRESS_WARNINGS_ENV: &str = "TAGDB_SUPPRESS_WARNINGS";

/// How many backups to keep per database.
pub const BACKUP_KEEP_COUNT_ENV: &str = "TAGDB_BACKUP_KEEP_COUNT";

const DEFAULT_BACKUP_KEEP_COUNT: usize = 20;

/// The directory holding the registry file and default-created databases.
pub fn tagdb_home() -> PathBuf {
    if let Ok(dir) = std::env::var(HOME_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    ProjectDirs::from("com", "tagdb", "tagdb")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Whether advisory warnings should be suppressed.
pub fn suppress_warnings() -> bool {
    std::env::var(SUPPRESS_WARNINGS_ENV)
        .map(|v| !v.is_empty())
        .unwrap_or(false)
}

/// Per-database backup retention count.
pub fn backup_keep_count() -> usize {
    std::env::var(BACKUP_KEEP_COUNT_ENV)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_BACKUP_KEEP_COUNT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_home_env_override() {
        std::env::set_var(HOME_ENV, "/tmp/tagdb-test-home");
        assert_eq!(tagdb_home(), PathBuf::from("/tmp/tagdb-test-home"));
        std::env::remove_var(HOME_ENV);
    }

    #[test]
    fn test_backup_keep_count_default_on_garbage() {
        std::env::set_var(BACKUP_KEEP_COUNT_ENV, "not-a-number");
        assert_eq!(backup_keep_count(), DEFAULT_BACKUP_KEEP_COUNT);
        std::env::remove_var(BACKUP_KEEP_COUNT_ENV);
    }
}
