//! # The Name → Path Registry
//!
//! A plain-text file (`.paths` in the tagdb home), one database file path
//! per line in registration order. A database's short name is its file stem,
//! so `/data/work.tagdb` is addressed as `work`. The registry knows nothing
//! about file contents; it only maps names to locations.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, TagdbError};

pub const REGISTRY_FILE: &str = ".paths";

#[derive(Debug, Clone)]
pub struct Registry {
    path: PathBuf,
}

impl Registry {
    pub fn new(home: impl AsRef<Path>) -> Registry {
        Registry {
            path: home.as_ref().join(REGISTRY_FILE),
        }
    }

    /// Create the registry file (and its directory) if missing. `clear`
    /// wipes an existing file.
    pub fn init(&self, clear: bool) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        if clear || !self.path.exists() {
            fs::write(&self.path, "")?;
        }
        Ok(())
    }

    /// All registered database paths, in registration order. A missing
    /// registry file reads as empty.
    pub fn list(&self) -> Result<Vec<PathBuf>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(PathBuf::from)
            .collect())
    }

    /// The registered path whose file stem is `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        self.list()?
            .into_iter()
            .find(|path| stem_of(path) == Some(name))
            .ok_or_else(|| TagdbError::NotRegistered(name.to_string()))
    }

    /// Append a database file path. The stored form is absolute so the
    /// registry stays valid regardless of the caller's working directory.
    pub fn register(&self, db: impl AsRef<Path>) -> Result<()> {
        let db = std::path::absolute(db.as_ref())?;
        let name = stem_of(&db).unwrap_or_default().to_string();
        let registered = self.list()?;
        if registered.iter().any(|path| stem_of(path) == Some(name.as_str())) {
            return Err(TagdbError::AlreadyRegistered(name));
        }
        self.init(false)?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", db.display())?;
        Ok(())
    }

    /// Remove the entry whose file stem is `name`.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let registered = self.list()?;
        let remaining: Vec<&PathBuf> = registered
            .iter()
            .filter(|path| stem_of(path) != Some(name))
            .collect();
        if remaining.len() == registered.len() {
            return Err(TagdbError::NotRegistered(name.to_string()));
        }
        let mut content = String::new();
        for path in remaining {
            content.push_str(&path.display().to_string());
            content.push('\n');
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

fn stem_of(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}
