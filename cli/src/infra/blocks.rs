//! Filesystem implementation of the `BlockInstaller` port.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use crate::application::ports::BlockInstaller;
use crate::domain::block::contains_marker;
use crate::domain::{ConfigBlock, InstallOutcome};

const BACKUP_INFIX: &str = ".rebox-backup-";

/// Appends marker-delimited blocks to local text files, copying the file
/// aside the first time rebox touches it.
pub struct TextBlockInstaller {
    clock: fn() -> NaiveDateTime,
}

impl TextBlockInstaller {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(|| chrono::Local::now().naive_local())
    }

    /// Uses `clock` for backup timestamps (for testing).
    #[must_use]
    pub fn with_clock(clock: fn() -> NaiveDateTime) -> Self {
        Self { clock }
    }

    /// `<file>.rebox-backup-<YYYYmmddTHHMMSS>`, with `-<n>` appended until the
    /// name is free.
    fn backup_path(&self, path: &Path) -> PathBuf {
        let stamp = (self.clock)().format("%Y%m%dT%H%M%S");
        let base = format!("{}{BACKUP_INFIX}{stamp}", path.display());
        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() {
            candidate = PathBuf::from(format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }
}

impl Default for TextBlockInstaller {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockInstaller for TextBlockInstaller {
    fn is_installed(&self, path: &Path, start_marker: &str) -> Result<bool> {
        Ok(read_existing(path)?.is_some_and(|c| contains_marker(&c, start_marker)))
    }

    fn install(&self, block: &ConfigBlock) -> Result<InstallOutcome> {
        let path = &block.path;
        let existing = read_existing(path)?;
        if existing
            .as_deref()
            .is_some_and(|c| contains_marker(c, &block.start_marker))
        {
            tracing::debug!(path = %path.display(), marker = %block.start_marker, "block already present");
            return Ok(InstallOutcome::AlreadyInstalled);
        }

        let backup = if existing.is_some() {
            let backup = self.backup_path(path);
            fs::copy(path, &backup)
                .with_context(|| format!("backup {} to {}", path.display(), backup.display()))?;
            Some(backup)
        } else {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)
                        .with_context(|| format!("create dir {}", parent.display()))?;
                    if block.credential_bearing {
                        set_permissions(parent, 0o700)?;
                    }
                }
            }
            None
        };

        let addition = block.render_append(existing.as_deref().unwrap_or(""));
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open {}", path.display()))?;
        file.write_all(addition.as_bytes())
            .with_context(|| format!("write {}", path.display()))?;
        if block.credential_bearing {
            set_permissions(path, 0o600)?;
        }

        tracing::info!(
            path = %path.display(),
            marker = %block.start_marker,
            backup = ?backup,
            "installed block"
        );
        Ok(InstallOutcome::Installed { backup })
    }
}

/// File content, or `None` when the file does not exist.
fn read_existing(path: &Path) -> Result<Option<String>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(String::from_utf8_lossy(&bytes).into_owned())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .with_context(|| format!("set permissions on {}", path.display()))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
