//! Cross-process ownership of the keyboard.
//!
//! Every command that opens the device holds this lock for as long as the
//! handle lives. A one-shot `set` or `identify` would otherwise switch the
//! keyboard of a running daemon offline. The holder writes its command and pid
//! into the file so a refused command can say who owns the keyboard.

use std::fs::{File, OpenOptions, TryLockError};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("keyboard is in use by {owner}")]
    Busy { owner: String },

    #[error("could not determine lock file path")]
    NoPath,

    #[error("lock file: {0}")]
    Io(#[from] io::Error),
}

/// Exclusive claim on the keyboard, released when dropped
#[derive(Debug)]
pub struct DeviceLock {
    _file: File,
}

impl DeviceLock {
    /// Claim the keyboard for `command`, failing fast if another process holds it
    pub fn acquire(command: &str) -> Result<Self, LockError> {
        let path = Self::path().ok_or(LockError::NoPath)?;
        Self::acquire_at(&path, command)
    }

    fn acquire_at(path: &Path, command: &str) -> Result<Self, LockError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // the owner line belongs to the current holder, only clear it once locked
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        match file.try_lock() {
            Ok(()) => {},
            Err(TryLockError::WouldBlock) => {
                let mut owner = String::new();
                // some platforms refuse reads of a locked file
                if file.read_to_string(&mut owner).is_err() || owner.trim().is_empty() {
                    owner = "another process".into();
                }
                return Err(LockError::Busy {
                    owner: owner.trim().to_string(),
                });
            },
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }

        file.set_len(0)?;
        writeln!(file, "skyloong-sync {command} (pid {})", std::process::id())?;
        debug!("claimed keyboard lock at {}", path.display());

        Ok(Self { _file: file })
    }

    fn path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "skyloong-sync")
            .map(|dirs| dirs.config_dir().join("skyloong-sync.lock"))
    }
}
