//! Disposable working directory for a single build.
//!
//! The compiler writes its output (and a pile of auxiliary files) into the
//! current directory, so each build runs inside its own temporary directory.
//! Entering the sandbox changes the process's working directory; leaving it
//! restores the previous one and removes the whole tree, on every exit path.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// An entered sandbox. Dropping it without calling [`Sandbox::exit`] still
/// restores the working directory and removes the tree, but can only log
/// teardown failures.
#[derive(Debug)]
pub struct Sandbox {
    dir: Option<TempDir>,
    previous: PathBuf,
}

impl Sandbox {
    /// Create a fresh, empty directory and make it the current directory.
    pub fn enter() -> Result<Sandbox> {
        let previous = std::env::current_dir()
            .with_context(|| "Failed to determine the current directory")?;
        let dir = tempfile::Builder::new()
            .prefix("mintscript-")
            .tempdir()
            .with_context(|| "Failed to create a temporary build directory")?;
        std::env::set_current_dir(dir.path()).with_context(|| {
            format!("Failed to change directory to {}", dir.path().display())
        })?;
        log::debug!("Entered build directory {}", dir.path().display());

        Ok(Sandbox {
            dir: Some(dir),
            previous,
        })
    }

    /// Absolute path of the sandbox directory.
    pub fn path(&self) -> &Path {
        // only `teardown` clears `dir`, and it consumes or drops the sandbox
        self.dir
            .as_ref()
            .map(TempDir::path)
            .expect("sandbox directory exists until exit")
    }

    /// The working directory that was current before entering.
    pub fn previous_dir(&self) -> &Path {
        &self.previous
    }

    /// Restore the previous working directory and delete the sandbox.
    ///
    /// The directory is always restored before the tree is removed; some
    /// platforms refuse to delete a directory that is still current.
    pub fn exit(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        let Some(dir) = self.dir.take() else {
            return Ok(());
        };
        let path = dir.path().to_path_buf();

        let restored = std::env::set_current_dir(&self.previous).with_context(|| {
            format!(
                "Failed to change directory back to {}",
                self.previous.display()
            )
        });
        let removed = dir
            .close()
            .with_context(|| format!("Failed to remove build directory {}", path.display()));
        log::debug!("Left build directory {}", path.display());

        restored.and(removed)
    }
}

impl Drop for Sandbox {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::warn!("{e:#}");
        }
    }
}

/// Run `f` inside a fresh sandbox, tearing it down however `f` ends.
///
/// A teardown failure never hides an error from `f`. When `f` succeeded, a
/// teardown failure is logged as a warning and the run still succeeds: the
/// artifact has already been delivered by then.
pub fn scoped<T, F>(f: F) -> Result<T>
where
    F: FnOnce(&Sandbox) -> Result<T>,
{
    let sandbox = Sandbox::enter()?;
    let result = f(&sandbox);
    let teardown = sandbox.exit();

    match (result, teardown) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(value), Err(e)) => {
            log::warn!("{e:#}");
            Ok(value)
        }
        (Err(e), Ok(())) => Err(e),
        (Err(e), Err(teardown)) => {
            log::warn!("{teardown:#}");
            Err(e)
        }
    }
}

/// Serialises tests that change the process's working directory.
#[cfg(test)]
pub(crate) fn cwd_lock() -> std::sync::MutexGuard<'static, ()> {
    use std::sync::Mutex;
    static LOCK: Mutex<()> = Mutex::new(());
    LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
