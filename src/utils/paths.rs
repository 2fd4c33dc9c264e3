//! Path utilities and scoped working-directory changes

use std::env;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::BuilderError;

/// Changes the process working directory and restores it on drop
///
/// The previous directory is captured before the change, so the restore
/// runs on every exit path: normal return, `?` propagation and unwinding.
#[derive(Debug)]
#[must_use = "the working directory is restored as soon as the guard is dropped"]
pub struct WorkingDirGuard {
    previous: PathBuf,
}

impl WorkingDirGuard {
    /// Enter `dir`, remembering the current directory
    pub fn enter(dir: &Path) -> Result<Self, BuilderError> {
        let previous = env::current_dir()
            .map_err(|e| BuilderError::io("Failed to get current directory", e))?;
        env::set_current_dir(dir).map_err(|e| {
            BuilderError::io(format!("Failed to enter {}", dir.display()), e)
        })?;
        debug!("entered {} (from {})", dir.display(), previous.display());
        Ok(Self { previous })
    }

    /// Directory that will be restored
    pub fn previous(&self) -> &Path {
        &self.previous
    }
}

impl Drop for WorkingDirGuard {
    fn drop(&mut self) {
        match env::set_current_dir(&self.previous) {
            Ok(()) => debug!("restored working directory {}", self.previous.display()),
            Err(e) => warn!(
                "failed to restore working directory {}: {}",
                self.previous.display(),
                e
            ),
        }
    }
}

/// Make `path` absolute against the current directory
pub fn absolutize(path: &Path) -> Result<PathBuf, BuilderError> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = env::current_dir().map_err(|e| BuilderError::io("Failed to get current directory", e))?;
    Ok(cwd.join(path))
}

/// Check that `path` is relative and names a directory strictly below its base
///
/// Rejects absolute paths, paths that climb out with `..`, and paths that
/// resolve to the base itself such as `.` or `src/..`.
pub fn check_contained(path: &Path) -> Result<(), &'static str> {
    let mut depth: usize = 0;
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => return Err("must be a relative path"),
            Component::CurDir => {}
            Component::ParentDir => {
                depth = depth
                    .checked_sub(1)
                    .ok_or("must not leave the project root")?;
            }
            Component::Normal(_) => depth += 1,
        }
    }
    if depth == 0 {
        return Err("must name a directory inside the project root");
    }
    Ok(())
}

/// Ensure a directory exists
pub fn ensure_dir(path: &Path) -> Result<(), BuilderError> {
    if !path.exists() {
        std::fs::create_dir_all(path).map_err(|e| {
            BuilderError::io(format!("Failed to create directory: {}", path.display()), e)
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_guard_restores_on_drop() {
        let temp_dir = TempDir::new().unwrap();
        let before = env::current_dir().unwrap();
        {
            let guard = WorkingDirGuard::enter(temp_dir.path()).unwrap();
            assert_eq!(guard.previous(), before.as_path());
            assert_eq!(
                env::current_dir().unwrap().canonicalize().unwrap(),
                temp_dir.path().canonicalize().unwrap()
            );
        }
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn test_guard_restores_on_error_path() {
        fn failing(dir: &Path) -> Result<(), BuilderError> {
            let _guard = WorkingDirGuard::enter(dir)?;
            Err(BuilderError::tool_failure("step", Some(1)))
        }

        let temp_dir = TempDir::new().unwrap();
        let before = env::current_dir().unwrap();
        assert!(failing(temp_dir.path()).is_err());
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn test_guard_restores_on_panic() {
        let temp_dir = TempDir::new().unwrap();
        let before = env::current_dir().unwrap();
        let dir = temp_dir.path().to_path_buf();
        let result = std::panic::catch_unwind(move || {
            let _guard = WorkingDirGuard::enter(&dir).unwrap();
            panic!("tool blew up");
        });
        assert!(result.is_err());
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    #[serial]
    fn test_enter_missing_dir_leaves_cwd_alone() {
        let before = env::current_dir().unwrap();
        let err = WorkingDirGuard::enter(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, BuilderError::Io { .. }));
        assert_eq!(env::current_dir().unwrap(), before);
    }

    #[test]
    fn test_absolutize() {
        let abs = absolutize(Path::new("some/dir")).unwrap();
        assert!(abs.is_absolute());
        assert!(abs.ends_with("some/dir"));

        let temp_dir = TempDir::new().unwrap();
        assert_eq!(absolutize(temp_dir.path()).unwrap(), temp_dir.path());
    }

    #[test]
    fn test_check_contained() {
        for ok in ["build", "out/debug", "./build", "a/../build", "cmake_build/"] {
            assert!(check_contained(Path::new(ok)).is_ok(), "{ok}");
        }
        for bad in [".", "..", "src/..", "./", "../build", "a/../../b", "/tmp/build"] {
            assert!(check_contained(Path::new(bad)).is_err(), "{bad}");
        }
    }

    #[test]
    fn test_ensure_dir() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        ensure_dir(&nested).unwrap();
        assert!(nested.is_dir());
        ensure_dir(&nested).unwrap();
    }
}
