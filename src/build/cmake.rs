//! CMake configuration and execution
//!
//! This module handles invoking CMake for the configure and build steps and
//! resetting the build directory. Every tool invocation runs with the working
//! directory set to the project root and restores the caller's directory on
//! the way out, whatever the outcome.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::error::BuilderError;
use crate::exec::subprocess::{self, find_program, CommandResult};
use crate::utils::paths::{absolutize, check_contained, ensure_dir, WorkingDirGuard};

/// Default CMake executable
pub const CMAKE: &str = "cmake";

/// Target built when none is given
pub const DEFAULT_TARGET: &str = "all";

/// Options for the build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Target passed to `--target`
    pub target: String,
    /// Configuration label passed to `--config` when non-empty
    pub build_type: String,
    /// Pass `-v` to the build tool
    pub verbose: bool,
    /// Extra arguments appended verbatim
    pub cmake_args: Vec<String>,
}

impl Default for BuildRequest {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            build_type: String::new(),
            verbose: false,
            cmake_args: Vec::new(),
        }
    }
}

/// What a cleanup removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupReport {
    /// Number of files deleted
    pub files: u64,
    /// Total size of the deleted files
    pub bytes: u64,
}

/// Drives CMake against one project root and build directory
#[derive(Debug, Clone)]
pub struct CMakeDriver {
    /// CMake program name or path, resolved on each invocation
    program: String,
    /// Absolute project root (where CMakeLists.txt is located)
    project_root: PathBuf,
    /// Absolute build directory
    build_dir: PathBuf,
    /// Kill the tool after this long
    timeout: Option<Duration>,
}

impl CMakeDriver {
    /// Create a driver for `project_home` building into `project_home/build_directory`
    ///
    /// Fails when the build directory is not strictly inside the project root,
    /// or when the project root or the build directory's parent is missing.
    pub fn new(
        program: impl Into<String>,
        project_home: &Path,
        build_directory: &Path,
    ) -> Result<Self, BuilderError> {
        check_contained(build_directory).map_err(|reason| BuilderError::InvalidPath {
            what: "BuildDirectory".to_string(),
            path: build_directory.to_path_buf(),
            reason: reason.to_string(),
        })?;

        let project_root = absolutize(project_home)?;
        if !project_root.exists() {
            return Err(BuilderError::not_found("ProjectHome", project_home));
        }

        let build_dir = project_root.join(build_directory);
        let parent_exists = build_dir.parent().map_or(false, Path::exists);
        if !parent_exists {
            return Err(BuilderError::not_found("BuildDirectory", &build_dir));
        }

        Ok(Self {
            program: program.into(),
            project_root,
            build_dir,
            timeout: None,
        })
    }

    /// Create a driver from loaded settings
    pub fn from_settings(program: impl Into<String>, settings: &Settings) -> Result<Self, BuilderError> {
        Self::new(
            program,
            Path::new(&settings.project_home),
            Path::new(&settings.build_directory),
        )
    }

    /// Set a timeout for every tool invocation
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Absolute project root
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    /// Absolute build directory
    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Arguments for the configure step
    pub fn configure_args(&self) -> Vec<String> {
        vec![
            "-S".to_string(),
            self.project_root.display().to_string(),
            "-B".to_string(),
            self.build_dir.display().to_string(),
        ]
    }

    /// Arguments for the build step
    pub fn build_args(&self, request: &BuildRequest) -> Vec<String> {
        let mut args = vec![
            "--build".to_string(),
            self.build_dir.display().to_string(),
            "--target".to_string(),
            request.target.clone(),
        ];

        if !request.build_type.is_empty() {
            args.push("--config".to_string());
            args.push(request.build_type.clone());
        }

        if request.verbose {
            args.push("-v".to_string());
        }

        args.extend(request.cmake_args.iter().filter(|a| !a.is_empty()).cloned());
        args
    }

    /// Run CMake configure step
    ///
    /// A non-zero exit is reported through [`CommandResult::success`], not as
    /// an error.
    pub fn configure(&self) -> Result<CommandResult, BuilderError> {
        self.invoke(&self.configure_args())
    }

    /// Run CMake build step
    pub fn build(&self, request: &BuildRequest) -> Result<CommandResult, BuilderError> {
        self.invoke(&self.build_args(request))
    }

    /// Delete the build directory and recreate it empty
    pub fn cleanup(&self) -> Result<CleanupReport, BuilderError> {
        let mut report = CleanupReport::default();

        if self.build_dir.exists() {
            for entry in WalkDir::new(&self.build_dir).into_iter().filter_map(|e| e.ok()) {
                if let Ok(metadata) = entry.metadata() {
                    if metadata.is_file() {
                        report.files += 1;
                        report.bytes += metadata.len();
                    }
                }
            }

            fs::remove_dir_all(&self.build_dir).map_err(|e| {
                BuilderError::io(format!("Failed to remove {}", self.build_dir.display()), e)
            })?;
        }

        ensure_dir(&self.build_dir)?;
        debug!(
            "cleaned {}: {} files, {} bytes",
            self.build_dir.display(),
            report.files,
            report.bytes
        );
        Ok(report)
    }

    /// Query the CMake version, e.g. "3.28.1"
    ///
    /// Output is captured rather than shown. Returns `None` when the tool is
    /// missing or its output is not recognised.
    pub fn tool_version(&self) -> Option<String> {
        let program = find_program(&self.program).ok()?;
        let result =
            subprocess::run_capturing(&program, &["--version".to_string()], self.timeout).ok()?;
        if !result.success {
            return None;
        }
        parse_version(&result.stdout)
    }

    fn invoke(&self, args: &[String]) -> Result<CommandResult, BuilderError> {
        let program = find_program(&self.program)?;
        let guard = WorkingDirGuard::enter(&self.project_root)?;
        debug!("running in {}, returning to {}", self.project_root.display(), guard.previous().display());
        let result = subprocess::run_status(&program, args, self.timeout)?;

        debug!(
            "{} exited with {:?} after {:.2?}",
            program.display(),
            result.exit_code,
            result.duration
        );
        Ok(result)
    }
}

/// Parse "cmake version X.Y.Z" from the first line of `cmake --version`
fn parse_version(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .next()
        .and_then(|line| line.trim().strip_prefix("cmake version "))
        .map(|v| v.trim().to_string())
}
