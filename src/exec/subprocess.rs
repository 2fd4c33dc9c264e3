//! Subprocess execution with timeout support
//!
//! Programs are always spawned directly from an argv vector, never through a
//! shell, so arguments reach the tool exactly as given.

use std::path::Path;
use std::process::{ExitStatus, Stdio};
use std::time::{Duration, Instant};

use tokio::process::Command;
use tracing::debug;

use crate::error::BuilderError;

/// Result of a subprocess execution
#[derive(Debug)]
pub struct CommandResult {
    /// Whether the command succeeded (exit code 0)
    pub success: bool,

    /// Process exit code, `None` when terminated by a signal
    pub exit_code: Option<i32>,

    /// Captured standard output
    pub stdout: String,

    /// Captured standard error
    pub stderr: String,

    /// Execution duration
    pub duration: Duration,
}

impl CommandResult {
    /// Create a CommandResult from an exit status
    pub fn from_status(status: ExitStatus, stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            success: status.success(),
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
        }
    }
}

/// Render a command line for logging
pub fn display_command(program: &Path, args: &[String]) -> String {
    let mut line = program.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(arg);
    }
    line
}

/// Run a command with output inherited and fail on a non-zero exit
///
/// Strict variant of [`run_status`] for callers that only care about success.
/// The lifecycle steps report the exit code themselves and use `run_status`.
#[allow(dead_code)]
pub fn run(program: &Path, args: &[String], timeout: Option<Duration>) -> Result<CommandResult, BuilderError> {
    let result = run_command(program, args, true, timeout)?;
    if !result.success {
        return Err(BuilderError::tool_failure(
            program.display().to_string(),
            result.exit_code,
        ));
    }
    Ok(result)
}

/// Run a command with output inherited and return the raw result
pub fn run_status(
    program: &Path,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<CommandResult, BuilderError> {
    run_command(program, args, true, timeout)
}

/// Run a command with stdout/stderr captured
///
/// A non-zero exit is not an error here. The captured streams are logged at
/// debug level so failures stay diagnosable.
pub fn run_capturing(
    program: &Path,
    args: &[String],
    timeout: Option<Duration>,
) -> Result<CommandResult, BuilderError> {
    let result = run_command(program, args, false, timeout)?;
    if result.success {
        debug!("{} exited with code 0", program.display());
    } else {
        debug!(
            "{} exited with code {:?}: {}",
            program.display(),
            result.exit_code,
            result.stderr.trim_end()
        );
    }
    if !result.stdout.is_empty() {
        debug!("stdout: {}", result.stdout.trim_end());
    }
    Ok(result)
}

/// Run a command with optional timeout
///
/// With `inherit_io` the child shares this process's stdio; otherwise stdout
/// and stderr are piped and returned in the result.
pub fn run_command(
    program: &Path,
    args: &[String],
    inherit_io: bool,
    timeout: Option<Duration>,
) -> Result<CommandResult, BuilderError> {
    debug!("run command: {}", display_command(program, args));

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| BuilderError::io("Failed to start the process runtime", e))?;
    runtime.block_on(run_command_async(program, args, inherit_io, timeout))
}

async fn run_command_async(
    program: &Path,
    args: &[String],
    inherit_io: bool,
    timeout: Option<Duration>,
) -> Result<CommandResult, BuilderError> {
    let start = Instant::now();

    let mut cmd = Command::new(program);
    cmd.args(args).stdin(Stdio::null()).kill_on_drop(true);
    if inherit_io {
        cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
    } else {
        cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
    }

    // A timed run gets its own process group so a timeout reaches everything
    // the tool started. Untimed runs stay in ours and keep receiving Ctrl-C.
    #[cfg(unix)]
    if timeout.is_some() {
        cmd.process_group(0);
    }

    let child = cmd
        .spawn()
        .map_err(|e| BuilderError::io(format!("Failed to execute {}", program.display()), e))?;
    let pid = child.id();
    let wait = child.wait_with_output();

    let output = match timeout {
        None => wait.await,
        Some(limit) => match tokio::time::timeout(limit, wait).await {
            Ok(output) => output,
            Err(_) => {
                // Dropping the wait future already killed the direct child.
                debug!("{} exceeded {:?}, killing its process group", program.display(), limit);
                kill_process_group(pid);
                return Err(BuilderError::Timeout {
                    program: program.display().to_string(),
                    limit,
                });
            }
        },
    }
    .map_err(|e| BuilderError::io(format!("Failed to wait for {}", program.display()), e))?;

    Ok(CommandResult::from_status(
        output.status,
        String::from_utf8_lossy(&output.stdout).into_owned(),
        String::from_utf8_lossy(&output.stderr).into_owned(),
        start.elapsed(),
    ))
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    if let Some(pid) = pid {
        // SAFETY: killpg only sends a signal. The group id is the pid of the
        // child spawned with process_group(0) above.
        unsafe {
            libc::killpg(pid as libc::pid_t, libc::SIGKILL);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Resolve a program name or path to an executable
pub fn find_program(program: &str) -> Result<std::path::PathBuf, BuilderError> {
    which::which(program).map_err(|_| BuilderError::MissingTool {
        tool: program.to_string(),
    })
}
