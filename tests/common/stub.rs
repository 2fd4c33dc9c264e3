//! Stand-in `cmake` for tests
//!
//! A shell script that appends `<cwd>\t<args>` to a log for every configure
//! or build call and exits with a chosen code. `--version` answers
//! `cmake version 3.99.0` without being logged.
//!
//! Shared by the unit tests under `src/` and the end-to-end tests in `tests/`.

#![allow(dead_code)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// One recorded invocation
#[derive(Debug)]
pub struct StubCall {
    pub cwd: String,
    pub args: String,
}

pub struct StubCMake {
    dir: TempDir,
}

impl StubCMake {
    /// Stub exiting with `configure_code` for `-S ...` and `build_code` for `--build ...`
    pub fn new(configure_code: i32, build_code: i32) -> Self {
        Self::with_body(&format!(
            "case \"$1\" in\n  -S) exit {configure_code} ;;\n  --build) exit {build_code} ;;\nesac\nexit 0\n"
        ))
    }

    /// Stub whose configure and build steps never finish
    pub fn hanging() -> Self {
        Self::with_body("exec sleep 30\n")
    }

    /// Stub that leaves a background child behind and waits for it
    ///
    /// The child touches [`marker`](Self::marker) after two seconds unless it
    /// is killed first.
    pub fn forking() -> Self {
        let dir = TempDir::new().unwrap();
        let marker = dir.path().join("survived");
        Self::write(
            dir,
            &format!("( sleep 2; touch '{}' ) &\nwait\n", marker.display()),
        )
    }

    fn with_body(body: &str) -> Self {
        Self::write(TempDir::new().unwrap(), body)
    }

    fn write(dir: TempDir, body: &str) -> Self {
        let log = dir.path().join("calls.log");
        let script = format!(
            "#!/bin/sh\n\
             if [ \"$1\" = \"--version\" ]; then echo \"cmake version 3.99.0\"; exit 0; fi\n\
             printf '%s\\t%s\\n' \"$(pwd -P)\" \"$*\" >> '{}'\n\
             {}",
            log.display(),
            body
        );
        let program = dir.path().join("cmake");
        fs::write(&program, script).unwrap();
        fs::set_permissions(&program, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    /// Path to the stub executable
    pub fn program(&self) -> String {
        self.dir.path().join("cmake").display().to_string()
    }

    /// File a [`forking`](Self::forking) stub's background child creates
    pub fn marker(&self) -> PathBuf {
        self.dir.path().join("survived")
    }

    fn log(&self) -> PathBuf {
        self.dir.path().join("calls.log")
    }

    /// Invocations recorded so far, oldest first
    pub fn calls(&self) -> Vec<StubCall> {
        read_calls(&self.log())
    }
}

fn read_calls(log: &Path) -> Vec<StubCall> {
    let Ok(content) = fs::read_to_string(log) else {
        return Vec::new();
    };
    content
        .lines()
        .filter_map(|line| line.split_once('\t'))
        .map(|(cwd, args)| StubCall {
            cwd: cwd.to_string(),
            args: args.to_string(),
        })
        .collect()
}
