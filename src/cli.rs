//! CLI argument parsing using clap derive macros

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::{debug, Level};

use crate::build::cmake::{CMAKE, DEFAULT_TARGET};
use crate::build::{BuildRequest, CMakeDriver, CleanupReport};
use crate::config::{SettingsStore, SETTINGS_FILE_NAME};
use crate::error::BuilderError;

/// Name used as the prefix of error lines
pub const PROGRAM_NAME: &str = "C Project Builder";

/// C Project Builder
///
/// Configures and builds a CMake project described by buildsettings.json.
/// Without -c or -b both steps run.
#[derive(Parser, Debug)]
#[command(name = "cpb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Build target name
    #[arg(default_value = DEFAULT_TARGET)]
    pub target: String,

    /// Only configure cmake
    #[arg(short, long)]
    pub configure: bool,

    /// Only build
    #[arg(short, long)]
    pub build: bool,

    /// Enable verbose output for cmake
    #[arg(short, long)]
    pub verbose: bool,

    /// Specify build type, e.g. -t=Debug
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "")]
    pub build_type: String,

    /// Cleanup the build directory
    #[arg(long)]
    pub clean: bool,

    /// Arguments passed to cmake, e.g. --cmake-args=arg1,arg2
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "ARGS")]
    pub cmake_args: Vec<String>,

    /// Create buildsettings.json if it does not exist
    #[arg(long)]
    pub create_settings: bool,

    /// Output debug messages
    #[arg(long)]
    pub debug: bool,

    /// Settings file to use instead of the one beside the executable
    #[arg(long, env = "CPB_SETTINGS", value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// CMake executable
    #[arg(long, env = "CPB_CMAKE", default_value = CMAKE, value_name = "PATH")]
    pub cmake: String,

    /// Kill cmake if a step runs longer than this
    #[arg(long, value_name = "SECONDS", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,
}

/// What a run should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Write the settings template
    CreateSettings,
    /// Reset the build directory
    Clean,
    /// Configure and/or build, configure first
    Lifecycle { configure: bool, build: bool },
}

/// Fully resolved request for one run
#[derive(Debug, Clone)]
pub struct Intent {
    pub action: Action,
    pub request: BuildRequest,
    pub debug: bool,
    pub settings: Option<PathBuf>,
    pub cmake: String,
    pub timeout: Option<Duration>,
}

impl Intent {
    /// Resolve parsed flags into an intent
    ///
    /// `--create-settings` beats `--clean`, which beats configure/build.
    /// With neither `-c` nor `-b`, both steps run.
    pub fn from_cli(cli: Cli) -> Self {
        let action = if cli.create_settings {
            Action::CreateSettings
        } else if cli.clean {
            Action::Clean
        } else if !cli.configure && !cli.build {
            Action::Lifecycle {
                configure: true,
                build: true,
            }
        } else {
            Action::Lifecycle {
                configure: cli.configure,
                build: cli.build,
            }
        };

        Self {
            action,
            request: BuildRequest {
                target: cli.target,
                build_type: cli.build_type,
                verbose: cli.verbose,
                cmake_args: cli.cmake_args.into_iter().filter(|a| !a.is_empty()).collect(),
            },
            debug: cli.debug,
            settings: cli.settings,
            cmake: cli.cmake,
            timeout: cli.timeout.map(Duration::from_secs),
        }
    }

    fn log(&self) {
        debug!("target: {}", self.request.target);
        debug!("options:");
        debug!("  action: {:?}", self.action);
        debug!("  verbose: {}", self.request.verbose);
        debug!("  type: {}", self.request.build_type);
        debug!("  cmake-args: {:?}", self.request.cmake_args);
        debug!("  cmake: {}", self.cmake);
        debug!("  timeout: {:?}", self.timeout);
    }
}

/// Result of a successful run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    SettingsCreated,
    Cleaned(CleanupReport),
    Configured,
    Built,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::SettingsCreated => write!(f, "Successfully created '{}'", SETTINGS_FILE_NAME),
            Outcome::Cleaned(_) => write!(f, "Cleaned up project repository."),
            Outcome::Configured => write!(f, "Configuration succeeded."),
            Outcome::Built => write!(f, "Build succeeded."),
        }
    }
}

/// Carry out `intent` using the settings file it names
///
/// Without `--settings` the file beside the executable is used.
pub fn execute(intent: &Intent) -> Result<Outcome> {
    intent.log();

    let store = match &intent.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::beside_executable()?,
    };
    run(intent, &store)
}

/// Carry out `intent` using the settings in `store`
pub fn run(intent: &Intent, store: &SettingsStore) -> Result<Outcome> {
    debug!("settings file: {}", store.path().display());

    match intent.action {
        Action::CreateSettings => {
            store.create()?;
            Ok(Outcome::SettingsCreated)
        }
        Action::Clean => {
            let report = load_driver(intent, store)?.cleanup()?;
            Ok(Outcome::Cleaned(report))
        }
        Action::Lifecycle { configure, build } => {
            let driver = load_driver(intent, store)?;
            run_lifecycle(&driver, &intent.request, configure, build)
        }
    }
}

fn load_driver(intent: &Intent, store: &SettingsStore) -> Result<CMakeDriver> {
    let settings = store.load()?;
    let driver = CMakeDriver::from_settings(intent.cmake.clone(), &settings)?.timeout(intent.timeout);
    debug!("project root: {}", driver.project_root().display());
    debug!("build directory: {}", driver.build_dir().display());
    Ok(driver)
}

/// Configure then build; a failed configure never reaches the build
fn run_lifecycle(
    driver: &CMakeDriver,
    request: &BuildRequest,
    configure: bool,
    build: bool,
) -> Result<Outcome> {
    if tracing::enabled!(Level::DEBUG) {
        match driver.tool_version() {
            Some(version) => debug!("cmake version: {}", version),
            None => debug!("cmake version: unknown"),
        }
    }

    if configure {
        let result = driver.configure()?;
        if !result.success {
            return Err(BuilderError::tool_failure("CMake configure", result.exit_code).into());
        }
    }

    if build {
        let result = driver.build(request)?;
        if !result.success {
            return Err(BuilderError::tool_failure("CMake build", result.exit_code).into());
        }
        return Ok(Outcome::Built);
    }

    Ok(Outcome::Configured)
}
