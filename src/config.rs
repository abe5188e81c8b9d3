use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for how the child console is created and how failures are reported.
///
/// None of these change which command is run: the command line is always
/// passed through untouched.
///
/// # Examples
///
/// ```toml
/// # Show the new console window instead of hiding it
/// show-window = "normal"
///
/// # Exit with the failing Win32 call's error code instead of -1
/// failure-exit-code = "os-error"
/// ```
///
/// Config file location:
/// - Windows: `%APPDATA%\subcon\config.toml`
/// - Linux: `~/.config/subcon/config.toml`
///
/// Environment variables: `SUBCON_SHOW_WINDOW`, `SUBCON_FAILURE_EXIT_CODE`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct SubconConfig {
    #[serde(default)]
    pub show_window: ShowWindow,

    #[serde(default)]
    pub failure_exit_code: FailureExitCode,
}

/// Initial visibility of the freshly created console window.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ShowWindow {
    #[default]
    Hidden,
    Normal,
    Minimized,
}

/// What the process exits with when no child exit code could be obtained.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum FailureExitCode {
    /// Exit with -1
    #[default]
    Sentinel,
    /// Exit with the OS error code of the call that failed
    OsError,
}

impl SubconConfig {
    /// Load configuration from the config file and environment variables.
    ///
    /// Later sources override earlier ones:
    /// 1. Default values
    /// 2. Config file (see [`config_path`])
    /// 3. Environment variables (`SUBCON_*`)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(config_path().as_deref())
    }

    /// Like [`SubconConfig::load`], reading the given file instead of the default one.
    ///
    /// A missing file is not an error.
    pub fn load_from(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let mut builder = Config::builder()
            .set_default("show-window", defaults.show_window.to_string())?
            .set_default("failure-exit-code", defaults.failure_exit_code.to_string())?;

        if let Some(path) = config_file
            && path.exists()
        {
            log::debug!("Reading config from {}", path.display());
            builder = builder.add_source(File::from(path));
        }

        // `SUBCON_SHOW_WINDOW` -> `show-window`
        builder = builder.add_source(
            config::Environment::with_prefix("SUBCON")
                .prefix_separator("_")
                .convert_case(config::Case::Kebab),
        );

        builder.build()?.try_deserialize()
    }
}

/// Default location of the config file, if a config directory exists.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("subcon").join("config.toml"))
}
