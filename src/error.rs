//! Subcon error types and formatting
//!
//! - **`LaunchError`** - a step of creating the child failed. Nothing was
//!   spawned.
//! - **`WaitError`** - the child was spawned but supervising it failed, so no
//!   real exit code is available.
//!
//! Both convert into `anyhow::Error` with `?` in the binary; [`exit_code`]
//! downcasts them back to pick the process exit status.

use std::io;

use color_print::cwrite;

use crate::config::FailureExitCode;
use crate::styling::{ERROR_EMOJI, INFO_EMOJI};

/// Exit code reported when the supervisor itself failed, as opposed to a code
/// the child returned.
pub const WAIT_FAILURE_EXIT_CODE: u32 = 0xFFFF_FFFF;

/// One of the three standard I/O streams handed to the child.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum StdStream {
    Input,
    Output,
    Error,
}

impl StdStream {
    pub const ALL: [StdStream; 3] = [StdStream::Input, StdStream::Output, StdStream::Error];
}

/// The process-creation parameters that were attempted, echoed in diagnostics.
///
/// Handles are kept as plain integers so this type exists on every platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreationParams {
    pub command_line: String,
    pub creation_flags: u32,
    pub startup_flags: u32,
    pub show_window: String,
    pub std_handles: [usize; 3],
}

impl std::fmt::Display for CreationParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [stdin, stdout, stderr] = self.std_handles;
        write!(
            f,
            "command line {:?}, creation flags {:#x}, startup flags {:#x}, show window {}, \
             stdin {stdin:#x}, stdout {stdout:#x}, stderr {stderr:#x}",
            self.command_line, self.creation_flags, self.startup_flags, self.show_window,
        )
    }
}

/// Failure to create the child process.
#[derive(Debug)]
pub enum LaunchError {
    /// `GetStdHandle` failed for one of the standard streams
    StdHandle { stream: StdStream, error: io::Error },
    /// `SetHandleInformation` could not make a standard handle inheritable
    Inherit { stream: StdStream, error: io::Error },
    /// `CreateProcessW` refused to create the child
    CreateProcess {
        params: Box<CreationParams>,
        error: io::Error,
    },
}

impl LaunchError {
    /// Name of the operating-system call that failed.
    pub fn call(&self) -> &'static str {
        match self {
            LaunchError::StdHandle { .. } => "GetStdHandle",
            LaunchError::Inherit { .. } => "SetHandleInformation",
            LaunchError::CreateProcess { .. } => "CreateProcessW",
        }
    }

    pub fn os_error(&self) -> &io::Error {
        match self {
            LaunchError::StdHandle { error, .. }
            | LaunchError::Inherit { error, .. }
            | LaunchError::CreateProcess { error, .. } => error,
        }
    }
}

impl std::fmt::Display for LaunchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let call = self.call();
        match self {
            LaunchError::StdHandle { stream, error } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Cannot get standard {stream} handle: <bold>{call}</> failed: {error}</>"
                )
            }
            LaunchError::Inherit { stream, error } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Cannot make standard {stream} handle inheritable: <bold>{call}</> failed: {error}</>"
                )
            }
            LaunchError::CreateProcess { params, error } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Error creating process: <bold>{call}</> failed: {error}</> {INFO_EMOJI} <dim>{params}</>"
                )
            }
        }
    }
}

impl std::error::Error for LaunchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.os_error())
    }
}

/// Failure while supervising a child that was successfully created.
#[derive(Debug)]
pub enum WaitError {
    /// `WaitForSingleObject` itself reported `WAIT_FAILED`
    Wait { error: io::Error },
    /// `GetExitCodeProcess` failed after the child was signaled
    StatusQuery { error: io::Error },
}

impl WaitError {
    /// Always [`WAIT_FAILURE_EXIT_CODE`]; no child exit code was obtained.
    pub fn exit_code(&self) -> u32 {
        WAIT_FAILURE_EXIT_CODE
    }

    pub fn call(&self) -> &'static str {
        match self {
            WaitError::Wait { .. } => "WaitForSingleObject",
            WaitError::StatusQuery { .. } => "GetExitCodeProcess",
        }
    }

    pub fn os_error(&self) -> &io::Error {
        match self {
            WaitError::Wait { error } | WaitError::StatusQuery { error } => error,
        }
    }
}

impl std::fmt::Display for WaitError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let call = self.call();
        match self {
            WaitError::Wait { error } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Failed waiting for child process: <bold>{call}</> failed: {error}</>"
                )
            }
            WaitError::StatusQuery { error } => {
                cwrite!(
                    f,
                    "{ERROR_EMOJI} <red>Cannot read child exit code: <bold>{call}</> failed: {error}</>"
                )
            }
        }
    }
}

impl std::error::Error for WaitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.os_error())
    }
}

/// Pick the process exit status for a fatal error.
///
/// With [`FailureExitCode::OsError`], launch and wait failures exit with the
/// failing call's OS error code when one is known. Everything else exits with
/// the sentinel `-1`.
pub fn exit_code(err: &anyhow::Error, mode: FailureExitCode) -> i32 {
    const SENTINEL: i32 = WAIT_FAILURE_EXIT_CODE as i32;

    let os_error = if let Some(e) = err.downcast_ref::<LaunchError>() {
        Some(e.os_error())
    } else {
        err.downcast_ref::<WaitError>().map(WaitError::os_error)
    };

    match mode {
        FailureExitCode::Sentinel => SENTINEL,
        FailureExitCode::OsError => os_error
            .and_then(io::Error::raw_os_error)
            .filter(|&code| code != 0)
            .unwrap_or(SENTINEL),
    }
}
