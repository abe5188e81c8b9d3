//! Creating the child in a new console and owning its handles.
//!
//! All Win32 calls of the crate live here.
#![allow(unsafe_code)]

use std::io;

use windows::Win32::Foundation::{
    CloseHandle, HANDLE, HANDLE_FLAG_INHERIT, SetHandleInformation,
    WAIT_ABANDONED, WAIT_FAILED, WAIT_OBJECT_0, WAIT_TIMEOUT,
};
use windows::Win32::System::Console::{
    GetStdHandle, STD_ERROR_HANDLE, STD_INPUT_HANDLE, STD_OUTPUT_HANDLE,
};
use windows::Win32::System::Environment::GetCommandLineW;
use windows::Win32::System::Threading::{
    CREATE_NEW_CONSOLE, CreateProcessW, GetExitCodeProcess, INFINITE, PROCESS_INFORMATION,
    STARTF_USESHOWWINDOW, STARTF_USESTDHANDLES, STARTUPINFOW, WaitForSingleObject,
};
use windows::Win32::UI::WindowsAndMessaging::{
    SHOW_WINDOW_CMD, SW_HIDE, SW_SHOWMINNOACTIVE, SW_SHOWNORMAL,
};
use windows::core::{PCWSTR, PWSTR};

use crate::config::ShowWindow;
use crate::error::{CreationParams, LaunchError, StdStream};
use crate::supervise::{WaitOutcome, Waitable};

/// The raw command line of the current process, as UTF-16 without the NUL.
pub fn command_line() -> Vec<u16> {
    // SAFETY: GetCommandLineW returns a NUL-terminated string owned by the
    // process that stays valid until exit; as_wide stops at the terminator.
    unsafe { GetCommandLineW().as_wide().to_vec() }
}

/// Process and primary-thread handles of a launched child.
///
/// Both handles are closed exactly once: by [`ProcessHandles::release`] or, on
/// any other path, when the value is dropped.
#[derive(Debug)]
pub struct ProcessHandles {
    process: HANDLE,
    thread: HANDLE,
    pid: u32,
}

impl ProcessHandles {
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Close both handles.
    pub fn release(mut self) {
        self.close();
    }

    /// True once both handles have been closed.
    pub fn is_released(&self) -> bool {
        self.process.is_invalid() && self.thread.is_invalid()
    }

    fn close(&mut self) {
        for (name, handle) in [("process", &mut self.process), ("thread", &mut self.thread)] {
            if handle.is_invalid() {
                continue;
            }
            // SAFETY: the handle came from CreateProcessW and is closed only here.
            if let Err(e) = unsafe { CloseHandle(*handle) } {
                log::warn!("Failed to close {name} handle of child {}: {e}", self.pid);
            }
            // Null, not INVALID_HANDLE_VALUE: -1 is also the current-process
            // pseudo handle and would be waitable.
            *handle = HANDLE::default();
        }
    }
}

impl Drop for ProcessHandles {
    fn drop(&mut self) {
        self.close();
    }
}

impl Waitable for ProcessHandles {
    fn wait(&self) -> io::Result<WaitOutcome> {
        // SAFETY: waiting on a handle we own; an invalid handle yields WAIT_FAILED.
        let event = unsafe { WaitForSingleObject(self.process, INFINITE) };
        match event {
            WAIT_OBJECT_0 => Ok(WaitOutcome::Signaled),
            WAIT_FAILED => Err(io::Error::last_os_error()),
            WAIT_TIMEOUT => Ok(WaitOutcome::TimedOut),
            WAIT_ABANDONED => Ok(WaitOutcome::Abandoned),
            other => Ok(WaitOutcome::Other(other.0)),
        }
    }

    fn exit_code(&self) -> io::Result<u32> {
        let mut code = 0u32;
        // SAFETY: `code` outlives the call.
        unsafe { GetExitCodeProcess(self.process, &mut code) }?;
        Ok(code)
    }
}

/// Start `args` as a new process attached to a brand-new console.
///
/// `args` is the complete command line of the child (its first token names the
/// program). The child gets our standard handles, which are made inheritable
/// first; this flag stays set on them afterwards.
pub fn launch(args: &[u16], show_window: ShowWindow) -> Result<ProcessHandles, LaunchError> {
    let [stdin, stdout, stderr] = inheritable_std_handles()?;

    let startup_info = STARTUPINFOW {
        cb: std::mem::size_of::<STARTUPINFOW>() as u32,
        dwFlags: STARTF_USESTDHANDLES | STARTF_USESHOWWINDOW,
        wShowWindow: show_window_cmd(show_window).0 as u16,
        hStdInput: stdin,
        hStdOutput: stdout,
        hStdError: stderr,
        ..Default::default()
    };

    let params = CreationParams {
        command_line: String::from_utf16_lossy(args),
        creation_flags: CREATE_NEW_CONSOLE.0,
        startup_flags: startup_info.dwFlags.0,
        show_window: show_window.to_string(),
        std_handles: [stdin.0 as usize, stdout.0 as usize, stderr.0 as usize],
    };
    log::debug!("Creating process: {params}");

    // CreateProcessW may write into the command line, so it gets its own
    // NUL-terminated copy.
    let mut command_line: Vec<u16> = args.iter().copied().chain(std::iter::once(0)).collect();
    let mut info = PROCESS_INFORMATION::default();

    // SAFETY: every pointer refers to a local that outlives the call.
    let created = unsafe {
        CreateProcessW(
            PCWSTR::null(),
            Some(PWSTR(command_line.as_mut_ptr())),
            None,
            None,
            true,
            CREATE_NEW_CONSOLE,
            None,
            PCWSTR::null(),
            &startup_info,
            &mut info,
        )
    };
    if let Err(e) = created {
        return Err(LaunchError::CreateProcess {
            params: Box::new(params),
            error: e.into(),
        });
    }

    log::debug!("Started child process {}", info.dwProcessId);
    Ok(ProcessHandles {
        process: info.hProcess,
        thread: info.hThread,
        pid: info.dwProcessId,
    })
}

/// Fetch stdin, stdout and stderr and mark each inheritable.
fn inheritable_std_handles() -> Result<[HANDLE; 3], LaunchError> {
    let mut handles = [HANDLE::default(); 3];
    for (slot, stream) in handles.iter_mut().zip(StdStream::ALL) {
        let id = match stream {
            StdStream::Input => STD_INPUT_HANDLE,
            StdStream::Output => STD_OUTPUT_HANDLE,
            StdStream::Error => STD_ERROR_HANDLE,
        };
        // SAFETY: plain query of the process's standard handle table.
        let handle = unsafe { GetStdHandle(id) }.map_err(|e| LaunchError::StdHandle {
            stream,
            error: e.into(),
        })?;
        // SAFETY: only the inherit flag of a handle we were just given is changed.
        unsafe { SetHandleInformation(handle, HANDLE_FLAG_INHERIT.0, HANDLE_FLAG_INHERIT) }
            .map_err(|e| LaunchError::Inherit {
                stream,
                error: e.into(),
            })?;
        *slot = handle;
    }
    Ok(handles)
}

fn show_window_cmd(show_window: ShowWindow) -> SHOW_WINDOW_CMD {
    match show_window {
        ShowWindow::Hidden => SW_HIDE,
        ShowWindow::Normal => SW_SHOWNORMAL,
        ShowWindow::Minimized => SW_SHOWMINNOACTIVE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::supervise::await_exit;

    fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().collect()
    }

    #[test]
    fn test_command_line_is_not_empty() {
        let raw = command_line();
        assert!(!raw.is_empty());
        assert!(!raw.contains(&0), "NUL terminator should not be included");
    }

    #[test]
    fn test_exit_code_is_relayed() {
        let child = launch(&wide("cmd.exe /c exit 42"), ShowWindow::Hidden).unwrap();
        assert!(child.pid() != 0);
        assert_eq!(await_exit(&child).unwrap(), 42);

        // Querying the same process again gives the same answer
        let mut code = 0u32;
        unsafe { GetExitCodeProcess(child.process, &mut code) }.unwrap();
        assert_eq!(code, 42);

        child.release();
    }

    #[test]
    fn test_large_exit_code_is_relayed() {
        let child = launch(&wide("cmd.exe /c exit -2"), ShowWindow::Hidden).unwrap();
        assert_eq!(await_exit(&child).unwrap(), 0xFFFF_FFFE);
    }

    #[test]
    fn test_release_invalidates_both_handles() {
        let mut child = launch(&wide("cmd.exe /c exit 0"), ShowWindow::Hidden).unwrap();
        assert!(!child.is_released());
        await_exit(&child).unwrap();

        child.close();
        assert!(child.is_released());
        // A second close is a no-op, and so is the close in Drop
        child.close();
        assert!(child.is_released());
    }

    #[test]
    fn test_wait_after_close_fails() {
        let mut child = launch(&wide("cmd.exe /c exit 0"), ShowWindow::Hidden).unwrap();
        child.close();
        assert!(await_exit(&child).is_err());
    }

    #[test]
    fn test_missing_program_is_create_process_error() {
        let err = launch(
            &wide("subcon-test-no-such-program.exe arg"),
            ShowWindow::Hidden,
        )
        .unwrap_err();
        assert!(matches!(err, LaunchError::CreateProcess { .. }), "{err:?}");
        assert_eq!(err.call(), "CreateProcessW");
        assert!(err.to_string().contains("subcon-test-no-such-program.exe arg"));
    }

    #[test]
    fn test_empty_command_line_fails_without_panicking() {
        let result = launch(&[], ShowWindow::Hidden);
        assert!(matches!(result, Err(LaunchError::CreateProcess { .. })));
    }

    #[test]
    fn test_show_window_mapping() {
        assert_eq!(show_window_cmd(ShowWindow::Hidden), SW_HIDE);
        assert_eq!(show_window_cmd(ShowWindow::Normal), SW_SHOWNORMAL);
        assert_eq!(show_window_cmd(ShowWindow::Minimized), SW_SHOWMINNOACTIVE);
    }
}
