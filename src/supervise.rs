//! Waiting for the child to exit and reading its exit code.
//!
//! The wait loop only needs two things from a child: a blocking wait and an
//! exit-code query. [`Waitable`] captures exactly that, so the loop runs the
//! same against a real process handle and against the scripted children in the
//! tests below.

use std::io;

use crate::error::WaitError;

/// Result of one blocking wait that did not fail outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitOutcome {
    /// The child has terminated.
    Signaled,
    /// The wait returned because its timeout elapsed.
    TimedOut,
    /// The waited-on object was an abandoned mutex.
    Abandoned,
    /// A return value outside the documented set.
    Other(u32),
}

/// A child process that can be waited on.
pub trait Waitable {
    /// Block until the child is signaled or the wait returns for another reason.
    ///
    /// `Err` means the wait call itself failed.
    fn wait(&self) -> io::Result<WaitOutcome>;

    /// Exit status of a child that has terminated.
    fn exit_code(&self) -> io::Result<u32>;
}

/// Block until `child` terminates and return its exit code.
///
/// Wake-ups other than [`WaitOutcome::Signaled`] are retried; none of them
/// can be mistaken for termination. A failing wait or status query is terminal
/// and maps to [`WaitError`], whose exit code is the
/// [`WAIT_FAILURE_EXIT_CODE`](crate::error::WAIT_FAILURE_EXIT_CODE) sentinel.
pub fn await_exit<W: Waitable + ?Sized>(child: &W) -> Result<u32, WaitError> {
    let mut spurious = 0u32;
    loop {
        match child.wait().map_err(|error| WaitError::Wait { error })? {
            WaitOutcome::Signaled => break,
            outcome => {
                spurious += 1;
                log::warn!("Child not signaled after wait ({outcome:?}), waiting again (#{spurious})");
            }
        }
    }

    let code = child
        .exit_code()
        .map_err(|error| WaitError::StatusQuery { error })?;
    log::debug!("Child exited with code {code} ({code:#x})");
    Ok(code)
}
