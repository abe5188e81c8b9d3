//! Run a command in a freshly created console.
//!
//! Some console attach sequences leave a child with broken I/O, most visibly
//! when a Windows program runs inside a redirected context such as
//! `VAR=$(subcon.exe cmd.exe /c echo hi)` from WSL. `subcon` strips its own
//! path from the raw command line, starts the rest as a child attached to a new
//! console with our standard handles, waits for it, and exits with its code.
//!
//! - [`cmdline`] finds where the program-path token ends
//! - `process` (Windows only) creates the child and owns its handles
//! - [`supervise`] waits for the child and reads its exit code

pub mod cmdline;
pub mod config;
pub mod error;
#[cfg(windows)]
pub mod process;
pub mod styling;
pub mod supervise;

pub use error::{LaunchError, WAIT_FAILURE_EXIT_CODE, WaitError};
