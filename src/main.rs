use anyhow::Context;
use color_print::cformat;
use std::process;
use subcon::config::{FailureExitCode, SubconConfig};
use subcon::error::exit_code;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = match SubconConfig::load().context("Failed to load config") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", format_fatal(&e));
            process::exit(exit_code(&e, FailureExitCode::Sentinel));
        }
    };

    match run(&config) {
        // Exit codes are DWORDs; the cast keeps every bit of the child's code
        Ok(code) => process::exit(code as i32),
        Err(e) => {
            // Typed errors are already formatted with emoji and colors
            eprintln!("{}", format_fatal(&e));
            process::exit(exit_code(&e, config.failure_exit_code));
        }
    }
}

#[cfg(windows)]
fn run(config: &SubconConfig) -> anyhow::Result<u32> {
    use subcon::cmdline::strip_program_path;
    use subcon::process::{command_line, launch};
    use subcon::styling::WARNING_EMOJI;
    use subcon::supervise::await_exit;

    let raw = command_line();
    let args = strip_program_path(&raw);
    log::debug!("Command line: {}", String::from_utf16_lossy(&raw));
    if args.is_empty() {
        log::warn!("No command after the program path; the child gets an empty command line");
        eprintln!(
            "{}",
            cformat!("{WARNING_EMOJI} <yellow>No command given. Usage: subcon <<command>> [args...]</>")
        );
    }

    let child = launch(args, config.show_window)?;
    let result = await_exit(&child);
    child.release();
    Ok(result?)
}

#[cfg(not(windows))]
fn run(_config: &SubconConfig) -> anyhow::Result<u32> {
    anyhow::bail!("subcon only runs on Windows")
}

fn format_fatal(err: &anyhow::Error) -> String {
    use subcon::error::{LaunchError, WaitError};
    use subcon::styling::ERROR_EMOJI;

    if err.downcast_ref::<LaunchError>().is_some() || err.downcast_ref::<WaitError>().is_some() {
        err.to_string()
    } else {
        let message = format!("{err:#}");
        cformat!("{ERROR_EMOJI} <red>{message}</>")
    }
}
