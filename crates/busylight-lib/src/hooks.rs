//! Visual state change hooks — run user-defined commands when the light
//! turns on or off.

use std::io;
use std::process::ExitStatus;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::config::Config;
use crate::controller::VisualState;

/// Guard preventing concurrent hook execution (shared by both hooks).
static HOOK_RUNNING: AtomicBool = AtomicBool::new(false);

/// Default timeout for hook commands.
const HOOK_TIMEOUT: Duration = Duration::from_secs(30);

/// Poll interval when waiting for a hook process to exit.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Run the configured hook for a visual state change.
///
/// The command runs on a background thread so the event loop never blocks.
/// Empty commands are ignored. Only one hook runs at a time: if the previous
/// one is still running, the new one is skipped with a warning.
pub fn run_visual_hook(state: VisualState, config: &Config) {
    match state {
        VisualState::Lit => run_hook(&config.on_lit_command),
        VisualState::Off => run_hook(&config.on_off_command),
    }
}

fn run_hook(command: &str) {
    let command = command.trim();
    if command.is_empty() {
        return;
    }
    if HOOK_RUNNING
        .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
        .is_err()
    {
        log::warn!("hook skipped (previous hook still running): {command}");
        return;
    }
    let command = command.to_string();
    std::thread::spawn(move || {
        let result = run_hook_with_timeout(&command, HOOK_TIMEOUT);
        HOOK_RUNNING.store(false, Ordering::SeqCst);
        match result {
            Ok(s) if !s.success() => log::warn!("hook exited with {s}: {command}"),
            Err(e) => log::warn!("hook failed: {e}: {command}"),
            Ok(_) => log::debug!("hook finished: {command}"),
        }
    });
}

/// Run a shell command, killing it if it outlives `timeout`.
fn run_hook_with_timeout(command: &str, timeout: Duration) -> io::Result<ExitStatus> {
    let mut child = if cfg!(windows) {
        std::process::Command::new("cmd")
            .args(["/C", command])
            .spawn()?
    } else {
        std::process::Command::new("sh")
            .args(["-c", command])
            .spawn()?
    };

    let max_polls = (timeout.as_millis() / POLL_INTERVAL.as_millis()).max(1) as u64;
    for _ in 0..max_polls {
        match child.try_wait()? {
            Some(status) => return Ok(status),
            None => std::thread::sleep(POLL_INTERVAL),
        }
    }

    log::warn!("hook timed out after {timeout:?}, killing: {command}");
    let _ = child.kill();
    child.wait()
}
