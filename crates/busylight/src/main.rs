//! `busylight`: the tray app for a blink(1) busy light.
//!
//! Release builds on Windows use the GUI subsystem and have no console, so
//! logging goes to `busylight.log` and fatal errors also raise a message box.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

#[cfg(any(windows, target_os = "linux"))]
mod tray;

/// Cleared by the Exit menu item or WM_QUIT to end the tray loop.
#[cfg(any(windows, target_os = "linux"))]
pub static RUNNING: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

/// Log at `info` to the file next to the config, or to stderr if it can't be created.
#[cfg(any(windows, target_os = "linux"))]
fn init_logging() {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    builder.format_target(false);

    let file = busylight_lib::config::Config::log_path().and_then(|path| {
        if let Some(dir) = path.parent() {
            let _ = std::fs::create_dir_all(dir);
        }
        std::fs::File::create(path).ok()
    });
    if let Some(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
}

/// Started from a terminal with arguments: point at the CLI instead of
/// opening the tray.
#[cfg(windows)]
fn redirect_to_cli() -> bool {
    use windows::Win32::System::Console::{ATTACH_PARENT_PROCESS, AttachConsole, FreeConsole};

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() {
        return false;
    }
    if unsafe { AttachConsole(ATTACH_PARENT_PROCESS) }.is_err() {
        return false;
    }
    eprintln!("busylight is the tray app; run `busylight-cli {}` instead.", args.join(" "));
    unsafe {
        let _ = FreeConsole();
    }
    true
}

#[cfg(any(windows, target_os = "linux"))]
fn main() {
    init_logging();

    #[cfg(windows)]
    {
        if redirect_to_cli() {
            return;
        }
    }

    if let Err(e) = tray::run() {
        log::error!("{e}");
        report_fatal(&format!("Error: {e}"));
        std::process::exit(1);
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
fn main() {
    eprintln!("busylight has no tray on this platform; use busylight-cli.");
    std::process::exit(1);
}

#[cfg(any(windows, target_os = "linux"))]
fn report_fatal(msg: &str) {
    eprintln!("{msg}");
    #[cfg(windows)]
    message_box(msg);
}

#[cfg(windows)]
fn message_box(msg: &str) {
    use windows::Win32::UI::WindowsAndMessaging::{MB_ICONERROR, MB_OK, MessageBoxW};
    use windows::core::PCWSTR;

    let wide = |s: &str| -> Vec<u16> { s.encode_utf16().chain(std::iter::once(0)).collect() };
    let text = wide(msg);
    let caption = wide("Busylight");
    unsafe {
        let _ = MessageBoxW(
            None,
            PCWSTR(text.as_ptr()),
            PCWSTR(caption.as_ptr()),
            MB_ICONERROR | MB_OK,
        );
    }
}
