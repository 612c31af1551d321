//! System tray — platform-specific event loops and shared state.

mod shared;
pub(crate) mod state;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(windows)]
mod windows;

pub fn run() -> busylight_lib::error::Result<()> {
    let instance = single_instance::SingleInstance::new("busylight").map_err(|e| {
        busylight_lib::BusylightError::Config(format!("Failed to create instance lock: {e}"))
    })?;

    if !instance.is_single() {
        log::warn!("Another instance of Busylight is already running.");
        state::show_notification("Another instance is already running.");
        return Ok(());
    }

    // `instance` stays alive for the duration of run(), holding the lock.
    #[cfg(windows)]
    {
        windows::run()
    }

    #[cfg(target_os = "linux")]
    {
        linux::run()
    }
}
