//! `on` / `off` subcommands — set the light once and exit.

use std::path::Path;

use super::{Result, VisualState, format_color, load_config, open_controller};

/// The light keeps showing the last color after the process exits, so a
/// single command is all that is needed.
pub(super) fn cmd_set_light(target: VisualState, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path);
    let mut controller = open_controller(&config)?;

    let shown = match target {
        VisualState::Lit => controller.turn_on()?,
        VisualState::Off => controller.turn_off()?,
    };

    match shown {
        VisualState::Lit => println!("Light: ON ({})", format_color(controller.alert())),
        VisualState::Off => println!("Light: OFF"),
    }
    Ok(())
}
