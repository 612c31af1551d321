//! Alert color parsing and formatting.

use std::fmt;

/// An 8-bit-per-channel RGB color as sent to the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);
    pub const RED: Rgb = Rgb::new(0xFF, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_black(&self) -> bool {
        *self == Rgb::BLACK
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format_color(*self))
    }
}

/// Parse an alert color.
///
/// Accepts:
/// - Hex: `"#FF0000"`, `"FF0000"`, `"#ff0000"`
/// - Named: `"red"`, `"green"`, `"blue"`, `"white"`, `"orange"`, `"yellow"`,
///   `"purple"`, `"cyan"`, `"magenta"`
///
/// Black (`"off"`, `"black"`, `"#000000"`) is rejected: an alert color that
/// looks like off would make the light useless.
pub fn parse_color(s: &str) -> crate::error::Result<Rgb> {
    let s = s.trim();

    let named = match s.to_lowercase().as_str() {
        "red" => Some(Rgb::RED),
        "green" => Some(Rgb::new(0x00, 0xFF, 0x00)),
        "blue" => Some(Rgb::new(0x00, 0x00, 0xFF)),
        "white" => Some(Rgb::new(0xFF, 0xFF, 0xFF)),
        "orange" => Some(Rgb::new(0xFF, 0x80, 0x00)),
        "yellow" => Some(Rgb::new(0xFF, 0xFF, 0x00)),
        "purple" => Some(Rgb::new(0x80, 0x00, 0xFF)),
        "cyan" => Some(Rgb::new(0x00, 0xFF, 0xFF)),
        "magenta" => Some(Rgb::new(0xFF, 0x00, 0xFF)),
        "off" | "black" => Some(Rgb::BLACK),
        _ => None,
    };

    let color = match named {
        Some(c) => c,
        None => {
            let hex = s.strip_prefix('#').unwrap_or(s);
            if hex.len() != 6 || !hex.is_ascii() {
                return Err(crate::BusylightError::Color(format!(
                    "Invalid color: {s} (use #RRGGBB or a color name)"
                )));
            }
            let val = u32::from_str_radix(hex, 16)
                .map_err(|_| crate::BusylightError::Color(format!("Invalid hex color: {s}")))?;
            Rgb::new((val >> 16) as u8, (val >> 8) as u8, val as u8)
        }
    };

    if color.is_black() {
        return Err(crate::BusylightError::Color(format!(
            "{s} cannot be used as an alert color"
        )));
    }
    Ok(color)
}

/// Format a color as `#RRGGBB`.
pub fn format_color(c: Rgb) -> String {
    format!("#{:02X}{:02X}{:02X}", c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_named_red() {
        assert_eq!(parse_color("red").unwrap(), Rgb::RED);
    }

    #[test]
    fn parse_named_case_insensitive() {
        assert_eq!(parse_color("RED").unwrap(), Rgb::RED);
        assert_eq!(parse_color("  Red  ").unwrap(), Rgb::RED);
    }

    #[test]
    fn parse_named_orange() {
        assert_eq!(parse_color("orange").unwrap(), Rgb::new(0xFF, 0x80, 0x00));
    }

    #[test]
    fn parse_hex_with_and_without_hash() {
        assert_eq!(parse_color("#12AB34").unwrap(), Rgb::new(0x12, 0xAB, 0x34));
        assert_eq!(parse_color("12ab34").unwrap(), Rgb::new(0x12, 0xAB, 0x34));
    }

    #[test]
    fn parse_rejects_black() {
        assert!(parse_color("off").is_err());
        assert!(parse_color("black").is_err());
        assert!(parse_color("#000000").is_err());
    }

    #[test]
    fn parse_invalid_length() {
        assert!(parse_color("#FFF").is_err());
        assert!(parse_color("#FF000000").is_err());
        assert!(parse_color("").is_err());
    }

    #[test]
    fn parse_invalid_hex_digits() {
        assert!(parse_color("#GGHHII").is_err());
    }

    #[test]
    fn parse_non_ascii_does_not_panic() {
        assert!(parse_color("ÿÿÿ").is_err());
    }

    #[test]
    fn format_roundtrip() {
        let c = Rgb::new(0xAB, 0xCD, 0xEF);
        assert_eq!(format_color(c), "#ABCDEF");
        assert_eq!(parse_color(&format_color(c)).unwrap(), c);
    }

    #[test]
    fn display_matches_format() {
        assert_eq!(Rgb::RED.to_string(), "#FF0000");
    }
}
