//! Tray icons, drawn at startup instead of embedded.
//!
//! Lit: a disc in the alert color. Off: a dark grey disc. Both have a darker
//! rim so they stay visible on light and dark panels.

use busylight_lib::color::Rgb;
use busylight_lib::controller::VisualState;
use image::{Rgba, RgbaImage};
use tray_icon::Icon;

/// Edge length of the drawn icon. Windows tray icons range from 16 px
/// (100 % DPI) to 32 px (200 % DPI).
const TRAY_ICON_SIZE: u32 = 32;

/// Rim thickness in pixels.
const RIM: f32 = 2.0;

const OFF_FILL: Rgb = Rgb::new(0x50, 0x50, 0x50);

/// RGBA pixel data cached for cheap cloning into `Icon`.
struct CachedIcon {
    rgba: Vec<u8>,
    width: u32,
    height: u32,
}

impl CachedIcon {
    fn from_image(img: RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        Self {
            rgba: img.into_raw(),
            width,
            height,
        }
    }

    fn to_icon(&self) -> Option<Icon> {
        Icon::from_rgba(self.rgba.clone(), self.width, self.height)
            .map_err(|e| log::warn!("could not build tray icon: {e}"))
            .ok()
    }
}

/// Scale each channel by `factor` (0.0–1.0).
fn shade(c: Rgb, factor: f32) -> Rgb {
    let s = |v: u8| (v as f32 * factor).round() as u8;
    Rgb::new(s(c.r), s(c.g), s(c.b))
}

/// Draw an anti-aliased disc filling a `size` × `size` image.
fn draw_disc(size: u32, fill: Rgb, rim: Rgb) -> RgbaImage {
    let center = size as f32 / 2.0;
    let radius = center - 1.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - center;
        let dy = y as f32 + 0.5 - center;
        let dist = (dx * dx + dy * dy).sqrt();
        let coverage = (radius + 0.5 - dist).clamp(0.0, 1.0);
        let c = if dist > radius - RIM { rim } else { fill };
        Rgba([c.r, c.g, c.b, (coverage * 255.0).round() as u8])
    })
}

/// The two tray icons for one alert color.
pub struct IconSet {
    lit: CachedIcon,
    off: CachedIcon,
}

impl IconSet {
    pub fn new(alert: Rgb) -> Self {
        Self {
            lit: CachedIcon::from_image(draw_disc(TRAY_ICON_SIZE, alert, shade(alert, 0.6))),
            off: CachedIcon::from_image(draw_disc(
                TRAY_ICON_SIZE,
                OFF_FILL,
                shade(OFF_FILL, 0.6),
            )),
        }
    }

    pub fn icon_for(&self, state: VisualState) -> Option<Icon> {
        match state {
            VisualState::Lit => self.lit.to_icon(),
            VisualState::Off => self.off.to_icon(),
        }
    }
}
