//! blink(1) HID protocol constants and report framing.
//!
//! The device takes 9-byte feature reports (report id 1). The only command
//! used here is "fade to RGB" (`'c'`); turning the light off is a fade to
//! black.

use crate::color::Rgb;

/// ThingM USB vendor ID.
pub const BLINK1_VID: u16 = 0x27B8;

/// blink(1) USB product ID (all hardware revisions).
pub const BLINK1_PID: u16 = 0x01ED;

/// Feature report ID used for every command.
pub const REPORT_ID: u8 = 0x01;

/// Full report length including the report ID byte.
pub const REPORT_SIZE: usize = 9;

/// "Fade to RGB" command byte.
pub const CMD_FADE_TO_RGB: u8 = b'c';

/// `0` addresses every LED on multi-LED (mk2+) devices.
pub const LED_ALL: u8 = 0;

/// HID class request: SET_REPORT.
pub const HID_SET_REPORT: u8 = 0x09;

/// HID report type in the high byte of `wValue`: feature report.
pub const HID_REPORT_TYPE_FEATURE: u16 = 0x03;

/// `wValue` for a SET_REPORT control transfer of our feature report.
pub const SET_REPORT_VALUE: u16 = (HID_REPORT_TYPE_FEATURE << 8) | REPORT_ID as u16;

/// Timeout for a single control transfer.
pub const USB_TIMEOUT_MS: u64 = 1000;

/// Longest fade the device can represent (16-bit count of 10 ms ticks).
pub const MAX_FADE_MS: u32 = u16::MAX as u32 * 10;

/// Build a "fade to RGB" feature report.
///
/// Layout: `[id, 'c', r, g, b, t_hi, t_lo, led, 0]` where `t` is the fade
/// time in 10 ms units, saturating at [`MAX_FADE_MS`].
pub fn fade_report(color: Rgb, fade_ms: u32) -> [u8; REPORT_SIZE] {
    let ticks = (fade_ms.min(MAX_FADE_MS) / 10) as u16;
    let [t_hi, t_lo] = ticks.to_be_bytes();
    [
        REPORT_ID,
        CMD_FADE_TO_RGB,
        color.r,
        color.g,
        color.b,
        t_hi,
        t_lo,
        LED_ALL,
        0,
    ]
}

/// Build the report that turns every LED off.
pub fn off_report(fade_ms: u32) -> [u8; REPORT_SIZE] {
    fade_report(Rgb::BLACK, fade_ms)
}
