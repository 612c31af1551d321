//! Device communication — driver traits, platform backends, and a mock.
//!
//! The core never talks to USB directly. It goes through two small traits:
//! [`DeviceConnector`] (construct-or-fail: find and open one light) and
//! [`IndicatorDevice`] (set a color, turn off). Linux uses `nusb` control
//! transfers on the default endpoint; Windows opens the HID interface and
//! uses `HidD_SetFeature`.

use std::fmt;

use serde::Serialize;

use crate::color::Rgb;
#[cfg(any(windows, target_os = "linux"))]
use crate::protocol::*;

// ── Error type ──

/// Device communication errors.
///
/// String payloads follow the convention **"context: details"** where *context*
/// identifies the operation (e.g. `"USB open"`, `"SET_REPORT"`) and *details*
/// describes what went wrong.
#[derive(Debug)]
pub enum DeviceError {
    NotFound,
    OpenFailed(String),
    WriteFailed(String),
}

impl DeviceError {
    /// `true` for errors raised while acquiring a device handle.
    ///
    /// These are the "no device ready" class: there is nothing to retry against.
    pub fn is_no_device(&self) -> bool {
        matches!(self, DeviceError::NotFound | DeviceError::OpenFailed(_))
    }
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceError::NotFound => write!(f, "No blink(1) device found"),
            DeviceError::OpenFailed(e) => write!(f, "Failed to open device: {e}"),
            DeviceError::WriteFailed(e) => write!(f, "Device write failed: {e}"),
        }
    }
}

impl std::error::Error for DeviceError {}

pub type Result<T> = std::result::Result<T, DeviceError>;

// ── Device info ──

#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    /// Platform path (`usb:BBB/DDD` on Linux, HID interface path on Windows).
    pub path: String,
    /// USB product string, e.g. "blink(1) mk3".
    pub product: String,
    /// USB serial number, if the device reports one.
    pub serial: Option<String>,
}

// ── Traits ──

/// One opened indicator light.
pub trait IndicatorDevice {
    fn info(&self) -> &DeviceInfo;
    /// Show `color` on every LED of the device.
    fn set_color(&self, color: Rgb) -> Result<()>;
    /// Turn every LED off.
    fn turn_off(&self) -> Result<()>;
}

/// Construct-or-fail factory for indicator devices.
///
/// Called once at startup and again from the recovery path whenever a
/// command fails on the current handle.
pub trait DeviceConnector {
    type Device: IndicatorDevice;

    fn connect(&self) -> Result<Self::Device>;
}

// ── Windows implementation ──

#[cfg(windows)]
mod windows_impl {
    use super::*;
    use std::mem;

    use windows::Win32::Devices::DeviceAndDriverInstallation::*;
    use windows::Win32::Devices::HumanInterfaceDevice::{HidD_GetSerialNumberString, HidD_SetFeature};
    use windows::Win32::Foundation::*;
    use windows::Win32::Storage::FileSystem::*;
    use windows::core::{GUID, PCWSTR};

    /// Device interface class GUID for HID devices.
    const HID_INTERFACE_GUID: GUID = GUID::from_u128(0x4d1e55b2_f16f_11cf_88cb_001111000030);

    /// Extract a null-terminated UTF-16 path from SP_DEVICE_INTERFACE_DETAIL_DATA_W.
    ///
    /// # Safety
    /// `detail` must point to a valid, fully initialized SP_DEVICE_INTERFACE_DETAIL_DATA_W.
    unsafe fn extract_path(detail: &SP_DEVICE_INTERFACE_DETAIL_DATA_W) -> String {
        let ptr = &detail.DevicePath as *const u16;
        let mut len = 0;
        // SAFETY: caller guarantees `detail` is valid; DevicePath is null-terminated.
        unsafe {
            while *ptr.add(len) != 0 {
                len += 1;
            }
            String::from_utf16_lossy(std::slice::from_raw_parts(ptr, len))
        }
    }

    /// Enumerate HID interface paths belonging to a blink(1).
    pub fn blink1_paths() -> Vec<String> {
        let needle = format!("vid_{BLINK1_VID:04x}&pid_{BLINK1_PID:04x}");
        let mut paths = Vec::new();
        unsafe {
            let Ok(dev_info) = SetupDiGetClassDevsW(
                Some(&HID_INTERFACE_GUID),
                PCWSTR::null(),
                None,
                DIGCF_PRESENT | DIGCF_DEVICEINTERFACE,
            ) else {
                return paths;
            };

            for index in 0..64 {
                let mut iface = SP_DEVICE_INTERFACE_DATA {
                    cbSize: mem::size_of::<SP_DEVICE_INTERFACE_DATA>() as u32,
                    ..Default::default()
                };
                if SetupDiEnumDeviceInterfaces(dev_info, None, &HID_INTERFACE_GUID, index, &mut iface)
                    .is_err()
                {
                    break;
                }
                let mut req: u32 = 0;
                let _ = SetupDiGetDeviceInterfaceDetailW(dev_info, &iface, None, 0, Some(&mut req), None);
                if req == 0 {
                    continue;
                }
                let mut buf = vec![0u8; req as usize];
                // SAFETY: buf is req bytes, large enough for the detail struct.
                let detail = &mut *(buf.as_mut_ptr() as *mut SP_DEVICE_INTERFACE_DETAIL_DATA_W);
                detail.cbSize = mem::size_of::<SP_DEVICE_INTERFACE_DETAIL_DATA_W>() as u32;
                if SetupDiGetDeviceInterfaceDetailW(dev_info, &iface, Some(detail), req, None, None)
                    .is_ok()
                {
                    let path = extract_path(detail);
                    if path.to_lowercase().contains(&needle) {
                        paths.push(path);
                    }
                }
            }
            let _ = SetupDiDestroyDeviceInfoList(dev_info);
        }
        paths
    }

    fn open_handle(path: &str) -> Result<HANDLE> {
        let wide: Vec<u16> = path.encode_utf16().chain(std::iter::once(0)).collect();
        unsafe {
            CreateFileW(
                PCWSTR(wide.as_ptr()),
                (GENERIC_READ | GENERIC_WRITE).0,
                FILE_SHARE_READ | FILE_SHARE_WRITE,
                None,
                OPEN_EXISTING,
                FILE_FLAGS_AND_ATTRIBUTES(0),
                None,
            )
        }
        .map_err(|e| DeviceError::OpenFailed(format!("CreateFileW: {e}")))
    }

    fn read_serial(handle: HANDLE) -> Option<String> {
        let mut buf = [0u16; 127];
        let ok: bool = unsafe {
            HidD_GetSerialNumberString(
                handle,
                buf.as_mut_ptr() as *mut _,
                mem::size_of_val(&buf) as u32,
            )
        }
        .into();
        if !ok {
            return None;
        }
        let end = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
        let serial = String::from_utf16_lossy(&buf[..end]);
        (!serial.is_empty()).then_some(serial)
    }

    pub struct WindowsDevice {
        handle: HANDLE,
        info: DeviceInfo,
        fade_ms: u32,
    }

    impl WindowsDevice {
        pub fn open(serial: &str, fade_ms: u32) -> Result<Self> {
            let mut last_err = None;
            for path in blink1_paths() {
                let handle = match open_handle(&path) {
                    Ok(h) => h,
                    Err(e) => {
                        last_err = Some(e);
                        continue;
                    }
                };
                let dev_serial = read_serial(handle);
                if !serial.is_empty() && dev_serial.as_deref() != Some(serial) {
                    unsafe {
                        let _ = CloseHandle(handle);
                    }
                    continue;
                }
                return Ok(WindowsDevice {
                    handle,
                    info: DeviceInfo {
                        path,
                        product: "blink(1)".into(),
                        serial: dev_serial,
                    },
                    fade_ms,
                });
            }
            Err(last_err.unwrap_or(DeviceError::NotFound))
        }

        fn send_report(&self, report: &[u8]) -> Result<()> {
            let ok: bool = unsafe {
                HidD_SetFeature(self.handle, report.as_ptr() as *const _, report.len() as u32)
            }
            .into();
            if ok {
                Ok(())
            } else {
                Err(DeviceError::WriteFailed(format!(
                    "HidD_SetFeature: {}",
                    windows::core::Error::from_win32()
                )))
            }
        }
    }

    impl IndicatorDevice for WindowsDevice {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn set_color(&self, color: Rgb) -> Result<()> {
            self.send_report(&fade_report(color, self.fade_ms))
        }

        fn turn_off(&self) -> Result<()> {
            self.send_report(&off_report(self.fade_ms))
        }
    }

    impl Drop for WindowsDevice {
        fn drop(&mut self) {
            unsafe {
                let _ = CloseHandle(self.handle);
            }
        }
    }
}

#[cfg(windows)]
pub use windows_impl::WindowsDevice;

// ── Linux implementation ──

#[cfg(target_os = "linux")]
mod linux_impl {
    use super::*;
    use std::time::Duration;

    use nusb::transfer::{Control, ControlType, Recipient};

    pub fn is_blink1(dev: &nusb::DeviceInfo) -> bool {
        dev.vendor_id() == BLINK1_VID && dev.product_id() == BLINK1_PID
    }

    pub fn bus_path(dev: &nusb::DeviceInfo) -> String {
        format!("usb:{:03}/{:03}", dev.bus_number(), dev.device_address())
    }

    /// USB interface class of the blink(1) HID interface.
    const HID_CLASS: u8 = 0x03;

    /// Number of the HID interface, 0 on every known blink(1) revision.
    pub fn hid_interface(dev: &nusb::DeviceInfo) -> u8 {
        dev.interfaces()
            .find(|iface| iface.class() == HID_CLASS)
            .map(|iface| iface.interface_number())
            .unwrap_or(0)
    }

    /// SET_REPORT (feature, report id 1) addressed to `interface`.
    pub fn set_report_control(interface: u8) -> Control {
        Control {
            control_type: ControlType::Class,
            recipient: Recipient::Interface,
            request: HID_SET_REPORT,
            value: SET_REPORT_VALUE,
            index: interface as u16,
        }
    }

    pub struct LinuxDevice {
        interface: nusb::Interface,
        interface_number: u8,
        info: DeviceInfo,
        fade_ms: u32,
    }

    impl LinuxDevice {
        pub fn open(serial: &str, fade_ms: u32) -> Result<Self> {
            let device_info = nusb::list_devices()
                .map_err(|e| DeviceError::OpenFailed(format!("USB enumeration: {e}")))?
                .filter(is_blink1)
                .find(|dev| serial.is_empty() || dev.serial_number() == Some(serial))
                .ok_or(DeviceError::NotFound)?;

            let info = DeviceInfo {
                path: bus_path(&device_info),
                product: device_info
                    .product_string()
                    .unwrap_or("blink(1)")
                    .to_string(),
                serial: device_info.serial_number().map(|s| s.to_string()),
            };

            let interface_number = hid_interface(&device_info);
            let device = device_info
                .open()
                .map_err(|e| DeviceError::OpenFailed(format!("USB open: {e}")))?;

            // usbfs rejects interface-recipient requests on an interface
            // usbhid still owns, so take it over first.
            let interface = device
                .detach_and_claim_interface(interface_number)
                .map_err(|e| {
                    DeviceError::OpenFailed(format!("claim interface {interface_number}: {e}"))
                })?;

            Ok(LinuxDevice {
                interface,
                interface_number,
                info,
                fade_ms,
            })
        }

        /// HID SET_REPORT (feature) via a class control transfer.
        fn send_report(&self, report: &[u8]) -> Result<()> {
            self.interface
                .control_out_blocking(
                    set_report_control(self.interface_number),
                    report,
                    Duration::from_millis(USB_TIMEOUT_MS),
                )
                .map_err(|e| DeviceError::WriteFailed(format!("SET_REPORT: {e}")))?;
            Ok(())
        }
    }

    impl IndicatorDevice for LinuxDevice {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn set_color(&self, color: Rgb) -> Result<()> {
            self.send_report(&fade_report(color, self.fade_ms))
        }

        fn turn_off(&self) -> Result<()> {
            self.send_report(&off_report(self.fade_ms))
        }
    }
}

#[cfg(target_os = "linux")]
pub use linux_impl::LinuxDevice;

// ── Unsupported-platform stub ──

#[cfg(not(any(windows, target_os = "linux")))]
pub struct UnsupportedDevice {
    info: DeviceInfo,
}

#[cfg(not(any(windows, target_os = "linux")))]
impl UnsupportedDevice {
    pub fn open(_serial: &str, _fade_ms: u32) -> Result<Self> {
        Err(DeviceError::NotFound)
    }
}

#[cfg(not(any(windows, target_os = "linux")))]
impl IndicatorDevice for UnsupportedDevice {
    fn info(&self) -> &DeviceInfo {
        &self.info
    }
    fn set_color(&self, _color: Rgb) -> Result<()> {
        Err(DeviceError::WriteFailed("unsupported platform".into()))
    }
    fn turn_off(&self) -> Result<()> {
        Err(DeviceError::WriteFailed("unsupported platform".into()))
    }
}

// ── Device enumeration ──

/// A discovered blink(1) (not yet opened).
#[derive(Debug, Clone, Serialize)]
pub struct DiscoveredDevice {
    /// Platform path of the device.
    pub path: String,
    /// USB serial number, if available.
    pub serial: Option<String>,
}

/// Enumerate all connected blink(1) devices.
///
/// On unsupported platforms, always returns an empty list.
pub fn enumerate_devices() -> Vec<DiscoveredDevice> {
    #[cfg(windows)]
    {
        windows_impl::blink1_paths()
            .into_iter()
            .map(|path| DiscoveredDevice { path, serial: None })
            .collect()
    }
    #[cfg(target_os = "linux")]
    {
        match nusb::list_devices() {
            Ok(iter) => iter
                .filter(linux_impl::is_blink1)
                .map(|dev| DiscoveredDevice {
                    path: linux_impl::bus_path(&dev),
                    serial: dev.serial_number().map(|s| s.to_string()),
                })
                .collect(),
            Err(e) => {
                log::warn!("USB enumeration failed: {e}");
                vec![]
            }
        }
    }
    #[cfg(not(any(windows, target_os = "linux")))]
    {
        vec![]
    }
}

#[cfg(windows)]
pub type PlatformDevice = WindowsDevice;
#[cfg(target_os = "linux")]
pub type PlatformDevice = LinuxDevice;
#[cfg(not(any(windows, target_os = "linux")))]
pub type PlatformDevice = UnsupportedDevice;

/// Open a blink(1) by serial number. Empty serial = first device found.
pub fn open_device_by_serial(serial: &str, fade_ms: u32) -> Result<PlatformDevice> {
    let dev = PlatformDevice::open(serial.trim(), fade_ms)?;
    log::debug!("opened {} at {}", dev.info().product, dev.info().path);
    Ok(dev)
}

/// Connector for real hardware.
#[derive(Debug, Clone, Default)]
pub struct UsbConnector {
    /// Preferred serial number (empty = first device).
    pub serial: String,
    /// Fade time for every color change, in milliseconds.
    pub fade_ms: u32,
}

impl UsbConnector {
    pub fn new(serial: impl Into<String>, fade_ms: u32) -> Self {
        Self {
            serial: serial.into(),
            fade_ms,
        }
    }

    /// Serial and fade time from config, with the fade clamped to the
    /// configurable maximum.
    pub fn from_config(config: &crate::config::Config) -> Self {
        let fade_ms = config.fade_ms.min(crate::config::MAX_FADE_MS);
        Self::new(config.device_serial.clone(), fade_ms)
    }
}

impl DeviceConnector for UsbConnector {
    type Device = PlatformDevice;

    fn connect(&self) -> Result<PlatformDevice> {
        open_device_by_serial(&self.serial, self.fade_ms)
    }
}

// ── Mock device for testing ──

/// In-memory mock connector/device for unit and integration tests.
///
/// Always compiled (zero runtime cost), hidden from public docs. All devices
/// produced by one [`MockConnector`] share a [`MockState`], so tests can
/// script failures and inspect calls across session replacements.
#[doc(hidden)]
pub mod mock {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// One recorded driver call.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum MockCall {
        Connect { ok: bool },
        SetColor { session: u32, color: Rgb, ok: bool },
        TurnOff { session: u32, ok: bool },
    }

    /// State shared by a connector and every device it has produced.
    #[derive(Debug, Default)]
    pub struct MockState {
        /// Every driver call, in order.
        pub calls: RefCell<Vec<MockCall>>,
        /// If true, `connect` returns `NotFound`.
        pub fail_connect: Cell<bool>,
        /// Number of upcoming `set_color` calls that fail.
        pub fail_set_color: Cell<u32>,
        /// Number of upcoming `turn_off` calls that fail.
        pub fail_turn_off: Cell<u32>,
        /// Successful connects so far (also the next session number).
        pub connects: Cell<u32>,
        /// What the "hardware" currently shows (`None` = off).
        pub shown: Cell<Option<Rgb>>,
    }

    #[derive(Debug, Clone, Default)]
    pub struct MockConnector {
        pub state: Rc<MockState>,
    }

    impl MockConnector {
        pub fn new() -> Self {
            Self::default()
        }

        /// A connector whose `connect` always fails.
        pub fn unplugged() -> Self {
            let c = Self::new();
            c.state.fail_connect.set(true);
            c
        }

        pub fn calls(&self) -> Vec<MockCall> {
            self.state.calls.borrow().clone()
        }

        pub fn connect_count(&self) -> usize {
            self.count(|c| matches!(c, MockCall::Connect { .. }))
        }

        pub fn set_color_count(&self) -> usize {
            self.count(|c| matches!(c, MockCall::SetColor { .. }))
        }

        pub fn turn_off_count(&self) -> usize {
            self.count(|c| matches!(c, MockCall::TurnOff { .. }))
        }

        /// Whether the simulated hardware is currently lit.
        pub fn is_shown_lit(&self) -> bool {
            self.state.shown.get().is_some()
        }

        fn count(&self, f: impl Fn(&MockCall) -> bool) -> usize {
            self.state.calls.borrow().iter().filter(|c| f(c)).count()
        }
    }

    impl DeviceConnector for MockConnector {
        type Device = MockDevice;

        fn connect(&self) -> Result<MockDevice> {
            let ok = !self.state.fail_connect.get();
            self.state.calls.borrow_mut().push(MockCall::Connect { ok });
            if !ok {
                return Err(DeviceError::NotFound);
            }
            let session = self.state.connects.get() + 1;
            self.state.connects.set(session);
            Ok(MockDevice {
                info: DeviceInfo {
                    path: format!("mock://blink1/{session}"),
                    product: "blink(1) mk3".into(),
                    serial: Some("MOCK1234".into()),
                },
                session,
                state: Rc::clone(&self.state),
            })
        }
    }

    /// A device handle produced by [`MockConnector`].
    pub struct MockDevice {
        info: DeviceInfo,
        session: u32,
        state: Rc<MockState>,
    }

    impl MockDevice {
        pub fn session(&self) -> u32 {
            self.session
        }

        fn take_failure(counter: &Cell<u32>) -> bool {
            let n = counter.get();
            if n > 0 {
                counter.set(n - 1);
                true
            } else {
                false
            }
        }
    }

    impl IndicatorDevice for MockDevice {
        fn info(&self) -> &DeviceInfo {
            &self.info
        }

        fn set_color(&self, color: Rgb) -> Result<()> {
            let ok = !Self::take_failure(&self.state.fail_set_color);
            self.state.calls.borrow_mut().push(MockCall::SetColor {
                session: self.session,
                color,
                ok,
            });
            if !ok {
                return Err(DeviceError::WriteFailed("SET_REPORT: mock failure".into()));
            }
            self.state.shown.set(Some(color));
            Ok(())
        }

        fn turn_off(&self) -> Result<()> {
            let ok = !Self::take_failure(&self.state.fail_turn_off);
            self.state.calls.borrow_mut().push(MockCall::TurnOff {
                session: self.session,
                ok,
            });
            if !ok {
                return Err(DeviceError::WriteFailed("SET_REPORT: mock failure".into()));
            }
            self.state.shown.set(None);
            Ok(())
        }
    }
}
