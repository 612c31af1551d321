//! One live binding to an indicator device.
//!
//! A [`DeviceSession`] makes exactly one attempt per command and reports the
//! outcome as a `bool`. It never retries and never reconnects on its own;
//! replacing a session after a failure is the controller's job.

use crate::color::Rgb;
use crate::device::{DeviceConnector, DeviceInfo, IndicatorDevice, Result};

pub struct DeviceSession<D: IndicatorDevice> {
    device: D,
    alert: Rgb,
    lit: bool,
}

impl<D: IndicatorDevice> DeviceSession<D> {
    /// Acquire a device through `connector` and normalize it to off.
    ///
    /// Failing to acquire the device is returned as an error. A failed
    /// initial turn-off is only logged: the session still starts as not lit.
    pub fn open<C>(connector: &C, alert: Rgb) -> Result<Self>
    where
        C: DeviceConnector<Device = D>,
    {
        let device = connector.connect()?;
        let mut session = Self {
            device,
            alert,
            lit: false,
        };
        if !session.deactivate() {
            log::warn!("could not turn light off on {}", session.info().path);
        }
        Ok(session)
    }

    /// Show the alert color. On success the session is lit.
    pub fn activate(&mut self) -> bool {
        match self.device.set_color(self.alert) {
            Ok(()) => {
                self.lit = true;
                true
            }
            Err(e) => {
                log::warn!("activate failed: {e}");
                false
            }
        }
    }

    /// Turn the light off. On success the session is not lit.
    pub fn deactivate(&mut self) -> bool {
        match self.device.turn_off() {
            Ok(()) => {
                self.lit = false;
                true
            }
            Err(e) => {
                log::warn!("deactivate failed: {e}");
                false
            }
        }
    }

    /// Last successfully commanded state. A cache, not a hardware query.
    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn alert(&self) -> Rgb {
        self.alert
    }

    pub fn info(&self) -> &DeviceInfo {
        self.device.info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::DeviceError;
    use crate::device::mock::{MockCall, MockConnector};

    #[test]
    fn open_turns_light_off() {
        let c = MockConnector::new();
        let s = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert!(!s.is_lit());
        assert_eq!(
            c.calls(),
            vec![
                MockCall::Connect { ok: true },
                MockCall::TurnOff {
                    session: 1,
                    ok: true
                },
            ]
        );
    }

    #[test]
    fn open_twice_leaves_light_off() {
        let c = MockConnector::new();
        let mut first = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert!(first.activate());
        drop(first);

        let second = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert!(!second.is_lit());
        assert!(!c.is_shown_lit());
    }

    #[test]
    fn open_without_device_fails() {
        let c = MockConnector::unplugged();
        let err = DeviceSession::open(&c, Rgb::RED).err().unwrap();
        assert!(matches!(err, DeviceError::NotFound));
    }

    #[test]
    fn open_survives_failed_initial_off() {
        let c = MockConnector::new();
        c.state.fail_turn_off.set(1);
        let s = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert!(!s.is_lit());
    }

    #[test]
    fn activate_sets_lit_and_uses_alert_color() {
        let c = MockConnector::new();
        let alert = Rgb::new(0, 0, 0xFF);
        let mut s = DeviceSession::open(&c, alert).unwrap();
        assert!(s.activate());
        assert!(s.is_lit());
        assert_eq!(s.alert(), alert);
        assert_eq!(c.state.shown.get(), Some(alert));
    }

    #[test]
    fn failed_activate_leaves_flag_unchanged() {
        let c = MockConnector::new();
        let mut s = DeviceSession::open(&c, Rgb::RED).unwrap();
        c.state.fail_set_color.set(1);
        assert!(!s.activate());
        assert!(!s.is_lit());
        // Exactly one attempt, no internal retry.
        assert_eq!(c.set_color_count(), 1);
    }

    #[test]
    fn failed_deactivate_leaves_flag_unchanged() {
        let c = MockConnector::new();
        let mut s = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert!(s.activate());
        c.state.fail_turn_off.set(1);
        assert!(!s.deactivate());
        assert!(s.is_lit(), "stale cache is kept after a failed command");
    }

    #[test]
    fn info_comes_from_device() {
        let c = MockConnector::new();
        let s = DeviceSession::open(&c, Rgb::RED).unwrap();
        assert_eq!(s.info().path, "mock://blink1/1");
    }
}
