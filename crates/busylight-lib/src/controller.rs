//! Timed state controller — the user-facing on/off/arm state machine.
//!
//! Two mostly independent dimensions:
//! - light: `Off` / `Lit`, held by the current [`DeviceSession`]
//! - timer: disarmed / armed, held by a [`Countdown`]
//!
//! Every on/off command gets exactly one recovery attempt: if the current
//! session reports failure, it is dropped, a fresh session is opened through
//! the connector, and the command is issued once more with its result
//! ignored. A failure to open the replacement is returned to the caller and
//! is meant to be fatal.
//!
//! The returned [`VisualState`] is the *requested* state, not a hardware
//! readback, so the UI stays optimistic when the retry also fails.

use std::fmt;
use std::time::Duration;

use crate::color::Rgb;
use crate::device::{DeviceConnector, DeviceInfo, IndicatorDevice, Result};
use crate::duration::MAX_DURATION;
use crate::error::BusylightError;
use crate::session::DeviceSession;
use crate::timer::{Clock, Countdown, SystemClock};

/// Two-valued projection of the light shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualState {
    Lit,
    Off,
}

impl VisualState {
    pub fn is_lit(self) -> bool {
        self == VisualState::Lit
    }
}

impl fmt::Display for VisualState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VisualState::Lit => write!(f, "On"),
            VisualState::Off => write!(f, "Off"),
        }
    }
}

#[derive(Clone, Copy)]
enum Command {
    Activate,
    Deactivate,
}

impl Command {
    fn run<D: IndicatorDevice>(self, session: &mut DeviceSession<D>) -> bool {
        match self {
            Command::Activate => session.activate(),
            Command::Deactivate => session.deactivate(),
        }
    }

    fn visual(self) -> VisualState {
        match self {
            Command::Activate => VisualState::Lit,
            Command::Deactivate => VisualState::Off,
        }
    }
}

pub struct TimedStateController<C: DeviceConnector, K: Clock = SystemClock> {
    connector: C,
    alert: Rgb,
    /// `None` only after a replacement session failed to open.
    session: Option<DeviceSession<C::Device>>,
    countdown: Countdown,
    clock: K,
}

impl<C: DeviceConnector> TimedStateController<C> {
    /// Open the first session using the system clock.
    pub fn new(connector: C, alert: Rgb) -> Result<Self> {
        Self::with_clock(connector, alert, SystemClock)
    }
}

impl<C: DeviceConnector, K: Clock> TimedStateController<C, K> {
    /// Open the first session. Fails if no device is reachable.
    pub fn with_clock(connector: C, alert: Rgb, clock: K) -> Result<Self> {
        let session = DeviceSession::open(&connector, alert)?;
        log::info!("indicator ready: {}", session.info().path);
        Ok(Self {
            connector,
            alert,
            session: Some(session),
            countdown: Countdown::new(),
            clock,
        })
    }

    /// Cancel any countdown and light up.
    pub fn turn_on(&mut self) -> Result<VisualState> {
        self.disarm();
        self.command(Command::Activate)
    }

    /// Cancel any countdown and turn off.
    pub fn turn_off(&mut self) -> Result<VisualState> {
        self.disarm();
        self.command(Command::Deactivate)
    }

    /// Cancel any countdown and flip the light.
    pub fn toggle(&mut self) -> Result<VisualState> {
        self.disarm();
        if self.is_lit() {
            self.command(Command::Deactivate)
        } else {
            self.command(Command::Activate)
        }
    }

    /// Light up now and turn off automatically after `duration`.
    ///
    /// Re-arming replaces the pending countdown. A zero duration does
    /// nothing and returns `Ok(None)`. Durations above [`MAX_DURATION`] are
    /// rejected before the light or the countdown is touched.
    pub fn arm_for(&mut self, duration: Duration) -> crate::error::Result<Option<VisualState>> {
        if duration.is_zero() {
            return Ok(None);
        }
        if duration > MAX_DURATION || !self.countdown.arm(self.clock.now(), duration) {
            return Err(BusylightError::Duration(format!(
                "{}s exceeds the {}h limit",
                duration.as_secs(),
                MAX_DURATION.as_secs() / 3600
            )));
        }
        log::info!("armed auto-off in {}s", duration.as_secs());
        // Activate directly: turn_on() would cancel the countdown just armed.
        Ok(Some(self.command(Command::Activate)?))
    }

    /// Deliver the countdown-expiry event if it is due.
    ///
    /// Returns `Ok(Some(Off))` exactly once per armed countdown.
    pub fn poll_timer(&mut self) -> Result<Option<VisualState>> {
        if !self.countdown.poll(self.clock.now()) {
            return Ok(None);
        }
        log::info!("auto-off timer expired");
        self.command(Command::Deactivate).map(Some)
    }

    /// Cancel the countdown without changing the light.
    ///
    /// Returns `true` if a countdown was pending.
    pub fn disarm(&mut self) -> bool {
        let was_armed = self.countdown.cancel();
        if was_armed {
            log::debug!("auto-off timer cancelled");
        }
        was_armed
    }

    /// Cancel the countdown and leave the light off.
    pub fn shutdown(&mut self) -> Result<VisualState> {
        self.turn_off()
    }

    /// Cached light state of the current session.
    pub fn is_lit(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_lit())
    }

    /// The light state as shown to the user.
    pub fn visual_state(&self) -> VisualState {
        if self.is_lit() {
            VisualState::Lit
        } else {
            VisualState::Off
        }
    }

    pub fn is_armed(&self) -> bool {
        self.countdown.is_armed()
    }

    /// Time left on the pending countdown.
    pub fn remaining(&self) -> Option<Duration> {
        self.countdown.remaining(self.clock.now())
    }

    /// How long the event loop may sleep before the countdown is due.
    pub fn next_wakeup(&self) -> Option<Duration> {
        self.remaining()
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.session.as_ref().map(|s| s.info())
    }

    pub fn alert(&self) -> Rgb {
        self.alert
    }

    /// Run `cmd` on the current session, with one session-replacement retry.
    fn command(&mut self, cmd: Command) -> Result<VisualState> {
        let ok = match self.session.as_mut() {
            Some(session) => cmd.run(session),
            None => false,
        };
        if !ok {
            log::warn!("device command failed, reopening device");
            // Release the old handle before opening the replacement.
            self.session = None;
            let mut fresh = DeviceSession::open(&self.connector, self.alert)?;
            if cmd.run(&mut fresh) {
                log::info!("device recovered: {}", fresh.info().path);
            } else {
                log::warn!("retry on fresh device also failed");
            }
            self.session = Some(fresh);
        }
        Ok(cmd.visual())
    }
}
