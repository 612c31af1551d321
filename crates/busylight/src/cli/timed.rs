//! `for` subcommand — light up, then turn off when the countdown expires.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use busylight_lib::BusylightError;
use busylight_lib::device::DeviceConnector;
use busylight_lib::timer::Clock;

use super::{
    RUNNING, Result, TimedStateController, format_remaining, load_config, open_controller,
    parse_duration,
};

/// Upper bound on one sleep, so Ctrl+C is noticed promptly.
const MAX_NAP: Duration = Duration::from_millis(250);

/// How a timed run ended.
#[derive(Debug, PartialEq, Eq)]
enum Ending {
    Expired,
    Interrupted,
}

pub(super) fn cmd_for(input: &str, config_path: Option<&Path>) -> Result<()> {
    let duration = parse_duration(input).ok_or_else(|| {
        BusylightError::Duration(format!(
            "invalid duration \"{}\" (expected e.g. 90, 30m, 2h; at most 168h)",
            input.trim()
        ))
    })?;

    let config = load_config(config_path);
    let mut controller = open_controller(&config)?;
    controller.arm_for(duration)?;
    println!("Light: ON (auto-off in {})", format_remaining(duration));

    match wait_for_expiry(&mut controller, &RUNNING, std::thread::sleep)? {
        Ending::Expired => println!("Light: OFF (timer expired)"),
        Ending::Interrupted => {
            controller.shutdown()?;
            println!("Light: OFF (interrupted)");
        }
    }
    Ok(())
}

/// Poll the countdown until it fires or `running` is cleared.
fn wait_for_expiry<C, K>(
    controller: &mut TimedStateController<C, K>,
    running: &AtomicBool,
    mut sleep: impl FnMut(Duration),
) -> Result<Ending>
where
    C: DeviceConnector,
    K: Clock,
{
    while controller.is_armed() {
        if controller.poll_timer()?.is_some() {
            return Ok(Ending::Expired);
        }
        if !running.load(Ordering::SeqCst) {
            return Ok(Ending::Interrupted);
        }
        let nap = controller.next_wakeup().map_or(MAX_NAP, |d| d.min(MAX_NAP));
        sleep(nap);
    }
    Ok(Ending::Interrupted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use busylight_lib::color::Rgb;
    use busylight_lib::device::mock::MockConnector;
    use busylight_lib::timer::mock::ManualClock;

    fn armed(secs: u64) -> (
        TimedStateController<MockConnector, ManualClock>,
        MockConnector,
        ManualClock,
    ) {
        let connector = MockConnector::new();
        let clock = ManualClock::new();
        let mut ctl =
            TimedStateController::with_clock(connector.clone(), Rgb::RED, clock.clone()).unwrap();
        ctl.arm_for(Duration::from_secs(secs)).unwrap();
        (ctl, connector, clock)
    }

    #[test]
    fn waits_until_countdown_expires() {
        let (mut ctl, connector, clock) = armed(3);
        let running = AtomicBool::new(true);
        let mut slept = Duration::ZERO;
        let ending = wait_for_expiry(&mut ctl, &running, |d| {
            slept += d;
            clock.advance(d);
        })
        .unwrap();
        assert_eq!(ending, Ending::Expired);
        assert_eq!(slept, Duration::from_secs(3));
        assert!(!connector.is_shown_lit());
    }

    #[test]
    fn naps_are_bounded() {
        let (mut ctl, _, clock) = armed(60);
        let running = AtomicBool::new(true);
        let mut longest = Duration::ZERO;
        wait_for_expiry(&mut ctl, &running, |d| {
            longest = longest.max(d);
            clock.advance(d);
        })
        .unwrap();
        assert_eq!(longest, MAX_NAP);
    }

    #[test]
    fn interrupt_stops_waiting_with_light_still_on() {
        let (mut ctl, connector, _) = armed(60);
        let running = AtomicBool::new(false);
        let ending = wait_for_expiry(&mut ctl, &running, |_| panic!("must not sleep")).unwrap();
        assert_eq!(ending, Ending::Interrupted);
        assert!(connector.is_shown_lit());

        ctl.shutdown().unwrap();
        assert!(!connector.is_shown_lit());
        assert!(!ctl.is_armed());
    }
}
