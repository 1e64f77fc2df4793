// SPDX-License-Identifier: MPL-2.0

//! Ranging and calibration with a VL53L0 sensor through the `stmvl53l0`
//! driver.
//!
//! A run always starts by stopping the sensor, then either calibrates it or
//! ranges until interrupted. See [`config::Settings`] for what can be tuned.

pub mod calibration;
pub mod cli;
pub mod config;
pub mod ranging;
mod use_case;

use std::io::Write;

use cancel_token::CancelToken;
use stmvl53l0_uapi::{Device, Result, defs::Stop};

use crate::{
    calibration::{calibrate_offset, calibrate_xtalk},
    cli::Mode,
    config::Settings,
};

/// Runs the tool against `device`, writing operator output to `out`.
///
/// Cancelling `token` ends ranging, or cuts the measurements that follow a
/// crosstalk calibration short.
pub fn run<D: Device, W: Write>(
    device: &D,
    settings: &Settings,
    token: &CancelToken,
    out: &mut W,
) -> Result<()> {
    device.ioctl::<Stop>(&mut ())?;

    match settings.mode {
        Mode::XtalkCalibration => calibrate_xtalk(device, settings, token, out).map(drop),
        Mode::OffsetCalibration => calibrate_offset(device, settings, out).map(drop),
        Mode::Range => ranging::range(device, settings, token, out),
    }
}

#[cfg(test)]
mod test {
    use std::{env, fs, sync::Arc, thread, time::Duration};

    use cancel_token::{block_interrupt, spawn_interrupt_watcher};
    use stmvl53l0_uapi::{
        Errno, Error,
        defs::{GetRangingData, Init, Parameter},
        ioctl::IoctlCmd,
        mock::MockDevice,
    };

    use super::*;

    #[test]
    fn ranging_stops_the_driver_twice() {
        let token = Arc::new(CancelToken::new());
        let cancel = token.clone();
        let mut reads = 0;
        let device = MockDevice::with_responder(move |call, _| {
            if call.cmd == GetRangingData::CMD {
                reads += 1;
                if reads == 5 {
                    cancel.cancel();
                }
            }
            Ok(())
        });
        let settings = Settings {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        };

        run(&device, &settings, &token, &mut Vec::new()).unwrap();

        let names = device.names();
        assert_eq!(names.first(), Some(&"VL53L0_IOCTL_STOP"));
        assert_eq!(names.last(), Some(&"VL53L0_IOCTL_STOP"));
        assert_eq!(device.count::<Stop>(), 2);
        assert_eq!(device.count::<Parameter>(), 2);
        assert_eq!(device.count::<Init>(), 1);
        assert_eq!(device.count::<GetRangingData>(), 5);
    }

    #[test]
    fn sigint_ends_ranging_with_a_stop() {
        block_interrupt().unwrap();
        let token = CancelToken::new();
        let device = MockDevice::new();
        let settings = Settings {
            poll_interval: Duration::from_millis(1),
            ..Default::default()
        };

        let result = thread::scope(|scope| {
            let watcher = spawn_interrupt_watcher(scope, &token, || {}).unwrap();
            let ranging = scope.spawn(|| run(&device, &settings, &token, &mut Vec::new()));

            while device.count::<GetRangingData>() == 0 {
                thread::sleep(Duration::from_millis(1));
            }
            watcher.raise().unwrap();
            let result = ranging.join().unwrap();
            watcher.shutdown();
            result
        });

        assert!(result.is_ok());
        assert!(token.is_cancelled());
        assert_eq!(device.names().last(), Some(&"VL53L0_IOCTL_STOP"));
        assert_eq!(device.count::<Stop>(), 2);
    }

    #[test]
    fn offset_calibration_mode_does_not_range() {
        let offset_file = env::temp_dir().join(format!("vl53l0-run-offset-{}", std::process::id()));
        let device = MockDevice::new();
        let settings = Settings {
            mode: Mode::OffsetCalibration,
            offset_file: offset_file.clone(),
            ..Default::default()
        };

        run(&device, &settings, &CancelToken::new(), &mut Vec::new()).unwrap();

        let stored = fs::read_to_string(&offset_file).unwrap();
        fs::remove_file(&offset_file).unwrap();
        assert_eq!(stored.lines().count(), 5);
        assert_eq!(device.count::<Stop>(), 1);
        assert_eq!(device.count::<Init>(), 0);
    }

    #[test]
    fn failing_stop_aborts_the_run() {
        let device = MockDevice::with_responder(|call, _| {
            Err(Error::ioctl_failed(Errno::ENODEV, call.name))
        });
        let error = run(
            &device,
            &Settings::default(),
            &CancelToken::new(),
            &mut Vec::new(),
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            format!(
                "Could not perform VL53L0_IOCTL_STOP : {}",
                Errno::ENODEV.desc()
            )
        );
        assert_eq!(device.calls().len(), 1);
    }
}
