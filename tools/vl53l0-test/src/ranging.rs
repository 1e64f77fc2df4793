// SPDX-License-Identifier: MPL-2.0

use std::{
    io::{self, Write},
    panic, thread,
};

use cancel_token::CancelToken;
use log::{info, warn};
use stmvl53l0_uapi::{
    Device, Result,
    defs::{Init, Stop},
    types::ParameterName,
};

use crate::{config::Settings, use_case::cycle_use_cases};

/// Ranges until `token` is cancelled, then stops the driver.
///
/// With `settings.use_case_cycle`, a worker switches the measurement profile
/// in the background; it is stopped and joined before returning.
pub fn range<D: Device, W: Write>(
    device: &D,
    settings: &Settings,
    token: &CancelToken,
    out: &mut W,
) -> Result<()> {
    let worker_token = CancelToken::new();

    thread::scope(|scope| {
        let worker = settings.use_case_cycle.then(|| {
            scope.spawn(|| {
                cycle_use_cases(
                    device,
                    settings.use_case_interval,
                    &worker_token,
                    &mut io::stdout(),
                )
            })
        });

        let result =
            configure(device, settings, out).and_then(|()| poll(device, settings, token, out));

        worker_token.cancel();
        if let Some(Err(payload)) = worker.map(|worker| worker.join()) {
            panic::resume_unwind(payload);
        }
        result
    })
}

/// Programs the ranging mode, the interrupt and the optional calibration
/// presets, then starts the sensor.
pub fn configure<D: Device, W: Write>(device: &D, settings: &Settings, out: &mut W) -> Result<()> {
    let thresholds = settings.thresholds;
    if thresholds.low().is_some() || thresholds.high().is_some() {
        writeln!(
            out,
            "Configuring Low threshold = {}, High threshold = {}",
            thresholds.low().unwrap_or(0),
            thresholds.high().unwrap_or(0)
        )?;
    }

    device.set_parameter(ParameterName::DeviceMode, thresholds.device_mode() as i32)?;
    device.set_parameter(
        ParameterName::GpioFunction,
        thresholds.gpio_functionality() as i32,
    )?;
    if let Some(low) = thresholds.low() {
        device.set_parameter(ParameterName::LowThreshold, low as i32)?;
    }
    if let Some(high) = thresholds.high() {
        device.set_parameter(ParameterName::HighThreshold, high as i32)?;
    }

    if let Some(offset) = settings.preset_offset_um {
        writeln!(out, "Set Offset value = {}", offset)?;
        device.set_parameter(ParameterName::Offset, offset)?;
    }
    if let Some(rate) = settings.preset_xtalk_rate {
        device.set_parameter(ParameterName::XtalkEnable, 1)?;
        writeln!(out, "Set Xtalk value = {}", rate)?;
        device.set_parameter(ParameterName::XtalkRate, rate as i32)?;
    }

    device.ioctl::<Init>(&mut ())?;
    info!("ranging started");
    Ok(())
}

/// Prints one measurement per polling interval until `token` is cancelled.
fn poll<D: Device, W: Write>(
    device: &D,
    settings: &Settings,
    token: &CancelToken,
    out: &mut W,
) -> Result<()> {
    let mut last_status = None;

    while !token.is_cancelled() {
        if token.wait_timeout(settings.poll_interval) {
            break;
        }
        let data = match device.ranging_data() {
            Ok(data) => data,
            Err(err) => {
                warn!("reading a measurement failed: {}", err);
                continue;
            }
        };

        let status = data.status();
        if status != last_status {
            match status {
                Some(status) => info!("range status: {}", status.description()),
                None => info!("range status: unknown ({})", data.range_status),
            }
            last_status = status;
        }
        write!(
            out,
            "  VL53L0 Range Data:{:4}, error status:0x{:x}, signalRate_mcps:{:7}, Amb Rate_mcps:{:7}\r",
            data.range_mm,
            data.range_status,
            data.signal_rate_rtn_mcps as i32,
            data.ambient_rate_rtn_mcps as i32
        )?;
        out.flush()?;
    }

    writeln!(out)?;
    writeln!(out, "Stop driver")?;
    device.ioctl::<Stop>(&mut ())?;
    info!("ranging stopped");
    Ok(())
}
