// SPDX-License-Identifier: MPL-2.0

//! Crosstalk and offset calibration.
//!
//! Both calibrations are run by the driver; this module triggers them, reads
//! back the values the driver settled on and stores them in the files the
//! driver loads at boot.

use std::{fs, io::Write, path::Path};

use cancel_token::CancelToken;
use log::{info, warn};
use stmvl53l0_uapi::{
    Device, Result,
    defs::{OffsetCalibrate, XtalkCalibrate},
    types::{ParameterName, RangingMeasurement, fix_point_to_f32},
};

use crate::config::Settings;

/// The outcome of a crosstalk calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XtalkCalibration {
    /// The compensation rate, in 16.16 fixed point MCPS.
    pub rate: u32,
    pub enable: u8,
}

impl XtalkCalibration {
    pub fn file_contents(&self) -> String {
        format!("{}\n{}\n", self.rate as i32, self.enable)
    }
}

/// The outcome of an offset calibration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OffsetCalibration {
    pub offset_um: i32,
    pub vhv_settings: u8,
    pub phase_cal: u8,
    pub spad_count: u32,
    pub is_aperture_spads: u8,
}

impl OffsetCalibration {
    pub fn file_contents(&self) -> String {
        format!(
            "{}\n{}\n{}\n{}\n{}\n",
            self.offset_um,
            self.vhv_settings,
            self.phase_cal,
            self.spad_count as i32,
            self.is_aperture_spads
        )
    }
}

/// Runs a crosstalk calibration against a target at `settings.xtalk_target_mm`.
///
/// After storing the result, a few measurements are taken to flush stale data
/// out of the driver and the last one is reported.
pub fn calibrate_xtalk<D: Device, W: Write>(
    device: &D,
    settings: &Settings,
    token: &CancelToken,
    out: &mut W,
) -> Result<XtalkCalibration> {
    writeln!(
        out,
        "xtalk Calibrate place black target at {}mm from glass===",
        settings.xtalk_target_mm
    )?;
    info!("starting crosstalk calibration");

    let mut target = settings.xtalk_target_mm;
    device.ioctl::<XtalkCalibrate>(&mut target)?;

    let calibration = XtalkCalibration {
        rate: device.get_parameter(ParameterName::XtalkRate)?.value as u32,
        enable: device.get_parameter(ParameterName::XtalkEnable)?.value as u8,
    };
    writeln!(
        out,
        "VL53L0 Xtalk Calibration get Xtalk Compensation rate in fixed 16 point as {}, enable:{}",
        calibration.rate, calibration.enable
    )?;
    info!(
        "crosstalk compensation: {} MCPS",
        fix_point_to_f32(calibration.rate)
    );
    persist(&settings.xtalk_file, &calibration.file_contents());

    let mut last = RangingMeasurement::default();
    for _ in 0..=settings.calibration_samples {
        if token.wait_timeout(settings.poll_interval) {
            break;
        }
        match device.ranging_data() {
            Ok(data) => last = data,
            Err(err) => warn!("reading a measurement failed: {}", err),
        }
    }
    writeln!(
        out,
        " VL53L0 DMAX calibration Range Data:{},  signalRate_mcps:{}",
        last.range_mm, last.signal_rate_rtn_mcps as i32
    )?;

    Ok(calibration)
}

/// Runs an offset calibration against a target at `settings.offset_target_mm`.
pub fn calibrate_offset<D: Device, W: Write>(
    device: &D,
    settings: &Settings,
    out: &mut W,
) -> Result<OffsetCalibration> {
    info!("starting offset calibration");

    let mut target = settings.offset_target_mm;
    device.ioctl::<OffsetCalibrate>(&mut target)?;

    let offset_um = device.get_parameter(ParameterName::Offset)?.value;
    writeln!(out, "get offset {} micrometer===", offset_um)?;

    let ref_calibration = device.get_parameter(ParameterName::RefCalibration)?;
    let vhv_settings = ref_calibration.value as u8;
    let phase_cal = ref_calibration.value2 as u8;
    writeln!(
        out,
        "get VhvSettings is {} ===\nget PhaseCas is {} ===",
        vhv_settings, phase_cal
    )?;

    let spads = device.get_parameter(ParameterName::ReferenceSpads)?;
    let spad_count = spads.value as u32;
    let is_aperture_spads = spads.value2 as u8;
    writeln!(
        out,
        "get SpadCount is {} ===\nget IsApertureSpads is {} ===",
        spad_count as i32, is_aperture_spads
    )?;

    let calibration = OffsetCalibration {
        offset_um,
        vhv_settings,
        phase_cal,
        spad_count,
        is_aperture_spads,
    };
    persist(&settings.offset_file, &calibration.file_contents());
    Ok(calibration)
}

fn persist(path: &Path, contents: &str) {
    match fs::write(path, contents) {
        Ok(()) => info!("calibration stored in {}", path.display()),
        Err(err) => warn!("cannot store calibration in {}: {}", path.display(), err),
    }
}
