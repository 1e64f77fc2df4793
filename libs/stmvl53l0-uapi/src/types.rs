// SPDX-License-Identifier: MPL-2.0

//! The records exchanged with the driver and the values they carry.
//!
//! Every record is `#[repr(C)]` with the field order and widths of the
//! driver's headers; their sizes are checked at compile time.

use int_to_c_enum::TryFromInt;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::error::Result;

/// A register access; `struct stmvl53l0_register` in the driver.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct RegisterAccess {
    /// 1 for a read, 0 for a write.
    pub is_read: u32,
    pub reg_index: u32,
    /// The register width in bytes; see [`RegisterWidth`].
    pub reg_bytes: u32,
    /// The value to write, or the value read back.
    pub reg_data: u32,
    /// The status reported by the driver.
    pub status: i32,
}

const _: () = assert!(size_of::<RegisterAccess>() == 20);

impl RegisterAccess {
    pub fn read(reg_index: u32, width: RegisterWidth) -> Self {
        Self {
            is_read: 1,
            reg_index,
            reg_bytes: width as u32,
            ..Default::default()
        }
    }

    pub fn write(reg_index: u32, width: RegisterWidth, reg_data: u32) -> Self {
        Self {
            is_read: 0,
            reg_index,
            reg_bytes: width as u32,
            reg_data,
            status: 0,
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read != 0
    }
}

/// The width of a register access.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum RegisterWidth {
    Byte = 1,
    Word = 2,
    DoubleWord = 4,
}

/// A parameter access; `struct stmvl53l0_parameter` in the driver.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct ParameterAccess {
    /// 1 to get, 0 to set.
    pub is_read: u32,
    /// A raw [`ParameterName`]; the C enum occupies four bytes.
    name: u32,
    pub value: i32,
    /// The second value; only some parameters use it.
    pub value2: i32,
    pub status: i32,
}

const _: () = assert!(size_of::<ParameterAccess>() == 20);

impl ParameterAccess {
    pub fn get(name: ParameterName) -> Self {
        Self {
            is_read: 1,
            name: name as u32,
            ..Default::default()
        }
    }

    pub fn set(name: ParameterName, value: i32) -> Self {
        Self {
            is_read: 0,
            name: name as u32,
            value,
            ..Default::default()
        }
    }

    pub fn is_read(&self) -> bool {
        self.is_read != 0
    }

    pub fn name(&self) -> Result<ParameterName> {
        Ok(ParameterName::try_from(self.name)?)
    }
}

/// The parameters reachable through [`Parameter`](crate::defs::Parameter).
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum ParameterName {
    /// The range offset, in micrometers.
    Offset = 0,
    /// The crosstalk compensation rate, in 16.16 fixed point MCPS.
    XtalkRate = 1,
    XtalkEnable = 2,
    /// The GPIO interrupt function; see [`GpioFunctionality`].
    GpioFunction = 3,
    LowThreshold = 4,
    HighThreshold = 5,
    /// The ranging mode; see [`DeviceMode`].
    DeviceMode = 6,
    InterMeasurementPeriod = 7,
    /// `value` is the reference SPAD count, `value2` is 1 for aperture SPADs.
    ReferenceSpads = 8,
    /// `value` is the VHV setting, `value2` is the phase calibration.
    RefCalibration = 9,
}

/// The ranging modes of the sensor.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum DeviceMode {
    SingleRanging = 0,
    ContinuousRanging = 1,
    SingleHistogram = 2,
    ContinuousTimedRanging = 3,
}

/// What raises the GPIO interrupt line.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum GpioFunctionality {
    Off = 0,
    ThresholdCrossedLow = 1,
    ThresholdCrossedHigh = 2,
    ThresholdCrossedOut = 3,
    NewMeasureReady = 4,
}

/// The predefined measurement profiles of the driver.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum UseCase {
    LongDistance = 1,
    HighAccuracy = 2,
    HighSpeed = 3,
    /// The profile last installed with
    /// [`ActivateCustomUseCase`](crate::defs::ActivateCustomUseCase).
    Custom = 4,
}

/// A measurement profile; `struct stmvl53l0_custom_use_case` in the driver.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct CustomUseCase {
    /// The minimum return signal rate, in 16.16 fixed point MCPS.
    pub signal_rate_limit: u32,
    /// The maximum sigma, in 16.16 fixed point millimeters.
    pub sigma_limit: u32,
    /// The VCSEL pulse period of the pre-range phase, in PCLKs.
    pub pre_range_pulse_period: u32,
    /// The VCSEL pulse period of the final-range phase, in PCLKs.
    pub final_range_pulse_period: u32,
    /// The measurement timing budget, in microseconds.
    pub timing_budget_us: u32,
}

const _: () = assert!(size_of::<CustomUseCase>() == 20);

impl CustomUseCase {
    pub const LONG_DISTANCE: Self = Self {
        signal_rate_limit: FIX_POINT_ONE / 10,
        sigma_limit: 60 * FIX_POINT_ONE,
        pre_range_pulse_period: 18,
        final_range_pulse_period: 14,
        timing_budget_us: 26_000,
    };

    pub const HIGH_ACCURACY: Self = Self {
        signal_rate_limit: 25 * FIX_POINT_ONE / 100,
        sigma_limit: 18 * FIX_POINT_ONE,
        pre_range_pulse_period: 14,
        final_range_pulse_period: 10,
        timing_budget_us: 200_000,
    };

    pub const HIGH_SPEED: Self = Self {
        signal_rate_limit: 25 * FIX_POINT_ONE / 100,
        sigma_limit: 32 * FIX_POINT_ONE,
        pre_range_pulse_period: 14,
        final_range_pulse_period: 10,
        timing_budget_us: 20_000,
    };
}

/// 1.0 in 16.16 fixed point.
pub const FIX_POINT_ONE: u32 = 1 << 16;

/// Converts a 16.16 fixed point value.
pub fn fix_point_to_f32(value: u32) -> f32 {
    value as f32 / FIX_POINT_ONE as f32
}

/// A ranging measurement; `VL53L0_RangingMeasurementData_t` in the ST API.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct RangingMeasurement {
    pub timestamp: u32,
    pub measurement_time_us: u32,
    pub range_mm: u16,
    pub range_dmax_mm: u16,
    /// 16.16 fixed point.
    pub signal_rate_rtn_mcps: u32,
    /// 16.16 fixed point.
    pub ambient_rate_rtn_mcps: u32,
    /// 8.8 fixed point.
    pub effective_spad_rtn_count: u16,
    pub zone_id: u8,
    pub range_fractional_part: u8,
    /// A raw [`RangeStatus`].
    pub range_status: u8,
    _padding: [u8; 3],
}

const _: () = assert!(size_of::<RangingMeasurement>() == 28);

impl RangingMeasurement {
    pub fn status(&self) -> Option<RangeStatus> {
        RangeStatus::try_from(self.range_status).ok()
    }
}

/// The validity of a ranging measurement.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromInt)]
pub enum RangeStatus {
    Valid = 0,
    SigmaFail = 1,
    SignalFail = 2,
    MinRangeFail = 3,
    PhaseFail = 4,
    HardwareFail = 5,
    NoUpdate = 255,
}

impl RangeStatus {
    pub fn description(self) -> &'static str {
        match self {
            RangeStatus::Valid => "range valid",
            RangeStatus::SigmaFail => "sigma fail",
            RangeStatus::SignalFail => "signal fail",
            RangeStatus::MinRangeFail => "min range fail",
            RangeStatus::PhaseFail => "phase fail",
            RangeStatus::HardwareFail => "hardware fail",
            RangeStatus::NoUpdate => "no update",
        }
    }
}
