// SPDX-License-Identifier: MPL-2.0

//! The `ioctl` commands of the `stmvl53l0` driver.

use crate::{
    ioc,
    types::{CustomUseCase, ParameterAccess, RangingMeasurement, RegisterAccess},
};

/// The `ioctl` type shared by every command of the driver.
pub const VL53L0_IOCTL_MAGIC: u8 = b'p';

ioc! {
    /// Initializes the sensor and starts ranging.
    pub struct Init                  = VL53L0_IOCTL_INIT,                     VL53L0_IOCTL_MAGIC, 0x01, NoData;
    /// Runs crosstalk calibration against a target at the given distance (mm).
    pub struct XtalkCalibrate        = VL53L0_IOCTL_XTALKCALB,                VL53L0_IOCTL_MAGIC, 0x02, InData<u32>;
    /// Runs offset calibration against a target at the given distance (mm).
    pub struct OffsetCalibrate       = VL53L0_IOCTL_OFFCALB,                  VL53L0_IOCTL_MAGIC, 0x03, InData<u32>;
    /// Stops ranging. Harmless when the sensor is idle.
    pub struct Stop                  = VL53L0_IOCTL_STOP,                     VL53L0_IOCTL_MAGIC, 0x05, NoData;
    pub struct SetXtalk              = VL53L0_IOCTL_SETXTALK,                 VL53L0_IOCTL_MAGIC, 0x06, InData<u32>;
    pub struct SetOffset             = VL53L0_IOCTL_SETOFFSET,                VL53L0_IOCTL_MAGIC, 0x07, InData<i8>;
    /// Switches to one of the driver's predefined use cases; see [`UseCase`](crate::types::UseCase).
    pub struct ActivateUseCase       = VL53L0_IOCTL_ACTIVATE_USE_CASE,        VL53L0_IOCTL_MAGIC, 0x08, InData<u8>;
    pub struct ActivateCustomUseCase = VL53L0_IOCTL_ACTIVATE_CUSTOM_USE_CASE, VL53L0_IOCTL_MAGIC, 0x09, InData<CustomUseCase>;
    /// Fetches the latest ranging measurement.
    pub struct GetRangingData        = VL53L0_IOCTL_GETDATAS,                 VL53L0_IOCTL_MAGIC, 0x0b, OutData<RangingMeasurement>;
    /// Reads or writes a raw sensor register.
    pub struct Register              = VL53L0_IOCTL_REGISTER,                 VL53L0_IOCTL_MAGIC, 0x0c, InOutData<RegisterAccess>;
    /// Gets or sets a named driver parameter.
    pub struct Parameter             = VL53L0_IOCTL_PARAMETER,                VL53L0_IOCTL_MAGIC, 0x0d, InOutData<ParameterAccess>;
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ioctl::IoctlCmd;

    #[test]
    fn request_numbers() {
        assert_eq!(Init::CMD, 0x0000_7001);
        assert_eq!(XtalkCalibrate::CMD, 0x4004_7002);
        assert_eq!(OffsetCalibrate::CMD, 0x4004_7003);
        assert_eq!(Stop::CMD, 0x0000_7005);
        assert_eq!(SetXtalk::CMD, 0x4004_7006);
        assert_eq!(SetOffset::CMD, 0x4001_7007);
        assert_eq!(ActivateUseCase::CMD, 0x4001_7008);
        assert_eq!(ActivateCustomUseCase::CMD, 0x4014_7009);
        assert_eq!(GetRangingData::CMD, 0x801c_700b);
        assert_eq!(Register::CMD, 0xc014_700c);
        assert_eq!(Parameter::CMD, 0xc014_700d);
    }

    #[test]
    fn names_follow_the_driver_header() {
        assert_eq!(Stop::NAME, "VL53L0_IOCTL_STOP");
        assert_eq!(GetRangingData::NAME, "VL53L0_IOCTL_GETDATAS");
        assert_eq!(
            ActivateCustomUseCase::NAME,
            "VL53L0_IOCTL_ACTIVATE_CUSTOM_USE_CASE"
        );
    }
}
