// SPDX-License-Identifier: MPL-2.0

//! The C ABI of the Android sensors HAL (`hardware/hardware.h` and
//! `hardware/sensors.h`).
//!
//! Only what this tool touches is declared. The objects behind these pointers
//! are allocated and owned by the HAL; the structures are never built here
//! except for [`SensorsEvent`], which the HAL fills in.

use core::ffi::{CStr, c_char, c_int, c_void};

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// The exported name of the module descriptor, `HAL_MODULE_INFO_SYM_AS_STR`.
pub const HAL_MODULE_INFO_SYM: &[u8] = b"HMI\0";
/// The device identifier to open, `SENSORS_HARDWARE_POLL`.
pub const SENSORS_HARDWARE_POLL: &CStr = c"poll";

pub const SENSOR_TYPE_META_DATA: i32 = 0;
pub const SENSOR_TYPE_LIGHT: i32 = 5;
pub const SENSOR_TYPE_PROXIMITY: i32 = 8;
/// The vendor type reported by the time-of-flight sensor.
pub const SENSOR_TYPE_TIME_OF_FLIGHT: i32 = 40;

pub const META_DATA_FLUSH_COMPLETE: i32 = 1;

/// `hw_module_methods_t`
#[repr(C)]
pub struct HwModuleMethods {
    pub open: Option<
        unsafe extern "C" fn(
            module: *const HwModule,
            id: *const c_char,
            device: *mut *mut HwDevice,
        ) -> c_int,
    >,
}

/// `hw_module_t`
#[repr(C)]
pub struct HwModule {
    pub tag: u32,
    pub module_api_version: u16,
    pub hal_api_version: u16,
    pub id: *const c_char,
    pub name: *const c_char,
    pub author: *const c_char,
    pub methods: *mut HwModuleMethods,
    pub dso: *mut c_void,
    /// `uint64_t` on LP64 targets, `uint32_t` otherwise.
    pub reserved: [usize; 32 - 7],
}

/// `hw_device_t`
#[repr(C)]
pub struct HwDevice {
    pub tag: u32,
    pub version: u32,
    pub module: *mut HwModule,
    pub reserved: [usize; 12],
    pub close: Option<unsafe extern "C" fn(device: *mut HwDevice) -> c_int>,
}

/// `sensors_module_t`
#[repr(C)]
pub struct SensorsModule {
    pub common: HwModule,
    pub get_sensors_list:
        Option<unsafe extern "C" fn(module: *mut SensorsModule, list: *mut *const Sensor) -> c_int>,
    pub set_operation_mode: Option<unsafe extern "C" fn(mode: c_int) -> c_int>,
}

/// The leading part of `sensors_poll_device_1_t`, up to `flush`.
#[repr(C)]
pub struct SensorsPollDevice1 {
    pub common: HwDevice,
    pub activate: Option<
        unsafe extern "C" fn(
            device: *mut SensorsPollDevice1,
            handle: c_int,
            enabled: c_int,
        ) -> c_int,
    >,
    pub set_delay: Option<
        unsafe extern "C" fn(
            device: *mut SensorsPollDevice1,
            handle: c_int,
            period_ns: i64,
        ) -> c_int,
    >,
    pub poll: Option<
        unsafe extern "C" fn(
            device: *mut SensorsPollDevice1,
            data: *mut SensorsEvent,
            count: c_int,
        ) -> c_int,
    >,
    pub batch: Option<
        unsafe extern "C" fn(
            device: *mut SensorsPollDevice1,
            handle: c_int,
            flags: c_int,
            sampling_period_ns: i64,
            max_report_latency_ns: i64,
        ) -> c_int,
    >,
    pub flush:
        Option<unsafe extern "C" fn(device: *mut SensorsPollDevice1, handle: c_int) -> c_int>,
}

/// `sensor_t`
#[repr(C)]
pub struct Sensor {
    pub name: *const c_char,
    pub vendor: *const c_char,
    pub version: c_int,
    pub handle: c_int,
    pub sensor_type: c_int,
    pub max_range: f32,
    pub resolution: f32,
    pub power: f32,
    pub min_delay: i32,
    pub fifo_reserved_event_count: u32,
    pub fifo_max_event_count: u32,
    pub string_type: *const c_char,
    pub required_permission: *const c_char,
    /// `int64_t` on LP64 targets, `int32_t` otherwise.
    pub max_delay: isize,
    /// `uint64_t` on LP64 targets, `uint32_t` otherwise.
    pub flags: usize,
    pub reserved: [*mut c_void; 2],
}

/// `sensors_event_t`
///
/// The payload is a union in C; every variant this tool reads is viewed
/// through `data`.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, FromBytes, IntoBytes, Immutable, KnownLayout)]
pub struct SensorsEvent {
    pub version: i32,
    pub sensor: i32,
    pub sensor_type: i32,
    pub reserved0: i32,
    pub timestamp: i64,
    pub data: [f32; 16],
    pub flags: u32,
    pub reserved1: [u32; 3],
}

const _: () = assert!(size_of::<SensorsEvent>() == 104);

impl SensorsEvent {
    /// The `meta_data.what` field of a meta-data event.
    pub fn meta_data_what(&self) -> i32 {
        self.data[0].to_bits() as i32
    }

    /// The `meta_data.sensor` field of a meta-data event.
    pub fn meta_data_sensor(&self) -> i32 {
        self.data[1].to_bits() as i32
    }
}

#[cfg(test)]
mod test {
    use core::mem::offset_of;

    use zerocopy::FromZeros;

    use super::*;

    #[test]
    fn event_layout() {
        assert_eq!(offset_of!(SensorsEvent, timestamp), 16);
        assert_eq!(offset_of!(SensorsEvent, data), 24);
        assert_eq!(offset_of!(SensorsEvent, flags), 88);
    }

    #[test]
    fn pointer_sized_layouts() {
        let word = size_of::<usize>();
        assert_eq!(size_of::<HwModule>(), 8 + 5 * word + 25 * word);
        assert_eq!(size_of::<HwDevice>(), 8 + 14 * word);
        assert_eq!(
            offset_of!(SensorsPollDevice1, activate),
            size_of::<HwDevice>()
        );
        assert_eq!(offset_of!(Sensor, version), 2 * word);
    }

    #[test]
    fn meta_data_overlays_the_payload() {
        let mut event = SensorsEvent::new_zeroed();
        event.sensor_type = SENSOR_TYPE_META_DATA;
        event.data[0] = f32::from_bits(META_DATA_FLUSH_COMPLETE as u32);
        event.data[1] = f32::from_bits(7);
        assert_eq!(event.meta_data_what(), META_DATA_FLUSH_COMPLETE);
        assert_eq!(event.meta_data_sensor(), 7);
    }
}
