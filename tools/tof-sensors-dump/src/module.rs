// SPDX-License-Identifier: MPL-2.0

//! Loading a sensors HAL module and driving its poll device.

use core::{
    ffi::{CStr, c_char, c_int},
    fmt,
    ptr::{self, NonNull},
    slice,
    sync::atomic::{AtomicBool, Ordering},
};
use std::{path::Path, time::Duration};

use libloading::os::unix::{Library, RTLD_LAZY};
use log::{debug, warn};
use nix::errno::Errno;

use crate::{
    dumper::{SensorInfo, SensorsHal},
    hal::{
        HAL_MODULE_INFO_SYM, HwDevice, SENSORS_HARDWARE_POLL, Sensor, SensorsEvent, SensorsModule,
        SensorsPollDevice1,
    },
};

#[derive(Debug)]
pub enum LoadError {
    Open(libloading::Error),
    Symbol(libloading::Error),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Open(err) => write!(f, "Failing to open sensor library! Error: {}", err),
            LoadError::Symbol(err) => {
                write!(f, "Failing to get sensor module handle! Error: {}", err)
            }
        }
    }
}

impl std::error::Error for LoadError {}

/// The module descriptor of a loaded HAL shared object.
///
/// The shared object stays mapped until the process exits: HAL threads may
/// still be running after the poll device is closed.
pub struct HalModule {
    module: NonNull<SensorsModule>,
}

impl HalModule {
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: Loading a HAL runs its initializers. The HAL is trusted to be
        // a well-formed sensors module, as it is for the Android framework.
        let library = unsafe { Library::open(Some(path), RTLD_LAZY) }.map_err(LoadError::Open)?;

        // SAFETY: `HMI` is the module descriptor, a `sensors_module_t` living
        // as long as the library, and is only read through the pointer.
        let module = unsafe { library.get::<*mut SensorsModule>(HAL_MODULE_INFO_SYM) }
            .map(|symbol| *symbol)
            .map_err(LoadError::Symbol)?;
        let module = NonNull::new(module).ok_or(LoadError::Symbol(
            libloading::Error::DlSymUnknown,
        ))?;

        // Never unloaded; see `HalModule`.
        let _ = library.into_raw();
        debug!("loaded {}", path.display());
        Ok(HalModule { module })
    }

    /// Opens the module's poll device.
    pub fn open_poll_device(&self) -> Result<PollDevice<'_>, Errno> {
        let module = self.module.as_ptr();

        // SAFETY: `module` points to the descriptor kept alive by `self`.
        let methods = unsafe { (*module).common.methods };
        // SAFETY: `methods` is null or points to the module's static method table.
        let open = unsafe { methods.as_ref() }
            .and_then(|methods| methods.open)
            .ok_or(Errno::ENOSYS)?;

        let mut device: *mut HwDevice = ptr::null_mut();
        // SAFETY: The arguments follow the `hw_module_methods_t::open` contract.
        let ret = unsafe {
            open(
                &raw const (*module).common,
                SENSORS_HARDWARE_POLL.as_ptr(),
                &mut device,
            )
        };
        PollDevice::check(ret)?;

        let device = NonNull::new(device.cast::<SensorsPollDevice1>()).ok_or(Errno::ENODEV)?;
        Ok(PollDevice {
            device,
            module: self,
            closed: AtomicBool::new(false),
        })
    }

    fn sensor_list(&self) -> &[Sensor] {
        let module = self.module.as_ptr();
        // SAFETY: `module` points to the descriptor kept alive by `self`.
        let Some(get_sensors_list) = (unsafe { (*module).get_sensors_list }) else {
            warn!("the module cannot list its sensors");
            return &[];
        };

        let mut list: *const Sensor = ptr::null();
        // SAFETY: The HAL stores a pointer to its static sensor array in `list`.
        let count = unsafe { get_sensors_list(module, &mut list) };
        if list.is_null() || count <= 0 {
            return &[];
        }
        // SAFETY: The HAL guarantees `count` entries that live as long as the module.
        unsafe { slice::from_raw_parts(list, count as usize) }
    }
}

/// An opened poll device. It is closed on drop unless closed before.
pub struct PollDevice<'a> {
    device: NonNull<SensorsPollDevice1>,
    module: &'a HalModule,
    closed: AtomicBool,
}

// SAFETY: Sensors HALs are required to accept `activate`, `batch` and `flush`
// from any thread while another thread is blocked in `poll`.
unsafe impl Send for PollDevice<'_> {}
// SAFETY: See above.
unsafe impl Sync for PollDevice<'_> {}

impl PollDevice<'_> {
    fn check(ret: c_int) -> Result<(), Errno> {
        if ret < 0 {
            Err(Errno::from_i32(-ret))
        } else {
            Ok(())
        }
    }

    fn raw(&self) -> *mut SensorsPollDevice1 {
        self.device.as_ptr()
    }

    fn ops(&self) -> Result<&SensorsPollDevice1, Errno> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Errno::ENODEV);
        }
        // SAFETY: The device stays valid until it is closed.
        Ok(unsafe { self.device.as_ref() })
    }
}

fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        return String::new();
    }
    // SAFETY: The HAL's sensor strings are static and nul-terminated.
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

impl SensorsHal for PollDevice<'_> {
    fn sensors(&self) -> Vec<SensorInfo> {
        self.module
            .sensor_list()
            .iter()
            .map(|sensor| SensorInfo {
                name: c_string(sensor.name),
                vendor: c_string(sensor.vendor),
                version: sensor.version,
                handle: sensor.handle,
                sensor_type: sensor.sensor_type,
                max_range: sensor.max_range,
                resolution: sensor.resolution,
                power: sensor.power,
            })
            .collect()
    }

    fn activate(&self, handle: i32, enabled: bool) -> Result<(), Errno> {
        let activate = self.ops()?.activate.ok_or(Errno::ENOSYS)?;
        // SAFETY: The device is open and `activate` belongs to it.
        Self::check(unsafe { activate(self.raw(), handle, c_int::from(enabled)) })
    }

    fn batch(&self, handle: i32, sampling_period: Duration) -> Result<(), Errno> {
        let batch = self.ops()?.batch.ok_or(Errno::ENOSYS)?;
        let period_ns = i64::try_from(sampling_period.as_nanos()).map_err(|_| Errno::EINVAL)?;
        // SAFETY: The device is open and `batch` belongs to it.
        Self::check(unsafe { batch(self.raw(), handle, 0, period_ns, 0) })
    }

    fn poll(&self, events: &mut [SensorsEvent]) -> Result<usize, Errno> {
        let poll = self.ops()?.poll.ok_or(Errno::ENOSYS)?;
        let count = c_int::try_from(events.len()).map_err(|_| Errno::EINVAL)?;
        // SAFETY: `events` provides room for `count` events.
        let ret = unsafe { poll(self.raw(), events.as_mut_ptr(), count) };
        Self::check(ret).map(|()| ret as usize)
    }

    fn flush(&self, handle: i32) -> Result<(), Errno> {
        let flush = self.ops()?.flush.ok_or(Errno::ENOSYS)?;
        // SAFETY: The device is open and `flush` belongs to it.
        Self::check(unsafe { flush(self.raw(), handle) })
    }

    fn close(&self) -> Result<(), Errno> {
        let close = self.ops()?.common.close;
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(Errno::ENODEV);
        }
        let Some(close) = close else {
            return Ok(());
        };
        // SAFETY: The device is open, and `closed` keeps every later call away from it.
        Self::check(unsafe { close(self.raw().cast::<HwDevice>()) })
    }
}

impl Drop for PollDevice<'_> {
    fn drop(&mut self) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if let Err(errno) = self.close() {
            warn!("closing the poll device failed: {}", errno);
        }
    }
}
