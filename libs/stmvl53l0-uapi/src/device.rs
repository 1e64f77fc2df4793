// SPDX-License-Identifier: MPL-2.0

use std::{
    ffi::c_void,
    fs::{File, OpenOptions},
    os::{fd::AsRawFd, unix::fs::OpenOptionsExt},
    path::Path,
    ptr,
};

use log::{debug, warn};
use nix::{fcntl::OFlag, libc, sys::ioctl::ioctl_num_type};

use crate::{
    defs::{GetRangingData, Parameter},
    error::{Errno, Error, Result},
    ioctl::IoctlCmd,
    types::{ParameterAccess, ParameterName, RangingMeasurement},
};

/// The character device created by the driver.
pub const DEVICE_PATH: &str = "/dev/stmvl53l0_ranging";

/// Something that accepts the driver's `ioctl` commands.
///
/// Implementations must tolerate commands issued concurrently from several
/// threads, as the kernel does for a shared file descriptor.
pub trait Device: Sync {
    /// Issues `C` with `data` as its argument.
    ///
    /// The driver may update `data` in place for commands that read back.
    fn ioctl<C: IoctlCmd>(&self, data: &mut C::Data) -> Result<()>;

    /// Reads a driver parameter.
    fn get_parameter(&self, name: ParameterName) -> Result<ParameterAccess> {
        let mut param = ParameterAccess::get(name);
        self.ioctl::<Parameter>(&mut param)?;
        if param.status != 0 {
            warn!("get {:?} reported status {}", name, param.status);
        }
        Ok(param)
    }

    /// Writes a driver parameter.
    fn set_parameter(&self, name: ParameterName, value: i32) -> Result<()> {
        let mut param = ParameterAccess::set(name, value);
        self.ioctl::<Parameter>(&mut param)?;
        if param.status != 0 {
            warn!(
                "set {:?} = {} reported status {}",
                name, value, param.status
            );
        }
        Ok(())
    }

    /// Fetches the latest ranging measurement.
    fn ranging_data(&self) -> Result<RangingMeasurement> {
        let mut data = RangingMeasurement::default();
        self.ioctl::<GetRangingData>(&mut data)?;
        Ok(data)
    }
}

/// The opened driver node. The file is closed on drop.
#[derive(Debug)]
pub struct DeviceFile {
    file: File,
}

impl DeviceFile {
    /// Opens the node for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_flags(path.as_ref(), OFlag::empty())
    }

    /// Opens the node for reading and writing with `O_SYNC`.
    pub fn open_sync(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_flags(path.as_ref(), OFlag::O_SYNC)
    }

    fn open_with_flags(path: &Path, flags: OFlag) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(flags.bits())
            .open(path)?;
        debug!("opened {}", path.display());
        Ok(Self { file })
    }
}

impl Device for DeviceFile {
    fn ioctl<C: IoctlCmd>(&self, data: &mut C::Data) -> Result<()> {
        debug!("ioctl {} ({:#010x})", C::NAME, C::CMD);

        let arg: *mut c_void = if size_of::<C::Data>() == 0 {
            ptr::null_mut()
        } else {
            ptr::from_mut(data).cast()
        };

        // SAFETY: `arg` is either null for commands without payload or points to
        // a live, exclusively borrowed record whose size is the one encoded in
        // `C::CMD`, so the driver never touches memory outside of it.
        let ret = unsafe { libc::ioctl(self.file.as_raw_fd(), C::CMD as ioctl_num_type, arg) };

        Errno::result(ret)
            .map(drop)
            .map_err(|errno| Error::ioctl_failed(errno, C::NAME))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::defs::Stop;

    #[test]
    fn missing_node_reports_enoent() {
        let error = DeviceFile::open("/nonexistent/stmvl53l0_ranging").unwrap_err();
        assert_eq!(error.error(), Errno::ENOENT);
    }

    #[test]
    fn non_driver_file_rejects_commands() {
        let device = DeviceFile::open("/dev/null").unwrap();
        let error = device.ioctl::<Stop>(&mut ()).unwrap_err();
        assert_eq!(error.ioctl_name(), Some("VL53L0_IOCTL_STOP"));
        assert_eq!(error.error(), Errno::ENOTTY);
    }
}
