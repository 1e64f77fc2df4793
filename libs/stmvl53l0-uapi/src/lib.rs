// SPDX-License-Identifier: MPL-2.0

//! The user-space view of the `stmvl53l0` ranging driver.
//!
//! The driver is reached through [`DEVICE_PATH`] and speaks a small set of
//! `ioctl` commands (see [`defs`]) whose payloads are fixed-layout C records
//! (see [`types`]). The records here reproduce the driver's layout bit for bit;
//! any change to field order or width breaks the ABI.
//!
//! Commands are issued through the [`Device`] trait. [`DeviceFile`] talks to
//! the real character device; with the `mock` feature enabled,
//! [`mock::MockDevice`] records the traffic instead.

pub mod defs;
mod device;
pub mod error;
pub mod ioctl;
#[cfg(feature = "mock")]
pub mod mock;
pub mod types;

pub use self::{
    device::{DEVICE_PATH, Device, DeviceFile},
    error::{Errno, Error, Result},
};
