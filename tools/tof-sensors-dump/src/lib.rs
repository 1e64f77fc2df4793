// SPDX-License-Identifier: MPL-2.0

//! Dumps the events of the time-of-flight sensors exposed by an Android
//! sensors HAL module.
//!
//! The module is loaded with [`module::HalModule`]; everything else talks to
//! the HAL through the [`dumper::SensorsHal`] trait.

pub mod cli;
pub mod dumper;
pub mod hal;
pub mod module;
