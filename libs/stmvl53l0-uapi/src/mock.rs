// SPDX-License-Identifier: MPL-2.0

//! A recording stand-in for the driver.
//!
//! [`MockDevice`] remembers every command it receives together with the bytes
//! of its argument, and lets a responder closure fill in what the driver would
//! have returned.

use std::sync::{Mutex, PoisonError};

use zerocopy::{FromBytes, IntoBytes};

use crate::{device::Device, error::Result, ioctl::IoctlCmd};

/// One command received by a [`MockDevice`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub name: &'static str,
    pub cmd: u32,
    /// The argument as passed in, before the responder ran.
    pub input: Vec<u8>,
}

impl Call {
    /// Decodes the argument as `T`, if the sizes agree.
    pub fn decode<T: FromBytes>(&self) -> Option<T> {
        T::read_from_bytes(&self.input).ok()
    }
}

type Responder = Box<dyn FnMut(&Call, &mut [u8]) -> Result<()> + Send>;

pub struct MockDevice {
    calls: Mutex<Vec<Call>>,
    responder: Mutex<Responder>,
}

impl MockDevice {
    /// Creates a device on which every command succeeds and leaves its argument untouched.
    pub fn new() -> Self {
        Self::with_responder(|_, _| Ok(()))
    }

    /// Creates a device answering with `responder`.
    ///
    /// The responder sees the call and the argument bytes, which it may rewrite
    /// to play the driver's part; its result is returned to the caller.
    pub fn with_responder<F>(responder: F) -> Self
    where
        F: FnMut(&Call, &mut [u8]) -> Result<()> + Send + 'static,
    {
        Self {
            calls: Mutex::new(Vec::new()),
            responder: Mutex::new(Box::new(responder)),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns the names of the received commands, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.calls().iter().map(|call| call.name).collect()
    }

    /// Counts the received commands of type `C`.
    pub fn count<C: IoctlCmd>(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.cmd == C::CMD)
            .count()
    }
}

impl Default for MockDevice {
    fn default() -> Self {
        Self::new()
    }
}

impl Device for MockDevice {
    fn ioctl<C: IoctlCmd>(&self, data: &mut C::Data) -> Result<()> {
        let call = Call {
            name: C::NAME,
            cmd: C::CMD,
            input: data.as_bytes().to_vec(),
        };

        let result = {
            let mut responder = self
                .responder
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            responder(&call, data.as_mut_bytes())
        };

        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        result
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        defs::{Parameter, Stop},
        error::{Errno, Error},
        types::{ParameterAccess, ParameterName},
    };

    #[test]
    fn records_calls_in_order() {
        let device = MockDevice::new();
        device.ioctl::<Stop>(&mut ()).unwrap();
        device.set_parameter(ParameterName::DeviceMode, 1).unwrap();

        assert_eq!(
            device.names(),
            ["VL53L0_IOCTL_STOP", "VL53L0_IOCTL_PARAMETER"]
        );
        let param = device.calls()[1].decode::<ParameterAccess>().unwrap();
        assert_eq!(param.name(), Ok(ParameterName::DeviceMode));
        assert_eq!(param.value, 1);
        assert_eq!(device.count::<Parameter>(), 1);
    }

    #[test]
    fn responder_plays_the_driver() {
        let device = MockDevice::with_responder(|call, bytes| {
            if call.cmd == Parameter::CMD {
                let mut param = ParameterAccess::read_from_bytes(bytes).unwrap();
                param.value = 600;
                bytes.copy_from_slice(param.as_bytes());
            }
            Ok(())
        });

        let param = device.get_parameter(ParameterName::XtalkRate).unwrap();
        assert_eq!(param.value, 600);
    }

    #[test]
    fn responder_errors_reach_the_caller() {
        let device =
            MockDevice::with_responder(|call, _| Err(Error::ioctl_failed(Errno::EIO, call.name)));
        let error = device.ioctl::<Stop>(&mut ()).unwrap_err();
        assert_eq!(error.error(), Errno::EIO);
        assert_eq!(device.count::<Stop>(), 1);
    }
}
