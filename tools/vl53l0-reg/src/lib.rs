// SPDX-License-Identifier: MPL-2.0

//! Reads or writes one VL53L0 register through the `stmvl53l0` driver.
//!
//! Two positional arguments request a read, three request a write. The
//! arguments are validated before the device is opened.

use std::{fmt, path::PathBuf};

use clap::Parser;
use log::debug;
use stmvl53l0_uapi::{
    DEVICE_PATH, Device, Result,
    defs::Register,
    types::{RegisterAccess, RegisterWidth},
};

#[derive(Debug, Parser)]
#[command(
    name = "vl53l0_reg",
    version,
    about = "Read or write a VL53L0 register",
    after_help = "Omit REG_DATA to read the register."
)]
pub struct Cli {
    #[arg(long, value_name = "PATH", default_value = DEVICE_PATH, help = "The driver node")]
    pub device: PathBuf,
    #[arg(
        value_name = "REG_ADDR",
        value_parser = parse_hex,
        help = "The register address in hex, e.g. 0xc0"
    )]
    pub address: u32,
    #[arg(
        value_name = "REG_BYTES",
        value_parser = parse_width,
        help = "The register width in bytes: 1, 2 or 4"
    )]
    pub width: RegisterWidth,
    #[arg(
        value_name = "REG_DATA",
        value_parser = parse_hex,
        help = "The value to write in hex"
    )]
    pub value: Option<u32>,
}

impl Cli {
    /// Builds the request described by the arguments.
    pub fn request(&self) -> RegisterAccess {
        match self.value {
            None => RegisterAccess::read(self.address, self.width),
            Some(value) => RegisterAccess::write(self.address, self.width, value),
        }
    }
}

/// Parses a hexadecimal number, with or without a `0x` prefix.
pub fn parse_hex(arg: &str) -> core::result::Result<u32, String> {
    let digits = arg
        .strip_prefix("0x")
        .or_else(|| arg.strip_prefix("0X"))
        .unwrap_or(arg);
    u32::from_str_radix(digits, 16).map_err(|e| format!("`{arg}` is not a hex number: {e}"))
}

fn parse_width(arg: &str) -> core::result::Result<RegisterWidth, String> {
    let bytes: u32 = arg
        .parse()
        .map_err(|e| format!("`{arg}` is not a decimal number: {e}"))?;
    RegisterWidth::try_from(bytes)
        .map_err(|_| format!("register width must be 1, 2 or 4, not {bytes}"))
}

/// Describes a request the way the tool announces it.
pub struct Announcement<'a>(pub &'a RegisterAccess);

impl fmt::Display for Announcement<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let access = self.0;
        if access.is_read() {
            write!(
                f,
                "To read VL53L0 register index:0x{:x}, bytes:{}",
                access.reg_index, access.reg_bytes
            )
        } else {
            write!(
                f,
                "To write VL53L0 register index:0x{:x}, bytes:{} as value:0x{:x}",
                access.reg_index, access.reg_bytes, access.reg_data
            )
        }
    }
}

/// Issues `request` and returns the record as updated by the driver.
pub fn access_register<D: Device>(device: &D, request: RegisterAccess) -> Result<RegisterAccess> {
    let mut access = request;
    device.ioctl::<Register>(&mut access)?;
    debug!("register reply: {:?}", access);
    Ok(access)
}

#[cfg(test)]
mod test {
    use stmvl53l0_uapi::{Errno, Error, ioctl::IoctlCmd, mock::MockDevice};
    use zerocopy::{FromBytes, IntoBytes};

    use super::*;

    fn parse(args: &[&str]) -> core::result::Result<Cli, clap::Error> {
        Cli::try_parse_from(std::iter::once("vl53l0_reg").chain(args.iter().copied()))
    }

    #[test]
    fn hex_accepts_optional_prefix() {
        assert_eq!(parse_hex("0xc0"), Ok(0xc0));
        assert_eq!(parse_hex("0XC0"), Ok(0xc0));
        assert_eq!(parse_hex("c0"), Ok(0xc0));
        assert!(parse_hex("0xzz").is_err());
        assert!(parse_hex("").is_err());
    }

    #[test]
    fn rejects_bad_width_and_address() {
        assert!(parse(&["0xc0", "3"]).is_err());
        assert!(parse(&["0xc0", "0x2"]).is_err());
        assert!(parse(&["g0", "1"]).is_err());
        assert!(parse(&["0xc0"]).is_err());
        assert!(parse(&["0xc0", "1", "0x1", "extra"]).is_err());
    }

    #[test]
    fn two_arguments_request_a_read() {
        let cli = parse(&["0xc0", "1"]).unwrap();
        let request = cli.request();
        assert!(request.is_read());
        assert_eq!(request.reg_index, 0xc0);
        assert_eq!(request.reg_bytes, 1);
        assert_eq!(
            Announcement(&request).to_string(),
            "To read VL53L0 register index:0xc0, bytes:1"
        );
    }

    #[test]
    fn three_arguments_request_a_write() {
        let cli = parse(&["0x8a", "2", "0x29"]).unwrap();
        let request = cli.request();
        assert!(!request.is_read());
        assert_eq!(request.reg_data, 0x29);
        assert_eq!(
            Announcement(&request).to_string(),
            "To write VL53L0 register index:0x8a, bytes:2 as value:0x29"
        );
    }

    #[test]
    fn read_issues_exactly_one_ioctl() {
        let device = MockDevice::with_responder(|_, bytes| {
            let mut access = RegisterAccess::read_from_bytes(bytes).unwrap();
            access.reg_data = 0xee;
            bytes.copy_from_slice(access.as_bytes());
            Ok(())
        });

        let reply =
            access_register(&device, RegisterAccess::read(0xc0, RegisterWidth::Byte)).unwrap();

        let calls = device.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].cmd, Register::CMD);
        assert!(calls[0].decode::<RegisterAccess>().unwrap().is_read());
        assert_eq!(reply.reg_data, 0xee);
    }

    #[test]
    fn write_issues_exactly_one_ioctl_with_the_value() {
        let device = MockDevice::new();
        let cli = parse(&["0x8a", "4", "deadbeef"]).unwrap();

        access_register(&device, cli.request()).unwrap();

        let calls = device.calls();
        assert_eq!(calls.len(), 1);
        let sent = calls[0].decode::<RegisterAccess>().unwrap();
        assert_eq!(sent.is_read, 0);
        assert_eq!(sent.reg_index, 0x8a);
        assert_eq!(sent.reg_bytes, 4);
        assert_eq!(sent.reg_data, 0xdead_beef);
    }

    #[test]
    fn driver_failure_is_reported() {
        let device =
            MockDevice::with_responder(|call, _| Err(Error::ioctl_failed(Errno::EIO, call.name)));
        let error =
            access_register(&device, RegisterAccess::read(0, RegisterWidth::Byte)).unwrap_err();
        assert_eq!(error.ioctl_name(), Some("VL53L0_IOCTL_REGISTER"));
    }
}
