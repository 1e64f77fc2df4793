// SPDX-License-Identifier: MPL-2.0

//! Typed `ioctl` commands.
//!
//! Every command is a zero-sized type implementing [`IoctlCmd`]. Its request
//! number is derived from the direction, the type (magic), the command number
//! and the payload size, following the generic Linux `_IOC` encoding, so the
//! payload record and the request number can never disagree.
//!
//! Commands are declared with [`ioc!`](crate::ioc):
//!
//! ```
//! use stmvl53l0_uapi::{ioc, ioctl::{IoctlCmd, IoctlDir}};
//!
//! ioc! {
//!     /// Reads a counter.
//!     pub struct GetCounter = EXAMPLE_GET_COUNTER, b'x', 0x01, OutData<u32>;
//! }
//!
//! assert_eq!(GetCounter::DIR, IoctlDir::Read);
//! assert_eq!(GetCounter::CMD, 0x8004_7801);
//! ```

// Reference: <https://elixir.bootlin.com/linux/v6.18/source/include/uapi/asm-generic/ioctl.h>

use zerocopy::{FromBytes, Immutable, IntoBytes};

const NR_BITS: u32 = 8;
const TYPE_BITS: u32 = 8;
const SIZE_BITS: u32 = 14;

const NR_SHIFT: u32 = 0;
const TYPE_SHIFT: u32 = NR_SHIFT + NR_BITS;
const SIZE_SHIFT: u32 = TYPE_SHIFT + TYPE_BITS;
const DIR_SHIFT: u32 = SIZE_SHIFT + SIZE_BITS;

/// The direction of the data transfer, seen from user space.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoctlDir {
    /// `_IO`: no payload.
    None = 0,
    /// `_IOW`: user space writes the payload.
    Write = 1,
    /// `_IOR`: user space reads the payload.
    Read = 2,
    /// `_IOWR`: the payload travels both ways.
    ReadWrite = 3,
}

/// Encodes a request number; `_IOC` in C.
pub const fn encode(dir: IoctlDir, ty: u8, nr: u8, size: usize) -> u32 {
    assert!(
        size < (1 << SIZE_BITS),
        "ioctl payload does not fit the size field"
    );

    ((dir as u32) << DIR_SHIFT)
        | ((size as u32) << SIZE_SHIFT)
        | ((ty as u32) << TYPE_SHIFT)
        | ((nr as u32) << NR_SHIFT)
}

/// An `ioctl` command.
pub trait IoctlCmd {
    /// The name of the C macro defining the command.
    const NAME: &'static str;
    const DIR: IoctlDir;
    const TYPE: u8;
    const NR: u8;

    /// The record exchanged with the driver, `()` for commands without payload.
    type Data: FromBytes + IntoBytes + Immutable;

    /// The encoded request number.
    const CMD: u32 = encode(Self::DIR, Self::TYPE, Self::NR, size_of::<Self::Data>());
}

/// Declares `ioctl` commands.
///
/// Each entry reads `NAME = C_MACRO, TYPE, NR, KIND;` where `KIND` is one of
/// `NoData`, `InData<T>`, `OutData<T>` or `InOutData<T>`.
#[macro_export]
macro_rules! ioc {
    (@dir NoData) => { $crate::ioctl::IoctlDir::None };
    (@dir InData) => { $crate::ioctl::IoctlDir::Write };
    (@dir OutData) => { $crate::ioctl::IoctlDir::Read };
    (@dir InOutData) => { $crate::ioctl::IoctlDir::ReadWrite };

    (@data NoData) => { () };
    (@data $kind:ident <$data:ty>) => { $data };

    () => {};
    (
        $(#[$meta:meta])*
        $vis:vis struct $ty:ident = $name:ident, $magic:expr, $nr:expr, $kind:ident $(<$data:ty>)?;
        $($rest:tt)*
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy)]
        $vis struct $ty;

        impl $crate::ioctl::IoctlCmd for $ty {
            const NAME: &'static str = stringify!($name);
            const DIR: $crate::ioctl::IoctlDir = $crate::ioc!(@dir $kind);
            const TYPE: u8 = $magic;
            const NR: u8 = $nr;
            type Data = $crate::ioc!(@data $kind $(<$data>)?);
        }

        $crate::ioc!($($rest)*);
    };
}
