// SPDX-License-Identifier: MPL-2.0

use core::fmt;

pub use nix::errno::Errno;

/// Error used in this crate and by the tools built on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Error {
    errno: Errno,
    context: Context,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Context {
    None,
    Message(&'static str),
    Ioctl(&'static str),
}

pub type Result<T> = core::result::Result<T, Error>;

impl Error {
    pub const fn new(errno: Errno) -> Self {
        Error {
            errno,
            context: Context::None,
        }
    }

    pub const fn with_message(errno: Errno, msg: &'static str) -> Self {
        Error {
            errno,
            context: Context::Message(msg),
        }
    }

    /// Creates an error for a failed `ioctl` command, named by its C macro.
    pub const fn ioctl_failed(errno: Errno, cmd_name: &'static str) -> Self {
        Error {
            errno,
            context: Context::Ioctl(cmd_name),
        }
    }

    pub const fn error(&self) -> Errno {
        self.errno
    }

    /// Returns the name of the failed `ioctl` command, if the error came from one.
    pub const fn ioctl_name(&self) -> Option<&'static str> {
        match self.context {
            Context::Ioctl(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.context {
            Context::None => write!(f, "{}", self.errno.desc()),
            Context::Message(msg) => write!(f, "{}: {}", msg, self.errno.desc()),
            Context::Ioctl(name) => {
                write!(f, "Could not perform {} : {}", name, self.errno.desc())
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<Errno> for Error {
    fn from(errno: Errno) -> Self {
        Error::new(errno)
    }
}

impl From<std::io::Error> for Error {
    fn from(io_error: std::io::Error) -> Self {
        match io_error.raw_os_error() {
            Some(raw) => Error::new(Errno::from_i32(raw)),
            None => Error::with_message(Errno::EIO, "I/O error without OS error code"),
        }
    }
}

impl From<int_to_c_enum::TryFromIntError> for Error {
    fn from(_: int_to_c_enum::TryFromIntError) -> Self {
        Error::with_message(Errno::EINVAL, "Invalid enum value")
    }
}

#[macro_export]
macro_rules! return_errno {
    ($errno: expr) => {
        return Err($crate::error::Error::new($errno))
    };
}

#[macro_export]
macro_rules! return_errno_with_message {
    ($errno: expr, $message: expr) => {
        return Err($crate::error::Error::with_message($errno, $message))
    };
}
