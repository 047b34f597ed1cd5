//! Status word reported by [`Gateway::open`](crate::Gateway::open).
//!
//! Each bit signals one condition, and several can be set at once: a failed
//! open caused by a name collision reports `FAILURE | SERVER_ERROR |
//! NAME_NOT_UNIQUE`. Bits reported by the engine are passed through as-is.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::ops::{BitOr, BitOrAssign};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Status(u32);

impl Status {
    /// Overall operation failed.
    pub const FAILURE: Status = Status(0x01);
    /// The option mask contained an unrecognized bit.
    pub const INVALID_OPTION: Status = Status(0x02);
    /// The requested name was taken; set on rename as well as on rejection.
    pub const NAME_NOT_UNIQUE: Status = Status(0x04);
    pub const SERVER_STARTED: Status = Status(0x08);
    /// No server could be reached.
    pub const SERVER_FAILED: Status = Status(0x10);
    /// Communication with the server failed.
    pub const SERVER_ERROR: Status = Status(0x20);
    pub const NO_SUCH_CLIENT: Status = Status(0x40);
    pub const LOAD_FAILURE: Status = Status(0x80);
    pub const INIT_FAILURE: Status = Status(0x100);
    pub const SHM_FAILURE: Status = Status(0x200);
    /// Client and engine protocol versions differ.
    pub const VERSION_ERROR: Status = Status(0x400);
    pub const BACKEND_ERROR: Status = Status(0x800);
    pub const CLIENT_ZOMBIE: Status = Status(0x1000);
    /// The engine refused the client name.
    pub const INVALID_NAME: Status = Status(0x2000);

    const NAMES: [(Status, &'static str); 14] = [
        (Status::FAILURE, "FAILURE"),
        (Status::INVALID_OPTION, "INVALID_OPTION"),
        (Status::NAME_NOT_UNIQUE, "NAME_NOT_UNIQUE"),
        (Status::SERVER_STARTED, "SERVER_STARTED"),
        (Status::SERVER_FAILED, "SERVER_FAILED"),
        (Status::SERVER_ERROR, "SERVER_ERROR"),
        (Status::NO_SUCH_CLIENT, "NO_SUCH_CLIENT"),
        (Status::LOAD_FAILURE, "LOAD_FAILURE"),
        (Status::INIT_FAILURE, "INIT_FAILURE"),
        (Status::SHM_FAILURE, "SHM_FAILURE"),
        (Status::VERSION_ERROR, "VERSION_ERROR"),
        (Status::BACKEND_ERROR, "BACKEND_ERROR"),
        (Status::CLIENT_ZOMBIE, "CLIENT_ZOMBIE"),
        (Status::INVALID_NAME, "INVALID_NAME"),
    ];

    pub const fn empty() -> Self {
        Status(0)
    }

    /// Wraps raw bits, keeping bits this crate has no name for.
    pub const fn from_bits_retain(bits: u32) -> Self {
        Status(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Status) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_failure(self) -> bool {
        self.contains(Status::FAILURE)
    }

    pub fn insert(&mut self, other: Status) {
        self.0 |= other.0;
    }

    /// Names of the set bits, in bit order.
    pub fn names(self) -> Vec<&'static str> {
        Self::NAMES
            .iter()
            .filter(|(flag, _)| self.contains(*flag))
            .map(|(_, name)| *name)
            .collect()
    }
}

impl BitOr for Status {
    type Output = Status;

    fn bitor(self, rhs: Status) -> Status {
        Status(self.0 | rhs.0)
    }
}

impl BitOrAssign for Status {
    fn bitor_assign(&mut self, rhs: Status) {
        self.0 |= rhs.0;
    }
}

impl From<Status> for u32 {
    fn from(status: Status) -> Self {
        status.0
    }
}

impl Display for Status {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        if self.is_empty() {
            return write!(f, "OK");
        }

        let known = Self::NAMES
            .iter()
            .fold(0u32, |acc, (flag, _)| acc | flag.0);
        let mut names = self.names().join("|");

        let unknown = self.0 & !known;
        if unknown != 0 {
            if !names.is_empty() {
                names.push('|');
            }
            names.push_str(&format!("{unknown:#x}"));
        }

        write!(f, "{names}")
    }
}
