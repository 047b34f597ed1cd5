//! Open options and the resolution of optional open arguments.

use std::fmt::{Display, Formatter, Result as FormatResult};
use std::ops::BitOr;

use log::debug;
use serde::Serialize;

/// Option mask passed to [`Gateway::open`](crate::Gateway::open).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct OpenOptions(u32);

impl OpenOptions {
    pub const NONE: OpenOptions = OpenOptions(0);
    /// Never start a server; attach only to one that is already running.
    pub const NO_START_SERVER: OpenOptions = OpenOptions(0x01);
    /// Fail instead of renaming when the name is taken.
    pub const USE_EXACT_NAME: OpenOptions = OpenOptions(0x02);
    /// [`OpenArgs::server_name`] is meaningful.
    pub const SERVER_NAME: OpenOptions = OpenOptions(0x04);
    /// [`OpenArgs::session_id`] is meaningful.
    pub const SESSION_ID: OpenOptions = OpenOptions(0x20);

    /// Every bit `open` accepts. Load-name (0x08) and load-init (0x10) are
    /// internal-client options and are rejected here.
    pub const RECOGNIZED: OpenOptions = OpenOptions(0x01 | 0x02 | 0x04 | 0x20);

    pub const fn from_bits_retain(bits: u32) -> Self {
        OpenOptions(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: OpenOptions) -> bool {
        self.0 & other.0 == other.0
    }

    /// Bits outside [`OpenOptions::RECOGNIZED`].
    pub const fn unrecognized_bits(self) -> u32 {
        self.0 & !Self::RECOGNIZED.0
    }

    pub const fn is_recognized(self) -> bool {
        self.unrecognized_bits() == 0
    }
}

impl BitOr for OpenOptions {
    type Output = OpenOptions;

    fn bitor(self, rhs: OpenOptions) -> OpenOptions {
        OpenOptions(self.0 | rhs.0)
    }
}

impl Display for OpenOptions {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "{:#x}", self.0)
    }
}

/// Optional arguments accompanying an open.
///
/// A field is read only when the matching option bit is set:
/// [`OpenOptions::SERVER_NAME`] for `server_name` and
/// [`OpenOptions::SESSION_ID`] for `session_id`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenArgs {
    pub server_name: Option<String>,
    pub session_id: Option<String>,
}

impl OpenArgs {
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = Some(name.into());
        self
    }

    pub fn with_session_id(mut self, id: impl Into<String>) -> Self {
        self.session_id = Some(id.into());
        self
    }
}

/// Configuration an open runs with once options and arguments are combined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedOpen {
    pub server_name: String,
    pub session_id: Option<String>,
    pub options: OpenOptions,
}

impl ResolvedOpen {
    /// Whether this open may start a server, and so takes a server reference.
    pub fn auto_start(&self) -> bool {
        !self.options.contains(OpenOptions::NO_START_SERVER)
    }
}

/// Resolve `options` and `args` into the configuration of one open.
///
/// Missing arguments, arguments whose flag is not set, and an empty server
/// name all fall back to `default_server_name` and no session id. The mask
/// itself is not validated here.
pub fn resolve(
    options: OpenOptions,
    args: Option<&OpenArgs>,
    default_server_name: &str,
) -> ResolvedOpen {
    let Some(args) = args else {
        return ResolvedOpen {
            server_name: default_server_name.to_string(),
            session_id: None,
            options,
        };
    };

    let server_name = if options.contains(OpenOptions::SERVER_NAME) {
        args.server_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| {
                debug!("Server name flag set without a name, using {default_server_name}");
                default_server_name
            })
    } else {
        default_server_name
    };

    let session_id = if options.contains(OpenOptions::SESSION_ID) {
        args.session_id.clone()
    } else {
        None
    };

    ResolvedOpen {
        server_name: server_name.to_string(),
        session_id,
        options,
    }
}
