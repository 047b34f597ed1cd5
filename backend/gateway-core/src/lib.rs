pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod gateway;
pub mod name;
pub mod options;
pub mod server;
pub mod status;

#[cfg(test)]
mod tests;

pub use gateway::{ClientHandle, Gateway, client_close, client_open, get_client_pid};
pub use name::ClientName;
pub use options::{OpenArgs, OpenOptions, ResolvedOpen};
pub use status::Status;

/// Version of the client/engine handshake spoken by [`client::internal::InternalClient`].
pub const PROTOCOL_VERSION: u32 = 8;

/// Server name used when a caller does not supply one.
pub const DEFAULT_SERVER_NAME: &str = "default";

/// Maximum length of a server name, in bytes.
pub const SERVER_NAME_SIZE: usize = 256;

/// Prefix shared by every environment variable the gateway reads.
pub const ENV_PREFIX: &str = "AUDIOGATE_";

/// Close code returned for a missing handle or a failed proxy close.
pub const CLOSE_FAILED: i32 = -1;

pub(crate) const ENV_DEFAULT_SERVER: &str = const_format::concatcp!(ENV_PREFIX, "DEFAULT_SERVER");
pub(crate) const ENV_NO_START_SERVER: &str =
    const_format::concatcp!(ENV_PREFIX, "NO_START_SERVER");
pub(crate) const ENV_DEBUG_CLIENTS: &str = const_format::concatcp!(ENV_PREFIX, "DEBUG_CLIENTS");
pub(crate) const ENV_START_TIMEOUT_MS: &str =
    const_format::concatcp!(ENV_PREFIX, "START_TIMEOUT_MS");
