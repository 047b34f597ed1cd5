//! Boundary between the gateway and the audio engine.
//!
//! The gateway never schedules audio or moves samples. It needs three things
//! from an engine:
//! - a way to start a process-resident server ([`ServerBackend`])
//! - per-server client registration and pid lookup ([`ServerInstance`])
//! - a stop hook for when the last server reference is released
//!
//! [`loopback`] provides an in-memory engine implementing both traits.

pub mod loopback;

use crate::error::engine::EngineError;
use crate::options::OpenOptions;
use crate::status::Status;

use std::sync::Arc;

/// Everything an engine needs to admit one client.
#[derive(Debug, Clone)]
pub struct ClientRequest<'a> {
    pub server_name: &'a str,
    pub name: &'a str,
    pub options: OpenOptions,
    pub session_id: Option<&'a str>,
    pub pid: u32,
    pub protocol_version: u32,
}

/// Result of a successful registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub refnum: u32,
    /// Name the engine actually registered, which differs from the requested
    /// one after a rename.
    pub name: String,
    pub uuid: String,
    /// Informational bits, e.g. [`Status::NAME_NOT_UNIQUE`] after a rename.
    pub status: Status,
}

/// A running server.
///
/// Implementations are shared between threads: `client_pid` may run
/// concurrently with registration and must synchronize internally.
pub trait ServerInstance: Send + Sync {
    fn server_name(&self) -> &str;

    /// Whether the server has finished starting and accepts clients.
    fn is_ready(&self) -> bool;

    fn register_client(&self, request: &ClientRequest<'_>) -> Result<Registration, EngineError>;

    fn unregister_client(&self, refnum: u32) -> Result<(), EngineError>;

    /// Pid of the process owning the client registered as `name`, or 0.
    fn client_pid(&self, name: &str) -> u32;

    fn stop(&self);
}

/// Starts server instances.
pub trait ServerBackend: Send + Sync {
    fn start(&self, server_name: &str) -> Result<Arc<dyn ServerInstance>, EngineError>;
}
