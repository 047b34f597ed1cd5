//! Client proxies and the factory that builds them.
//!
//! A proxy is what a [`ClientHandle`](crate::ClientHandle) owns. The direct
//! variant ([`internal::InternalClient`]) registers with the server instance;
//! the debug variant ([`debug::DebugClient`]) wraps any proxy with tracing and
//! call-sequence checks. Both are used through [`ClientProxy`], so the gateway
//! cannot tell them apart.

pub mod debug;
pub mod internal;

use crate::engine::ServerInstance;
use crate::error::client::ClientError;
use crate::name::ClientName;
use crate::options::ResolvedOpen;
use crate::status::Status;

use std::sync::Arc;

use debug::DebugClient;
use internal::InternalClient;
use log::trace;

pub trait ClientProxy: Send {
    /// Attach to the server. Engine-reported conditions are OR-ed into `status`.
    fn open(
        &mut self,
        request: &ResolvedOpen,
        name: &ClientName,
        status: &mut Status,
    ) -> Result<(), ClientError>;

    /// Detach from the server.
    fn close(&mut self) -> Result<(), ClientError>;

    /// Name registered with the engine, once open.
    fn name(&self) -> Option<&str>;
}

#[derive(Debug, Clone, Copy)]
pub struct ClientFactory {
    debug: bool,
}

impl ClientFactory {
    /// `debug` is OR-ed with the `debug-client` cargo feature.
    pub fn new(debug: bool) -> Self {
        Self {
            debug: debug || cfg!(feature = "debug-client"),
        }
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn create(&self, server: Option<Arc<dyn ServerInstance>>) -> Box<dyn ClientProxy> {
        let client = InternalClient::new(server);

        if self.debug {
            trace!("Building debug client proxy");
            Box::new(DebugClient::new(client))
        } else {
            Box::new(client)
        }
    }
}
