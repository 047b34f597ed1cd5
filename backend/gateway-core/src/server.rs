//! Reference-counted ownership of the process-resident server.
//!
//! The count covers only handles that asked for auto-start and attached. The
//! server exists exactly while the count is positive: 0 → 1 starts it, 1 → 0
//! stops it.
//!
//! The manager has no lock of its own. The gateway keeps it behind its
//! open/close mutex, so every method here runs serialized. The live instance
//! is also published in a shared slot that pid queries read without taking
//! that mutex.

use crate::engine::{ServerBackend, ServerInstance};
use crate::error::server::ServerError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::sleep;
use std::time::Duration;

use backoff::{ExponentialBackoff, backoff::Backoff};
use log::{debug, info, trace, warn};

/// Slot holding the live server, readable without the gateway mutex.
pub type PublishedServer = Arc<RwLock<Option<Arc<dyn ServerInstance>>>>;

const READY_POLL_INITIAL_INTERVAL: Duration = Duration::from_millis(5);
const READY_POLL_MAX_INTERVAL: Duration = Duration::from_millis(250);

pub struct ServerLifecycleManager {
    backend: Arc<dyn ServerBackend>,
    ref_count: usize,
    published: PublishedServer,
    start_timeout: Duration,
}

impl ServerLifecycleManager {
    pub fn new(backend: Arc<dyn ServerBackend>, start_timeout: Duration) -> Self {
        Self {
            backend,
            ref_count: 0,
            published: Arc::new(RwLock::new(None)),
            start_timeout,
        }
    }

    pub fn ref_count(&self) -> usize {
        self.ref_count
    }

    /// The live server, if any.
    pub fn current(&self) -> Option<Arc<dyn ServerInstance>> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Slot read by pid queries outside the gateway mutex.
    pub fn published(&self) -> PublishedServer {
        Arc::clone(&self.published)
    }

    /// Take a server reference, starting the server if none is live.
    ///
    /// On error the count is unchanged and no server is left running.
    pub fn attach_or_start(&mut self, server_name: &str) -> Result<(), ServerError> {
        if let Some(server) = self.current() {
            if server.server_name() != server_name {
                debug!(
                    "Attaching '{server_name}' request to running server '{}'",
                    server.server_name()
                );
            }
            self.ref_count += 1;
            trace!("Server reference taken, count = {}", self.ref_count);
            return Ok(());
        }

        info!("Starting server '{server_name}'");

        let server = self
            .backend
            .start(server_name)
            .map_err(|e| ServerError::Start {
                message: format!("Failed to start server '{server_name}': {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })?;

        if let Err(e) = self.wait_for_ready(server.as_ref()) {
            warn!("Server '{server_name}' never became ready, stopping it");
            server.stop();
            return Err(e);
        }

        *self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(server);
        self.ref_count = 1;

        info!("Server '{server_name}' running");
        Ok(())
    }

    /// Drop a server reference, stopping the server on the last one.
    pub fn release(&mut self) {
        if self.ref_count == 0 {
            warn!("Server release requested with no outstanding references");
            return;
        }

        self.ref_count -= 1;
        trace!("Server reference released, count = {}", self.ref_count);

        if self.ref_count > 0 {
            return;
        }

        let server = self
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        if let Some(server) = server {
            info!("Stopping server '{}'", server.server_name());
            server.stop();
        }
    }

    fn wait_for_ready(&self, server: &dyn ServerInstance) -> Result<(), ServerError> {
        let mut backoff = ExponentialBackoff {
            current_interval: READY_POLL_INITIAL_INTERVAL,
            initial_interval: READY_POLL_INITIAL_INTERVAL,
            max_interval: READY_POLL_MAX_INTERVAL,
            max_elapsed_time: Some(self.start_timeout),
            ..Default::default()
        };

        loop {
            if server.is_ready() {
                debug!("Server '{}' is ready", server.server_name());
                return Ok(());
            }

            match backoff.next_backoff() {
                Some(duration) => {
                    trace!("Server not ready, retrying after {duration:?}");
                    sleep(duration);
                }
                None => {
                    return Err(ServerError::Timeout {
                        message: format!(
                            "Server '{}' did not become ready within {:?}",
                            server.server_name(),
                            self.start_timeout
                        ),
                        location: ErrorLocation::from(Location::caller()),
                    });
                }
            }
        }
    }
}
