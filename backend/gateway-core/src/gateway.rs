//! Open/close gateway to the process-resident server.
//!
//! [`Gateway::open`] and [`Gateway::close`] run one at a time under a single
//! mutex that also owns the [`ServerLifecycleManager`], so the server
//! reference count and server start/stop never race. [`Gateway::client_pid`]
//! stays outside that mutex and reads the published server slot instead.
//!
//! Failures are reported only through the returned status word
//! ([`Status`]) and close codes; this module never panics on caller input.
//!
//! # Process-wide gateway
//!
//! [`client_open`], [`client_close`] and [`get_client_pid`] use one gateway
//! per process, built on first use with the loopback engine and
//! [`GatewayConfig::from_env`].

use crate::client::{ClientFactory, ClientProxy};
use crate::config::GatewayConfig;
use crate::engine::ServerBackend;
use crate::engine::loopback::LoopbackBackend;
use crate::name::ClientName;
use crate::options::{self, OpenArgs, OpenOptions, ResolvedOpen};
use crate::server::{PublishedServer, ServerLifecycleManager};
use crate::status::Status;
use crate::CLOSE_FAILED;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, error, info, warn};
use once_cell::sync::OnceCell;

static PROCESS_GATEWAY: OnceCell<Gateway> = OnceCell::new();

struct Shared {
    /// The open/close mutex.
    lifecycle: Mutex<ServerLifecycleManager>,
    published: PublishedServer,
    factory: ClientFactory,
    config: GatewayConfig,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, ServerLifecycleManager> {
        // Every mutation of the manager completes before anything that can
        // panic runs, so a poisoned guard still holds consistent state.
        self.lifecycle.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Entry point for attaching clients to the shared server.
///
/// Cloning is cheap; clones share the same mutex, server and count.
#[derive(Clone)]
pub struct Gateway {
    shared: Arc<Shared>,
}

impl Gateway {
    pub fn new(backend: Arc<dyn ServerBackend>, config: GatewayConfig) -> Self {
        let lifecycle = ServerLifecycleManager::new(backend, config.server_start_timeout());
        let published = lifecycle.published();

        Self {
            shared: Arc::new(Shared {
                lifecycle: Mutex::new(lifecycle),
                published,
                factory: ClientFactory::new(config.debug_clients),
                config,
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.shared.config
    }

    /// Open a client named `name`.
    ///
    /// Returns a handle and the accumulated status on success (empty on a
    /// clean open, informational bits such as [`Status::NAME_NOT_UNIQUE`]
    /// after a rename). On failure returns `None` and a status with
    /// [`Status::FAILURE`] set:
    /// - no name: exactly `FAILURE`, nothing else is touched
    /// - unrecognized option bits: exactly `FAILURE | INVALID_OPTION`
    /// - server cannot start: `FAILURE | SERVER_ERROR`
    /// - engine refused the client: `FAILURE | SERVER_ERROR` plus engine bits
    pub fn open(
        &self,
        name: Option<&str>,
        options: OpenOptions,
        args: Option<&OpenArgs>,
    ) -> (Option<ClientHandle>, Status) {
        let Some(raw_name) = name else {
            error!("open called with no client name");
            return (None, Status::FAILURE);
        };

        debug!("open '{raw_name}' with options {options}");
        let client_name = ClientName::sanitize(raw_name);

        let mut lifecycle = self.shared.lock();
        let mut status = Status::empty();

        if !options.is_recognized() {
            warn!(
                "open '{client_name}' rejected: unrecognized option bits {:#x}",
                options.unrecognized_bits()
            );
            status |= Status::FAILURE | Status::INVALID_OPTION;
            return (None, status);
        }

        let options = if self.shared.config.no_start_server {
            options | OpenOptions::NO_START_SERVER
        } else {
            options
        };

        let resolved = options::resolve(options, args, &self.shared.config.default_server_name);
        let takes_server_ref = resolved.auto_start();

        if takes_server_ref {
            if let Err(e) = lifecycle.attach_or_start(&resolved.server_name) {
                warn!("open '{client_name}' failed: {e}");
                status |= Status::FAILURE | Status::SERVER_ERROR;
                return (None, status);
            }
        }

        let mut proxy = self.shared.factory.create(lifecycle.current());

        if let Err(e) = proxy.open(&resolved, &client_name, &mut status) {
            warn!("open '{client_name}' failed: {e}");
            drop(proxy);
            if takes_server_ref {
                lifecycle.release();
            }
            status |= Status::FAILURE | Status::SERVER_ERROR;
            return (None, status);
        }

        info!(
            "Client '{}' opened on server '{}' (status {status})",
            proxy.name().unwrap_or(client_name.as_str()),
            resolved.server_name
        );

        let handle = ClientHandle {
            proxy: Some(proxy),
            requested_name: client_name,
            resolved,
            holds_server_ref: takes_server_ref,
            shared: Arc::clone(&self.shared),
        };

        (Some(handle), status)
    }

    /// Close a client, returning the proxy's close code.
    ///
    /// `None` is rejected with [`CLOSE_FAILED`] and no side effects. A handle
    /// is always torn down and its server reference released, even when the
    /// proxy reports a close failure.
    pub fn close(&self, handle: impl Into<Option<ClientHandle>>) -> i32 {
        let Some(mut handle) = handle.into() else {
            error!("close called with no client handle");
            return CLOSE_FAILED;
        };

        if !Arc::ptr_eq(&self.shared, &handle.shared) {
            warn!(
                "Client '{}' belongs to another gateway, closing it there",
                handle.requested_name
            );
        }

        handle.shutdown()
    }

    /// Pid of the process owning client `name`, or 0 when unknown or when no
    /// server is running. Does not wait for an in-flight open or close.
    pub fn client_pid(&self, name: &str) -> u32 {
        let server = self
            .shared
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        server.map(|server| server.client_pid(name)).unwrap_or(0)
    }

    /// Outstanding server references.
    pub fn ref_count(&self) -> usize {
        self.shared.lock().ref_count()
    }

    pub fn server_running(&self) -> bool {
        self.shared
            .published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("config", &self.shared.config)
            .field("debug_clients", &self.shared.factory.is_debug())
            .field("server_running", &self.server_running())
            .finish()
    }
}

/// One attached client.
///
/// Closing consumes the handle. Dropping an unclosed handle closes it.
pub struct ClientHandle {
    proxy: Option<Box<dyn ClientProxy>>,
    requested_name: ClientName,
    resolved: ResolvedOpen,
    holds_server_ref: bool,
    shared: Arc<Shared>,
}

impl ClientHandle {
    /// Name registered with the engine.
    pub fn name(&self) -> &str {
        self.proxy
            .as_ref()
            .and_then(|proxy| proxy.name())
            .unwrap_or(self.requested_name.as_str())
    }

    /// Sanitized name the client asked for.
    pub fn requested_name(&self) -> &ClientName {
        &self.requested_name
    }

    pub fn server_name(&self) -> &str {
        &self.resolved.server_name
    }

    pub fn options(&self) -> OpenOptions {
        self.resolved.options
    }

    /// Whether this handle's open took a server reference.
    pub fn holds_server_ref(&self) -> bool {
        self.holds_server_ref
    }

    fn shutdown(&mut self) -> i32 {
        let Some(mut proxy) = self.proxy.take() else {
            return CLOSE_FAILED;
        };

        let mut lifecycle = self.shared.lock();
        let name = proxy
            .name()
            .unwrap_or(self.requested_name.as_str())
            .to_string();

        let code = match proxy.close() {
            Ok(()) => 0,
            Err(e) => {
                warn!("Client '{name}' close failed: {e}");
                e.code()
            }
        };
        drop(proxy);

        if self.holds_server_ref {
            self.holds_server_ref = false;
            lifecycle.release();
        }

        info!("Client '{name}' closed (code {code})");
        code
    }
}

impl Drop for ClientHandle {
    fn drop(&mut self) {
        if self.proxy.is_some() {
            warn!("Client '{}' dropped without close, closing it", self.name());
            self.shutdown();
        }
    }
}

impl fmt::Debug for ClientHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientHandle")
            .field("name", &self.name())
            .field("server_name", &self.resolved.server_name)
            .field("options", &self.resolved.options)
            .field("holds_server_ref", &self.holds_server_ref)
            .finish()
    }
}

/// The process-wide gateway.
pub fn process_gateway() -> &'static Gateway {
    PROCESS_GATEWAY.get_or_init(|| {
        let config = GatewayConfig::from_env();
        let backend = Arc::new(LoopbackBackend::new(config.loopback.clone()));
        info!("Process gateway initialized (default server '{}')", config.default_server_name);
        Gateway::new(backend, config)
    })
}

/// [`Gateway::open`] on the process-wide gateway.
pub fn client_open(
    name: Option<&str>,
    options: OpenOptions,
    args: Option<&OpenArgs>,
) -> (Option<ClientHandle>, Status) {
    process_gateway().open(name, options, args)
}

/// [`Gateway::close`] on the process-wide gateway.
pub fn client_close(handle: impl Into<Option<ClientHandle>>) -> i32 {
    process_gateway().close(handle)
}

/// [`Gateway::client_pid`] on the process-wide gateway.
pub fn get_client_pid(name: &str) -> u32 {
    process_gateway().client_pid(name)
}
