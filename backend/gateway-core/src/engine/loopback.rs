//! In-memory engine.
//!
//! `LoopbackBackend` starts [`LoopbackServer`]s that keep a client registry
//! and nothing else. Admission rules mirror a real engine: names must be
//! legal, protocol versions must match, and collisions are renamed unless the
//! caller asked for the exact name. Start/stop transitions are counted so the
//! gateway's lifecycle can be observed from outside.

use crate::engine::{ClientRequest, Registration, ServerBackend, ServerInstance};
use crate::error::engine::EngineError;
use crate::name::{CLIENT_NAME_SIZE, truncate_to_boundary};
use crate::options::OpenOptions;
use crate::status::Status;
use crate::PROTOCOL_VERSION;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

const PORT_SEPARATOR: char = ':';
const UNIQUE_SUFFIX_LEN: usize = 3;
const MAX_UNIQUE_SUFFIX: u32 = 99;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackSettings {
    #[serde(default = "default_max_clients")]
    pub max_clients: usize,
    #[serde(default = "default_protocol_version")]
    pub protocol_version: u32,
    /// Number of readiness polls a fresh server answers `false` to.
    #[serde(default)]
    pub ready_after_polls: u32,
}

impl Default for LoopbackSettings {
    fn default() -> Self {
        Self {
            max_clients: default_max_clients(),
            protocol_version: default_protocol_version(),
            ready_after_polls: 0,
        }
    }
}

fn default_max_clients() -> usize {
    64
}
fn default_protocol_version() -> u32 {
    PROTOCOL_VERSION
}

#[derive(Debug, Default)]
struct Counters {
    starts: AtomicUsize,
    stops: AtomicUsize,
}

pub struct LoopbackBackend {
    settings: LoopbackSettings,
    counters: Arc<Counters>,
    failing_starts: AtomicUsize,
    latest: Mutex<Weak<LoopbackServer>>,
}

impl LoopbackBackend {
    pub fn new(settings: LoopbackSettings) -> Self {
        Self {
            settings,
            counters: Arc::new(Counters::default()),
            failing_starts: AtomicUsize::new(0),
            latest: Mutex::new(Weak::new()),
        }
    }

    pub fn settings(&self) -> &LoopbackSettings {
        &self.settings
    }

    /// Servers started so far.
    pub fn starts(&self) -> usize {
        self.counters.starts.load(Ordering::SeqCst)
    }

    /// Servers stopped so far.
    pub fn stops(&self) -> usize {
        self.counters.stops.load(Ordering::SeqCst)
    }

    /// Make the next `count` calls to `start` fail.
    pub fn fail_next_starts(&self, count: usize) {
        self.failing_starts.store(count, Ordering::SeqCst);
    }

    /// The most recently started server, while it is still running.
    pub fn running_server(&self) -> Option<Arc<LoopbackServer>> {
        self.latest
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .upgrade()
            .filter(|server| server.is_running())
    }
}

impl Default for LoopbackBackend {
    fn default() -> Self {
        Self::new(LoopbackSettings::default())
    }
}

impl ServerBackend for LoopbackBackend {
    fn start(&self, server_name: &str) -> Result<Arc<dyn ServerInstance>, EngineError> {
        let failing = self
            .failing_starts
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            warn!("Refusing to start loopback server '{server_name}'");
            return Err(EngineError::start(format!(
                "loopback server '{server_name}' was told to fail"
            )));
        }

        let server = Arc::new(LoopbackServer::new(
            server_name,
            self.settings.clone(),
            Arc::clone(&self.counters),
        ));
        self.counters.starts.fetch_add(1, Ordering::SeqCst);
        *self.latest.lock().unwrap_or_else(PoisonError::into_inner) = Arc::downgrade(&server);

        info!("Loopback server '{server_name}' started");
        Ok(server)
    }
}

#[derive(Debug, Clone)]
struct ClientEntry {
    refnum: u32,
    pid: u32,
    uuid: Uuid,
}

pub struct LoopbackServer {
    name: String,
    settings: LoopbackSettings,
    counters: Arc<Counters>,
    clients: RwLock<HashMap<String, ClientEntry>>,
    next_refnum: AtomicU32,
    pending_polls: AtomicU32,
    running: AtomicBool,
}

impl LoopbackServer {
    fn new(name: &str, settings: LoopbackSettings, counters: Arc<Counters>) -> Self {
        Self {
            name: name.to_string(),
            pending_polls: AtomicU32::new(settings.ready_after_polls),
            settings,
            counters,
            clients: RwLock::new(HashMap::new()),
            next_refnum: AtomicU32::new(1),
            running: AtomicBool::new(true),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn client_count(&self) -> usize {
        self.read_clients().len()
    }

    /// Registered client names, sorted.
    pub fn client_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.read_clients().keys().cloned().collect();
        names.sort();
        names
    }

    /// Uuid assigned to the client registered as `name`.
    pub fn client_uuid(&self, name: &str) -> Option<String> {
        self.read_clients().get(name).map(|entry| entry.uuid.to_string())
    }

    fn read_clients(&self) -> RwLockReadGuard<'_, HashMap<String, ClientEntry>> {
        self.clients.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_clients(&self) -> RwLockWriteGuard<'_, HashMap<String, ClientEntry>> {
        self.clients.write().unwrap_or_else(PoisonError::into_inner)
    }

    #[track_caller]
    fn check_name(name: &str) -> Result<(), EngineError> {
        if name.is_empty() {
            return Err(EngineError::invalid_name(name, "name is empty"));
        }
        if name.contains(PORT_SEPARATOR) {
            return Err(EngineError::invalid_name(
                name,
                format!("name contains the port separator '{PORT_SEPARATOR}'"),
            ));
        }
        Ok(())
    }

    fn session_uuid(session_id: Option<&str>) -> Uuid {
        match session_id.map(Uuid::parse_str) {
            Some(Ok(uuid)) => uuid,
            Some(Err(e)) => {
                warn!("Ignoring unparsable session id: {e}");
                Uuid::new_v4()
            }
            None => Uuid::new_v4(),
        }
    }
}

/// First free `<base>-NN` name, with the base cut so the result fits.
fn unique_name(clients: &HashMap<String, ClientEntry>, requested: &str) -> Option<String> {
    let base = truncate_to_boundary(requested, CLIENT_NAME_SIZE - UNIQUE_SUFFIX_LEN);

    (1..=MAX_UNIQUE_SUFFIX)
        .map(|suffix| format!("{base}-{suffix:02}"))
        .find(|candidate| !clients.contains_key(candidate))
}

impl ServerInstance for LoopbackServer {
    fn server_name(&self) -> &str {
        &self.name
    }

    fn is_ready(&self) -> bool {
        let still_starting = self
            .pending_polls
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        !still_starting && self.is_running()
    }

    fn register_client(&self, request: &ClientRequest<'_>) -> Result<Registration, EngineError> {
        if !self.is_running() {
            return Err(EngineError::not_running(format!(
                "loopback server '{}' is stopped",
                self.name
            )));
        }

        Self::check_name(request.name)?;

        if request.protocol_version != self.settings.protocol_version {
            return Err(EngineError::version_mismatch(
                request.protocol_version,
                self.settings.protocol_version,
            ));
        }

        let mut clients = self.write_clients();

        if clients.len() >= self.settings.max_clients {
            return Err(EngineError::resource_exhausted(format!(
                "loopback server '{}' is full ({} clients)",
                self.name, self.settings.max_clients
            )));
        }

        let (name, status) = if clients.contains_key(request.name) {
            if request.options.contains(OpenOptions::USE_EXACT_NAME) {
                return Err(EngineError::name_not_unique(request.name));
            }
            let renamed = unique_name(&clients, request.name)
                .ok_or_else(|| EngineError::name_not_unique(request.name))?;
            debug!("Client '{}' renamed to '{renamed}'", request.name);
            (renamed, Status::NAME_NOT_UNIQUE)
        } else {
            (request.name.to_string(), Status::empty())
        };

        let entry = ClientEntry {
            refnum: self.next_refnum.fetch_add(1, Ordering::SeqCst),
            pid: request.pid,
            uuid: Self::session_uuid(request.session_id),
        };

        debug!(
            "Registered client '{name}' (refnum {}, pid {}) on '{}'",
            entry.refnum, entry.pid, self.name
        );

        let registration = Registration {
            refnum: entry.refnum,
            name: name.clone(),
            uuid: entry.uuid.to_string(),
            status,
        };
        clients.insert(name, entry);

        Ok(registration)
    }

    fn unregister_client(&self, refnum: u32) -> Result<(), EngineError> {
        if !self.is_running() {
            return Err(EngineError::not_running(format!(
                "loopback server '{}' is stopped",
                self.name
            )));
        }

        let mut clients = self.write_clients();
        let name = clients
            .iter()
            .find(|(_, entry)| entry.refnum == refnum)
            .map(|(name, _)| name.clone())
            .ok_or_else(|| EngineError::no_such_client(refnum))?;

        clients.remove(&name);
        debug!("Unregistered client '{name}' (refnum {refnum}) from '{}'", self.name);
        Ok(())
    }

    fn client_pid(&self, name: &str) -> u32 {
        self.read_clients()
            .get(name)
            .map(|entry| entry.pid)
            .unwrap_or(0)
    }

    fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            debug!("Loopback server '{}' already stopped", self.name);
            return;
        }

        let dropped = {
            let mut clients = self.write_clients();
            let count = clients.len();
            clients.clear();
            count
        };
        self.counters.stops.fetch_add(1, Ordering::SeqCst);

        info!(
            "Loopback server '{}' stopped ({dropped} clients dropped)",
            self.name
        );
    }
}
