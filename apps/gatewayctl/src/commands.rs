//! Command implementations behind the `gatewayctl` subcommands.

use crate::cli::ProbeArgs;
use crate::error::CtlError;

use gateway_core::config::GatewayConfig;
use gateway_core::engine::loopback::LoopbackBackend;
use gateway_core::{ClientHandle, Gateway, OpenArgs, OpenOptions};

use common::ErrorLocation;

use std::panic::Location;
use std::path::Path;
use std::sync::Arc;
use std::thread::sleep;
use std::time::Duration;

use log::{debug, info, warn};
use serde::Serialize;
use sysinfo::{Pid, Process, ProcessesToUpdate, System};

/// One client opened by a probe.
#[derive(Debug, Clone, Serialize)]
pub struct ClientReport {
    pub requested_name: String,
    /// Name the engine registered, absent when the open failed.
    pub assigned_name: Option<String>,
    pub status: u32,
    pub status_names: Vec<&'static str>,
    pub pid: u32,
    pub process_name: Option<String>,
    /// Close code, absent when there was nothing to close.
    pub close_code: Option<i32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub options: u32,
    pub clients: Vec<ClientReport>,
    pub ref_count_while_open: usize,
    pub final_ref_count: usize,
    pub server_starts: usize,
    pub server_stops: usize,
}

/// Load config from `config_dir` (or the default directory) with process
/// environment overrides applied.
#[track_caller]
pub fn load_config(config_dir: Option<&Path>) -> Result<GatewayConfig, CtlError> {
    let base = match config_dir
        .map(Path::to_path_buf)
        .or_else(GatewayConfig::default_dir)
    {
        Some(dir) => GatewayConfig::load(&dir).map_err(|e| CtlError::Config {
            message: format!("Failed to load config from {}: {e}", dir.display()),
            location: ErrorLocation::from(Location::caller()),
        })?,
        None => {
            warn!("No config directory available, using defaults");
            GatewayConfig::default()
        }
    };

    base.apply_overrides(|key| std::env::var(key).ok())
        .map_err(|e| CtlError::Config {
            message: format!("Invalid environment override: {e}"),
            location: ErrorLocation::from(Location::caller()),
        })
}

pub fn probe_options(args: &ProbeArgs) -> OpenOptions {
    let mut options = OpenOptions::NONE;
    if args.no_start {
        options = options | OpenOptions::NO_START_SERVER;
    }
    if args.exact {
        options = options | OpenOptions::USE_EXACT_NAME;
    }
    if args.server.is_some() {
        options = options | OpenOptions::SERVER_NAME;
    }
    if args.session.is_some() {
        options = options | OpenOptions::SESSION_ID;
    }
    options
}

/// Open every name in `args` through one fresh gateway, hold them, then
/// close them in reverse order.
pub fn probe(config: GatewayConfig, args: &ProbeArgs) -> ProbeReport {
    let backend = Arc::new(LoopbackBackend::new(config.loopback.clone()));
    let gateway = Gateway::new(backend.clone(), config);

    let options = probe_options(args);
    let mut open_args = OpenArgs::default();
    if let Some(server) = &args.server {
        open_args = open_args.with_server_name(server);
    }
    if let Some(session) = &args.session {
        open_args = open_args.with_session_id(session);
    }

    let mut opened: Vec<(ClientReport, Option<ClientHandle>)> = args
        .names
        .iter()
        .map(|name| open_one(&gateway, name, options, &open_args))
        .collect();

    let ref_count_while_open = gateway.ref_count();

    if args.hold_ms > 0 {
        debug!("Holding {} clients for {}ms", opened.len(), args.hold_ms);
        sleep(Duration::from_millis(args.hold_ms));
    }

    for (report, handle) in opened.iter_mut().rev() {
        if let Some(handle) = handle.take() {
            report.close_code = Some(gateway.close(handle));
        }
    }

    let report = ProbeReport {
        options: options.bits(),
        clients: opened.into_iter().map(|(report, _)| report).collect(),
        ref_count_while_open,
        final_ref_count: gateway.ref_count(),
        server_starts: backend.starts(),
        server_stops: backend.stops(),
    };

    info!(
        "Probe finished: {} clients, {} starts, {} stops",
        report.clients.len(),
        report.server_starts,
        report.server_stops
    );
    report
}

fn open_one(
    gateway: &Gateway,
    name: &str,
    options: OpenOptions,
    open_args: &OpenArgs,
) -> (ClientReport, Option<ClientHandle>) {
    let (handle, status) = gateway.open(Some(name), options, Some(open_args));

    let assigned_name = handle.as_ref().map(|handle| handle.name().to_string());
    let pid = assigned_name
        .as_deref()
        .map(|assigned| gateway.client_pid(assigned))
        .unwrap_or(0);
    let process_name = (pid != 0)
        .then(|| with_process(pid, |p| p.name().to_string_lossy().to_string()))
        .flatten();

    let report = ClientReport {
        requested_name: name.to_string(),
        assigned_name,
        status: status.bits(),
        status_names: status.names(),
        pid,
        process_name,
        close_code: None,
    };

    (report, handle)
}

#[track_caller]
pub(crate) fn with_process<F, R>(pid: u32, f: F) -> Option<R>
where
    F: FnOnce(&Process) -> R,
{
    let mut sys = System::new_all();
    sys.refresh_processes(ProcessesToUpdate::All, true);

    sys.process(Pid::from_u32(pid)).map(f)
}

#[track_caller]
pub fn render_json<T: Serialize>(value: &T) -> Result<String, CtlError> {
    serde_json::to_string_pretty(value).map_err(|e| CtlError::Report {
        message: format!("Failed to render report as JSON: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
pub fn render_config(config: &GatewayConfig) -> Result<String, CtlError> {
    toml::to_string_pretty(config).map_err(|e| CtlError::Report {
        message: format!("Failed to render config as TOML: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}
