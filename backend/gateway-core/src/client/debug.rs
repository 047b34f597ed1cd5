//! Tracing decorator for client proxies.
//!
//! Every call is forwarded untouched; the decorator only observes. It logs
//! each call with its duration and result under the `audiogate::debug_client`
//! target, and reports call sequences a well-behaved gateway never produces.

use crate::client::ClientProxy;
use crate::error::client::ClientError;
use crate::name::ClientName;
use crate::options::ResolvedOpen;
use crate::status::Status;

use std::time::Instant;

use log::{debug, error, warn};

const LOG_TARGET: &str = "audiogate::debug_client";

pub struct DebugClient<C: ClientProxy> {
    inner: C,
    label: String,
    opens: u32,
    closes: u32,
    open: bool,
}

impl<C: ClientProxy> DebugClient<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            label: String::from("<unopened>"),
            opens: 0,
            closes: 0,
            open: false,
        }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }

    /// Open calls seen so far, successful or not.
    pub fn opens(&self) -> u32 {
        self.opens
    }

    pub fn closes(&self) -> u32 {
        self.closes
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl<C: ClientProxy> ClientProxy for DebugClient<C> {
    fn open(
        &mut self,
        request: &ResolvedOpen,
        name: &ClientName,
        status: &mut Status,
    ) -> Result<(), ClientError> {
        self.opens += 1;
        if self.open {
            error!(target: LOG_TARGET, "Client '{}' opened twice", self.label);
        }

        let before = *status;
        let started = Instant::now();
        let result = self.inner.open(request, name, status);
        let elapsed = started.elapsed();

        match &result {
            Ok(()) => {
                self.open = true;
                self.label = self.inner.name().unwrap_or(name.as_str()).to_string();
                debug!(
                    target: LOG_TARGET,
                    "open('{name}', server '{}', options {}) -> ok as '{}' in {elapsed:?}, status {before} -> {status}",
                    request.server_name, request.options, self.label
                );
            }
            Err(e) => {
                debug!(
                    target: LOG_TARGET,
                    "open('{name}', server '{}', options {}) -> failed in {elapsed:?}, status {before} -> {status}: {e}",
                    request.server_name, request.options
                );
            }
        }

        result
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.closes += 1;
        if !self.open {
            error!(target: LOG_TARGET, "Client '{}' closed while not open", self.label);
        }

        let started = Instant::now();
        let result = self.inner.close();
        let elapsed = started.elapsed();
        self.open = false;

        match &result {
            Ok(()) => debug!(target: LOG_TARGET, "close('{}') -> ok in {elapsed:?}", self.label),
            Err(e) => debug!(target: LOG_TARGET, "close('{}') -> failed in {elapsed:?}: {e}", self.label),
        }

        result
    }

    fn name(&self) -> Option<&str> {
        self.inner.name()
    }
}

impl<C: ClientProxy> Drop for DebugClient<C> {
    fn drop(&mut self) {
        if self.open {
            warn!(
                target: LOG_TARGET,
                "Client '{}' dropped while open ({} opens, {} closes)",
                self.label, self.opens, self.closes
            );
        }
    }
}
