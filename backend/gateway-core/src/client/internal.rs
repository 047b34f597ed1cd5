use crate::PROTOCOL_VERSION;
use crate::client::ClientProxy;
use crate::engine::{ClientRequest, Registration, ServerInstance};
use crate::error::client::ClientError;
use crate::name::ClientName;
use crate::options::ResolvedOpen;
use crate::status::Status;

use common::ErrorLocation;

use std::panic::Location;
use std::process;
use std::sync::Arc;

use log::{debug, trace};

/// Client proxy talking directly to an in-process server instance.
pub struct InternalClient {
    server: Option<Arc<dyn ServerInstance>>,
    registration: Option<Registration>,
}

impl InternalClient {
    pub fn new(server: Option<Arc<dyn ServerInstance>>) -> Self {
        Self {
            server,
            registration: None,
        }
    }

    pub fn registration(&self) -> Option<&Registration> {
        self.registration.as_ref()
    }
}

impl ClientProxy for InternalClient {
    fn open(
        &mut self,
        request: &ResolvedOpen,
        name: &ClientName,
        status: &mut Status,
    ) -> Result<(), ClientError> {
        if self.registration.is_some() {
            return Err(ClientError::State {
                message: format!("Client '{name}' is already open"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let server = match self.server.as_ref() {
            Some(server) if server.is_ready() => server,
            _ => {
                *status |= Status::FAILURE | Status::SERVER_FAILED;
                return Err(ClientError::NoServer {
                    message: format!(
                        "No running server '{}' for client '{name}'",
                        request.server_name
                    ),
                    location: ErrorLocation::from(Location::caller()),
                });
            }
        };

        let client_request = ClientRequest {
            server_name: &request.server_name,
            name: name.as_str(),
            options: request.options,
            session_id: request.session_id.as_deref(),
            pid: process::id(),
            protocol_version: PROTOCOL_VERSION,
        };

        let registration = server.register_client(&client_request).map_err(|e| {
            *status |= e.status();
            ClientError::Engine {
                message: format!("Server refused client '{name}': {e}"),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            }
        })?;

        *status |= registration.status;
        debug!(
            "Client '{}' registered as refnum {}",
            registration.name, registration.refnum
        );
        self.registration = Some(registration);
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        let registration = self.registration.take().ok_or_else(|| ClientError::State {
            message: String::from("Client is not open"),
            location: ErrorLocation::from(Location::caller()),
        })?;

        let server = self.server.as_ref().ok_or_else(|| ClientError::NoServer {
            message: format!("Client '{}' has no server to detach from", registration.name),
            location: ErrorLocation::from(Location::caller()),
        })?;

        trace!("Unregistering refnum {}", registration.refnum);

        server
            .unregister_client(registration.refnum)
            .map_err(|e| ClientError::Engine {
                message: format!("Failed to detach client '{}': {e}", registration.name),
                location: ErrorLocation::from(Location::caller()),
                source: e,
            })
    }

    fn name(&self) -> Option<&str> {
        self.registration.as_ref().map(|r| r.name.as_str())
    }
}
