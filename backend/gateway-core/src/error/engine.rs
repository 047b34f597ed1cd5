//! Errors reported by the engine behind the gateway.
//!
//! Each variant maps to the status bits a caller of `open` sees through
//! [`EngineError::status`].

use crate::status::Status;

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum EngineError {
    #[error("Start Error: {message} {location}")]
    Start {
        message: String,
        location: ErrorLocation,
    },

    #[error("Not Running Error: {message} {location}")]
    NotRunning {
        message: String,
        location: ErrorLocation,
    },

    #[error("Name Not Unique Error: '{name}' is already registered {location}")]
    NameNotUnique {
        name: String,
        location: ErrorLocation,
    },

    #[error("Invalid Name Error: '{name}': {reason} {location}")]
    InvalidName {
        name: String,
        reason: String,
        location: ErrorLocation,
    },

    #[error("Version Mismatch Error: client speaks {client}, engine speaks {engine} {location}")]
    VersionMismatch {
        client: u32,
        engine: u32,
        location: ErrorLocation,
    },

    #[error("Resource Exhausted Error: {message} {location}")]
    ResourceExhausted {
        message: String,
        location: ErrorLocation,
    },

    #[error("No Such Client Error: refnum {refnum} {location}")]
    NoSuchClient { refnum: u32, location: ErrorLocation },
}

impl EngineError {
    #[track_caller]
    pub fn start(message: impl Into<String>) -> Self {
        EngineError::Start {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn not_running(message: impl Into<String>) -> Self {
        EngineError::NotRunning {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn name_not_unique(name: impl Into<String>) -> Self {
        EngineError::NameNotUnique {
            name: name.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn invalid_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        EngineError::InvalidName {
            name: name.into(),
            reason: reason.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn version_mismatch(client: u32, engine: u32) -> Self {
        EngineError::VersionMismatch {
            client,
            engine,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn resource_exhausted(message: impl Into<String>) -> Self {
        EngineError::ResourceExhausted {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    pub fn no_such_client(refnum: u32) -> Self {
        EngineError::NoSuchClient {
            refnum,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    /// Status bits this failure contributes to an open.
    pub fn status(&self) -> Status {
        let condition = match self {
            EngineError::Start { .. } | EngineError::NotRunning { .. } => Status::SERVER_FAILED,
            EngineError::NameNotUnique { .. } => Status::NAME_NOT_UNIQUE,
            EngineError::InvalidName { .. } => Status::INVALID_NAME,
            EngineError::VersionMismatch { .. } => Status::VERSION_ERROR,
            EngineError::ResourceExhausted { .. } => Status::INIT_FAILURE,
            EngineError::NoSuchClient { .. } => Status::NO_SUCH_CLIENT,
        };
        Status::FAILURE | condition
    }
}
