use crate::CLOSE_FAILED;
use crate::error::engine::EngineError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ClientError {
    #[error("Engine Error: {message} {location}")]
    Engine {
        message: String,
        location: ErrorLocation,
        #[source]
        source: EngineError,
    },

    #[error("No Server Error: {message} {location}")]
    NoServer {
        message: String,
        location: ErrorLocation,
    },

    #[error("State Error: {message} {location}")]
    State {
        message: String,
        location: ErrorLocation,
    },
}

impl ClientError {
    /// Return code handed back by `close` for this failure.
    pub fn code(&self) -> i32 {
        CLOSE_FAILED
    }
}
