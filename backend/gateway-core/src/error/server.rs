use crate::error::engine::EngineError;

use common::ErrorLocation;

use thiserror::Error as ThisError;

#[derive(Debug, ThisError)]
pub enum ServerError {
    #[error("Start Error: {message} {location}")]
    Start {
        message: String,
        location: ErrorLocation,
        #[source]
        source: EngineError,
    },

    #[error("Timeout Error: {message} {location}")]
    Timeout {
        message: String,
        location: ErrorLocation,
    },
}
