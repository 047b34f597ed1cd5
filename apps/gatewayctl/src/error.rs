use common::ErrorLocation;

use serde::Serialize;
use thiserror::Error;

/// Errors reported by `gatewayctl`.
///
/// Printed to stderr as JSON, so they keep structured information and
/// location tracking.
#[derive(Debug, Error, Serialize)]
#[serde(tag = "type", content = "data")]
pub enum CtlError {
    /// Error from this tool
    #[error("Gatewayctl Error: {message} {location}")]
    Ctl {
        message: String,
        location: ErrorLocation,
    },

    /// Gateway configuration could not be loaded
    #[error("Config Error: {message} {location}")]
    Config {
        message: String,
        location: ErrorLocation,
    },

    /// Report could not be rendered
    #[error("Report Error: {message} {location}")]
    Report {
        message: String,
        location: ErrorLocation,
    },
}
