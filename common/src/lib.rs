//! Shared building blocks for the audiogate workspace.
//!
//! Every error type in the workspace records where it was raised through
//! [`ErrorLocation`], so a status word or close code observed by a caller can
//! be traced back to the exact failure site in the logs.

pub mod error;

pub use error::error_location::ErrorLocation;
