// Unit tests for error module
// Errors are printed to stderr as JSON

use crate::error::CtlError;

use common::ErrorLocation;

use std::panic::Location;

/// **VALUE**: Tests that errors serialize with their variant tag.
///
/// **BUG THIS CATCHES**: Would catch the `Serialize` derive or the serde tag being dropped,
/// which turns the stderr report into plain text.
#[test]
fn given_config_error_when_serialized_then_carries_type_and_message() {
    // GIVEN
    let err = CtlError::Config {
        message: String::from("bad timeout"),
        location: ErrorLocation::from(Location::caller()),
    };

    // WHEN
    let json = serde_json::to_value(&err).expect("serializable");

    // THEN
    assert_eq!(json["type"], "Config");
    assert_eq!(json["data"]["message"], "bad timeout");
    assert!(json["data"]["location"]["line"].as_u64().is_some());
}

#[test]
fn given_report_error_when_displayed_then_prefixed_with_kind() {
    let err = CtlError::Report {
        message: String::from("broken"),
        location: ErrorLocation::from(Location::caller()),
    };

    let text = err.to_string();

    assert!(text.starts_with("Report Error: broken ["), "text: {text}");
}
