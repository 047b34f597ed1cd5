use gateway_core::{CLOSE_FAILED, OpenOptions, Status, client_close, client_open, get_client_pid};

use serial_test::serial;

// ============================================================================
// Process-wide entry points
// These share one gateway for the whole test binary, so they run serially
// and leave no client open behind them.
// ============================================================================

/// **VALUE**: The free functions drive one process-wide gateway end to end.
///
/// **WHY THIS MATTERS**: Applications that never build a [`gateway_core::Gateway`] rely
/// on these functions alone.
#[test]
#[serial]
fn given_process_gateway_when_opening_and_closing_then_pid_follows_client() {
    // GIVEN
    assert_eq!(get_client_pid("process-player"), 0);

    // WHEN
    let (handle, status) = client_open(Some("process-player"), OpenOptions::NONE, None);

    // THEN
    let handle = handle.expect("open on process gateway");
    assert_eq!(status, Status::empty());
    assert_eq!(get_client_pid("process-player"), std::process::id());

    assert_eq!(client_close(handle), 0);
    assert_eq!(get_client_pid("process-player"), 0);
}

#[test]
#[serial]
fn given_process_gateway_when_closing_nothing_then_failure_code() {
    assert_eq!(client_close(None), CLOSE_FAILED);
}

#[test]
#[serial]
fn given_process_gateway_when_opening_without_name_then_bare_failure() {
    let (handle, status) = client_open(None, OpenOptions::NONE, None);

    assert!(handle.is_none());
    assert_eq!(status, Status::FAILURE);
}

/// **VALUE**: Two clients on the process gateway share one server.
#[test]
#[serial]
fn given_two_process_clients_when_first_closes_then_second_still_found() {
    // GIVEN
    let (first, _) = client_open(Some("process-a"), OpenOptions::NONE, None);
    let (second, _) = client_open(Some("process-b"), OpenOptions::NONE, None);
    let second = second.expect("second opens");

    // WHEN
    assert_eq!(client_close(first), 0);

    // THEN
    assert_eq!(get_client_pid("process-a"), 0);
    assert_eq!(get_client_pid("process-b"), std::process::id());

    assert_eq!(client_close(second), 0);
}
