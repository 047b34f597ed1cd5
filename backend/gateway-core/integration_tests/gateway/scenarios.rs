use super::loopback_gateway;

use gateway_core::name::CLIENT_NAME_SIZE;
use gateway_core::{OpenOptions, Status};

// ============================================================================
// End-to-end open/close scenarios against the loopback engine
// ============================================================================

/// **VALUE**: Cold-process open and close of a single client.
///
/// **WHY THIS MATTERS**: This is the path every audio application takes: the first open
/// starts the server, the last close stops it.
///
/// **BUG THIS CATCHES**: Would catch a missing auto-start, a non-zero status on a clean
/// open, or a server left running after the last close.
#[test]
fn given_cold_process_when_player_opens_and_closes_then_server_starts_and_stops() {
    // GIVEN: No server has ever run
    let (backend, gateway) = loopback_gateway();
    assert!(!gateway.server_running());

    // WHEN: Opening "player" with no options
    let (handle, status) = gateway.open(Some("player"), OpenOptions::NONE, None);

    // THEN: Server auto-started, clean status, live handle
    assert_eq!(status, Status::empty());
    let handle = handle.expect("handle should be returned");
    assert!(gateway.server_running());
    assert_eq!(backend.starts(), 1);
    assert_eq!(gateway.ref_count(), 1);

    // WHEN: Closing it
    let code = gateway.close(handle);

    // THEN: Closed cleanly and the server is gone
    assert_eq!(code, 0);
    assert!(!gateway.server_running());
    assert_eq!(backend.stops(), 1);
    assert_eq!(gateway.ref_count(), 0);
}

/// **VALUE**: A 300 character name is truncated before reaching the engine.
///
/// **BUG THIS CATCHES**: Would catch open failing on length alone.
#[test]
fn given_300_char_name_when_opening_then_truncated_and_opened() {
    // GIVEN
    let (_backend, gateway) = loopback_gateway();
    let long_name = "a".repeat(300);

    // WHEN
    let (handle, status) = gateway.open(Some(&long_name), OpenOptions::NONE, None);

    // THEN
    assert_eq!(status, Status::empty());
    let handle = handle.expect("long name should still open");
    assert_eq!(handle.name().len(), CLIENT_NAME_SIZE);
    assert_eq!(handle.name(), &long_name[..CLIENT_NAME_SIZE]);
    assert_eq!(
        gateway.client_pid(&long_name[..CLIENT_NAME_SIZE]),
        std::process::id()
    );

    assert_eq!(gateway.close(handle), 0);
}

/// **VALUE**: An unknown option bit is rejected with exactly two status bits.
#[test]
fn given_unknown_option_bit_when_opening_then_invalid_option_and_no_side_effects() {
    // GIVEN
    let (backend, gateway) = loopback_gateway();
    let unknown = OpenOptions::from_bits_retain(0x100);

    // WHEN
    let (handle, status) = gateway.open(Some("x"), unknown, None);

    // THEN
    assert!(handle.is_none());
    assert_eq!(status, Status::FAILURE | Status::INVALID_OPTION);
    assert_eq!(gateway.ref_count(), 0);
    assert_eq!(backend.starts(), 0);
}

/// **VALUE**: Pid queries follow the client's lifetime.
///
/// **WHY THIS MATTERS**: Pid lookup is used by session managers to find the process
/// behind a client; stale answers after close would point them at the wrong process.
#[test]
fn given_client_lifetime_when_querying_pid_then_known_only_while_open() {
    // GIVEN: No server has started yet
    let (_backend, gateway) = loopback_gateway();
    assert_eq!(gateway.client_pid("synth"), 0);

    // WHEN: "synth" is open
    let (handle, _) = gateway.open(Some("synth"), OpenOptions::NONE, None);
    let handle = handle.expect("open");

    // THEN: Its pid is this process
    assert_eq!(gateway.client_pid("synth"), std::process::id());
    assert_eq!(gateway.client_pid("someone-else"), 0);

    // WHEN: It closes as the last server holder
    gateway.close(handle);

    // THEN: Not found again
    assert_eq!(gateway.client_pid("synth"), 0);
}

/// **VALUE**: A closed handle cannot release anything a second time.
///
/// **WHY THIS MATTERS**: Close consumes the handle, so the only "second close" a caller
/// can express is a close with no handle. It must be rejected without touching the
/// references other handles hold.
#[test]
fn given_closed_handle_when_closing_again_then_rejected_without_double_release() {
    // GIVEN: Two clients, one of which is closed
    let (backend, gateway) = loopback_gateway();
    let (keep, _) = gateway.open(Some("keep"), OpenOptions::NONE, None);
    let (gone, _) = gateway.open(Some("gone"), OpenOptions::NONE, None);
    assert_eq!(gateway.close(gone), 0);
    assert_eq!(gateway.ref_count(), 1);

    // WHEN: The caller's variable for the closed handle is now empty
    let gone = None;
    let code = gateway.close(gone);

    // THEN: Rejected and the surviving reference is intact
    assert_eq!(code, -1);
    assert_eq!(gateway.ref_count(), 1);
    assert!(gateway.server_running());
    assert_eq!(backend.stops(), 0);

    gateway.close(keep);
    assert_eq!(backend.stops(), 1);
}
