use crate::client::ClientProxy;
use crate::client::internal::InternalClient;
use crate::engine::loopback::LoopbackBackend;
use crate::engine::{ServerBackend, ServerInstance};
use crate::error::client::ClientError;
use crate::name::ClientName;
use crate::options::{OpenOptions, ResolvedOpen};
use crate::status::Status;

use std::sync::Arc;

fn request(options: OpenOptions) -> ResolvedOpen {
    ResolvedOpen {
        server_name: String::from("default"),
        session_id: None,
        options,
    }
}

fn running_server() -> Arc<dyn ServerInstance> {
    LoopbackBackend::default().start("default").expect("start")
}

/// **VALUE**: Verifies a no-start client with no server fails with server bits set.
///
/// **WHY THIS MATTERS**: A no-start open in a process where nothing started a server has
/// nothing to attach to; the caller must learn that from the status word.
#[test]
fn given_no_server_when_opening_then_no_server_error_and_server_failed_bits() {
    // GIVEN
    let mut client = InternalClient::new(None);
    let mut status = Status::empty();

    // WHEN
    let result = client.open(
        &request(OpenOptions::NO_START_SERVER),
        &ClientName::sanitize("player"),
        &mut status,
    );

    // THEN
    assert!(matches!(result, Err(ClientError::NoServer { .. })));
    assert_eq!(status, Status::FAILURE | Status::SERVER_FAILED);
    assert!(client.registration().is_none());
}

/// **VALUE**: Verifies engine refusal bits reach the caller's status word.
#[test]
fn given_taken_exact_name_when_opening_then_engine_bits_merged() {
    // GIVEN: "player" already registered
    let server = running_server();
    let mut first = InternalClient::new(Some(server.clone()));
    let mut status = Status::empty();
    first
        .open(&request(OpenOptions::NONE), &ClientName::sanitize("player"), &mut status)
        .expect("first open");

    // WHEN: A second client insists on the same name
    let mut second = InternalClient::new(Some(server));
    let mut second_status = Status::empty();
    let result = second.open(
        &request(OpenOptions::USE_EXACT_NAME),
        &ClientName::sanitize("player"),
        &mut second_status,
    );

    // THEN
    assert!(matches!(result, Err(ClientError::Engine { .. })));
    assert_eq!(second_status, Status::FAILURE | Status::NAME_NOT_UNIQUE);
}

#[test]
fn given_renamed_client_when_opened_then_informational_bit_set_and_name_updated() {
    let server = running_server();
    let mut status = Status::empty();
    let mut first = InternalClient::new(Some(server.clone()));
    first
        .open(&request(OpenOptions::NONE), &ClientName::sanitize("player"), &mut status)
        .expect("first open");

    let mut second = InternalClient::new(Some(server));
    let mut second_status = Status::empty();
    second
        .open(&request(OpenOptions::NONE), &ClientName::sanitize("player"), &mut second_status)
        .expect("second open");

    assert_eq!(second_status, Status::NAME_NOT_UNIQUE);
    assert_eq!(second.name(), Some("player-01"));
}

#[test]
fn given_open_client_when_opened_again_then_state_error() {
    let mut client = InternalClient::new(Some(running_server()));
    let mut status = Status::empty();
    let name = ClientName::sanitize("player");
    client
        .open(&request(OpenOptions::NONE), &name, &mut status)
        .expect("first open");

    let result = client.open(&request(OpenOptions::NONE), &name, &mut status);

    assert!(matches!(result, Err(ClientError::State { .. })));
    assert!(status.is_empty(), "A refused reopen must not add bits");
}

#[test]
fn given_unopened_client_when_closed_then_state_error_with_failure_code() {
    let mut client = InternalClient::new(Some(running_server()));

    let result = client.close();

    match result {
        Err(e @ ClientError::State { .. }) => assert_eq!(e.code(), crate::CLOSE_FAILED),
        other => panic!("Expected State error, got {other:?}"),
    }
}

/// **VALUE**: Verifies close reports failure when the server went away underneath.
///
/// **BUG THIS CATCHES**: Would catch close claiming success after the server stopped.
#[test]
fn given_stopped_server_when_closing_then_engine_error() {
    // GIVEN
    let server = running_server();
    let mut client = InternalClient::new(Some(server.clone()));
    let mut status = Status::empty();
    client
        .open(&request(OpenOptions::NONE), &ClientName::sanitize("player"), &mut status)
        .expect("open");

    // WHEN
    server.stop();
    let result = client.close();

    // THEN
    assert!(matches!(result, Err(ClientError::Engine { .. })));
}
