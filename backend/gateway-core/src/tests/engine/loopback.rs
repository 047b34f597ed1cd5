use crate::PROTOCOL_VERSION;
use crate::engine::loopback::{LoopbackBackend, LoopbackSettings};
use crate::engine::{ClientRequest, ServerBackend, ServerInstance};
use crate::error::engine::EngineError;
use crate::options::OpenOptions;
use crate::status::Status;

use std::sync::Arc;

const SERVER: &str = "default";
const SESSION: &str = "8c2d2d6e-7c84-4d1c-9bbf-1f6f0b3a9cde";

fn request<'a>(name: &'a str, options: OpenOptions) -> ClientRequest<'a> {
    ClientRequest {
        server_name: SERVER,
        name,
        options,
        session_id: None,
        pid: 4242,
        protocol_version: PROTOCOL_VERSION,
    }
}

fn started(settings: LoopbackSettings) -> (LoopbackBackend, Arc<dyn ServerInstance>) {
    let backend = LoopbackBackend::new(settings);
    let server = backend.start(SERVER).expect("loopback start");
    (backend, server)
}

/// **VALUE**: Verifies a fresh name registers as-is and is visible to pid lookups.
#[test]
fn given_free_name_when_registering_then_registered_under_that_name() {
    // GIVEN
    let (_backend, server) = started(LoopbackSettings::default());

    // WHEN
    let registration = server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("registration");

    // THEN
    assert_eq!(registration.name, "player");
    assert!(registration.status.is_empty());
    assert_eq!(server.client_pid("player"), 4242);
    assert_eq!(server.client_pid("nobody"), 0);
}

/// **VALUE**: Verifies collisions are renamed unless the exact name was requested.
///
/// **WHY THIS MATTERS**: Two instances of the same program must both be able to attach;
/// only callers insisting on an exact name should be refused.
///
/// **BUG THIS CATCHES**: Would catch a duplicate overwriting the first client's entry.
#[test]
fn given_taken_name_when_registering_without_exact_name_then_renamed() {
    // GIVEN: "player" is registered
    let (_backend, server) = started(LoopbackSettings::default());
    server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("first registration");

    // WHEN: Registering "player" twice more
    let second = server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("second registration");
    let third = server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("third registration");

    // THEN: Each gets the next free suffix and is flagged as renamed
    assert_eq!(second.name, "player-01");
    assert_eq!(third.name, "player-02");
    assert_eq!(second.status, Status::NAME_NOT_UNIQUE);
    assert_ne!(second.refnum, third.refnum);
}

#[test]
fn given_taken_name_when_registering_with_exact_name_then_refused() {
    let (_backend, server) = started(LoopbackSettings::default());
    server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("first registration");

    let result = server.register_client(&request("player", OpenOptions::USE_EXACT_NAME));

    match result {
        Err(e @ EngineError::NameNotUnique { .. }) => {
            assert_eq!(e.status(), Status::FAILURE | Status::NAME_NOT_UNIQUE);
        }
        other => panic!("Expected NameNotUnique, got {other:?}"),
    }
}

/// **VALUE**: Verifies renaming keeps long names within the name capacity.
#[test]
fn given_taken_max_length_name_when_renamed_then_result_fits() {
    // GIVEN: A registered name of the maximum length
    let (_backend, server) = started(LoopbackSettings::default());
    let long = "x".repeat(crate::name::CLIENT_NAME_SIZE);
    server
        .register_client(&request(&long, OpenOptions::NONE))
        .expect("first registration");

    // WHEN
    let renamed = server
        .register_client(&request(&long, OpenOptions::NONE))
        .expect("renamed registration");

    // THEN
    assert_eq!(renamed.name.len(), crate::name::CLIENT_NAME_SIZE);
    assert!(renamed.name.ends_with("-01"));
}

#[test]
fn given_illegal_names_when_registering_then_invalid_name() {
    let (_backend, server) = started(LoopbackSettings::default());

    for name in ["", "system:capture_1"] {
        let result = server.register_client(&request(name, OpenOptions::NONE));
        match result {
            Err(e @ EngineError::InvalidName { .. }) => {
                assert_eq!(e.status(), Status::FAILURE | Status::INVALID_NAME);
            }
            other => panic!("Expected InvalidName for '{name}', got {other:?}"),
        }
    }
}

/// **VALUE**: Verifies a client built for another protocol version is refused.
#[test]
fn given_engine_with_other_protocol_when_registering_then_version_mismatch() {
    // GIVEN
    let (_backend, server) = started(LoopbackSettings {
        protocol_version: PROTOCOL_VERSION + 1,
        ..LoopbackSettings::default()
    });

    // WHEN
    let result = server.register_client(&request("player", OpenOptions::NONE));

    // THEN
    match result {
        Err(e @ EngineError::VersionMismatch { .. }) => {
            assert!(e.status().contains(Status::VERSION_ERROR));
        }
        other => panic!("Expected VersionMismatch, got {other:?}"),
    }
}

#[test]
fn given_full_server_when_registering_then_resource_exhausted() {
    let (_backend, server) = started(LoopbackSettings {
        max_clients: 1,
        ..LoopbackSettings::default()
    });
    server
        .register_client(&request("first", OpenOptions::NONE))
        .expect("first registration");

    let result = server.register_client(&request("second", OpenOptions::NONE));

    assert!(matches!(result, Err(EngineError::ResourceExhausted { .. })));
}

/// **VALUE**: Verifies a supplied session id becomes the client uuid.
#[test]
fn given_session_id_when_registering_then_uuid_preserved() {
    // GIVEN
    let (backend, server) = started(LoopbackSettings::default());
    let mut with_session = request("restored", OpenOptions::SESSION_ID);
    with_session.session_id = Some(SESSION);

    // WHEN
    let registration = server.register_client(&with_session).expect("registration");
    let fresh = server
        .register_client(&request("fresh", OpenOptions::NONE))
        .expect("registration");

    // THEN
    assert_eq!(registration.uuid, SESSION);
    assert_ne!(fresh.uuid, SESSION);
    let running = backend.running_server().expect("running server");
    assert_eq!(running.client_uuid("restored").as_deref(), Some(SESSION));
}

#[test]
fn given_registered_client_when_unregistering_then_removed_once() {
    let (_backend, server) = started(LoopbackSettings::default());
    let registration = server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("registration");

    assert!(server.unregister_client(registration.refnum).is_ok());
    assert_eq!(server.client_pid("player"), 0);
    assert!(matches!(
        server.unregister_client(registration.refnum),
        Err(EngineError::NoSuchClient { .. })
    ));
}

/// **VALUE**: Verifies stop drops every client and is counted once.
///
/// **BUG THIS CATCHES**: Would catch a double stop being counted twice, which would
/// hide double-release bugs in the gateway.
#[test]
fn given_running_server_when_stopped_twice_then_one_stop_counted() {
    // GIVEN
    let (backend, server) = started(LoopbackSettings::default());
    server
        .register_client(&request("player", OpenOptions::NONE))
        .expect("registration");

    // WHEN
    server.stop();
    server.stop();

    // THEN
    assert_eq!(backend.starts(), 1);
    assert_eq!(backend.stops(), 1);
    assert_eq!(server.client_pid("player"), 0);
    assert!(backend.running_server().is_none());
    assert!(matches!(
        server.register_client(&request("late", OpenOptions::NONE)),
        Err(EngineError::NotRunning { .. })
    ));
}

#[test]
fn given_start_failure_injected_when_starting_then_next_start_succeeds() {
    let backend = LoopbackBackend::default();
    backend.fail_next_starts(1);

    assert!(matches!(backend.start(SERVER), Err(EngineError::Start { .. })));
    assert!(backend.start(SERVER).is_ok());
    assert_eq!(backend.starts(), 1);
}

#[test]
fn given_slow_server_when_polled_then_ready_after_configured_polls() {
    let (_backend, server) = started(LoopbackSettings {
        ready_after_polls: 2,
        ..LoopbackSettings::default()
    });

    assert!(!server.is_ready());
    assert!(!server.is_ready());
    assert!(server.is_ready());
}
