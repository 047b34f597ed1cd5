use crate::client::ClientProxy;
use crate::client::debug::DebugClient;
use crate::error::client::ClientError;
use crate::name::ClientName;
use crate::options::{OpenOptions, ResolvedOpen};
use crate::status::Status;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::{Arc, Mutex};

/// Proxy that records calls and returns scripted results.
struct ScriptedProxy {
    open_bits: Status,
    fail_open: bool,
    fail_close: bool,
    calls: Arc<Mutex<Vec<&'static str>>>,
}

impl ScriptedProxy {
    fn new(open_bits: Status, fail_open: bool, fail_close: bool) -> (Self, Arc<Mutex<Vec<&'static str>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let proxy = Self {
            open_bits,
            fail_open,
            fail_close,
            calls: Arc::clone(&calls),
        };
        (proxy, calls)
    }

    fn scripted_error() -> ClientError {
        ClientError::State {
            message: String::from("scripted failure"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl ClientProxy for ScriptedProxy {
    fn open(
        &mut self,
        _request: &ResolvedOpen,
        _name: &ClientName,
        status: &mut Status,
    ) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push("open");
        *status |= self.open_bits;
        if self.fail_open {
            return Err(Self::scripted_error());
        }
        Ok(())
    }

    fn close(&mut self) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push("close");
        if self.fail_close {
            return Err(Self::scripted_error());
        }
        Ok(())
    }

    fn name(&self) -> Option<&str> {
        Some("scripted")
    }
}

fn request() -> ResolvedOpen {
    ResolvedOpen {
        server_name: String::from("default"),
        session_id: None,
        options: OpenOptions::NONE,
    }
}

/// **VALUE**: Verifies the decorator forwards a successful open unchanged.
///
/// **WHY THIS MATTERS**: Debug mode must be invisible to the gateway; a decorator that
/// alters status bits or results would make debug builds behave differently.
///
/// **BUG THIS CATCHES**: Would catch the decorator swallowing informational bits.
#[test]
fn given_debug_wrapper_when_inner_open_succeeds_then_result_and_status_forwarded() {
    // GIVEN
    let (inner, calls) = ScriptedProxy::new(Status::NAME_NOT_UNIQUE, false, false);
    let mut client = DebugClient::new(inner);
    let mut status = Status::empty();

    // WHEN
    let result = client.open(&request(), &ClientName::sanitize("synth"), &mut status);

    // THEN
    assert!(result.is_ok());
    assert_eq!(status, Status::NAME_NOT_UNIQUE);
    assert_eq!(client.name(), Some("scripted"));
    assert!(client.is_open());
    assert_eq!(client.opens(), 1);
    assert_eq!(*calls.lock().unwrap(), vec!["open"]);
}

#[test]
fn given_debug_wrapper_when_inner_open_fails_then_same_error_and_bits() {
    let (inner, _calls) = ScriptedProxy::new(Status::FAILURE | Status::VERSION_ERROR, true, false);
    let mut client = DebugClient::new(inner);
    let mut status = Status::empty();

    let result = client.open(&request(), &ClientName::sanitize("synth"), &mut status);

    assert!(matches!(result, Err(ClientError::State { .. })));
    assert_eq!(status, Status::FAILURE | Status::VERSION_ERROR);
    assert!(!client.is_open());
}

/// **VALUE**: Verifies out-of-order calls are still forwarded, only logged.
///
/// **BUG THIS CATCHES**: Would catch the decorator "fixing" a close-before-open by
/// skipping the inner call, which changes side effects.
#[test]
fn given_unopened_debug_wrapper_when_closed_then_inner_close_still_called() {
    // GIVEN
    let (inner, calls) = ScriptedProxy::new(Status::empty(), false, true);
    let mut client = DebugClient::new(inner);

    // WHEN
    let result = client.close();

    // THEN
    assert!(result.is_err());
    assert_eq!(client.closes(), 1);
    assert_eq!(*calls.lock().unwrap(), vec!["close"]);
}

#[test]
fn given_opened_debug_wrapper_when_closed_then_counts_balance() {
    let (inner, calls) = ScriptedProxy::new(Status::empty(), false, false);
    let mut client = DebugClient::new(inner);
    let mut status = Status::empty();

    client
        .open(&request(), &ClientName::sanitize("synth"), &mut status)
        .expect("open");
    client.close().expect("close");

    assert_eq!((client.opens(), client.closes()), (1, 1));
    assert!(!client.is_open());
    assert_eq!(client.inner().name(), Some("scripted"));
    assert_eq!(*calls.lock().unwrap(), vec!["open", "close"]);
}
