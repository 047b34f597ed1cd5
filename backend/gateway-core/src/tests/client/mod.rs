mod debug;
mod internal;

use crate::client::ClientFactory;
use crate::engine::loopback::LoopbackBackend;
use crate::engine::ServerBackend;
use crate::name::ClientName;
use crate::options::{OpenOptions, ResolvedOpen};
use crate::status::Status;

#[test]
fn given_factory_when_created_then_proxy_opens_against_server() {
    let backend = LoopbackBackend::default();
    let server = backend.start("default").expect("start");
    let factory = ClientFactory::new(true);
    let request = ResolvedOpen {
        server_name: String::from("default"),
        session_id: None,
        options: OpenOptions::NONE,
    };
    let mut status = Status::empty();

    let mut proxy = factory.create(Some(server.clone()));

    assert!(factory.is_debug());
    assert!(proxy.open(&request, &ClientName::sanitize("synth"), &mut status).is_ok());
    assert_eq!(proxy.name(), Some("synth"));
    assert_eq!(server.client_pid("synth"), std::process::id());
    assert!(proxy.close().is_ok());
    assert_eq!(server.client_pid("synth"), 0);
}
