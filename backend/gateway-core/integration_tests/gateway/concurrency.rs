use super::loopback_gateway;

use gateway_core::config::GatewayConfig;
use gateway_core::engine::loopback::{LoopbackBackend, LoopbackSettings};
use gateway_core::{Gateway, OpenOptions, Status};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// ============================================================================
// Open/close from many threads at once
// ============================================================================

const THREADS: usize = 8;
const ROUNDS: usize = 25;

/// Gateway whose server takes a few readiness polls to come up, widening the
/// window in which concurrent first opens could race a start.
fn slow_start_gateway() -> (Arc<LoopbackBackend>, Gateway) {
    let config = GatewayConfig {
        loopback: LoopbackSettings {
            ready_after_polls: 3,
            ..LoopbackSettings::default()
        },
        ..GatewayConfig::default()
    };
    let backend = Arc::new(LoopbackBackend::new(config.loopback.clone()));
    let gateway = Gateway::new(backend.clone(), config);
    (backend, gateway)
}

/// **VALUE**: Simultaneous first opens start the server exactly once.
///
/// **WHY THIS MATTERS**: Every application in a session tends to open at login. If two
/// of them both saw "no server" they would each start one, and one would leak.
///
/// **BUG THIS CATCHES**: Would catch the reference count check and the start running
/// outside the open/close mutex.
#[test]
fn given_threads_opening_together_when_all_close_then_one_start_and_one_stop() {
    // GIVEN: THREADS callers released at the same moment
    let (backend, gateway) = slow_start_gateway();
    let barrier = Barrier::new(THREADS);

    // WHEN: Each opens its own client and keeps it
    let handles: Vec<_> = thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|index| {
                let gateway = &gateway;
                let barrier = &barrier;
                scope.spawn(move || {
                    barrier.wait();
                    gateway.open(Some(&format!("app-{index}")), OpenOptions::NONE, None)
                })
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker panicked"))
            .collect()
    });

    // THEN: All opened cleanly against a single server
    assert_eq!(backend.starts(), 1);
    assert_eq!(gateway.ref_count(), THREADS);
    for (handle, status) in &handles {
        assert!(handle.is_some());
        assert_eq!(*status, Status::empty());
    }
    let server = backend.running_server().expect("server running");
    assert_eq!(server.client_count(), THREADS);

    // WHEN: All close concurrently
    let codes: Vec<i32> = thread::scope(|scope| {
        let workers: Vec<_> = handles
            .into_iter()
            .map(|(handle, _)| {
                let gateway = &gateway;
                scope.spawn(move || gateway.close(handle))
            })
            .collect();

        workers
            .into_iter()
            .map(|worker| worker.join().expect("worker panicked"))
            .collect()
    });

    // THEN: Every close succeeded and the server stopped once
    assert!(codes.iter().all(|&code| code == 0), "codes: {codes:?}");
    assert_eq!(gateway.ref_count(), 0);
    assert_eq!((backend.starts(), backend.stops()), (1, 1));
    assert!(!server.is_running());
}

/// **VALUE**: Repeated open/close churn leaves no references behind.
///
/// **WHY THIS MATTERS**: The count must return to zero after any interleaving, or the
/// server outlives its last client.
///
/// **BUG THIS CATCHES**: Would catch a lost update on the count, or a stop racing a
/// start so that starts and stops drift apart.
#[test]
fn given_threads_churning_open_close_when_done_then_count_zero_and_starts_match_stops() {
    // GIVEN
    let (backend, gateway) = loopback_gateway();
    let opened = AtomicUsize::new(0);
    let closed = AtomicUsize::new(0);

    // WHEN: Each thread opens and closes its client ROUNDS times, querying pids in between
    thread::scope(|scope| {
        for index in 0..THREADS {
            let gateway = &gateway;
            let opened = &opened;
            let closed = &closed;
            scope.spawn(move || {
                let name = format!("churn-{index}");
                for _ in 0..ROUNDS {
                    let (handle, status) = gateway.open(Some(&name), OpenOptions::NONE, None);
                    let Some(handle) = handle else {
                        panic!("open of '{name}' failed: {status}");
                    };
                    opened.fetch_add(1, Ordering::SeqCst);

                    assert_eq!(gateway.client_pid(&name), std::process::id());

                    if gateway.close(handle) == 0 {
                        closed.fetch_add(1, Ordering::SeqCst);
                    }
                }
            });
        }
    });

    // THEN
    assert_eq!(opened.load(Ordering::SeqCst), THREADS * ROUNDS);
    assert_eq!(closed.load(Ordering::SeqCst), THREADS * ROUNDS);
    assert_eq!(gateway.ref_count(), 0);
    assert!(!gateway.server_running());
    assert!(backend.starts() >= 1);
    assert_eq!(backend.starts(), backend.stops());
}

/// **VALUE**: Pid queries keep answering while opens and closes are in flight.
///
/// **BUG THIS CATCHES**: Would catch the pid query taking the open/close mutex or
/// observing a half-torn-down server.
#[test]
fn given_resident_client_when_others_churn_then_pid_query_always_finds_it() {
    // GIVEN: A client that stays open for the whole test
    let (backend, gateway) = loopback_gateway();
    let (resident, _) = gateway.open(Some("resident"), OpenOptions::NONE, None);
    let resident = resident.expect("resident opens");

    // WHEN: Other threads churn while one thread queries
    thread::scope(|scope| {
        for index in 0..THREADS {
            let gateway = &gateway;
            scope.spawn(move || {
                for _ in 0..ROUNDS {
                    let (handle, _) =
                        gateway.open(Some(&format!("visitor-{index}")), OpenOptions::NONE, None);
                    gateway.close(handle);
                }
            });
        }

        let gateway = &gateway;
        scope.spawn(move || {
            for _ in 0..(THREADS * ROUNDS) {
                // THEN
                assert_eq!(gateway.client_pid("resident"), std::process::id());
            }
        });
    });

    assert_eq!(gateway.ref_count(), 1);
    gateway.close(resident);
    assert_eq!((backend.starts(), backend.stops()), (1, 1));
}
