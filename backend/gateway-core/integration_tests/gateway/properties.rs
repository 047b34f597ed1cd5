use super::loopback_gateway;

use gateway_core::{OpenArgs, OpenOptions, Status};

const RECOGNIZED_BITS: [u32; 4] = [0x01, 0x02, 0x04, 0x20];

fn recognized_masks() -> Vec<OpenOptions> {
    (0u32..(1 << RECOGNIZED_BITS.len()))
        .map(|selection| {
            RECOGNIZED_BITS
                .iter()
                .enumerate()
                .filter(|(index, _)| selection & (1 << index) != 0)
                .fold(0, |mask, (_, bit)| mask | bit)
        })
        .map(OpenOptions::from_bits_retain)
        .collect()
}

/// **VALUE**: Every recognized mask yields either a clean handle or a flagged failure.
///
/// **WHY THIS MATTERS**: Callers branch on "handle or status"; a null handle with an
/// empty status, or a handle with failure bits, leaves them unable to decide.
///
/// **BUG THIS CATCHES**: Would catch a failure path that returns before setting bits.
#[test]
fn given_every_recognized_mask_when_opening_then_handle_xor_failure_status() {
    let args = OpenArgs::default()
        .with_server_name("studio")
        .with_session_id("2f1a9a42-3b9e-4c55-8f57-0d1f41f7f4b1");

    for options in recognized_masks() {
        for with_args in [false, true] {
            // GIVEN: A fresh gateway for each combination
            let (_backend, gateway) = loopback_gateway();

            // WHEN
            let (handle, status) =
                gateway.open(Some("probe"), options, with_args.then_some(&args));

            // THEN
            match handle {
                Some(handle) => {
                    assert_eq!(status, Status::empty(), "options {options}");
                    assert_eq!(gateway.close(handle), 0);
                }
                None => {
                    assert!(status.is_failure(), "options {options}: {status}");
                    assert_eq!(gateway.ref_count(), 0);
                }
            }
        }
    }
}

/// **VALUE**: Any bit outside the recognized set is rejected the same way.
#[test]
fn given_each_unrecognized_bit_when_opening_then_exactly_invalid_option() {
    let (backend, gateway) = loopback_gateway();

    for shift in 0..32 {
        let bit = 1u32 << shift;
        if RECOGNIZED_BITS.contains(&bit) {
            continue;
        }

        let options = OpenOptions::from_bits_retain(bit | 0x02);
        let (handle, status) = gateway.open(Some("probe"), options, None);

        assert!(handle.is_none(), "bit {bit:#x}");
        assert_eq!(status, Status::FAILURE | Status::INVALID_OPTION, "bit {bit:#x}");
    }

    assert_eq!(gateway.ref_count(), 0);
    assert_eq!(backend.starts(), 0);
}

#[test]
fn given_prior_state_when_opening_without_name_then_count_never_changes() {
    let (_backend, gateway) = loopback_gateway();
    let mut held = Vec::new();

    for count in 0..3 {
        assert_eq!(gateway.ref_count(), count);

        let (handle, status) = gateway.open(None, OpenOptions::NONE, None);
        assert!(handle.is_none());
        assert_eq!(status, Status::FAILURE);
        assert_eq!(gateway.ref_count(), count);

        let (kept, _) = gateway.open(Some(&format!("held-{count}")), OpenOptions::NONE, None);
        held.extend(kept);
    }

    for handle in held {
        assert_eq!(gateway.close(handle), 0);
    }
    assert_eq!(gateway.ref_count(), 0);
}
