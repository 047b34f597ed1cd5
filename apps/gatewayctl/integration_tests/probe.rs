use gatewayctl::cli::{Cli, Command};
use gatewayctl::commands::{probe, render_json};

use gateway_core::config::GatewayConfig;

use clap::Parser;

// ============================================================================
// Command line to JSON report, through the public library surface
// ============================================================================

/// **VALUE**: A parsed probe command produces a JSON report with every field.
///
/// **WHY THIS MATTERS**: Scripts consume this output; a renamed field breaks them
/// silently.
#[test]
fn given_probe_command_line_when_run_then_json_report_has_client_fields() {
    // GIVEN
    let cli = Cli::try_parse_from([
        "gatewayctl",
        "probe",
        "recorder",
        "--server",
        "studio",
        "--session",
        "0d6f3a4e-55b1-4d7e-9a43-7b7d5a0de6f2",
    ])
    .expect("valid command line");
    let Command::Probe(args) = cli.command else {
        panic!("expected probe");
    };

    // WHEN
    let report = probe(GatewayConfig::default(), &args);
    let json = render_json(&report).expect("renders");

    // THEN
    let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    assert_eq!(value["options"], 0x24);
    assert_eq!(value["final_ref_count"], 0);
    let client = &value["clients"][0];
    assert_eq!(client["requested_name"], "recorder");
    assert_eq!(client["assigned_name"], "recorder");
    assert_eq!(client["status"], 0);
    assert_eq!(client["pid"], std::process::id());
    assert_eq!(client["close_code"], 0);
}

#[test]
fn given_exact_names_colliding_when_probed_then_second_fails_and_count_returns_to_zero() {
    let cli = Cli::try_parse_from(["gatewayctl", "probe", "mixer", "mixer", "--exact"])
        .expect("valid command line");
    let Command::Probe(args) = cli.command else {
        panic!("expected probe");
    };

    let report = probe(GatewayConfig::default(), &args);

    assert!(report.clients[0].assigned_name.is_some());
    assert!(report.clients[1].assigned_name.is_none());
    assert!(report.clients[1].status_names.contains(&"NAME_NOT_UNIQUE"));
    assert_eq!(report.ref_count_while_open, 1);
    assert_eq!(report.final_ref_count, 0);
}
