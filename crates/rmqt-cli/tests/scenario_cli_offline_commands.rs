use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn rmqt() -> Command {
    let mut cmd = Command::cargo_bin("rmqt").unwrap();
    cmd.env_remove("RUST_LOG")
        .env_remove("RABBITMQTOOL_HOST")
        .env_remove("RABBITMQTOOL_PORT");
    cmd
}

#[test]
fn masstransit_validate_counts_missing_bindings_from_file() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("s.json");
    fs::write(
        &snapshot,
        r#"{
  "VHosts": [{"Name": "/"}],
  "Exchanges": [
    {"Name": "orders", "Vhost": "/", "Type": "fanout", "Durable": true},
    {"Name": "billing", "Vhost": "/", "Type": "fanout", "Durable": true}
  ],
  "Queues": [
    {"Name": "orders", "Vhost": "/", "Durable": true},
    {"Name": "billing", "Vhost": "/", "Durable": true}
  ],
  "Bindings": [
    {"Source": "billing", "Vhost": "/", "Destination": "billing", "DestinationType": "queue", "RoutingKey": ""}
  ]
}"#,
    )
    .unwrap();

    rmqt()
        .args(["masstransit", "validate", "--file"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("candidates=2"))
        .stdout(predicate::str::contains("missing_bindings=1"))
        .stderr(predicate::str::contains("Missing binding: 'orders' exchange -> 'orders' queue."));
}

#[test]
fn restore_rejects_garbage_on_stdin_before_connecting() {
    rmqt()
        .args(["schema", "restore"])
        .write_stdin("this is not a snapshot")
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid snapshot on stdin"));
}

#[test]
fn unparseable_env_port_is_a_startup_error() {
    rmqt()
        .env("RABBITMQTOOL_PORT", "fifteen")
        .args(["schema", "is-alive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("RABBITMQTOOL_PORT"));
}

#[test]
fn unknown_profile_key_is_a_startup_error() {
    let dir = tempfile::tempdir().unwrap();
    let profile = dir.path().join("p.yaml");
    fs::write(&profile, "hostname: http://typo\n").unwrap();

    rmqt()
        .args(["--profile"])
        .arg(&profile)
        .args(["schema", "is-alive"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("CONFIG_UNKNOWN_KEYS"));
}

#[test]
fn debug_flag_logs_snapshot_load_to_stderr() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("s.json");
    fs::write(&snapshot, r#"{"Queues": [{"Name": "q1", "Vhost": "/"}]}"#).unwrap();

    rmqt()
        .args(["--debug", "masstransit", "validate", "--file"])
        .arg(&snapshot)
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot loaded").not())
        .stderr(predicate::str::contains("snapshot loaded"))
        .stderr(predicate::str::contains("queues=1"));
}

#[test]
fn help_states_that_flags_override_environment() {
    rmqt()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "defaults < --profile files < RABBITMQTOOL_* env vars < flags",
        ))
        .stdout(predicate::str::contains(
            "Flags override environment variables",
        ));
}
