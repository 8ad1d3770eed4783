//! Daemon startup against model artifacts on disk

use std::path::Path;

use surge_core::{LinearDemandModel, SurgeError};
use surge_daemon::config::Config;
use surge_daemon::SurgeDaemon;
use surge_rl::{LoadFailurePolicy, QTablePolicy};

fn config_in(dir: &Path, on_failure: LoadFailurePolicy) -> Config {
    let mut config = Config::default();
    config.models.policy_path = dir.join("surge_policy.json");
    config.models.demand_path = dir.join("demand_model.json");
    config.models.on_policy_load_failure = on_failure;
    config
}

fn write_demand_model(dir: &Path) {
    LinearDemandModel::new(20.0, vec![1.5, 4.0, 6.0, 25.0, 0.5])
        .unwrap()
        .save(&dir.join("demand_model.json"))
        .unwrap();
}

#[test]
fn test_starts_with_persisted_models() {
    let dir = tempfile::tempdir().unwrap();
    write_demand_model(dir.path());
    QTablePolicy::default()
        .save(&dir.path().join("surge_policy.json"))
        .unwrap();

    assert!(SurgeDaemon::new(config_in(dir.path(), LoadFailurePolicy::Halt)).is_ok());
}

#[test]
fn test_missing_policy_halts_by_default() {
    let dir = tempfile::tempdir().unwrap();
    write_demand_model(dir.path());

    let err = SurgeDaemon::new(config_in(dir.path(), LoadFailurePolicy::Halt))
        .err()
        .unwrap();
    assert!(matches!(err, SurgeError::ArtifactMissing(_)));
    assert!(err.remediation().is_some());
}

#[test]
fn test_missing_policy_with_fallback_starts() {
    let dir = tempfile::tempdir().unwrap();
    write_demand_model(dir.path());

    assert!(SurgeDaemon::new(config_in(dir.path(), LoadFailurePolicy::Fallback)).is_ok());
}

#[test]
fn test_corrupt_policy_with_fallback_starts() {
    let dir = tempfile::tempdir().unwrap();
    write_demand_model(dir.path());
    std::fs::write(dir.path().join("surge_policy.json"), "{not json").unwrap();

    assert!(SurgeDaemon::new(config_in(dir.path(), LoadFailurePolicy::Fallback)).is_ok());
}

#[test]
fn test_missing_demand_model_always_blocks() {
    let dir = tempfile::tempdir().unwrap();

    let err = SurgeDaemon::new(config_in(dir.path(), LoadFailurePolicy::Fallback))
        .err()
        .unwrap();
    assert!(err.is_load_failure());
}

fn serving_daemon(dir: &Path, bind_address: &str) -> SurgeDaemon {
    write_demand_model(dir);
    let mut config = config_in(dir, LoadFailurePolicy::Fallback);
    config.daemon.bind_address = bind_address.to_string();
    SurgeDaemon::new(config).unwrap()
}

#[tokio::test]
async fn test_run_until_reports_address_in_use() {
    let holder = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = holder.local_addr().unwrap().to_string();
    let dir = tempfile::tempdir().unwrap();
    let daemon = serving_daemon(dir.path(), &addr);

    // The signal never fires, so only a startup failure can end this call
    let err = daemon
        .run_until(std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Failed to bind"));
}

#[tokio::test]
async fn test_run_until_reports_invalid_address() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = serving_daemon(dir.path(), "not-an-address");

    let err = daemon
        .run_until(std::future::pending::<()>())
        .await
        .unwrap_err();
    assert!(format!("{err:#}").contains("Invalid bind address"));
}

#[tokio::test]
async fn test_run_until_stops_on_signal() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = serving_daemon(dir.path(), "127.0.0.1:0");

    assert!(daemon.run_until(async {}).await.is_ok());
}
