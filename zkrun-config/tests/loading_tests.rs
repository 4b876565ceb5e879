//! End-to-end loading of a service configuration and job specification pair

use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use zkrun_config::{job_name, ConfigProvider, ExitPolicy};
use tempfile::TempDir;

fn fixture(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("Failed to write fixture");
    path
}

#[test]
fn test_service_and_job_through_symlink() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let service = fixture(
        &dir,
        "zkrun.conf",
        r#"
ensemble = "zk1:2181,zk2:2181,zk3:2181/infra"

[sync]
group = "dc1"

[log]
file = "/var/log/zkrun/zkrun.log"
"#,
    );
    let job = fixture(
        &dir,
        "nightly-report.conf",
        r#"
command = "/usr/local/bin/report --nightly"
start.success.delay = "2s"
exit.policy = "reaquire-lock"
"#,
    );
    let link = dir.path().join("current.conf");
    std::os::unix::fs::symlink(&job, &link).expect("Failed to create symlink");

    let provider = ConfigProvider::without_env();
    let config = provider
        .load_service_config(&service)
        .expect("Service config must load");
    config.validate().expect("Service config must validate");

    let ensemble = config.ensemble().expect("Ensemble must parse");
    assert_eq!(ensemble.servers, "zk1:2181,zk2:2181,zk3:2181");
    assert_eq!(ensemble.chroot, "/infra");
    assert_eq!(config.sync_group, "dc1");

    let spec = provider.load_job_spec(&link).expect("Job spec must load");
    assert_eq!(spec.exit_policy, ExitPolicy::ReacquireLock);
    assert_eq!(spec.start_success_delay, Duration::from_secs(2));

    assert_eq!(job_name(&job).as_deref(), Some("nightly-report"));
}

#[test]
fn test_unsupported_extension_is_rejected() {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let job = fixture(&dir, "job.ucl", "command = \"/bin/true\";");

    let err = ConfigProvider::without_env()
        .load_job_spec(&job)
        .expect_err("UCL files are not supported");
    assert!(err.to_string().contains("ucl"));
}
