use crate::fakes::HarnessBuilder;
use opsbridge::Config;
use opsbridge::RunRequest;
use tempfile::TempDir;

#[tokio::test]
async fn toml_config_drives_a_run() {
    let tmp = TempDir::new().unwrap();
    let config_path = tmp.path().join("opsbridge.toml");
    let incidents = tmp.path().join("reports");
    std::fs::write(
        &config_path,
        format!(
            "incident_dir = {:?}\npolicy_path = {:?}\n\n[workflow]\nmax_rounds = 1\n\n[runbook]\nhealth_url = \"http://127.0.0.1:9/health\"\n",
            incidents.display().to_string(),
            tmp.path().join("none.yaml").display().to_string(),
        ),
    )
    .unwrap();

    let config = Config::load(&config_path).unwrap();
    assert_eq!(config.incident_dir, incidents);

    let harness = HarnessBuilder::new(&tmp)
        .config(|c| *c = config.clone())
        .build();
    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web"))
        .await
        .unwrap();

    assert!(outcome.report_path.starts_with(&incidents));
    assert!(outcome.report_path.exists());
    assert_eq!(
        outcome.state.plan[0].command.as_deref(),
        Some("curl -s http://127.0.0.1:9/health")
    );
}

#[tokio::test]
async fn malformed_policy_file_falls_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    crate::fakes::write_policy(&tmp, "max_steps: [oops\n");
    let harness = HarnessBuilder::new(&tmp).build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").approve(true))
        .await
        .unwrap();

    // Defaults require verify on every command: the first two template
    // steps have none.
    assert!(
        outcome
            .state
            .policy_violations
            .iter()
            .any(|v| v.starts_with("Missing verify for cmd: curl"))
    );
    assert!(!outcome.state.approvals.approved);
}
