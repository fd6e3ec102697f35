use crate::fakes::{HarnessBuilder, business_hours, read, write_policy};
use chrono::Utc;
use opsbridge::executor::{CommandAllowlist, CommandExecutor, EXIT_NOT_PERMITTED};
use opsbridge::observability::WorkflowEvent;
use opsbridge::report::ReportStore;
use opsbridge::stages::CommanderStage;
use opsbridge::workflow::{Incident, PlanStep, Severity, Stage, WorkflowState};
use opsbridge::{RunRequest, StageId};
use std::sync::Arc;
use tempfile::TempDir;

const PERMISSIVE_POLICY: &str = "\
require_verify_for_cmds: false
require_rollback_for_restart: false
business_hours_block_restart: false
";

fn bare_state(approved: bool) -> WorkflowState {
    WorkflowState::new(
        Incident {
            id: "INC-20240116-030000-0001".into(),
            service: "toy-web".into(),
            started_at: Utc::now(),
            severity: Severity::P2,
        },
        approved,
    )
}

#[tokio::test]
async fn empty_plan_preview_writes_report_and_finishes() {
    let tmp = TempDir::new().unwrap();
    let store = ReportStore::new(tmp.path().join("incidents"));
    let commander = CommanderStage::new(
        Arc::new(CommandExecutor::new(CommandAllowlist::default())),
        store.clone(),
    );

    let mut state = bare_state(false);
    let update = commander.run(&state).await.unwrap();
    state.apply(update);

    assert!(state.done);
    assert!(state.actions.is_empty());
    assert!(state.messages[0].content.contains("Dry-run"));
    assert!(store.path_for(&state.incident.id).exists());
}

#[tokio::test]
async fn single_approved_probe_records_output_without_resolution() {
    let tmp = TempDir::new().unwrap();
    let commander = CommanderStage::new(
        Arc::new(CommandExecutor::new(CommandAllowlist::new(["echo healthy"]))),
        ReportStore::new(tmp.path()),
    );

    let mut state = bare_state(true);
    state.plan = vec![PlanStep::new("Check health").command("echo healthy")];
    let update = commander.run(&state).await.unwrap();
    state.apply(update);

    assert_eq!(state.actions.len(), 1);
    let result = state.actions[0].command_result.as_ref().unwrap();
    assert!(!result.stdout.is_empty());
    assert!(state.actions[0].verify_result.is_none());
    assert!(!state.done);
}

#[tokio::test]
async fn restart_without_rollback_forces_preview() {
    let tmp = TempDir::new().unwrap();
    write_policy(&tmp, "require_verify_for_cmds: false\n");
    let harness = HarnessBuilder::new(&tmp)
        .allow(&["echo 200"])
        .logs(&["GET /health 502"])
        .build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").approve(true))
        .await
        .unwrap();
    let state = &outcome.state;

    assert_eq!(
        state.policy_violations,
        ["Missing rollback for restart cmd: bash scripts/restart-toy-web.sh"]
    );
    assert!(!state.approvals.approved);
    assert!(state.done);
    assert!(state.actions.is_empty());
    assert!(
        state
            .messages
            .iter()
            .any(|m| m.content.starts_with("Policy violations:\n- Missing rollback"))
    );
    assert!(
        harness
            .observer
            .events()
            .iter()
            .any(|e| matches!(e, WorkflowEvent::PolicyVetoed { violations: 1 }))
    );
}

#[tokio::test]
async fn supplied_diff_is_never_refetched() {
    let tmp = TempDir::new().unwrap();
    let diff_path = tmp.path().join("change.diff");
    std::fs::write(&diff_path, "+print(debug)\n").unwrap();
    let harness = HarnessBuilder::new(&tmp).diff("+other change").build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").diff_path(&diff_path))
        .await
        .unwrap();

    assert_eq!(*harness.diff.calls.lock().unwrap(), 0);
    assert_eq!(outcome.state.diff.as_deref(), Some("+print(debug)\n"));
    assert_eq!(outcome.state.review.issues, ["print statements found"]);
    assert_eq!(outcome.state.plan[0].description, "Revert recent change");
}

#[tokio::test]
async fn approved_compliant_run_executes_every_step() {
    let tmp = TempDir::new().unwrap();
    write_policy(&tmp, PERMISSIVE_POLICY);
    let harness = HarnessBuilder::new(&tmp).allow(&["echo 200"]).build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").approve(true))
        .await
        .unwrap();
    let state = &outcome.state;

    assert!(state.policy_violations.is_empty());
    assert_eq!(state.actions.len(), state.plan.len());
    for (action, step) in state.actions.iter().zip(&state.plan) {
        assert_eq!(&action.step, step);
    }
    // Health probe and log tail are not allowlisted here.
    assert_eq!(
        state.actions[0].command_result.as_ref().unwrap().exit_code,
        EXIT_NOT_PERMITTED
    );
    // The restart step's verify prints the success marker.
    assert!(state.done);

    let report = read(&outcome.report_path);
    assert!(report.starts_with(&format!("# Incident {} - toy-web\n", outcome.incident_id)));
    assert!(report.contains("## Actions\n- Check health\n"));
}

#[tokio::test]
async fn unapproved_run_never_executes() {
    let tmp = TempDir::new().unwrap();
    write_policy(&tmp, PERMISSIVE_POLICY);
    let marker = tmp.path().join("touched");
    let touch = format!("touch {}", marker.display());
    let harness = HarnessBuilder::new(&tmp).allow(&[touch.as_str()]).build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web"))
        .await
        .unwrap();

    assert!(outcome.state.done);
    assert!(outcome.state.actions.is_empty());
    assert!(!marker.exists());
    assert!(outcome.report_path.exists());
}

#[tokio::test]
async fn business_hours_block_restart() {
    let tmp = TempDir::new().unwrap();
    write_policy(
        &tmp,
        "require_verify_for_cmds: false\nrequire_rollback_for_restart: false\n",
    );
    let harness = HarnessBuilder::new(&tmp).at(business_hours()).build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").approve(true))
        .await
        .unwrap();
    assert_eq!(
        outcome.state.policy_violations,
        ["Restart blocked during business hours: bash scripts/restart-toy-web.sh"]
    );
    assert!(outcome.state.actions.is_empty());
}

#[tokio::test]
async fn unresolved_run_retries_with_fresh_round() {
    let tmp = TempDir::new().unwrap();
    write_policy(&tmp, PERMISSIVE_POLICY);
    let harness = HarnessBuilder::new(&tmp)
        .config(|c| c.workflow.max_rounds = 2)
        .build();

    let outcome = harness
        .runner
        .run(RunRequest::new("toy-web").approve(true))
        .await
        .unwrap();
    let state = &outcome.state;

    assert_eq!(state.round, 2);
    assert!(!state.done);
    assert_eq!(state.actions.len(), 2 * state.plan.len());
    assert_eq!(state.current_round_actions().count(), state.plan.len());

    let triage_visits = harness
        .observer
        .events()
        .iter()
        .filter(|e| {
            matches!(
                e,
                WorkflowEvent::StageStarted {
                    stage: StageId::Triage,
                    ..
                }
            )
        })
        .count();
    assert_eq!(triage_visits, 2);
}

#[tokio::test]
async fn triage_reads_unlisted_service_log() {
    let tmp = TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join("logs")).unwrap();
    std::fs::write(
        tmp.path().join("logs/checkout.log"),
        "GET / 502\ndeploy abc\n",
    )
    .unwrap();
    let template = format!("{}/logs/{{service}}.log", tmp.path().display());
    let harness = HarnessBuilder::new(&tmp)
        .config(|c| c.triage.log_path_template = template)
        .tail_log_files()
        .build();

    let outcome = harness
        .runner
        .run(RunRequest::new("checkout"))
        .await
        .unwrap();
    let signals = &outcome.state.signals;

    assert_eq!(signals.len(), 2);
    assert!(signals[0].tags.contains("HTTP_502"));
    assert!(signals[1].tags.contains("DEPLOY"));
    assert!(
        !outcome
            .state
            .messages
            .iter()
            .any(|m| m.content.contains("unavailable"))
    );
    assert!(harness.observer.events().iter().any(|e| matches!(
        e,
        WorkflowEvent::StageStarted {
            stage: StageId::StaticAnalysis,
            ..
        }
    )));
}
