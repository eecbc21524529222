//! Tests for the onboard command's run-level setup and export.

mod support;

use tempfile::TempDir;

use tether_core::commands::{OnboardCommand, OnboardOptions, TargetSelection, select_targets};
use tether_core::deploy::TargetingPolicy;
use tether_core::error::{ExportError, SetupError};
use tether_core::template::FileTemplateSource;
use tether_core::types::{Outcome, OverallStatus, Target};

use support::{FakeClock, FakeCloud, StaticTemplate, delegation_template};

fn setup_error(err: anyhow::Error) -> SetupError {
    err.downcast::<SetupError>()
        .expect("expected a run-level setup error")
}

#[test]
fn onboard_writes_export_and_reports_status() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("results.csv");
    let mut cloud = FakeCloud::with_subscriptions(&["A", "B", "C"]);
    cloud.submit_failures.insert("B".into());
    let templates = StaticTemplate::new(delegation_template());
    let clock = FakeClock::new();

    let options = OnboardOptions::new()
        .with_continue_on_error(true)
        .with_output_path(&output);
    let report = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap();

    assert_eq!(report.summary.len(), 3);
    assert_eq!(report.summary.status, OverallStatus::Failed);
    assert_eq!(report.output_path, output);

    let content = std::fs::read_to_string(&output).unwrap();
    assert_eq!(content.lines().count(), 4);
}

#[test]
fn simulation_injects_managing_tenant() {
    let temp = TempDir::new().unwrap();
    let cloud = FakeCloud::with_subscriptions(&["A"]);
    let templates = StaticTemplate::new(serde_json::json!({
        "parameters": { "managedByTenantId": { "type": "string" } },
        "resources": []
    }));
    let clock = FakeClock::new();

    let options = OnboardOptions::new()
        .with_simulate(true)
        .with_output_path(temp.path().join("r.csv"));
    let report = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap();

    let record = &report.summary.records[0];
    assert_eq!(record.outcome, Outcome::Simulated);
    assert_eq!(record.capability_owner_id.as_deref(), Some("managing-tenant"));

    let submissions = cloud.submissions.lock().unwrap();
    assert_eq!(
        submissions[0].2.template["parameters"]["managedByTenantId"]["defaultValue"],
        "managing-tenant"
    );
}

#[test]
fn unresolvable_tenant_aborts_before_any_target() {
    let temp = TempDir::new().unwrap();
    let output = temp.path().join("r.csv");
    let mut cloud = FakeCloud::with_subscriptions(&["A"]);
    cloud.tenant_fails = true;
    let templates = StaticTemplate::new(delegation_template());
    let clock = FakeClock::new();

    let options = OnboardOptions::new()
        .with_simulate(true)
        .with_output_path(&output);
    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap_err();

    assert!(matches!(setup_error(err), SetupError::TenantUnresolved { .. }));
    assert!(cloud.selected.lock().unwrap().is_empty());
    assert!(!output.exists());
}

#[test]
fn missing_template_aborts_run() {
    let cloud = FakeCloud::with_subscriptions(&["A"]);
    let templates = StaticTemplate::missing();
    let clock = FakeClock::new();

    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&OnboardOptions::new())
        .unwrap_err();

    assert!(matches!(
        setup_error(err),
        SetupError::TemplateUnavailable { .. }
    ));
    assert!(cloud.selected.lock().unwrap().is_empty());
}

#[test]
fn no_subscriptions_aborts_run() {
    let cloud = FakeCloud::with_subscriptions(&[]);
    let templates = StaticTemplate::new(delegation_template());
    let clock = FakeClock::new();

    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&OnboardOptions::new())
        .unwrap_err();

    assert!(matches!(setup_error(err), SetupError::NoTargetsAvailable));
}

#[test]
fn empty_selection_aborts_run() {
    let cloud = FakeCloud::with_subscriptions(&["A", "B"]);
    let templates = StaticTemplate::new(delegation_template());
    let clock = FakeClock::new();

    let options = OnboardOptions::new().with_selection(TargetSelection::Policy(
        TargetingPolicy::new(None, Some(vec!["A".into(), "B".into()])),
    ));
    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap_err();

    assert!(matches!(setup_error(err), SetupError::NoTargetsSelected));
    assert!(cloud.selected.lock().unwrap().is_empty());
}

#[test]
fn explicit_selection_keeps_requested_order() {
    let candidates = vec![
        Target::new("A", "a"),
        Target::new("B", "b"),
        Target::new("C", "c"),
    ];

    let selected = select_targets(
        &candidates,
        &TargetSelection::Explicit(vec!["C".into(), "a".into(), "C".into()]),
    )
    .unwrap();

    let ids: Vec<&str> = selected.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["C", "A"]);
}

#[test]
fn explicit_selection_rejects_unknown_ids() {
    let candidates = vec![Target::new("A", "a")];

    let err = select_targets(
        &candidates,
        &TargetSelection::Explicit(vec!["A".into(), "Z".into()]),
    )
    .unwrap_err();

    match err {
        SetupError::UnknownTargets { ids } => assert_eq!(ids, vec!["Z".to_string()]),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn unreadable_parameter_file_aborts_with_its_path() {
    let temp = TempDir::new().unwrap();
    let template = temp.path().join("template.json");
    std::fs::write(&template, delegation_template().to_string()).unwrap();
    let params = temp.path().join("missing.parameters.json");
    let cloud = FakeCloud::with_subscriptions(&["A"]);
    let templates = FileTemplateSource::new(&template).with_parameters(Some(params.clone()));
    let clock = FakeClock::new();

    let options = OnboardOptions::new().with_output_path(temp.path().join("r.csv"));
    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap_err();

    match setup_error(err) {
        SetupError::ParametersUnavailable { path, .. } => assert_eq!(path, params),
        other => panic!("unexpected error: {other}"),
    }
    assert!(cloud.selected.lock().unwrap().is_empty());
}

#[test]
fn export_failure_is_reported_separately() {
    let temp = TempDir::new().unwrap();
    // A regular file where the output directory should be.
    let blocker = temp.path().join("blocker");
    std::fs::write(&blocker, "").unwrap();
    let cloud = FakeCloud::with_subscriptions(&["A"]);
    let templates = StaticTemplate::new(delegation_template());
    let clock = FakeClock::new();

    let options = OnboardOptions::new().with_output_path(blocker.join("r.csv"));
    let err = OnboardCommand::new(&cloud, &templates, &clock)
        .execute(&options)
        .unwrap_err();

    assert!(err.downcast_ref::<SetupError>().is_none());
    let export = err.downcast_ref::<ExportError>().unwrap();
    assert_eq!(export.path, blocker.join("r.csv"));
    assert_eq!(cloud.selected.lock().unwrap().len(), 1);
}
