//! Tests for the targeting policy.

use tether_core::deploy::TargetingPolicy;
use tether_core::error::SetupError;
use tether_core::types::Target;

fn candidates() -> Vec<Target> {
    vec![
        Target::new("sub-a", "Alpha"),
        Target::new("sub-b", "Beta"),
        Target::new("sub-c", "Gamma"),
    ]
}

#[test]
fn default_policy_selects_everything() {
    let selected = TargetingPolicy::default().select(&candidates()).unwrap();
    assert_eq!(selected, candidates());
}

#[test]
fn whitelist_keeps_candidate_order() {
    let policy = TargetingPolicy::new(Some(vec!["sub-c".into(), "sub-a".into()]), None);
    let selected = policy.select(&candidates()).unwrap();
    let ids: Vec<&str> = selected.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec!["sub-a", "sub-c"]);
}

#[test]
fn whitelist_wins_over_blacklist() {
    let policy = TargetingPolicy::new(Some(vec!["sub-b".into()]), Some(vec!["sub-b".into()]));
    assert!(policy.should_deploy_to("sub-b"));
    assert!(!policy.should_deploy_to("sub-a"));
}

#[test]
fn blacklist_skips_targets() {
    let policy = TargetingPolicy::new(None, Some(vec!["SUB-B".into()]));
    let selected = policy.select(&candidates()).unwrap();
    assert_eq!(selected.len(), 2);
    assert!(selected.iter().all(|t| t.id != "sub-b"));
}

#[test]
fn unknown_whitelisted_ids_are_reported() {
    let policy = TargetingPolicy::new(Some(vec!["sub-z".into()]), None);
    let err = policy.select(&candidates()).unwrap_err();
    assert!(matches!(err, SetupError::UnknownTargets { ids } if ids == vec!["sub-z".to_string()]));
}
