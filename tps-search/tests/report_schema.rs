//! Report JSON schema tests
//!
//! Downstream tooling reads exported reports by key. These tests pin the key
//! names at every level of the document.

mod helpers;

use helpers::{settings, CapacityRunner, ScriptedRunner};
use serde_json::Value;
use tps_search::engine::SearchOrchestrator;
use tps_search::SearchConfig;

fn sorted_keys(value: &Value) -> Vec<String> {
    let mut keys: Vec<String> = value
        .as_object()
        .expect("expected a JSON object")
        .keys()
        .cloned()
        .collect();
    keys.sort();
    keys
}

fn report_json<R: tps_search::TrialRunner>(runner: &mut R) -> Value {
    let config = SearchConfig {
        max_tps_to_test: 5000,
        ..SearchConfig::default()
    };
    let report = SearchOrchestrator::new(config.settings())
        .run_with_report(runner, config.snapshot().unwrap())
        .unwrap();
    serde_json::to_value(&report).unwrap()
}

#[test]
fn test_top_level_and_outcome_keys() {
    let json = report_json(&mut CapacityRunner::new(2200));

    assert_eq!(
        sorted_keys(&json),
        vec![
            "coarse",
            "config",
            "confirmation",
            "environment",
            "format_version",
            "run_finish",
            "run_id",
            "run_start",
        ]
    );
    for phase in ["coarse", "confirmation"] {
        assert_eq!(
            sorted_keys(&json[phase]),
            vec!["max_rate_achieved", "max_rate_detail", "records"]
        );
    }
    assert_eq!(
        sorted_keys(&json["environment"]),
        vec!["cpu", "os_family", "release", "system", "target_version"]
    );
}

#[test]
fn test_record_keys() {
    let json = report_json(&mut CapacityRunner::new(2200));
    let record = &json["coarse"]["records"][0];

    assert_eq!(
        sorted_keys(record),
        vec![
            "ceiling_at_step",
            "evaluation",
            "floor_at_step",
            "passed",
            "target",
            "trial_report",
        ]
    );
    assert_eq!(
        sorted_keys(&record["evaluation"]),
        vec![
            "achieved_avg_rate",
            "artifacts_path",
            "count_expect_met",
            "expected_transaction_count",
            "observed_transaction_count",
            "passed",
            "rate_expect_met",
            "target_rate",
            "trial_end",
            "trial_start",
            "trial_succeeded",
        ]
    );
    assert_eq!(
        sorted_keys(&record["trial_report"]),
        vec![
            "achieved_avg_rate",
            "artifacts_path",
            "end_timestamp",
            "expected_transaction_count",
            "observed_transaction_count",
            "raw_detail",
            "start_timestamp",
            "trial_succeeded",
        ]
    );
}

#[test]
fn test_config_snapshot_is_embedded() {
    let json = report_json(&mut CapacityRunner::new(2200));
    let config = &json["config"];

    assert_eq!(config["max_tps_to_test"], 5000);
    assert_eq!(config["min_step"], 500);
    assert_eq!(config["coarse_duration_secs"], 150);
    assert_eq!(config["confirmation_duration_secs"], 300);
    assert_eq!(config["generator_rate_cap"], 4000);
    assert_eq!(config["extra_prune_blocks"], 2);
    assert_eq!(config["trial"]["timeout_grace_secs"], 60);
}

#[test]
fn test_no_pass_report_keeps_shape() {
    let json = report_json(&mut ScriptedRunner::default());

    assert_eq!(json["coarse"]["max_rate_achieved"], 0);
    assert_eq!(json["coarse"]["max_rate_detail"], serde_json::json!({}));
    assert_eq!(json["confirmation"]["max_rate_achieved"], 0);
    assert!(json["coarse"]["records"]
        .as_array()
        .unwrap()
        .iter()
        .all(|r| r["passed"] == false));
}

#[test]
fn test_max_rate_detail_comes_from_passing_trial() {
    let mut runner = CapacityRunner::new(2200);
    let json = report_json(&mut runner);

    // the stub records the request in raw_detail
    assert_eq!(json["coarse"]["max_rate_achieved"], 2000);
    assert_eq!(json["coarse"]["max_rate_detail"]["target_rate"], 2000);
    assert_eq!(json["coarse"]["max_rate_detail"]["duration_secs"], 150);

    let direct = SearchOrchestrator::new(settings(5000, 500))
        .run(&mut CapacityRunner::new(2200))
        .unwrap();
    assert_eq!(
        direct.coarse.max_rate_achieved,
        json["coarse"]["max_rate_achieved"]
    );
}
