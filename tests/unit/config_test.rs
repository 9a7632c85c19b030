//! Tests for configuration validation

use std::collections::HashMap;

use prometheus_throttle::config::{ThrottleConfig, ENV_CONCURRENCY, ENV_REQUESTS_PER_SECOND};
use prometheus_throttle::core::{AdmissionGate, FailurePolicy, SchedulerError};

fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn test_default_is_single_concurrency() {
    assert_eq!(
        ThrottleConfig::default(),
        ThrottleConfig::Concurrency { concurrency: 1 }
    );
}

#[test]
fn test_concurrency_validation() {
    assert!(ThrottleConfig::Concurrency { concurrency: 4 }.validate().is_ok());
    assert!(matches!(
        ThrottleConfig::Concurrency { concurrency: 0 }.validate(),
        Err(SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_rate_validation() {
    assert!(ThrottleConfig::Rate { requests_per_second: 2.5 }.validate().is_ok());
    for rate in [0.0, -2.0, f64::NAN, f64::INFINITY] {
        assert!(
            ThrottleConfig::Rate { requests_per_second: rate }.validate().is_err(),
            "rate {rate} should be rejected"
        );
    }
}

#[test]
fn test_from_json_concurrency() {
    let json = r#"{ "policy": "concurrency", "concurrency": 3 }"#;
    let config = ThrottleConfig::from_json_str(json).unwrap();
    assert_eq!(config, ThrottleConfig::Concurrency { concurrency: 3 });
}

#[test]
fn test_from_json_concurrency_defaults_to_one() {
    let json = r#"{ "policy": "concurrency" }"#;
    let config = ThrottleConfig::from_json_str(json).unwrap();
    assert_eq!(config, ThrottleConfig::Concurrency { concurrency: 1 });
}

#[test]
fn test_from_json_rate() {
    let json = r#"{ "policy": "rate", "requests_per_second": 2 }"#;
    let config = ThrottleConfig::from_json_str(json).unwrap();
    assert_eq!(config, ThrottleConfig::Rate { requests_per_second: 2.0 });
}

#[test]
fn test_from_json_rate_is_required() {
    let json = r#"{ "policy": "rate" }"#;
    assert!(ThrottleConfig::from_json_str(json).is_err());
}

#[test]
fn test_from_json_rejects_zero_rate() {
    let json = r#"{ "policy": "rate", "requests_per_second": 0 }"#;
    assert!(matches!(
        ThrottleConfig::from_json_str(json),
        Err(SchedulerError::InvalidConfig(_))
    ));
}

#[test]
fn test_json_round_trip_shape() {
    let value = serde_json::to_value(ThrottleConfig::Rate { requests_per_second: 4.0 }).unwrap();
    assert_eq!(value["policy"], "rate");
    assert_eq!(value["requests_per_second"], 4.0);
}

#[test]
fn test_from_lookup_prefers_rate() {
    let config = ThrottleConfig::from_lookup(lookup(&[
        (ENV_REQUESTS_PER_SECOND, "5"),
        (ENV_CONCURRENCY, "2"),
    ]))
    .unwrap();
    assert_eq!(config, ThrottleConfig::Rate { requests_per_second: 5.0 });
}

#[test]
fn test_from_lookup_concurrency() {
    let config = ThrottleConfig::from_lookup(lookup(&[(ENV_CONCURRENCY, " 8 ")])).unwrap();
    assert_eq!(config, ThrottleConfig::Concurrency { concurrency: 8 });
}

#[test]
fn test_from_lookup_empty_uses_default() {
    let config = ThrottleConfig::from_lookup(lookup(&[])).unwrap();
    assert_eq!(config, ThrottleConfig::default());
}

#[test]
fn test_from_lookup_rejects_garbage() {
    assert!(ThrottleConfig::from_lookup(lookup(&[(ENV_CONCURRENCY, "many")])).is_err());
    assert!(ThrottleConfig::from_lookup(lookup(&[(ENV_REQUESTS_PER_SECOND, "-1")])).is_err());
}

#[test]
fn test_build_gate_policy() {
    let gate = ThrottleConfig::Concurrency { concurrency: 2 }.build_gate().unwrap();
    assert_eq!(gate.failure_policy(), FailurePolicy::Isolate);

    let gate = ThrottleConfig::Rate { requests_per_second: 2.0 }.build_gate().unwrap();
    assert_eq!(gate.failure_policy(), FailurePolicy::FailFast);
}
