//! Tests for error types

use prometheus_throttle::core::{SchedulerError, TaskError};

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("concurrency must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: concurrency must be greater than 0"
    );
}

#[test]
fn test_empty_queue_error() {
    let err = SchedulerError::EmptyQueue;
    assert_eq!(format!("{}", err), "queue is empty");
}

#[test]
fn test_task_failed_error() {
    let err: TaskError<String> = TaskError::Failed("connection refused".to_string());
    assert_eq!(format!("{}", err), "task failed: connection refused");
    assert!(!err.is_abandoned());
    assert_eq!(err.into_failure().as_deref(), Some("connection refused"));
}

#[test]
fn test_task_panicked_error() {
    let err: TaskError<String> = TaskError::Panicked("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "task panicked: index out of bounds");
    assert!(err.into_failure().is_none());
}

#[test]
fn test_task_abandoned_error() {
    let err: TaskError<String> = TaskError::Abandoned;
    assert_eq!(format!("{}", err), "task abandoned before dispatch");
    assert!(err.is_abandoned());
}
