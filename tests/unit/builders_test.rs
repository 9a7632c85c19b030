//! Tests for builder modules

use std::sync::Arc;

use prometheus_throttle::builders::SchedulerBuilder;
use prometheus_throttle::config::ThrottleConfig;
use prometheus_throttle::core::{EventKind, FailurePolicy, InMemoryEventSink, Scheduler};
use prometheus_throttle::runtime::TokioSpawner;

#[test]
fn test_builder_keeps_config() {
    let builder = SchedulerBuilder::new(ThrottleConfig::Concurrency { concurrency: 5 });
    assert_eq!(
        builder.config(),
        &ThrottleConfig::Concurrency { concurrency: 5 }
    );
}

#[tokio::test]
async fn test_builder_rejects_invalid_config() {
    let result: Result<Scheduler<u32, String, TokioSpawner>, _> =
        SchedulerBuilder::new(ThrottleConfig::Rate { requests_per_second: 0.0 })
            .build(TokioSpawner::current());
    assert!(result.is_err());
}

#[tokio::test]
async fn test_builder_wires_event_sink() {
    let sink = InMemoryEventSink::new(16);
    let scheduler: Scheduler<u32, String, TokioSpawner> =
        SchedulerBuilder::new(ThrottleConfig::Rate { requests_per_second: 100.0 })
            .with_event_sink(Arc::new(sink.clone()))
            .build(TokioSpawner::current())
            .unwrap();
    assert_eq!(scheduler.failure_policy(), FailurePolicy::FailFast);

    let handle = scheduler.submit(|| async { Ok(1) });
    assert_eq!(handle.await.unwrap(), 1);

    let kinds: Vec<EventKind> = sink.events().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![EventKind::Queued, EventKind::Dispatched, EventKind::Fulfilled]
    );
}
