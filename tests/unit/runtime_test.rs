//! Tests for tokio spawner utilities

use std::time::Duration;

use prometheus_throttle::core::Spawn;
use prometheus_throttle::runtime::tokio_spawner::TokioSpawner;

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_spawner_spawn() {
    let spawner = TokioSpawner::new(tokio::runtime::Handle::current());

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        tx.send(123).unwrap();
    });

    let result = rx.await.expect("oneshot result");
    assert_eq!(result, 123);
}

#[tokio::test(start_paused = true)]
async fn test_tokio_spawner_spawn_after() {
    let spawner = TokioSpawner::current();
    let start = tokio::time::Instant::now();

    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn_after(Duration::from_millis(250), async move {
        tx.send(start.elapsed()).unwrap();
    });

    let elapsed = rx.await.expect("oneshot result");
    assert!(elapsed >= Duration::from_millis(250));
    assert!(elapsed < Duration::from_millis(300));
}
