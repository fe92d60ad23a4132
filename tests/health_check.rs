//! Health checking against live and unreachable backends.

mod common;

use std::time::Duration;

use common::{client, closed_port, get, start_balancer, start_mock_backend};

#[tokio::test]
async fn test_dead_replica_is_skipped() {
    let live = start_mock_backend("live").await;
    let dead = closed_port().await;

    let balancer = start_balancer(&format!(
        r#"
[health_check]
interval_secs = 1
timeout_secs = 1

[[services]]
name = "api"
matcher = "/"
replicas = [
    {{ url = "http://{dead}" }},
    {{ url = "http://{live}" }},
]
"#
    ))
    .await;

    // The first probe round runs immediately.
    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = client();
    for _ in 0..4 {
        let (status, body) = get(&client, &balancer.url("/")).await;
        assert_eq!(status, 200);
        assert_eq!(body, "live");
    }

    balancer.stop().await;
}

#[tokio::test]
async fn test_all_dead_is_service_unavailable() {
    let live = start_mock_backend("live").await;
    let dead_a = closed_port().await;
    let dead_b = closed_port().await;

    let balancer = start_balancer(&format!(
        r#"
[health_check]
interval_secs = 1
timeout_secs = 1

[[services]]
name = "down"
matcher = "/down"
replicas = [
    {{ url = "http://{dead_a}" }},
    {{ url = "http://{dead_b}" }},
]

[[services]]
name = "up"
matcher = "/up"
replicas = [{{ url = "http://{live}" }}]
"#
    ))
    .await;

    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = client();
    for _ in 0..3 {
        assert_eq!(get(&client, &balancer.url("/down/x")).await.0, 503);
    }
    assert_eq!(get(&client, &balancer.url("/up/x")).await.0, 200);

    balancer.stop().await;
}

#[tokio::test]
async fn test_unchecked_service_keeps_dead_replica() {
    let live = start_mock_backend("live").await;
    let dead = closed_port().await;

    let balancer = start_balancer(&format!(
        r#"
[health_check]
interval_secs = 1

[[services]]
name = "api"
matcher = "/"
health_check = false
replicas = [
    {{ url = "http://{dead}" }},
    {{ url = "http://{live}" }},
]
"#
    ))
    .await;

    tokio::time::sleep(Duration::from_millis(500)).await;

    let client = client();
    let (first, _) = get(&client, &balancer.url("/")).await;
    let (second, body) = get(&client, &balancer.url("/")).await;
    assert_eq!(first, 502);
    assert_eq!(second, 200);
    assert_eq!(body, "live");

    balancer.stop().await;
}
