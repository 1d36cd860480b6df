//! Provider and consumer over real sockets.

use std::time::Duration;

use cloud_resilience::resilience::circuit_breaker::CircuitState;
use cloud_resilience::{App, Shutdown};
use reqwest::StatusCode;

mod common;

#[tokio::test]
async fn test_provider_answers_directly() {
    let shutdown = Shutdown::new();
    let provider = common::spawn_app(App::Provider, &common::test_config(), &shutdown).await;

    let (status, body) = common::get(provider, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi, this is from open feign provider");

    let (status, body) = common::get(provider, "/fail").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, "hi, this is from open feign provider with fail");

    shutdown.trigger();
}

#[tokio::test]
async fn test_consumer_proxies_and_falls_back() {
    let shutdown = Shutdown::new();
    let (_provider, consumer) =
        common::spawn_provider_and_consumer(common::test_config(), &shutdown).await;

    let (status, body) = common::get(consumer, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi, this is from open feign provider");

    let (status, body) = common::get(consumer, "/fail").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi, this is from open feign customer call back, sayHiWithFail");

    shutdown.trigger();
}

#[tokio::test]
async fn test_slow_provider_falls_back_after_read_timeout() {
    let shutdown = Shutdown::new();
    let (_provider, consumer) =
        common::spawn_provider_and_consumer(common::test_config(), &shutdown).await;

    let started = std::time::Instant::now();
    let (status, body) = common::get(consumer, "/sleep").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi, this is from open feign customer call back, sayHiWithSleep");
    // provider sleeps 2s, consumer gives up after 500ms
    assert!(started.elapsed() < Duration::from_secs(2));

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_provider_falls_back() {
    let shutdown = Shutdown::new();
    let mut config = common::test_config();
    config.consumer.provider.instances = vec![common::closed_addr().await.to_string()];
    let consumer = common::spawn_app(App::Consumer, &config, &shutdown).await;

    let (status, body) = common::get(consumer, "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "hi, this is from open feign customer call back, sayHi");

    shutdown.trigger();
}

#[tokio::test]
async fn test_request_id_is_generated_and_kept() {
    let shutdown = Shutdown::new();
    let provider = common::spawn_app(App::Provider, &common::test_config(), &shutdown).await;
    let client = reqwest::Client::new();

    let generated = client.get(format!("http://{provider}/")).send().await.unwrap();
    let id = generated.headers()["x-request-id"].to_str().unwrap().to_string();
    assert!(uuid::Uuid::parse_str(&id).is_ok());

    let kept = client
        .get(format!("http://{provider}/"))
        .header("x-request-id", "trace-me")
        .send()
        .await
        .unwrap();
    assert_eq!(kept.headers()["x-request-id"], "trace-me");

    shutdown.trigger();
}

#[tokio::test]
async fn test_failing_endpoint_does_not_degrade_the_others() {
    use cloud_resilience::consumer::{ProviderClient, ProviderOperation};

    let shutdown = Shutdown::new();
    let mut config = common::test_config();
    let provider = common::spawn_app(App::Provider, &config, &shutdown).await;
    config.consumer.provider.instances = vec![provider.to_string()];
    config.consumer.circuit_breaker.sliding_window_size = 4;
    config.consumer.circuit_breaker.minimum_number_of_calls = 4;

    let client = ProviderClient::from_config(&config.consumer);
    for _ in 0..4 {
        client.say_hi_with_fail(None).await;
    }
    assert_eq!(
        client.circuit_breaker(ProviderOperation::SayHiWithFail).state(),
        CircuitState::Open
    );

    assert_eq!(client.say_hi(None).await, "hi, this is from open feign provider");
    assert_eq!(
        client.circuit_breaker(ProviderOperation::SayHi).state(),
        CircuitState::Closed
    );

    shutdown.trigger();
}
