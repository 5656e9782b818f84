//! Tests for the engine client and endpoint registry against a mock server.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{body_json_string, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::client::{EngineClient, EngineConfig};
use crate::endpoints::EndpointRegistry;
use crate::error::EngineError;
use crate::signing::CallbackSigner;
use crate::types::{EncodeJob, EncodeTask, DEFAULT_JOB_PRIORITY};
use crate::EncodingEngine;

fn test_client(server: &MockServer) -> EngineClient {
    EngineClient::new(EngineConfig {
        api_url: server.uri(),
        api_key: "test-key".to_string(),
        timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
    })
    .expect("create client")
}

fn test_signer() -> CallbackSigner {
    use base64::{engine::general_purpose::STANDARD, Engine};
    CallbackSigner::from_base64(&STANDARD.encode(vec![9u8; 64])).expect("valid key")
}

fn endpoint_json(id: &str, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "endpointUrl": "https://hooks.example.com/encode"
    })
}

#[tokio::test]
async fn create_asset_parses_engine_response() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/assets"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": "asset-1",
            "name": "My Clip",
            "alternateId": null
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let asset = client
        .create_asset("My Clip", "https://bucket.example.com/clip.mp4?sig=x")
        .await
        .expect("create asset");

    assert_eq!(asset.id, "asset-1");
    assert_eq!(asset.name, "My Clip");
    assert!(asset.alternate_id.is_none());
}

#[tokio::test]
async fn update_asset_alternate_id_patches() {
    let server = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path("/v1/assets/asset-1"))
        .and(body_json_string(r#"{"alternateId":"abc123"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "asset-1",
            "name": "My Clip",
            "alternateId": "abc123"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let asset = client
        .update_asset_alternate_id("asset-1", "abc123")
        .await
        .expect("update asset");

    assert_eq!(asset.alternate_id.as_deref(), Some("abc123"));
}

#[tokio::test]
async fn submit_job_returns_acceptance() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({
            "id": "job-1",
            "name": "Encode clip.mp4",
            "state": "Queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut job = EncodeJob::new("Encode clip.mp4");
    job.add_task(EncodeTask::new("H264 Adaptive", DEFAULT_JOB_PRIORITY));

    let submitted = client.submit_job(&job).await.expect("submit job");
    assert_eq!(submitted.id, "job-1");
    assert_eq!(submitted.state, "Queued");
}

#[tokio::test]
async fn submit_job_rejection_is_not_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/jobs"))
        .respond_with(ResponseTemplate::new(422).set_body_string("preset unknown"))
        .mount(&server)
        .await;

    let client = test_client(&server);
    let mut job = EncodeJob::new("Encode clip.mp4");
    job.add_task(EncodeTask::new("No Such Preset", DEFAULT_JOB_PRIORITY));

    let err = client.submit_job(&job).await.unwrap_err();
    assert!(matches!(err, EngineError::SubmissionRejected(_)));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn registry_reuses_existing_endpoint_without_creating() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpoints": [endpoint_json("ep-1", "encode-complete")]
        })))
        .mount(&server)
        .await;

    // Creation must never happen when the endpoint exists.
    Mock::given(method("POST"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let registry = EndpointRegistry::new(Arc::new(test_client(&server)));

    let first = registry
        .get_or_create("encode-complete", "https://hooks.example.com/encode", &test_signer())
        .await
        .expect("get endpoint");
    let second = registry
        .get_or_create("encode-complete", "https://hooks.example.com/encode", &test_signer())
        .await
        .expect("get endpoint again");

    assert_eq!(first.id, "ep-1");
    assert_eq!(first, second);
}

#[tokio::test]
async fn registry_creates_endpoint_when_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "endpoints": [] })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(
            ResponseTemplate::new(201).set_body_json(endpoint_json("ep-new", "encode-complete")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let registry = EndpointRegistry::new(Arc::new(test_client(&server)));
    let endpoint = registry
        .get_or_create("encode-complete", "https://hooks.example.com/encode", &test_signer())
        .await
        .expect("create endpoint");

    assert_eq!(endpoint.id, "ep-new");
}

#[tokio::test]
async fn registry_adopts_concurrently_created_endpoint() {
    let server = MockServer::start().await;

    // First lookup sees nothing; the re-list after the failed create sees
    // the endpoint the concurrent winner provisioned.
    Mock::given(method("GET"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "endpoints": [] })))
        .up_to_n_times(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "endpoints": [endpoint_json("ep-winner", "encode-complete")]
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate name"))
        .mount(&server)
        .await;

    let registry = EndpointRegistry::new(Arc::new(test_client(&server)));
    let endpoint = registry
        .get_or_create("encode-complete", "https://hooks.example.com/encode", &test_signer())
        .await
        .expect("adopt winner's endpoint");

    assert_eq!(endpoint.id, "ep-winner");
}

#[tokio::test]
async fn registry_surfaces_invalid_url_before_any_create() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "endpoints": [] })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/notification-endpoints"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let registry = EndpointRegistry::new(Arc::new(test_client(&server)));
    let err = registry
        .get_or_create("encode-complete", "not a url", &test_signer())
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidEndpoint { .. }));
    assert!(err.to_string().contains("not a url"));
}
