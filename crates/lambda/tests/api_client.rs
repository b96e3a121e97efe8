//! Integration tests for the Lambda Cloud HTTP client.
//!
//! These run `LambdaClient` against a local mock server and pin the wire
//! contract: authentication header, request bodies, response envelopes, and
//! the error taxonomy.

use lambda::api::models::LaunchRequest;
use lambda::{ApiError, InstanceApi, LambdaClient};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Helpers
// =============================================================================

const API_KEY: &str = "secret_test_key";

async fn client_for(server: &MockServer) -> LambdaClient {
    LambdaClient::with_base_url(API_KEY, server.uri()).expect("client should build")
}

fn instance_types_body() -> serde_json::Value {
    json!({
        "data": {
            "gpu_1x_a100": {
                "instance_type": {
                    "name": "gpu_1x_a100",
                    "description": "1x A100 (40 GB PCIe)",
                    "gpu_description": "A100 (40 GB PCIe)",
                    "price_cents_per_hour": 129,
                    "specs": {"gpus": 1, "vcpus": 30, "memory_gib": 200, "storage_gib": 512}
                },
                "regions_with_capacity_available": [
                    {"name": "us-south-1", "description": "Texas, USA"},
                    {"name": "us-east-1", "description": "Virginia, USA"}
                ]
            },
            "gpu_8x_h100_sxm5": {
                "instance_type": {
                    "name": "gpu_8x_h100_sxm5",
                    "description": "8x H100 (80 GB SXM5)",
                    "gpu_description": "H100 (80 GB SXM5)",
                    "price_cents_per_hour": 2792,
                    "specs": {"gpus": 8, "vcpus": 208, "memory_gib": 1800, "storage_gib": 26000}
                },
                "regions_with_capacity_available": []
            }
        }
    })
}

// =============================================================================
// Catalog and listings
// =============================================================================

#[tokio::test]
async fn test_instance_types_sends_bearer_auth_and_decodes() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instance-types"))
        .and(header("Authorization", format!("Bearer {API_KEY}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(instance_types_body()))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let data = client.instance_types().await.unwrap();

    assert_eq!(data.len(), 2);
    let entry = &data["gpu_1x_a100"];
    assert_eq!(entry.instance_type.price_cents_per_hour, 129);
    assert!(entry.is_available());

    // Region order must survive the trip; the first listed region is the
    // fallback launch target.
    let names: Vec<&str> = entry
        .regions_with_capacity_available
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(names, vec!["us-south-1", "us-east-1"]);

    assert!(!data["gpu_8x_h100_sxm5"].is_available());
}

#[tokio::test]
async fn test_list_instances_decodes_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {
                    "id": "inst-aaa",
                    "name": "trainer",
                    "status": "active",
                    "ip": "203.0.113.7",
                    "ssh_key_names": ["work"],
                    "region": {"name": "us-east-1", "description": "Virginia, USA"},
                    "instance_type": {
                        "name": "gpu_1x_a100",
                        "description": "1x A100 (40 GB PCIe)",
                        "price_cents_per_hour": 129
                    }
                },
                {"id": "inst-bbb", "status": "some_future_state"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let instances = client.list_instances().await.unwrap();

    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0].status, lambda::InstanceStatus::Active);
    assert_eq!(instances[0].ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(instances[1].status, lambda::InstanceStatus::Unknown);
}

#[tokio::test]
async fn test_ssh_keys_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/ssh-keys"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": "key-1", "name": "work", "public_key": "ssh-ed25519 AAAA..."},
                {"id": "key-2", "name": "laptop"}
            ]
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let keys = client.ssh_keys().await.unwrap();

    assert_eq!(keys.len(), 2);
    assert_eq!(keys[0].name, "work");
    assert!(keys[1].public_key.is_none());
}

// =============================================================================
// Launch
// =============================================================================

#[tokio::test]
async fn test_launch_posts_exact_body_without_name() {
    let server = MockServer::start().await;

    // Exact-body matcher: proves `name` is omitted and `file_system_names`
    // is sent even when empty.
    Mock::given(method("POST"))
        .and(path("/instance-operations/launch"))
        .and(body_json(json!({
            "region_name": "us-east-1",
            "instance_type_name": "gpu_1x_a100",
            "ssh_key_names": ["work"],
            "file_system_names": [],
            "quantity": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"instance_ids": ["inst-new-1"]}
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let req = LaunchRequest {
        region_name: "us-east-1".to_string(),
        instance_type_name: "gpu_1x_a100".to_string(),
        ssh_key_names: vec!["work".to_string()],
        file_system_names: Vec::new(),
        quantity: 1,
        name: None,
    };

    let ids = client.launch(&req).await.unwrap();
    assert_eq!(ids, vec!["inst-new-1".to_string()]);
}

#[tokio::test]
async fn test_launch_includes_name_when_set() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance-operations/launch"))
        .and(body_json(json!({
            "region_name": "us-west-2",
            "instance_type_name": "gpu_1x_a100",
            "ssh_key_names": ["work"],
            "file_system_names": ["shared-fs"],
            "quantity": 2,
            "name": "batch-workers"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"instance_ids": ["inst-1", "inst-2"]}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let req = LaunchRequest {
        region_name: "us-west-2".to_string(),
        instance_type_name: "gpu_1x_a100".to_string(),
        ssh_key_names: vec!["work".to_string()],
        file_system_names: vec!["shared-fs".to_string()],
        quantity: 2,
        name: Some("batch-workers".to_string()),
    };

    let ids = client.launch(&req).await.unwrap();
    assert_eq!(ids.len(), 2);
}

// =============================================================================
// Terminate
// =============================================================================

#[tokio::test]
async fn test_terminate_returns_confirmed_subset() {
    let server = MockServer::start().await;

    // Three requested, two confirmed. The client must report what the
    // platform says, not what was asked.
    Mock::given(method("POST"))
        .and(path("/instance-operations/terminate"))
        .and(body_json(json!({"instance_ids": ["a", "b", "c"]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "terminated_instances": [
                    {"id": "a", "status": "terminating"},
                    {"id": "c", "status": "terminating"}
                ]
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let ids = vec!["a".to_string(), "b".to_string(), "c".to_string()];
    let confirmed = client.terminate(&ids).await.unwrap();

    let confirmed_ids: Vec<&str> = confirmed.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(confirmed_ids, vec!["a", "c"]);
}

// =============================================================================
// Error handling
// =============================================================================

#[tokio::test]
async fn test_error_envelope_surfaces_message_and_suggestion() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/instance-operations/launch"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {
                "code": "instance-operations/launch/insufficient-capacity",
                "message": "Not enough capacity to fulfill launch request",
                "suggestion": "Try again later or use a different region"
            }
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let req = LaunchRequest {
        region_name: "us-east-1".to_string(),
        instance_type_name: "gpu_1x_a100".to_string(),
        ssh_key_names: vec!["work".to_string()],
        file_system_names: Vec::new(),
        quantity: 1,
        name: None,
    };

    let err = client.launch(&req).await.unwrap_err();
    match err {
        ApiError::Api {
            status,
            message,
            suggestion,
        } => {
            assert_eq!(status, 400);
            assert_eq!(message, "Not enough capacity to fulfill launch request");
            assert_eq!(
                suggestion.as_deref(),
                Some("Try again later or use a different region")
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {"message": "Forbidden"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.list_instances().await.unwrap_err();
    assert!(matches!(err, ApiError::Auth { .. }));
}

#[tokio::test]
async fn test_malformed_success_body_is_serialization_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/instances"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = client_for(&server).await;
    let err = client.list_instances().await.unwrap_err();
    assert!(matches!(err, ApiError::Serialization(_)));
}
