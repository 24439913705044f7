//! AwsGateway against a local fake of the configuration API.
//!
//! The fake checks that each request is signed and answers the way the
//! provider does: PascalCase JSON, errors named in `x-amzn-ErrorType`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use esbroker_gateway::{
    AwsGateway, ClusterConfig, ClusterGateway, CreateClusterRequest, Credentials, EbsOptions,
    GatewayError, VpcOptions,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct Fake {
    domains: Arc<Mutex<HashMap<String, Value>>>,
    tags: Arc<Mutex<Vec<Value>>>,
}

fn signed(headers: &HeaderMap) -> bool {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    auth.starts_with("AWS4-HMAC-SHA256 Credential=AKIDTEST/")
        && auth.contains("/us-west-2/es/aws4_request")
        && headers.contains_key("x-amz-date")
}

fn provider_error(status: StatusCode, kind: &str, message: &str) -> Response {
    (
        status,
        [("x-amzn-errortype", kind.to_string())],
        Json(json!({ "message": message })),
    )
        .into_response()
}

async fn create(State(fake): State<Fake>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !signed(&headers) {
        return provider_error(StatusCode::FORBIDDEN, "MissingAuthenticationToken", "unsigned");
    }
    let name = body["DomainName"].as_str().unwrap_or_default().to_string();
    let mut domains = fake.domains.lock().unwrap();
    if domains.contains_key(&name) {
        return provider_error(
            StatusCode::CONFLICT,
            "ResourceAlreadyExistsException",
            &format!("domain {name} already exists"),
        );
    }
    domains.insert(name.clone(), body);
    Json(json!({ "DomainStatus": { "DomainName": name, "Processing": true } })).into_response()
}

async fn describe(State(fake): State<Fake>, headers: HeaderMap, Path(name): Path<String>) -> Response {
    if !signed(&headers) {
        return provider_error(StatusCode::FORBIDDEN, "MissingAuthenticationToken", "unsigned");
    }
    match fake.domains.lock().unwrap().get(&name) {
        Some(_) => Json(json!({
            "DomainStatus": {
                "DomainName": name,
                "Processing": false,
                "Endpoints": { "vpc": format!("vpc-{name}.us-west-2.es.amazonaws.com") }
            }
        }))
        .into_response(),
        None => provider_error(
            StatusCode::CONFLICT,
            "ResourceNotFoundException",
            &format!("Domain not found: {name}"),
        ),
    }
}

async fn delete(State(fake): State<Fake>, headers: HeaderMap, Path(name): Path<String>) -> Response {
    if !signed(&headers) {
        return provider_error(StatusCode::FORBIDDEN, "MissingAuthenticationToken", "unsigned");
    }
    match fake.domains.lock().unwrap().remove(&name) {
        Some(_) => Json(json!({ "DomainStatus": { "DomainName": name, "Deleted": true } }))
            .into_response(),
        None => provider_error(
            StatusCode::CONFLICT,
            "ResourceNotFoundException",
            &format!("Domain not found: {name}"),
        ),
    }
}

async fn add_tags(State(fake): State<Fake>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !signed(&headers) {
        return provider_error(StatusCode::FORBIDDEN, "MissingAuthenticationToken", "unsigned");
    }
    fake.tags.lock().unwrap().push(body);
    StatusCode::OK.into_response()
}

async fn unavailable() -> Response {
    provider_error(StatusCode::SERVICE_UNAVAILABLE, "InternalException", "try later")
}

async fn start_fake() -> (Fake, String) {
    let fake = Fake::default();
    let app = Router::new()
        .route("/2015-01-01/es/domain", post(create))
        .route("/2015-01-01/es/domain/{name}", get(describe).delete(delete))
        .route("/2015-01-01/tags", post(add_tags))
        .with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (fake, format!("http://{addr}"))
}

fn credentials() -> Credentials {
    Credentials {
        access_key_id: "AKIDTEST".into(),
        secret_access_key: "secret".into(),
        session_token: None,
    }
}

fn request(name: &str) -> CreateClusterRequest {
    CreateClusterRequest {
        domain_name: name.to_string(),
        elasticsearch_version: "6.2".into(),
        access_policies: "{}".into(),
        ebs_options: EbsOptions {
            ebs_enabled: true,
            volume_size: 10,
            volume_type: "gp2".into(),
        },
        elasticsearch_cluster_config: ClusterConfig {
            dedicated_master_enabled: false,
            dedicated_master_count: None,
            dedicated_master_type: None,
            instance_count: 1,
            instance_type: "t2.small.elasticsearch".into(),
            zone_awareness_enabled: false,
        },
        encryption_at_rest_options: None,
        vpc_options: VpcOptions {
            subnet_ids: vec!["subnet-b".into()],
            security_group_ids: vec!["sg-1".into()],
        },
    }
}

#[tokio::test]
async fn full_lifecycle_against_fake() {
    let (fake, endpoint) = start_fake().await;
    let gateway = AwsGateway::new("us-west-2", Some(&endpoint), credentials()).unwrap();

    gateway.create_cluster(&request("dev-1234abcd")).await.unwrap();
    {
        let domains = fake.domains.lock().unwrap();
        let body = &domains["dev-1234abcd"];
        assert_eq!(body["VPCOptions"]["SubnetIds"][0], "subnet-b");
        assert_eq!(body["EBSOptions"]["VolumeSize"], 10);
    }

    let description = gateway.describe_cluster("dev-1234abcd").await.unwrap();
    assert_eq!(
        description.vpc_endpoint.as_deref(),
        Some("vpc-dev-1234abcd.us-west-2.es.amazonaws.com")
    );

    gateway
        .add_tag(
            "arn:aws:es:us-west-2:123456789012:domain/dev-1234abcd",
            "team",
            "search",
        )
        .await
        .unwrap();
    let tags = fake.tags.lock().unwrap().clone();
    assert_eq!(tags[0]["ARN"], "arn:aws:es:us-west-2:123456789012:domain/dev-1234abcd");
    assert_eq!(tags[0]["TagList"][0]["Key"], "team");

    gateway.delete_cluster("dev-1234abcd").await.unwrap();
    assert!(fake.domains.lock().unwrap().is_empty());
}

#[tokio::test]
async fn provider_errors_are_classified() {
    let (_fake, endpoint) = start_fake().await;
    let gateway = AwsGateway::new("us-west-2", Some(&endpoint), credentials()).unwrap();

    gateway.create_cluster(&request("dev-1")).await.unwrap();
    let err = gateway.create_cluster(&request("dev-1")).await.unwrap_err();
    assert!(matches!(err, GatewayError::AlreadyExists(_)));

    let err = gateway.describe_cluster("missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(m) if m.contains("missing")));

    let err = gateway.delete_cluster("missing").await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound(_)));
}

#[tokio::test]
async fn server_errors_are_transient() {
    let app = Router::new().fallback(unavailable);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let gateway =
        AwsGateway::new("us-west-2", Some(&format!("http://{addr}")), credentials()).unwrap();
    let err = gateway.describe_cluster("dev-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Service { status: 503, .. }));
    assert!(err.is_transient());
}

#[tokio::test]
async fn unreachable_endpoint_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let gateway =
        AwsGateway::new("us-west-2", Some(&format!("http://{addr}")), credentials()).unwrap();
    let err = gateway.describe_cluster("dev-1").await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}
