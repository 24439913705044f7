//! AwsGateway: Elasticsearch Service configuration API client.
//!
//! ```text
//! POST   /2015-01-01/es/domain          create
//! DELETE /2015-01-01/es/domain/{name}   delete
//! GET    /2015-01-01/es/domain/{name}   describe
//! POST   /2015-01-01/tags               add tags
//! ```

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use esbroker_core::BrokerConfig;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{GatewayError, GatewayResult};
use crate::gateway::ClusterGateway;
use crate::sigv4::{Credentials, Signer, amz_date, uri_encode};
use crate::types::{AddTagsRequest, ClusterDescription, CreateClusterRequest, DescribeDomainResponse, Tag};

const API_VERSION: &str = "2015-01-01";
const SERVICE: &str = "es";
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Error body returned by the provider.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "Message")]
    message: Option<String>,
    #[serde(default, rename = "__type")]
    kind: Option<String>,
}

/// Signed HTTPS client for one region.
pub struct AwsGateway {
    client: reqwest::Client,
    endpoint: Url,
    signer: Signer,
}

impl AwsGateway {
    /// Create a client for `region`, talking to `endpoint` if given and to
    /// `https://es.<region>.amazonaws.com` otherwise.
    pub fn new(region: &str, endpoint: Option<&str>, credentials: Credentials) -> GatewayResult<Self> {
        let endpoint = match endpoint {
            Some(e) => e.trim_end_matches('/').to_string(),
            None => format!("https://es.{region}.amazonaws.com"),
        };
        let endpoint = Url::parse(&endpoint)
            .map_err(|e| GatewayError::Transport(format!("invalid endpoint {endpoint}: {e}")))?;
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .user_agent(concat!("esbroker/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        debug!(%endpoint, region, "provider client created");
        Ok(Self {
            client,
            endpoint,
            signer: Signer::new(credentials, region, SERVICE),
        })
    }

    /// Build from the broker configuration and environment credentials.
    pub fn from_config(config: &BrokerConfig) -> GatewayResult<Self> {
        Self::new(
            &config.region,
            config.provider.endpoint.as_deref(),
            Credentials::from_env()?,
        )
    }

    fn domain_path(name: &str) -> String {
        format!("/{API_VERSION}/es/domain/{}", uri_encode(name, true))
    }

    /// Sign and send one request; returns the response body on 2xx.
    async fn send(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> GatewayResult<Vec<u8>> {
        let mut url = self.endpoint.clone();
        url.set_path(path);

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => return Err(GatewayError::Transport(format!("endpoint has no host: {url}"))),
        };
        let now = Utc::now();
        let payload = body.unwrap_or_default();

        let mut headers = vec![
            ("host".to_string(), host),
            ("x-amz-date".to_string(), amz_date(now)),
        ];
        if !payload.is_empty() {
            headers.push((CONTENT_TYPE.as_str().to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.signer.session_token() {
            headers.push(("x-amz-security-token".to_string(), token.to_string()));
        }
        let authorization =
            self.signer
                .authorization(method.as_str(), url.path(), "", &headers, &payload, now);

        let mut request = self.client.request(method.clone(), url.clone());
        for (name, value) in headers.iter().filter(|(name, _)| name != "host") {
            request = request.header(name.as_str(), value.as_str());
        }
        request = request.header(AUTHORIZATION, authorization);
        if !payload.is_empty() {
            request = request.body(payload);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        let error_type = response
            .headers()
            .get("x-amzn-errortype")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.split(':').next().unwrap_or(v).to_string());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if status.is_success() {
            debug!(%method, path, status = status.as_u16(), "provider call succeeded");
            return Ok(bytes.to_vec());
        }

        let err = classify(status.as_u16(), error_type, &bytes);
        warn!(%method, path, status = status.as_u16(), error = %err, "provider call failed");
        Err(err)
    }
}

/// Map an error response onto a `GatewayError`.
fn classify(status: u16, error_type: Option<String>, body: &[u8]) -> GatewayError {
    let parsed: ErrorBody = serde_json::from_slice(body).unwrap_or_default();
    let code = error_type
        .or(parsed.kind)
        .map(|c| c.rsplit('#').next().unwrap_or(&c).to_string())
        .unwrap_or_else(|| format!("HTTP{status}"));
    let message = parsed
        .message
        .unwrap_or_else(|| String::from_utf8_lossy(body).trim().to_string());

    if code == "ResourceAlreadyExistsException" {
        GatewayError::AlreadyExists(message)
    } else if code == "ResourceNotFoundException" {
        GatewayError::NotFound(message)
    } else if status == 429 || code.contains("Throttl") {
        GatewayError::Throttled(message)
    } else if status >= 500 {
        GatewayError::Service {
            status,
            code,
            message,
        }
    } else {
        GatewayError::Rejected { code, message }
    }
}

#[async_trait]
impl ClusterGateway for AwsGateway {
    async fn create_cluster(&self, request: &CreateClusterRequest) -> GatewayResult<()> {
        let body = serde_json::to_vec(request).map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.send(Method::POST, &format!("/{API_VERSION}/es/domain"), Some(body))
            .await?;
        Ok(())
    }

    async fn delete_cluster(&self, name: &str) -> GatewayResult<()> {
        self.send(Method::DELETE, &Self::domain_path(name), None).await?;
        Ok(())
    }

    async fn describe_cluster(&self, name: &str) -> GatewayResult<ClusterDescription> {
        let body = self.send(Method::GET, &Self::domain_path(name), None).await?;
        let response: DescribeDomainResponse =
            serde_json::from_slice(&body).map_err(|e| GatewayError::Decode(e.to_string()))?;
        Ok(response.domain_status.into())
    }

    async fn add_tag(&self, arn: &str, key: &str, value: &str) -> GatewayResult<()> {
        let request = AddTagsRequest {
            arn: arn.to_string(),
            tag_list: vec![Tag {
                key: key.to_string(),
                value: value.to_string(),
            }],
        };
        let body = serde_json::to_vec(&request).map_err(|e| GatewayError::Decode(e.to_string()))?;
        self.send(Method::POST, &format!("/{API_VERSION}/tags"), Some(body))
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_known_codes() {
        let err = classify(
            409,
            Some("ResourceAlreadyExistsException:http://internal.amazon.com/".to_string()),
            br#"{"message":"domain exists"}"#,
        );
        assert!(matches!(err, GatewayError::AlreadyExists(m) if m == "domain exists"));

        let err = classify(
            409,
            Some("ResourceNotFoundException".to_string()),
            br#"{"message":"Domain not found: nope"}"#,
        );
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn classify_by_status() {
        assert!(matches!(classify(429, None, b""), GatewayError::Throttled(_)));
        assert!(matches!(
            classify(503, None, b"unavailable"),
            GatewayError::Service { status: 503, .. }
        ));
        let err = classify(
            400,
            Some("ValidationException".to_string()),
            br#"{"Message":"bad volume"}"#,
        );
        assert_eq!(err.to_string(), "ValidationException: bad volume");
    }

    #[test]
    fn domain_path_encodes_name() {
        assert_eq!(AwsGateway::domain_path("dev-1234abcd"), "/2015-01-01/es/domain/dev-1234abcd");
        assert_eq!(AwsGateway::domain_path("a/b"), "/2015-01-01/es/domain/a%2Fb");
    }

    #[test]
    fn default_endpoint_uses_region() {
        let gateway = AwsGateway::new(
            "us-west-2",
            None,
            Credentials {
                access_key_id: "AKID".into(),
                secret_access_key: "secret".into(),
                session_token: None,
            },
        )
        .unwrap();
        assert_eq!(gateway.endpoint.as_str(), "https://es.us-west-2.amazonaws.com/");
    }
}
