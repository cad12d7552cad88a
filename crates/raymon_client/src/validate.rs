use crate::client::{build_http_client, error_name};
use raymon_error::error::SetupError;
use raymon_settings::config::ClusterEndpoint;
use reqwest::StatusCode;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidatedInput {
    pub title: String,
}

/// Check that the dashboard behind `endpoint` answers the summary request.
///
/// Issues a single GET with no retries. The client lives only for this call
/// and is dropped on every exit path.
pub async fn validate_input(
    endpoint: &ClusterEndpoint,
    timeout: Duration,
) -> Result<ValidatedInput, SetupError> {
    let client = build_http_client(timeout).map_err(|e| SetupError::Unknown {
        name: "ClientError".to_string(),
        message: e.to_string(),
    })?;

    let url = endpoint.summary_url();
    debug!("Validating Ray dashboard at {}", url);

    let response = client.get(&url).send().await.map_err(|e| {
        let name = error_name(&e);
        error!("Unexpected error {}: {}", name, e);
        SetupError::Unknown {
            name: name.to_string(),
            message: e.to_string(),
        }
    })?;

    let status = response.status();
    if status != StatusCode::OK {
        let body = response.text().await.unwrap_or_default();
        return Err(SetupError::CannotConnect {
            status: status.as_u16(),
            body,
        });
    }

    Ok(ValidatedInput {
        title: endpoint.title(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn endpoint_for(server: &mockito::ServerGuard) -> ClusterEndpoint {
        let addr = server.host_with_port();
        let (host, port) = addr.rsplit_once(':').unwrap();
        ClusterEndpoint::new(host, port.parse().unwrap(), 30)
    }

    #[tokio::test]
    async fn test_validate_success() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex(r"^/nodes".to_string()))
            .match_query(Matcher::UrlEncoded("view".into(), "summary".into()))
            .with_status(200)
            .with_body(r#"{"data": {"summary": [{"hostname": "head"}]}}"#)
            .expect(1)
            .create_async()
            .await;

        let endpoint = endpoint_for(&server);
        let info = validate_input(&endpoint, Duration::from_secs(5))
            .await
            .unwrap();

        assert_eq!(info.title, format!("Ray {}", endpoint.host));
        assert!(info.title.contains(&endpoint.host));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_validate_bad_status() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", Matcher::Regex(r"^/nodes".to_string()))
            .with_status(404)
            .with_body("no such route")
            .create_async()
            .await;

        let endpoint = endpoint_for(&server);
        let err = validate_input(&endpoint, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "cannot_connect");
        assert!(err.to_string().contains("no such route"));
        assert!(err.to_string().contains("404"));
    }

    #[tokio::test]
    async fn test_validate_unreachable() {
        let endpoint = ClusterEndpoint::new("127.0.0.1", 1, 30);
        let err = validate_input(&endpoint, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), "unknown");
    }
}
