use raymon_error::error::{ClientError, PollError};
use raymon_settings::config::ClusterEndpoint;
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Create the HTTP client used for dashboard requests.
///
/// The returned client pools connections; keep one per cluster for as long
/// as the cluster is being polled.
pub fn build_http_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ClientError::Error(format!("Failed to create client with error: {}", e)))
}

/// Short, stable name for a transport failure, used in logs and form errors.
pub fn error_name(err: &reqwest::Error) -> &'static str {
    if err.is_timeout() {
        "TimeoutError"
    } else if err.is_connect() {
        "ConnectError"
    } else if err.is_decode() {
        "DecodeError"
    } else if err.is_body() {
        "BodyError"
    } else if err.is_builder() {
        "InvalidUrl"
    } else {
        "RequestError"
    }
}

#[derive(Debug, Clone)]
pub struct RayDashboardClient {
    client: Client,
    url: String,
}

impl RayDashboardClient {
    pub fn new(endpoint: &ClusterEndpoint, client: &Client) -> Self {
        Self {
            client: client.clone(),
            url: endpoint.summary_url(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch `data.summary` from the dashboard.
    ///
    /// Entries are returned unparsed; deciding what a usable node looks like
    /// is left to the caller.
    pub async fn fetch_summary(&self) -> Result<Vec<Value>, PollError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| PollError::Transport(format!("{}: {}", error_name(&e), e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PollError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut body = response
            .json::<Value>()
            .await
            .map_err(|e| PollError::Decode(e.to_string()))?;

        match body.pointer_mut("/data/summary").map(Value::take) {
            Some(Value::Array(entries)) => Ok(entries),
            Some(other) => Err(PollError::Decode(format!(
                "data.summary is not an array: {}",
                other
            ))),
            None => Err(PollError::Decode(
                "response has no data.summary field".to_string(),
            )),
        }
    }
}
