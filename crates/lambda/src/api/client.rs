//! Lambda Cloud HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use super::models::{
    ApiResponse, Instance, InstanceTypesData, LaunchData, LaunchRequest, SshKey, TerminateData,
    TerminateRequest,
};
use super::InstanceApi;
use crate::error::ApiError;

/// Base URL for the Lambda Cloud API.
const API_BASE_URL: &str = "https://cloud.lambda.ai/api/v1";

/// Default timeout for API requests.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Lambda Cloud API client.
#[derive(Clone)]
pub struct LambdaClient {
    /// HTTP client.
    client: Client,
    /// API key for authentication.
    api_key: String,
    /// API base URL.
    base_url: String,
}

impl LambdaClient {
    /// Create a new client against the production API.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Self::with_base_url(api_key, API_BASE_URL)
    }

    /// Create a client against a different base URL. Lets tests point the
    /// client at a local server.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: base_url.into(),
        })
    }

    /// Make an authenticated GET request.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "GET request");

        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Make an authenticated POST request.
    async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: serde::de::DeserializeOwned,
        B: serde::Serialize,
    {
        let url = format!("{}{path}", self.base_url);
        debug!(url = %url, "POST request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Handle an API response, parsing JSON or the error envelope.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            serde_json::from_str(&text).map_err(|e| {
                warn!(error = %e, body = %text, "Failed to parse response");
                ApiError::Serialization(e)
            })
        } else {
            Err(ApiError::from_response(status.as_u16(), &text))
        }
    }
}

#[async_trait]
impl InstanceApi for LambdaClient {
    async fn instance_types(&self) -> Result<InstanceTypesData, ApiError> {
        let response: ApiResponse<InstanceTypesData> = self.get("/instance-types").await?;
        Ok(response.data)
    }

    async fn list_instances(&self) -> Result<Vec<Instance>, ApiError> {
        let response: ApiResponse<Vec<Instance>> = self.get("/instances").await?;
        Ok(response.data)
    }

    async fn launch(&self, req: &LaunchRequest) -> Result<Vec<String>, ApiError> {
        info!(
            instance_type = %req.instance_type_name,
            region = %req.region_name,
            quantity = req.quantity,
            "Launching instances"
        );

        let response: ApiResponse<LaunchData> =
            self.post("/instance-operations/launch", req).await?;

        info!(
            count = response.data.instance_ids.len(),
            "Launch request accepted"
        );
        Ok(response.data.instance_ids)
    }

    async fn terminate(&self, instance_ids: &[String]) -> Result<Vec<Instance>, ApiError> {
        info!(count = instance_ids.len(), "Terminating instances");

        let body = TerminateRequest {
            instance_ids: instance_ids.to_vec(),
        };
        let response: ApiResponse<TerminateData> =
            self.post("/instance-operations/terminate", &body).await?;

        Ok(response.data.terminated_instances)
    }

    async fn ssh_keys(&self) -> Result<Vec<SshKey>, ApiError> {
        let response: ApiResponse<Vec<SshKey>> = self.get("/ssh-keys").await?;
        Ok(response.data)
    }
}
