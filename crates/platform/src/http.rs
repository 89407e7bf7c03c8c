use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use types::{
    HEALTH_CHECK_PATH, HealthCheckResponse, IMAGE_COPY_PATH, IMAGE_DELETE_PATH, ImageCopyRequest,
    ImageCopyResponse, ImageDeleteRequest, OrkaConfig, PlatformClient, PlatformError, TOKEN_PATH,
    TokenLoginRequest, TokenLoginResponse, VM_CREATE_PATH, VM_DEPLOY_PATH, VM_PURGE_PATH,
    VmCreateRequest, VmDeployRequest, VmDeployResponse, VmPurgeRequest,
};

use crate::{extract_http_error_message, normalize_endpoint};

/// [`PlatformClient`] over HTTP. Every request is sent once; the only bound
/// on a hanging request is the client timeout.
#[derive(Debug, Clone)]
pub struct HttpPlatformClient {
    client: Client,
    endpoint: String,
}

impl HttpPlatformClient {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, PlatformError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|error| PlatformError::Transport {
                operation: "client_init",
                message: error.to_string(),
            })?;
        Ok(Self {
            client,
            endpoint: normalize_endpoint(endpoint),
        })
    }

    pub fn from_config(config: &OrkaConfig) -> Result<Self, PlatformError> {
        Self::new(
            &config.orka_endpoint,
            Duration::from_secs(config.http_timeout_secs),
        )
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    async fn send(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        expected: StatusCode,
    ) -> Result<Response, PlatformError> {
        let response = request
            .send()
            .await
            .map_err(|error| PlatformError::Transport {
                operation,
                message: error.to_string(),
            })?;

        let status = response.status();
        tracing::debug!(operation, status = status.as_u16(), "platform responded");
        if status == expected {
            return Ok(response);
        }

        let body = match response.text().await {
            Ok(text) => text,
            Err(error) => format!("unable to read error body: {error}"),
        };
        Err(PlatformError::HttpStatus {
            operation,
            status: status.as_u16(),
            message: extract_http_error_message(&body, status.canonical_reason()),
        })
    }

    async fn parse_json<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> Result<T, PlatformError> {
        let body = response
            .text()
            .await
            .map_err(|error| PlatformError::Transport {
                operation,
                message: error.to_string(),
            })?;
        serde_json::from_str(&body).map_err(|error| PlatformError::ResponseParse {
            operation,
            message: error.to_string(),
        })
    }
}

#[async_trait]
impl PlatformClient for HttpPlatformClient {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn login(
        &self,
        request: &TokenLoginRequest,
    ) -> Result<TokenLoginResponse, PlatformError> {
        tracing::debug!(endpoint = %self.endpoint, user = %request.email, "requesting platform token");
        let response = self
            .send(
                "login",
                self.client.post(self.url(TOKEN_PATH)).json(request),
                StatusCode::OK,
            )
            .await?;
        Self::parse_json("login", response).await
    }

    async fn copy_image(
        &self,
        token: &str,
        request: &ImageCopyRequest,
    ) -> Result<ImageCopyResponse, PlatformError> {
        tracing::debug!(
            source_image = %request.image,
            destination = %request.new_name,
            "requesting image copy"
        );
        let response = self
            .send(
                "copy_image",
                self.client
                    .post(self.url(IMAGE_COPY_PATH))
                    .bearer_auth(token)
                    .json(request),
                StatusCode::OK,
            )
            .await?;
        Self::parse_json("copy_image", response).await
    }

    async fn create_vm_config(
        &self,
        token: &str,
        request: &VmCreateRequest,
    ) -> Result<(), PlatformError> {
        tracing::debug!(
            vm_name = %request.orka_vm_name,
            base_image = %request.orka_base_image,
            cpu_core = request.orka_cpu_core,
            "requesting VM configuration"
        );
        self.send(
            "create_vm_config",
            self.client
                .post(self.url(VM_CREATE_PATH))
                .bearer_auth(token)
                .json(request),
            StatusCode::CREATED,
        )
        .await?;
        Ok(())
    }

    async fn deploy_vm(
        &self,
        token: &str,
        request: &VmDeployRequest,
    ) -> Result<VmDeployResponse, PlatformError> {
        tracing::debug!(vm_name = %request.orka_vm_name, "requesting VM deployment");
        let response = self
            .send(
                "deploy_vm",
                self.client
                    .post(self.url(VM_DEPLOY_PATH))
                    .bearer_auth(token)
                    .json(request),
                StatusCode::OK,
            )
            .await?;
        Self::parse_json("deploy_vm", response).await
    }

    async fn delete_image(
        &self,
        token: &str,
        request: &ImageDeleteRequest,
    ) -> Result<(), PlatformError> {
        tracing::debug!(image = %request.image, "requesting image deletion");
        self.send(
            "delete_image",
            self.client
                .delete(self.url(IMAGE_DELETE_PATH))
                .bearer_auth(token)
                .json(request),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    async fn purge_vm(&self, token: &str, request: &VmPurgeRequest) -> Result<(), PlatformError> {
        tracing::debug!(vm_name = %request.orka_vm_name, "requesting VM purge");
        self.send(
            "purge_vm",
            self.client
                .delete(self.url(VM_PURGE_PATH))
                .bearer_auth(token)
                .json(request),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }

    async fn health_check(&self) -> Result<HealthCheckResponse, PlatformError> {
        let response = self
            .send(
                "health_check",
                self.client.get(self.url(HEALTH_CHECK_PATH)),
                StatusCode::OK,
            )
            .await?;
        Self::parse_json("health_check", response).await
    }

    async fn revoke_token(&self, token: &str) -> Result<(), PlatformError> {
        self.send(
            "revoke_token",
            self.client.delete(self.url(TOKEN_PATH)).bearer_auth(token),
            StatusCode::OK,
        )
        .await?;
        Ok(())
    }
}
