use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::PlatformError;

pub const TOKEN_PATH: &str = "/token";
pub const IMAGE_COPY_PATH: &str = "/resources/image/copy";
pub const IMAGE_DELETE_PATH: &str = "/resources/image/delete";
pub const VM_CREATE_PATH: &str = "/resources/vm/create";
pub const VM_DEPLOY_PATH: &str = "/resources/vm/deploy";
pub const VM_PURGE_PATH: &str = "/resources/vm/purge";
pub const HEALTH_CHECK_PATH: &str = "/health-check";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenLoginResponse {
    pub token: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCopyRequest {
    pub image: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCopyResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmCreateRequest {
    pub orka_vm_name: String,
    pub orka_base_image: String,
    pub orka_image: String,
    pub orka_cpu_core: u32,
    pub vcpu_count: u32,
    pub io_boost: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDeployRequest {
    pub orka_vm_name: String,
}

/// The SSH port is reported as a decimal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmDeployResponse {
    pub vm_id: String,
    pub ip: String,
    pub ssh_port: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDeleteRequest {
    pub image: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmPurgeRequest {
    pub orka_vm_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    pub api_version: String,
}

/// Error body shape shared by every platform endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformErrorEnvelope {
    #[serde(default)]
    pub errors: Vec<PlatformErrorEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformErrorEntry {
    pub message: String,
}

impl PlatformErrorEnvelope {
    pub fn first_message(&self) -> Option<&str> {
        self.errors
            .first()
            .map(|entry| entry.message.trim())
            .filter(|message| !message.is_empty())
    }
}

/// Call/response contract the controller needs from the platform.
///
/// Each method issues exactly one request and returns once the response (or
/// transport failure) is known. Implementations check the success status
/// documented for the endpoint and report anything else as
/// [`PlatformError::HttpStatus`].
#[async_trait]
pub trait PlatformClient: Send + Sync {
    fn endpoint(&self) -> &str;

    async fn login(&self, request: &TokenLoginRequest)
    -> Result<TokenLoginResponse, PlatformError>;

    async fn copy_image(
        &self,
        token: &str,
        request: &ImageCopyRequest,
    ) -> Result<ImageCopyResponse, PlatformError>;

    /// Succeeds only on HTTP 201.
    async fn create_vm_config(
        &self,
        token: &str,
        request: &VmCreateRequest,
    ) -> Result<(), PlatformError>;

    async fn deploy_vm(
        &self,
        token: &str,
        request: &VmDeployRequest,
    ) -> Result<VmDeployResponse, PlatformError>;

    async fn delete_image(
        &self,
        token: &str,
        request: &ImageDeleteRequest,
    ) -> Result<(), PlatformError>;

    async fn purge_vm(&self, token: &str, request: &VmPurgeRequest) -> Result<(), PlatformError>;

    /// Unauthenticated.
    async fn health_check(&self) -> Result<HealthCheckResponse, PlatformError>;

    async fn revoke_token(&self, token: &str) -> Result<(), PlatformError>;
}
