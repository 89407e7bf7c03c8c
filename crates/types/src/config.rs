use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub const DEFAULT_ORKA_ENDPOINT: &str = "http://10.221.188.100";
pub const DEFAULT_VM_BUILDER_NAME: &str = "packer-builder";
pub const DEFAULT_VM_CPU_CORE: u32 = 3;
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 300;

/// Builder settings supplied by the harness. Read-only to the controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrkaConfig {
    #[serde(default = "default_orka_endpoint")]
    pub orka_endpoint: String,
    #[serde(default)]
    pub orka_user: String,
    #[serde(default)]
    pub orka_password: String,
    #[serde(default)]
    pub source_image: String,
    /// Destination of the optional pre-copy.
    #[serde(default)]
    pub image_name: String,
    #[serde(default)]
    pub image_precopy: bool,
    #[serde(default)]
    pub no_create_image: bool,
    #[serde(default)]
    pub no_delete_vm: bool,
    #[serde(default = "default_vm_builder_name")]
    pub orka_vm_builder_name: String,
    #[serde(default)]
    pub orka_vm_tag: String,
    #[serde(default = "default_vm_cpu_core")]
    pub orka_vm_cpu_core: u32,
    #[serde(default)]
    pub orka_vm_builder_enable_io_boost: bool,
    #[serde(default)]
    pub enable_orka_node_ip_mapping: bool,
    /// Deployed VM IP to reachable host.
    #[serde(default)]
    pub orka_node_ip_map: BTreeMap<String, String>,
    #[serde(default = "default_http_timeout_secs")]
    pub http_timeout_secs: u64,
}

impl Default for OrkaConfig {
    fn default() -> Self {
        Self {
            orka_endpoint: default_orka_endpoint(),
            orka_user: String::new(),
            orka_password: String::new(),
            source_image: String::new(),
            image_name: String::new(),
            image_precopy: false,
            no_create_image: false,
            no_delete_vm: false,
            orka_vm_builder_name: default_vm_builder_name(),
            orka_vm_tag: String::new(),
            orka_vm_cpu_core: default_vm_cpu_core(),
            orka_vm_builder_enable_io_boost: false,
            enable_orka_node_ip_mapping: false,
            orka_node_ip_map: BTreeMap::new(),
            http_timeout_secs: default_http_timeout_secs(),
        }
    }
}

impl OrkaConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_endpoint()?;

        for (field, value) in [
            ("orka_user", &self.orka_user),
            ("orka_password", &self.orka_password),
            ("source_image", &self.source_image),
            ("orka_vm_builder_name", &self.orka_vm_builder_name),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingField { field });
            }
        }

        if self.orka_vm_cpu_core == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "orka_vm_cpu_core",
                value: 0,
            });
        }

        if self.precopy_enabled() && self.image_name.trim().is_empty() {
            return Err(ConfigError::MissingPrecopyImageName);
        }

        Ok(())
    }

    /// Checks only what an unauthenticated request needs: a reachable
    /// http(s) endpoint and a non-zero timeout.
    pub fn validate_endpoint(&self) -> Result<(), ConfigError> {
        let endpoint = self.orka_endpoint.trim();
        if endpoint.is_empty() {
            return Err(ConfigError::MissingField {
                field: "orka_endpoint",
            });
        }
        let parsed = Url::parse(endpoint).map_err(|error| ConfigError::InvalidEndpoint {
            endpoint: endpoint.to_owned(),
            message: error.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: endpoint.to_owned(),
                message: format!("unsupported scheme `{}`", parsed.scheme()),
            });
        }

        if self.http_timeout_secs == 0 {
            return Err(ConfigError::InvalidLimit {
                field: "http_timeout_secs",
                value: 0,
            });
        }
        Ok(())
    }

    /// Pre-copy actually runs only when image creation is not disabled.
    pub fn precopy_enabled(&self) -> bool {
        self.image_precopy && !self.no_create_image
    }

    /// Copy of the configuration safe to print or log.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        if !copy.orka_password.is_empty() {
            copy.orka_password = "<redacted>".to_owned();
        }
        copy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("required configuration field `{field}` is empty")]
    MissingField { field: &'static str },
    #[error("invalid orka_endpoint `{endpoint}`: {message}")]
    InvalidEndpoint { endpoint: String, message: String },
    #[error("configuration limit `{field}` must be greater than zero; got {value}")]
    InvalidLimit { field: &'static str, value: u64 },
    #[error("image_precopy requires a non-empty image_name as the copy destination")]
    MissingPrecopyImageName,
}

fn default_orka_endpoint() -> String {
    DEFAULT_ORKA_ENDPOINT.to_owned()
}

fn default_vm_builder_name() -> String {
    DEFAULT_VM_BUILDER_NAME.to_owned()
}

fn default_vm_cpu_core() -> u32 {
    DEFAULT_VM_CPU_CORE
}

fn default_http_timeout_secs() -> u64 {
    DEFAULT_HTTP_TIMEOUT_SECS
}
