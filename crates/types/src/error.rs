use thiserror::Error;

/// Failure reported by a [`crate::PlatformClient`] call.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("platform transport failed for `{operation}`: {message}")]
    Transport {
        operation: &'static str,
        message: String,
    },
    #[error("platform returned HTTP {status} for `{operation}`: {message}")]
    HttpStatus {
        operation: &'static str,
        status: u16,
        message: String,
    },
    #[error("platform response parsing failed for `{operation}`: {message}")]
    ResponseParse {
        operation: &'static str,
        message: String,
    },
}

impl PlatformError {
    pub fn operation(&self) -> &'static str {
        match self {
            Self::Transport { operation, .. }
            | Self::HttpStatus { operation, .. }
            | Self::ResponseParse { operation, .. } => operation,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failure recorded by the provisioning controller.
///
/// Network failures surface as [`PlatformError::Transport`] inside the
/// variant of the step that issued the call. Forward-phase variants halt
/// provisioning. `CleanupAction` is only ever
/// produced by the compensating phase and never aborts sibling actions.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("error while logging into the Orka API: {source}")]
    Authentication {
        #[source]
        source: PlatformError,
    },
    #[error("pre-copy of image `{source_image}` to `{destination}` failed: {source}")]
    ImageCopy {
        source_image: String,
        destination: String,
        #[source]
        source: PlatformError,
    },
    #[error("builder VM configuration `{vm_name}` could not be created: {source}")]
    VmConfiguration {
        vm_name: String,
        #[source]
        source: PlatformError,
    },
    #[error("builder VM `{vm_name}` could not be deployed: {source}")]
    VmDeployment {
        vm_name: String,
        #[source]
        source: PlatformError,
    },
    #[error(
        "VM IP [{ip}] is not tracked in the provided node ip map; please provide a mapping for this VM"
    )]
    UnmappedHost { ip: String },
    #[error("malformed platform response for `{field}`: {message}")]
    MalformedResponse {
        field: &'static str,
        message: String,
    },
    #[error("cleanup action `{action}` failed: {source}")]
    CleanupAction {
        action: CleanupAction,
        #[source]
        source: PlatformError,
    },
}

impl ProvisionError {
    /// Platform failure underneath this error, if any.
    pub fn platform_error(&self) -> Option<&PlatformError> {
        match self {
            Self::Authentication { source }
            | Self::ImageCopy { source, .. }
            | Self::VmConfiguration { source, .. }
            | Self::VmDeployment { source, .. }
            | Self::CleanupAction { source, .. } => Some(source),
            Self::UnmappedHost { .. } | Self::MalformedResponse { .. } => None,
        }
    }

    /// True when the request never got a platform answer.
    pub fn is_transport(&self) -> bool {
        self.platform_error()
            .is_some_and(PlatformError::is_transport)
    }
}

/// Compensating actions performed during cleanup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupAction {
    DeleteImage,
    PurgeVm,
    HealthCheck,
    RevokeToken,
}

impl std::fmt::Display for CleanupAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DeleteImage => "delete_image",
            Self::PurgeVm => "purge_vm",
            Self::HealthCheck => "health_check",
            Self::RevokeToken => "revoke_token",
        })
    }
}
