mod config;
mod error;
mod platform;
mod session;
mod tracing;
mod ui;

pub use config::{
    ConfigError, DEFAULT_HTTP_TIMEOUT_SECS, DEFAULT_ORKA_ENDPOINT, DEFAULT_VM_BUILDER_NAME,
    DEFAULT_VM_CPU_CORE, OrkaConfig,
};
pub use error::{CleanupAction, PlatformError, ProvisionError};
pub use platform::{
    HEALTH_CHECK_PATH, HealthCheckResponse, IMAGE_COPY_PATH, IMAGE_DELETE_PATH, ImageCopyRequest,
    ImageCopyResponse, ImageDeleteRequest, PlatformClient, PlatformErrorEntry,
    PlatformErrorEnvelope, TOKEN_PATH, TokenLoginRequest, TokenLoginResponse, VM_CREATE_PATH,
    VM_DEPLOY_PATH, VM_PURGE_PATH, VmCreateRequest, VmDeployRequest, VmDeployResponse,
    VmPurgeRequest,
};
pub use session::{BuildState, StepAction};
pub use tracing::init_tracing;
pub use ui::Ui;
