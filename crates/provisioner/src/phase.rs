/// How far the forward phase progressed. Cleanup dispatches on this value.
///
/// The token lives inside every variant reached after a successful login, so
/// a phase that needs platform calls during cleanup always carries it. A
/// failed pre-copy is its own variant and is therefore always also a failed
/// VM creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ProvisionPhase {
    #[default]
    NotStarted,
    LoginFailed,
    /// Logged in, nothing created on the platform yet.
    LoggedIn { token: String },
    PrecopyFailed { token: String },
    /// VM configuration creation or deployment failed.
    VmCreationFailed { token: String },
    /// The platform accepted the deployment. `vm_id` is `None` when the
    /// deploy answer could not be read.
    Deployed {
        token: String,
        vm_id: Option<String>,
    },
}

impl ProvisionPhase {
    pub fn token(&self) -> Option<&str> {
        match self {
            Self::NotStarted | Self::LoginFailed => None,
            Self::LoggedIn { token }
            | Self::PrecopyFailed { token }
            | Self::VmCreationFailed { token }
            | Self::Deployed { token, .. } => Some(token),
        }
    }

    pub fn vm_id(&self) -> Option<&str> {
        match self {
            Self::Deployed { vm_id, .. } => vm_id.as_deref(),
            _ => None,
        }
    }

    pub fn login_failed(&self) -> bool {
        matches!(self, Self::LoginFailed)
    }

    pub fn create_vm_failed(&self) -> bool {
        matches!(
            self,
            Self::PrecopyFailed { .. } | Self::VmCreationFailed { .. }
        )
    }

    pub fn precopy_failed(&self) -> bool {
        matches!(self, Self::PrecopyFailed { .. })
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::LoginFailed => "login_failed",
            Self::LoggedIn { .. } => "logged_in",
            Self::PrecopyFailed { .. } => "precopy_failed",
            Self::VmCreationFailed { .. } => "vm_creation_failed",
            Self::Deployed { .. } => "deployed",
        }
    }
}
