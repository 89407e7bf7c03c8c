use crate::ProvisionError;

/// Outcome of a provisioning step, read by the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepAction {
    Continue,
    Halt,
}

/// Values exchanged between the controller and the harness for one build.
///
/// Each field is `None` until the step that produces it succeeds. The
/// harness decides the final exit state from `error`.
#[derive(Debug, Default)]
pub struct BuildState {
    /// Bearer token, present once login succeeded.
    pub token: Option<String>,
    /// Platform identifier of the deployed VM.
    pub vm_id: Option<String>,
    pub ssh_host: Option<String>,
    pub ssh_port: Option<u16>,
    /// Most recent failure, forward or cleanup.
    pub error: Option<ProvisionError>,
}

impl BuildState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ssh_endpoint(&self) -> Option<(&str, u16)> {
        match (self.ssh_host.as_deref(), self.ssh_port) {
            (Some(host), Some(port)) => Some((host, port)),
            _ => None,
        }
    }

    pub fn record_error(&mut self, error: ProvisionError) {
        self.error = Some(error);
    }

    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }
}
