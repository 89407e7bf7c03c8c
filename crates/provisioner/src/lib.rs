use std::sync::Arc;

use types::{
    BuildState, CleanupAction, ImageCopyRequest, ImageDeleteRequest, OrkaConfig, PlatformClient,
    PlatformError, ProvisionError, StepAction, TokenLoginRequest, Ui, VmCreateRequest,
    VmDeployRequest, VmDeployResponse, VmPurgeRequest,
};

mod host;
mod phase;
mod ui;
mod version;

pub use host::{parse_ssh_port, resolve_ssh_host};
pub use phase::ProvisionPhase;
pub use ui::TracingUi;
pub use version::{
    LEGACY_MULTI_TOKEN_MAX_VERSION, VersionParseError, parse_platform_version,
    token_revocation_required,
};

/// Creates and deploys one builder VM, then undoes what [`Self::run`] created.
pub struct OrkaCreateStep {
    config: Arc<OrkaConfig>,
    client: Arc<dyn PlatformClient>,
    ui: Arc<dyn Ui>,
    phase: ProvisionPhase,
}

impl OrkaCreateStep {
    pub fn new(config: Arc<OrkaConfig>, client: Arc<dyn PlatformClient>, ui: Arc<dyn Ui>) -> Self {
        Self {
            config,
            client,
            ui,
            phase: ProvisionPhase::NotStarted,
        }
    }

    pub fn phase(&self) -> &ProvisionPhase {
        &self.phase
    }

    /// Run the forward phase. On failure the error is shown, logged and left
    /// in `state.error`, and no later step is attempted.
    pub async fn run(&mut self, state: &mut BuildState) -> StepAction {
        match self.provision(state).await {
            Ok(()) => StepAction::Continue,
            Err(error) => {
                self.ui.error(&error.to_string());
                tracing::error!(
                    phase = self.phase.name(),
                    vm_name = %self.config.orka_vm_builder_name,
                    transport = error.is_transport(),
                    error = %error,
                    "builder VM provisioning halted"
                );
                state.record_error(error);
                StepAction::Halt
            }
        }
    }

    async fn provision(&mut self, state: &mut BuildState) -> Result<(), ProvisionError> {
        self.ui.say("Logging into Orka API endpoint");
        let token = match self.login().await {
            Ok(token) => token,
            Err(error) => {
                self.phase = ProvisionPhase::LoginFailed;
                return Err(error);
            }
        };
        self.ui.say("Logged in with token");
        state.token = Some(token.clone());
        self.phase = ProvisionPhase::LoggedIn {
            token: token.clone(),
        };

        let mut actual_image = self.config.source_image.clone();
        if self.config.image_precopy {
            if self.config.no_create_image {
                self.ui
                    .say("Skipping source image pre-copy because of 'no_create_image' being set");
            } else {
                if let Err(error) = self.precopy_image(&token).await {
                    self.phase = ProvisionPhase::PrecopyFailed { token };
                    return Err(error);
                }
                actual_image = self.config.image_name.clone();
                self.ui.say(&format!(
                    "Builder VM configuration will use pre-copied base image [{actual_image}]"
                ));
            }
        } else {
            self.ui.say(&format!(
                "Builder VM configuration will use base image [{actual_image}]"
            ));
        }

        if let Err(error) = self.create_vm_config(&token, &actual_image).await {
            self.phase = ProvisionPhase::VmCreationFailed { token };
            return Err(error);
        }

        let deployment = match self.deploy_vm(&token).await {
            Ok(deployment) => deployment,
            Err(PlatformError::ResponseParse { message, .. }) => {
                // A 200 answer means the VM exists even when its body is unreadable.
                self.phase = ProvisionPhase::Deployed { token, vm_id: None };
                return Err(ProvisionError::MalformedResponse {
                    field: "deploy_response",
                    message,
                });
            }
            Err(source) => {
                self.phase = ProvisionPhase::VmCreationFailed { token };
                return Err(ProvisionError::VmDeployment {
                    vm_name: self.config.orka_vm_builder_name.clone(),
                    source,
                });
            }
        };
        self.ui.say(&format!("Created VM [{}]", deployment.vm_id));
        state.vm_id = Some(deployment.vm_id.clone());
        self.phase = ProvisionPhase::Deployed {
            token,
            vm_id: Some(deployment.vm_id),
        };

        let ssh_host = resolve_ssh_host(&self.config, &deployment.ip)?;
        if ssh_host != deployment.ip {
            self.ui.say(&format!(
                "Found Internal VM IP in map [{} -> {ssh_host}]",
                deployment.ip
            ));
        }
        let ssh_port = parse_ssh_port(&deployment.ssh_port)?;
        self.ui.say(&format!(
            "SSH server will be available at [{ssh_host}:{ssh_port}]"
        ));
        state.ssh_host = Some(ssh_host);
        state.ssh_port = Some(ssh_port);
        Ok(())
    }

    async fn login(&self) -> Result<String, ProvisionError> {
        let request = TokenLoginRequest {
            email: self.config.orka_user.clone(),
            password: self.config.orka_password.clone(),
        };
        let response = self
            .client
            .login(&request)
            .await
            .map_err(|source| ProvisionError::Authentication { source })?;
        if response.token.trim().is_empty() {
            return Err(ProvisionError::Authentication {
                source: PlatformError::ResponseParse {
                    operation: "login",
                    message: "token response carried an empty token".to_owned(),
                },
            });
        }
        Ok(response.token)
    }

    async fn precopy_image(&self, token: &str) -> Result<(), ProvisionError> {
        let source_image = &self.config.source_image;
        let destination = &self.config.image_name;
        self.ui.say(&format!(
            "Pre-copying source image [{source_image}] to destination image [{destination}]"
        ));
        self.ui
            .say("This can take awhile depending on how big the source image is - please wait...");

        let request = ImageCopyRequest {
            image: source_image.clone(),
            new_name: destination.clone(),
        };
        self.client
            .copy_image(token, &request)
            .await
            .map_err(|source| ProvisionError::ImageCopy {
                source_image: source_image.clone(),
                destination: destination.clone(),
                source,
            })?;
        self.ui.say("Image copied");
        Ok(())
    }

    async fn create_vm_config(&self, token: &str, image: &str) -> Result<(), ProvisionError> {
        let vm_name = &self.config.orka_vm_builder_name;
        self.ui
            .say(&format!("Creating a Builder VM configuration [{vm_name}]"));

        let request = VmCreateRequest {
            orka_vm_name: vm_name.clone(),
            orka_base_image: image.to_owned(),
            orka_image: vm_name.clone(),
            orka_cpu_core: self.config.orka_vm_cpu_core,
            vcpu_count: self.config.orka_vm_cpu_core,
            io_boost: self.config.orka_vm_builder_enable_io_boost,
            tag: self.config.orka_vm_tag.clone(),
        };
        self.client
            .create_vm_config(token, &request)
            .await
            .map_err(|source| ProvisionError::VmConfiguration {
                vm_name: vm_name.clone(),
                source,
            })?;
        self.ui
            .say(&format!("Created builder VM configuration [{vm_name}]"));
        Ok(())
    }

    async fn deploy_vm(&self, token: &str) -> Result<VmDeployResponse, PlatformError> {
        let vm_name = &self.config.orka_vm_builder_name;
        self.ui.say(&format!(
            "Creating builder VM based on [{vm_name}] configuration"
        ));

        let request = VmDeployRequest {
            orka_vm_name: vm_name.clone(),
        };
        self.client.deploy_vm(token, &request).await
    }

    /// Undo whatever the forward phase created. Runs once, after
    /// [`OrkaCreateStep::run`] returned, whatever its outcome. Failures are
    /// reported and recorded in `state.error` but never escalated.
    pub async fn cleanup(self, state: &mut BuildState) {
        let Some(token) = self.phase.token() else {
            tracing::debug!(
                phase = self.phase.name(),
                "login never succeeded; nothing to clean up"
            );
            return;
        };

        if self.config.no_delete_vm {
            self.ui.say(
                "Skipping the deletion of the builder VM and its configuration because of 'no_delete_vm' being set",
            );
            if self.config.precopy_enabled() {
                self.ui.say(&format!(
                    "Pre-copy was performed: image [{}] will be left and not removed",
                    self.config.image_name
                ));
            }
            return;
        }

        match &self.phase {
            ProvisionPhase::NotStarted | ProvisionPhase::LoginFailed => {}
            ProvisionPhase::PrecopyFailed { .. } => {
                self.ui.say(&format!(
                    "Cleaning up pre-copied image [{}]",
                    self.config.image_name
                ));
                if let Err(error) = self.delete_precopied_image(token).await {
                    self.report_cleanup_failure(state, error);
                    self.ui
                        .say("Cleaning up pre-copied image failed, check orka cluster for artifacts");
                    return;
                }
                self.ui.say(
                    "Nothing else to clean up because the builder VM was never created",
                );
            }
            ProvisionPhase::VmCreationFailed { .. } => {
                // A configuration that was created before a failed deploy is
                // left on the platform.
                tracing::warn!(
                    vm_name = %self.config.orka_vm_builder_name,
                    "VM creation failed; any VM configuration created on the platform is not removed"
                );
                self.ui.say(
                    "Nothing to clean up because the builder VM creation or deployment failed",
                );
            }
            ProvisionPhase::LoggedIn { .. } => {
                self.revoke_token_if_legacy(token, state).await;
            }
            ProvisionPhase::Deployed { vm_id, .. } => {
                self.purge_vm(token, vm_id.as_deref(), state).await;
                self.revoke_token_if_legacy(token, state).await;
            }
        }
    }

    async fn delete_precopied_image(&self, token: &str) -> Result<(), ProvisionError> {
        let request = ImageDeleteRequest {
            image: self.config.orka_vm_builder_name.clone(),
        };
        self.client
            .delete_image(token, &request)
            .await
            .map_err(|source| ProvisionError::CleanupAction {
                action: CleanupAction::DeleteImage,
                source,
            })?;
        self.ui.say(&format!("Image deleted [{}]", request.image));
        Ok(())
    }

    async fn purge_vm(&self, token: &str, vm_id: Option<&str>, state: &mut BuildState) {
        let vm_name = &self.config.orka_vm_builder_name;
        self.ui.say("Removing builder VM and its configuration...");
        tracing::info!(
            vm_name = %vm_name,
            vm_id = vm_id.unwrap_or("unknown"),
            "purging builder VM"
        );

        let request = VmPurgeRequest {
            orka_vm_name: vm_name.clone(),
        };
        match self.client.purge_vm(token, &request).await {
            Ok(()) => self.ui.say("Builder VM and configuration purged"),
            Err(source) => self.report_cleanup_failure(
                state,
                ProvisionError::CleanupAction {
                    action: CleanupAction::PurgeVm,
                    source,
                },
            ),
        }
    }

    async fn revoke_token_if_legacy(&self, token: &str, state: &mut BuildState) {
        self.ui.say("Checking if token should be revoked");

        let health = match self.client.health_check().await {
            Ok(health) => health,
            Err(source) => {
                self.report_cleanup_failure(
                    state,
                    ProvisionError::CleanupAction {
                        action: CleanupAction::HealthCheck,
                        source,
                    },
                );
                return;
            }
        };

        let version = match parse_platform_version(&health.api_version) {
            Ok(version) => version,
            Err(error) => {
                self.report_cleanup_failure(
                    state,
                    ProvisionError::CleanupAction {
                        action: CleanupAction::HealthCheck,
                        source: PlatformError::ResponseParse {
                            operation: "health_check",
                            message: error.to_string(),
                        },
                    },
                );
                return;
            }
        };

        if !token_revocation_required(&version) {
            tracing::debug!(%version, "platform uses single-token auth; token left in place");
            return;
        }

        self.ui.say("Revoking orka user token");
        match self.client.revoke_token(token).await {
            Ok(()) => self.ui.say("Revoked orka user token"),
            Err(source) => self.report_cleanup_failure(
                state,
                ProvisionError::CleanupAction {
                    action: CleanupAction::RevokeToken,
                    source,
                },
            ),
        }
    }

    fn report_cleanup_failure(&self, state: &mut BuildState, error: ProvisionError) {
        self.ui.error(&error.to_string());
        tracing::warn!(
            phase = self.phase.name(),
            error = %error,
            "cleanup action failed"
        );
        state.record_error(error);
    }
}
