use std::{
    future::Future,
    io::{self, Write},
    path::Path,
    sync::Arc,
};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use provisioner::{
    OrkaCreateStep, VersionParseError, parse_platform_version, token_revocation_required,
};
use serde::Serialize;
use thiserror::Error;
use types::{BuildState, ConfigError, OrkaConfig, PlatformClient, PlatformError, StepAction, Ui};

pub const DEFAULT_CONFIG_PATH: &str = "orka.toml";
const CONFIG_ENV_PREFIX: &str = "ORKA__";

/// Values given on the command line. Unset fields leave lower layers alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CliOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orka_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orka_vm_builder_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub no_delete_vm: Option<bool>,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),
    #[error("failed to load configuration: {0}")]
    ConfigExtract(#[source] Box<figment::Error>),
    #[error(transparent)]
    ConfigValidation(#[from] ConfigError),
    #[error(transparent)]
    Platform(#[from] PlatformError),
    #[error(transparent)]
    PlatformVersion(#[from] VersionParseError),
    #[error("failed to render configuration: {0}")]
    Render(#[from] serde_json::Error),
}

impl From<figment::Error> for CliError {
    fn from(value: figment::Error) -> Self {
        Self::ConfigExtract(Box::new(value))
    }
}

/// Layers defaults, the TOML file at `config_path` (skipped when absent),
/// `ORKA__`-prefixed environment variables and `cli_overrides`, in that
/// order, then validates the result.
pub fn load_orka_config(
    config_path: &Path,
    cli_overrides: CliOverrides,
) -> Result<OrkaConfig, CliError> {
    let config = extract_orka_config(config_path, cli_overrides)?;
    config.validate()?;
    Ok(config)
}

/// Same layering as [`load_orka_config`], but only the settings needed for
/// unauthenticated platform queries are validated.
pub fn load_endpoint_config(
    config_path: &Path,
    cli_overrides: CliOverrides,
) -> Result<OrkaConfig, CliError> {
    let config = extract_orka_config(config_path, cli_overrides)?;
    config.validate_endpoint()?;
    Ok(config)
}

fn extract_orka_config(
    config_path: &Path,
    cli_overrides: CliOverrides,
) -> Result<OrkaConfig, CliError> {
    let mut figment = Figment::from(Serialized::defaults(OrkaConfig::default()));
    if config_path.is_file() {
        figment = figment.merge(Toml::file(config_path));
    } else {
        tracing::debug!(path = %config_path.display(), "configuration file not found; skipping");
    }
    figment = figment.merge(Env::prefixed(CONFIG_ENV_PREFIX).split("__"));
    figment = figment.merge(Serialized::defaults(cli_overrides));

    Ok(figment.extract()?)
}

/// Pretty JSON of the configuration with the password masked.
pub fn render_config(config: &OrkaConfig) -> Result<String, CliError> {
    Ok(serde_json::to_string_pretty(&config.redacted())?)
}

/// Runs the provisioning step and always follows it with cleanup.
///
/// On success the SSH endpoint is written to `out` as `key=value` lines and
/// `hold` is awaited before cleanup starts. A failed write skips `hold` and is
/// returned only after cleanup. The returned state carries the last recorded
/// error, if any.
pub async fn provision_builder<W, H>(
    config: Arc<OrkaConfig>,
    client: Arc<dyn PlatformClient>,
    ui: Arc<dyn Ui>,
    out: &mut W,
    hold: H,
) -> Result<BuildState, CliError>
where
    W: Write,
    H: Future<Output = ()>,
{
    let mut state = BuildState::new();
    let mut step = OrkaCreateStep::new(config, client, ui);

    let mut summary = Ok(());
    if step.run(&mut state).await == StepAction::Continue {
        summary = write_provision_summary(out, &state);
        match &summary {
            Ok(()) => hold.await,
            Err(error) => {
                tracing::error!(error = %error, "failed to publish the SSH endpoint; cleaning up");
            }
        }
    }
    step.cleanup(&mut state).await;

    if let Some(error) = &state.error {
        tracing::warn!(error = %error, "builder VM provisioning finished with an error");
    }
    summary?;
    Ok(state)
}

fn write_provision_summary<W: Write>(out: &mut W, state: &BuildState) -> io::Result<()> {
    if let Some(vm_id) = &state.vm_id {
        writeln!(out, "vm_id={vm_id}")?;
    }
    if let Some((host, port)) = state.ssh_endpoint() {
        writeln!(out, "ssh_host={host}")?;
        writeln!(out, "ssh_port={port}")?;
    }
    out.flush()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformVersionReport {
    pub endpoint: String,
    pub api_version: String,
    pub token_revocation_required: bool,
}

pub async fn check_platform(client: &dyn PlatformClient) -> Result<PlatformVersionReport, CliError> {
    let health = client.health_check().await?;
    let version = parse_platform_version(&health.api_version)?;
    Ok(PlatformVersionReport {
        endpoint: client.endpoint().to_owned(),
        api_version: health.api_version,
        token_revocation_required: token_revocation_required(&version),
    })
}
