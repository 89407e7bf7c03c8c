use std::{io, path::PathBuf, process::ExitCode, sync::Arc};

use clap::{Parser, Subcommand};
use cli::{
    CliError, CliOverrides, DEFAULT_CONFIG_PATH, check_platform, load_endpoint_config,
    load_orka_config, provision_builder, render_config,
};
use platform::HttpPlatformClient;
use provisioner::TracingUi;
use types::{PlatformClient, Ui, init_tracing};

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
enum CliCommand {
    /// Create and deploy the builder VM, then clean it up
    Provision {
        /// Wait for Ctrl-C after the VM is reachable and before cleanup
        #[arg(long)]
        hold: bool,
    },
    /// Query the platform version and whether tokens are revoked on cleanup.
    /// Needs only the endpoint, not credentials.
    HealthCheck,
    /// Validate configuration and print it with the password redacted
    Validate,
}

#[derive(Debug, Clone, Parser, PartialEq, Eq)]
#[command(name = "orka-builder", about = "Orka builder VM provisioning CLI")]
struct CliArgs {
    #[arg(short = 'c', long = "config", default_value = DEFAULT_CONFIG_PATH)]
    config_path: PathBuf,
    #[arg(long = "endpoint")]
    endpoint: Option<String>,
    #[arg(long = "vm-name")]
    vm_name: Option<String>,
    #[arg(long = "no-delete-vm")]
    no_delete_vm: bool,
    #[command(subcommand)]
    command: CliCommand,
}

impl CliArgs {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            orka_endpoint: self.endpoint.clone(),
            orka_vm_builder_name: self.vm_name.clone(),
            no_delete_vm: self.no_delete_vm.then_some(true),
        }
    }
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(error) => {
            eprintln!("orka-builder error: {error}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode, CliError> {
    init_tracing();
    let args = CliArgs::parse();

    match args.command {
        CliCommand::Validate => {
            let config = load_orka_config(&args.config_path, args.overrides())?;
            println!("{}", render_config(&config)?);
        }
        CliCommand::HealthCheck => {
            let config = load_endpoint_config(&args.config_path, args.overrides())?;
            let client = HttpPlatformClient::from_config(&config)?;
            let report = runtime()?.block_on(check_platform(&client))?;
            println!("endpoint={}", report.endpoint);
            println!("api_version={}", report.api_version);
            println!(
                "token_revocation_required={}",
                report.token_revocation_required
            );
        }
        CliCommand::Provision { hold } => {
            let config = load_orka_config(&args.config_path, args.overrides())?;
            let client = HttpPlatformClient::from_config(&config)?;
            let state = runtime()?.block_on(provision_builder(
                Arc::new(config),
                Arc::new(client) as Arc<dyn PlatformClient>,
                Arc::new(TracingUi) as Arc<dyn Ui>,
                &mut io::stdout(),
                async move {
                    if hold {
                        wait_for_release().await;
                    }
                },
            ))?;
            if state.has_error() {
                return Ok(ExitCode::from(1));
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn runtime() -> io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

async fn wait_for_release() {
    println!("hold=press Ctrl-C to clean up the builder VM");
    tracing::info!("holding builder VM until interrupted");
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to wait for Ctrl-C; cleaning up now");
    }
}
