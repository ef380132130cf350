//! Metacontroller Operator - lifecycle-managed deployment of the
//! Metacontroller cluster controller

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use kube::Client;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use metacontroller_operator::config::CharmConfig;
use metacontroller_operator::lifecycle::{Lifecycle, Status};
use metacontroller_operator::manifest::{DeployContext, RbacProfile};
use metacontroller_operator::{images, DEFAULT_APP_NAME, DEFAULT_METACONTROLLER_IMAGE};

/// Deploys and lifecycle-manages the Metacontroller cluster controller
#[derive(Parser, Debug)]
#[command(name = "metacontroller-operator", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render and apply all Kubernetes objects, then wait for readiness
    Install(DeployArgs),

    /// Delete all Kubernetes objects created by install
    Remove(DeployArgs),

    /// Check deployed resources once and report unit status
    Status(DeployArgs),

    /// Compare current state to desired state, reinstalling on drift
    UpdateStatus(DeployArgs),

    /// Print the rendered manifest set to stdout without applying it
    Render(DeployArgs),

    /// Print the pinned container images, one per line, for release auditing
    Images(ImagesArgs),
}

/// Arguments shared by all deployment-facing subcommands
#[derive(Parser, Debug)]
struct DeployArgs {
    /// Target namespace for namespaced objects
    #[arg(short = 'n', long, env = "OPERATOR_NAMESPACE")]
    namespace: String,

    /// Application name used for object names and labels
    #[arg(long, env = "OPERATOR_APP_NAME", default_value = DEFAULT_APP_NAME)]
    app_name: String,

    /// Controller image override (takes precedence over the config default)
    #[arg(long, env = "METACONTROLLER_IMAGE")]
    image: Option<String>,

    /// RBAC profile override: standalone or mesh-integrated
    #[arg(long)]
    rbac_profile: Option<String>,

    /// Path to the charm config YAML (declared option defaults)
    #[arg(short = 'c', long = "config")]
    config_file: Option<PathBuf>,

    /// Maximum seconds to wait for deployed resources to become ready
    #[arg(long, default_value_t = metacontroller_operator::MAX_TIME_CHECKING_RESOURCES_SECS)]
    timeout_secs: u64,
}

/// Arguments for the image audit subcommand
#[derive(Parser, Debug)]
struct ImagesArgs {
    /// Path to the charm config YAML (declared option defaults)
    #[arg(short = 'c', long = "config", default_value = "config.yaml")]
    config_file: PathBuf,

    /// Legacy fallback: source file to scan for pinned-image assignments
    #[arg(long)]
    scan_source: Option<PathBuf>,
}

impl DeployArgs {
    /// Resolve the deployment descriptor and profile
    ///
    /// Precedence for each value: CLI flag > config default > built-in.
    async fn resolve(&self) -> anyhow::Result<(DeployContext, RbacProfile)> {
        let config = match &self.config_file {
            Some(path) => CharmConfig::from_file(path).await?,
            None => CharmConfig::default(),
        };

        let image = self
            .image
            .clone()
            .or_else(|| config.metacontroller_image())
            .unwrap_or_else(|| DEFAULT_METACONTROLLER_IMAGE.to_string());

        let profile = match self
            .rbac_profile
            .clone()
            .or_else(|| config.rbac_profile())
        {
            Some(name) => name.parse::<RbacProfile>()?,
            None => RbacProfile::default(),
        };

        let ctx = DeployContext::new(&self.namespace, &self.app_name, image)?;
        Ok((ctx, profile))
    }

    /// Build the lifecycle driver, connecting to the cluster
    async fn lifecycle(&self) -> anyhow::Result<Lifecycle> {
        let (ctx, profile) = self.resolve().await?;
        let client = Client::try_default()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;
        Ok(Lifecycle::new(client, ctx, profile)
            .with_check_deadline(Duration::from_secs(self.timeout_secs)))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Install(args) => {
            let status = args.lifecycle().await?.install().await?;
            report(status);
        }
        Commands::Remove(args) => {
            args.lifecycle().await?.remove().await?;
            println!("removed");
        }
        Commands::Status(args) => {
            let status = args.lifecycle().await?.status().await?;
            report(status);
        }
        Commands::UpdateStatus(args) => {
            let lifecycle = args.lifecycle().await?;
            // Transient statuses (e.g. maintenance during a reinstall) are
            // printed as they happen; the final one decides the exit code.
            let status = lifecycle
                .update_status(|transient| println!("{}", transient))
                .await?;
            report(status);
        }
        Commands::Render(args) => {
            let (ctx, profile) = args.resolve().await?;
            let set = metacontroller_operator::manifest::render(&ctx, profile)?;
            print!("{}", set.to_yaml()?);
        }
        Commands::Images(args) => {
            let config = CharmConfig::from_file(&args.config_file).await?;
            let pinned = match &args.scan_source {
                Some(path) => {
                    let source = tokio::fs::read_to_string(path).await?;
                    images::pinned_images_with_fallback(&config, &source)?
                }
                None => images::pinned_images(&config)?,
            };
            for image in pinned {
                println!("{}", image);
            }
        }
    }

    Ok(())
}

/// Print the unit status; anything other than active is a non-zero exit so
/// CI and scripts can branch on it
fn report(status: Status) {
    println!("{}", status);
    if status != Status::Active {
        std::process::exit(1);
    }
}
