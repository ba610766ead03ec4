use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use wsboot::bootstrap::{BootstrapOrchestrator, ConsoleReporter};
use wsboot::config::{ConfigOverrides, WorkspaceConfig};
use wsboot::package::{Package, filter_packages, find_workspace_packages, topological_order};
use wsboot::runtime::RealRuntime;

/// wsboot - Workspace bootstrap linker
///
/// Installs the external dependencies of every package in a workspace and
/// links sibling packages into each other's dependency directories.
///
/// Settings are read from wsboot.json at the workspace root.
///
/// Examples:
///   wsboot bootstrap              # Bootstrap the workspace in the current directory
///   wsboot -r ./repo ls           # List the packages of ./repo
#[derive(Parser, Debug)]
#[command(author, version = env!("WSBOOT_VERSION"), about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Workspace root directory (defaults to the current directory; also via WSBOOT_ROOT)
    #[arg(
        long = "root",
        short = 'r',
        env = "WSBOOT_ROOT",
        value_name = "PATH",
        global = true
    )]
    pub root: Option<PathBuf>,

    /// Skip packages whose name matches this glob
    #[arg(long = "ignore", value_name = "GLOB", global = true)]
    pub ignore: Option<String>,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Install external dependencies and link sibling packages
    Bootstrap(BootstrapArgs),

    /// List the workspace packages
    Ls,
}

#[derive(clap::Args, Debug)]
pub struct BootstrapArgs {
    /// Maximum number of packages bootstrapped at once
    #[arg(long, short = 'c', env = "WSBOOT_CONCURRENCY", value_name = "N")]
    pub concurrency: Option<usize>,

    /// Install command used for external dependencies
    #[arg(long = "npm-client", env = "WSBOOT_NPM_CLIENT", value_name = "CLIENT")]
    pub npm_client: Option<String>,

    /// Text prepended to every generated proxy module
    #[arg(long = "link-file-prefix", value_name = "TEXT")]
    pub link_file_prefix: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let runtime = RealRuntime;

    let root = match cli.root {
        Some(root) => std::path::absolute(&root)
            .with_context(|| format!("Failed to resolve workspace root {:?}", root))?,
        None => std::env::current_dir().context("Failed to get current directory")?,
    };

    match cli.command {
        Commands::Bootstrap(args) => {
            let overrides = ConfigOverrides {
                concurrency: args.concurrency,
                ignore: cli.ignore,
                npm_client: args.npm_client,
                link_file_prefix: args.link_file_prefix,
            };
            bootstrap(&runtime, &root, overrides).await?
        }
        Commands::Ls => {
            let overrides = ConfigOverrides {
                ignore: cli.ignore,
                ..Default::default()
            };
            list(&runtime, &root, overrides).await?
        }
    }
    Ok(())
}

async fn load_packages(
    runtime: &RealRuntime,
    root: &Path,
    overrides: ConfigOverrides,
) -> Result<(WorkspaceConfig, Vec<Package>)> {
    let config = WorkspaceConfig::load(runtime, root)
        .await?
        .with_overrides(overrides);
    let packages = find_workspace_packages(runtime, root, &config.packages).await?;
    let packages = filter_packages(packages, config.ignore.as_deref())?;
    Ok((config, topological_order(packages)))
}

async fn bootstrap(runtime: &RealRuntime, root: &Path, overrides: ConfigOverrides) -> Result<()> {
    let (config, packages) = load_packages(runtime, root, overrides).await?;
    if packages.is_empty() {
        println!("No packages found in {}", root.display());
        return Ok(());
    }

    let installer = config.installer();
    let reporter = ConsoleReporter::new(packages.len());
    let orchestrator =
        BootstrapOrchestrator::new(runtime, &installer, &reporter, config.bootstrap_options());

    println!(
        "Bootstrapping {} package(s) with concurrency {}",
        packages.len(),
        orchestrator.options().concurrency
    );
    let summary = orchestrator
        .run(&packages)
        .await
        .map_err(|e| anyhow::anyhow!(e.chain_message()))?;

    println!(
        "Successfully bootstrapped {} package(s), {} link(s), {} warning(s)",
        summary.reports.len(),
        summary.linked_count(),
        summary.warnings().count()
    );
    Ok(())
}

async fn list(runtime: &RealRuntime, root: &Path, overrides: ConfigOverrides) -> Result<()> {
    let (_, packages) = load_packages(runtime, root, overrides).await?;
    if packages.is_empty() {
        println!("No packages found in {}", root.display());
        return Ok(());
    }

    for package in &packages {
        let location = package
            .location
            .strip_prefix(root)
            .unwrap_or(&package.location);
        println!("{}@{}  {}", package.name, package.version, location.display());
    }
    Ok(())
}
