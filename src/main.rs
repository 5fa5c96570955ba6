use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use vigil_mod_updater::manifest::Manifest;
use vigil_mod_updater::update::{CurrentProcess, NoRestart, ProcessControl, UpdateApplier};
use vigil_mod_updater::{RegistrationEvents, Updater, UpdaterConfig, UpdaterContext};

#[derive(Parser, Debug)]
#[command(name = "vigil-mod-updater")]
#[command(about = "Keeps plugin mods up to date from their GitHub releases", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Pending-update cache file (defaults to the configured one)
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Apply cached updates now
    Apply,

    /// List updates waiting for the next start
    Status,

    /// Drop every pending update
    Clear,

    /// Apply cached updates, then check every mod listed in a manifest
    Check {
        /// TOML file with one [[module]] table per mod
        manifest: PathBuf,

        /// Queue updates without relaunching the process
        #[arg(long)]
        no_restart: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = UpdaterConfig::load()?;
    if let Some(cache) = cli.cache {
        config.cache_file = cache;
    }

    match cli.command {
        Command::Apply => run_apply_command(config),
        Command::Status => run_status_command(config),
        Command::Clear => run_clear_command(config),
        Command::Check {
            manifest,
            no_restart,
        } => run_check_command(config, &manifest, no_restart),
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        "vigil_mod_updater=debug"
    } else {
        "vigil_mod_updater=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn run_apply_command(config: UpdaterConfig) -> Result<()> {
    let ctx = UpdaterContext::from_config(config)?;
    let report = UpdateApplier::new(&ctx).apply_all();

    if report.is_empty() {
        println!("{} No pending updates", "✓".green());
        return Ok(());
    }

    for update in &report.applied {
        println!(
            "   {} {} {}",
            "✓".green(),
            update.mod_name,
            update.new_version.dimmed()
        );
    }
    for name in &report.failed {
        println!("   {} {} {}", "✗".red(), name, "(dropped)".dimmed());
    }
    for name in &report.skipped {
        println!("   {} {} {}", "-".yellow(), name, "(incomplete record)".dimmed());
    }

    Ok(())
}

fn run_status_command(config: UpdaterConfig) -> Result<()> {
    let ctx = UpdaterContext::from_config(config)?;
    let pending = ctx.store.load();

    if pending.is_empty() {
        println!("{}", "No pending updates".dimmed());
        return Ok(());
    }

    println!("{} ({})", "PENDING UPDATES".bold(), pending.len());
    for update in &pending {
        println!(
            "   {} {} → {}",
            "↑".yellow(),
            update.mod_name,
            update.new_version.green()
        );
        println!("     {}", update.local_path.display().to_string().dimmed());
    }

    Ok(())
}

fn run_clear_command(config: UpdaterConfig) -> Result<()> {
    let ctx = UpdaterContext::from_config(config)?;
    ctx.store.clear()?;
    println!("{} Pending updates cleared", "✓".green());
    Ok(())
}

fn run_check_command(config: UpdaterConfig, manifest_path: &Path, no_restart: bool) -> Result<()> {
    let mut manifest = Manifest::load(manifest_path)?;
    let ctx = UpdaterContext::from_config(config)?;

    let process: Arc<dyn ProcessControl> = if no_restart {
        Arc::new(NoRestart)
    } else {
        Arc::new(CurrentProcess)
    };
    let events = Arc::new(RegistrationEvents::new());
    let updater = Updater::start(ctx.clone(), process, events.clone());

    // Installed builds become the manifest's versions, so the next run does not re-queue them
    let bumped = manifest.record_installed(updater.startup_report());
    if bumped > 0 {
        manifest.save(manifest_path)?;
        println!("{} {} mod(s) updated at startup", "✓".green(), bumped);
    }

    for module in &manifest.modules {
        events.publish(module);
    }

    let pending = ctx.store.load();
    if pending.is_empty() {
        println!("{} All mods are up to date", "✓".green());
    } else {
        println!(
            "{} {} update(s) queued for the next start",
            "↑".yellow(),
            pending.len()
        );
    }

    drop(updater);
    Ok(())
}
