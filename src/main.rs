//! depsentry - Multi-ecosystem dependency inventory and update CLI
//!
//! Subcommands:
//! - check: probe the dependency catalog
//! - outdated: list available updates
//! - update: apply updates under the configured policy
//! - report: build a dependency health report
//! - backup / backups / restore: manifest snapshots

use clap::Parser;
use depsentry::backup::BackupManager;
use depsentry::cli::{CliArgs, Command};
use depsentry::command::SystemCommandRunner;
use depsentry::domain::{DependencyCatalog, UpdateConfig};
use depsentry::inventory::DependencyInventory;
use depsentry::output::{JsonRenderer, OutputFormat, TextRenderer};
use depsentry::progress::Progress;
use depsentry::report::build_report;
use depsentry::update::{BatchUpdater, UpdateChecker};
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();
    init_tracing(&args);

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(args: &CliArgs) {
    let default_level = if args.verbose {
        "depsentry=debug"
    } else if args.quiet {
        "depsentry=error"
    } else {
        "depsentry=warn"
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    let root = args.path.clone();
    let runner = Arc::new(SystemCommandRunner::new());
    let format = OutputFormat::from_cli(args.json);
    let show_progress = !args.quiet && !args.json;

    let mut catalog = DependencyCatalog::core();
    catalog.extend_from_file(&root.join(".depsentry").join("catalog.json"))?;

    let mut config = UpdateConfig::load(&root);
    args.apply_to_config(&mut config);

    let mut stdout = io::stdout().lock();
    match &args.command {
        Command::Check { refresh } => {
            let mut inventory = DependencyInventory::new(catalog, runner, &root);
            inventory.discover();
            if *refresh {
                inventory.refresh();
            }

            let mut progress = Progress::new(show_progress);
            progress.spinner("Probing dependencies...");
            let states = inventory.probe_all().await;
            progress.finish_and_clear();

            match format {
                OutputFormat::Json => JsonRenderer::new().check(&states, &mut stdout)?,
                OutputFormat::Text => TextRenderer::new(args.verbose).check(&states, &mut stdout)?,
            }
            stdout.flush()?;

            let critical_missing = inventory
                .catalog()
                .critical()
                .any(|d| !states.get(&d.name).map(|s| s.installed).unwrap_or(false));
            Ok(if critical_missing {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }

        Command::Outdated => {
            let mut progress = Progress::new(show_progress);
            progress.spinner("Checking for updates...");
            let candidates = UpdateChecker::new(runner, &root).collect_candidates().await;
            progress.finish_and_clear();

            match format {
                OutputFormat::Json => JsonRenderer::new().outdated(&candidates, &mut stdout)?,
                OutputFormat::Text => {
                    TextRenderer::new(args.verbose).outdated(&candidates, &mut stdout)?
                }
            }
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Update { .. } => {
            let mut progress = Progress::new(show_progress);
            progress.spinner("Checking for updates...");
            let candidates = UpdateChecker::new(runner.clone(), &root)
                .collect_candidates()
                .await;
            progress.set_message("Applying updates...");

            let updater = BatchUpdater::new(runner, &root, config);
            let (summary, skipped) = updater.run(candidates).await?;
            progress.finish_and_clear();

            match format {
                OutputFormat::Json => {
                    JsonRenderer::new().update(&summary, &skipped, &mut stdout)?
                }
                OutputFormat::Text => {
                    TextRenderer::new(args.verbose).update(&summary, &skipped, &mut stdout)?
                }
            }
            stdout.flush()?;

            // Partial failure gets its own exit code
            Ok(if summary.all_succeeded() {
                ExitCode::SUCCESS
            } else if summary.success_count() > 0 {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            })
        }

        Command::Report => {
            let mut inventory = DependencyInventory::new(catalog, runner.clone(), &root);
            inventory.discover();

            let mut progress = Progress::new(show_progress);
            progress.spinner("Building report...");
            let states = inventory.probe_all().await;
            let candidates = UpdateChecker::new(runner, &root).collect_candidates().await;
            progress.finish_and_clear();

            let report = build_report(inventory.catalog(), &states, &candidates);
            match format {
                OutputFormat::Json => JsonRenderer::new().report(&report, &mut stdout)?,
                OutputFormat::Text => TextRenderer::new(args.verbose).report(&report, &mut stdout)?,
            }
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Backup => {
            let id = BackupManager::new(&root).snapshot()?;
            writeln!(stdout, "Created backup {}", id)?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Backups => {
            let backups = BackupManager::new(&root).list_backups();
            match format {
                OutputFormat::Json => JsonRenderer::new().backups(&backups, &mut stdout)?,
                OutputFormat::Text => {
                    TextRenderer::new(args.verbose).backups(&backups, &mut stdout)?
                }
            }
            stdout.flush()?;
            Ok(ExitCode::SUCCESS)
        }

        Command::Restore { id } => {
            let restored = BackupManager::new(&root).restore(id)?;
            writeln!(stdout, "Restored {} file(s) from {}", restored, id)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
