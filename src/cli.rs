//! CLI argument parsing module for depsentry

use crate::domain::UpdateConfig;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

/// Multi-ecosystem dependency inventory and update tool
#[derive(Parser, Debug, Clone)]
#[command(
    name = "depsentry",
    version,
    about = "Multi-ecosystem dependency inventory and update tool"
)]
pub struct CliArgs {
    /// Project directory to operate on
    #[arg(short = 'C', long = "path", default_value = ".", global = true)]
    pub path: PathBuf,

    /// Enable verbose output
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Enable quiet mode - minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Probe the dependency catalog and show what is installed
    Check {
        /// Drop cached probe results and probe the system again
        #[arg(long)]
        refresh: bool,
    },

    /// List declared packages with newer versions available
    Outdated,

    /// Apply available updates according to the configured policy
    Update {
        /// Show what would be updated without making changes
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Exclude specific packages (can be specified multiple times)
        #[arg(long, action = ArgAction::Append)]
        exclude: Vec<String>,

        /// Allow major version updates
        #[arg(long)]
        major: bool,

        /// Maximum number of packages updated at once
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Skip the pre-update manifest snapshot
        #[arg(long)]
        no_backup: bool,

        /// Skip the post-update test gate
        #[arg(long)]
        no_test: bool,
    },

    /// Build a dependency health report
    Report,

    /// Snapshot the project's manifest and lock files
    Backup,

    /// List existing snapshots
    Backups,

    /// Restore a snapshot over the project's manifests
    Restore {
        /// Snapshot id as shown by `backups`
        id: String,
    },
}

impl CliArgs {
    /// Overlays update-related flags onto a loaded configuration
    pub fn apply_to_config(&self, config: &mut UpdateConfig) {
        if let Command::Update {
            dry_run,
            exclude,
            major,
            max_concurrent,
            no_backup,
            no_test,
        } = &self.command
        {
            if *dry_run {
                config.dry_run = true;
            }
            if *major {
                config.auto_update_major = true;
            }
            if *no_backup {
                config.create_backup = false;
            }
            if *no_test {
                config.run_tests_after_update = false;
            }
            if let Some(n) = max_concurrent {
                config.max_concurrent_updates = (*n).max(1);
            }
            for package in exclude {
                if !config.exclude_packages.contains(package) {
                    config.exclude_packages.push(package.clone());
                }
            }
        }
    }
}
