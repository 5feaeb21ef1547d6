//! Command-line interface for readyq
//!
//! This module defines the CLI structure using clap derive macros.
//! Command bodies live in the submodules.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{Config, StoreConfig};
use crate::error::Result;

mod init;
mod task;

/// readyq - a dependency-aware task list in a markdown file
///
/// Tasks live in one human-readable document (`.readyq.md` by default).
/// Tasks can block each other; `ready` lists what can be worked on now.
#[derive(Parser, Debug)]
#[command(name = "readyq")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the task document (overrides .readyq.toml)
    #[arg(long, global = true, env = "READYQ_DB")]
    pub db_file: Option<PathBuf>,

    /// Path to a configuration file (defaults to ./.readyq.toml)
    #[arg(long, global = true, env = "READYQ_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Show full task ids instead of short ones
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the task document (migrating a legacy one if present)
    Init,

    /// Add a task
    New {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Comma-separated ids or id prefixes of blocking tasks
        #[arg(long, value_delimiter = ',')]
        blocked_by: Vec<String>,
    },

    /// List all tasks, oldest first
    List,

    /// List tasks that are not done and have no unfinished blockers
    Ready,

    /// Show one task with its session logs
    Show {
        /// Task id or unique id prefix
        id: String,
    },

    /// Edit a task's fields, logs, dependencies or status
    Update {
        /// Task id or unique id prefix
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// Delete the session log at this 0-based index
        #[arg(long)]
        delete_log: Option<usize>,

        /// Append a session log entry
        #[arg(long)]
        log: Option<String>,

        /// Comma-separated tasks this task blocks
        #[arg(long, value_delimiter = ',')]
        add_blocks: Vec<String>,

        /// Comma-separated tasks that block this task
        #[arg(long, value_delimiter = ',')]
        add_blocked_by: Vec<String>,

        /// Comma-separated tasks this task should no longer block
        #[arg(long, value_delimiter = ',')]
        remove_blocks: Vec<String>,

        /// Comma-separated tasks that should no longer block this task
        #[arg(long, value_delimiter = ',')]
        remove_blocked_by: Vec<String>,

        /// New status: open, in_progress, blocked, done
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a task and every dependency that mentions it
    Delete {
        /// Task id or unique id prefix
        id: String,
    },

    /// Check the document for integrity problems
    Validate,
}

impl Cli {
    /// Resolve the store configuration: config file, then `--db-file`
    pub fn store_config(&self) -> Result<StoreConfig> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::load_from_dir(&std::env::current_dir()?),
        };
        if let Some(path) = &self.db_file {
            config.store.path = path.clone();
        }
        Ok(config.store)
    }

    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let ctx = task::Context {
            store: self.store_config()?,
            json: self.json,
            quiet: self.quiet,
            verbose: self.verbose,
        };

        match self.command {
            Commands::Init => init::run(ctx),
            Commands::New {
                title,
                description,
                blocked_by,
            } => task::run_new(
                ctx,
                task::NewOptions {
                    title,
                    description,
                    blocked_by,
                },
            ),
            Commands::List => task::run_list(ctx),
            Commands::Ready => task::run_ready(ctx),
            Commands::Show { id } => task::run_show(ctx, &id),
            Commands::Update {
                id,
                title,
                description,
                delete_log,
                log,
                add_blocks,
                add_blocked_by,
                remove_blocks,
                remove_blocked_by,
                status,
            } => task::run_update(
                ctx,
                task::UpdateOptions {
                    id,
                    title,
                    description,
                    delete_log,
                    log,
                    add_blocks,
                    add_blocked_by,
                    remove_blocks,
                    remove_blocked_by,
                    status,
                },
            ),
            Commands::Delete { id } => task::run_delete(ctx, &id),
            Commands::Validate => task::run_validate(ctx),
        }
    }
}
