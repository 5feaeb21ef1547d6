//! readyq - Dependency-Aware Task Tracking Library
//!
//! This library provides the persistence and dependency-graph core of the
//! readyq CLI: tasks stored in one markdown document, safe to share between
//! concurrent processes.
//!
//! # Core Concepts
//!
//! - **Document**: a markdown file holding every task, one section each
//! - **Edges**: "A blocks B" is recorded on both tasks (`blocks` / `blocked_by`)
//! - **Ready set**: tasks that are not done and whose blockers are all done
//! - **Lock**: a sidecar marker file that serialises writers
//!
//! # Module Organization
//!
//! - `cli`: Command-line interface using clap
//! - `config`: Configuration loading from `.readyq.toml`
//! - `error`: Error types, warnings and result aliases
//! - `lock`: Document lock and atomic file replacement
//! - `task`: Task record, status and id helpers
//! - `document`: Markdown document parsing and rendering
//! - `legacy`: Line-delimited JSON documents from older versions
//! - `store`: Load/save of the whole collection, legacy migration
//! - `graph`: Edge maintenance, completion, ready set, cycle detection
//! - `validate`: Integrity audit of a loaded collection
//! - `update`: Task creation and multi-field edits
//! - `output`: Human and JSON output for the CLI

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod graph;
pub mod legacy;
pub mod lock;
pub mod output;
pub mod store;
pub mod task;
pub mod update;
pub mod validate;

pub use error::{Error, Result, Warning};
pub use store::TaskStore;
pub use task::{Task, TaskStatus};
