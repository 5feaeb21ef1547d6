//! Document-backed task repository.
//!
//! The whole collection is loaded and saved as one snapshot. Writers hold
//! the document lock for the entire write (and, through [`TaskStore::update`],
//! for the entire read-modify-write); readers never lock and rely on atomic
//! replacement to see either the old or the new document.
//!
//! A legacy line-delimited JSON document at the sibling `.jsonl` path is
//! migrated to markdown the first time the store is touched, keeping a
//! `.backup` copy of the original.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::StoreConfig;
use crate::document::{parse_document, render_document, render_task, TASK_SEPARATOR};
use crate::error::{Result, Warning};
use crate::graph::resolve_index;
use crate::legacy::{detect_format, parse_jsonl, render_jsonl, DocumentFormat};
use crate::lock::{write_atomic_str, DocumentLock};
use crate::task::Task;
use crate::validate::{validate, ValidationReport};

/// Everything learned while loading the document
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub tasks: Vec<Task>,
    pub format: DocumentFormat,
    /// Malformed legacy lines and validation findings
    pub warnings: Vec<Warning>,
    /// Present when a non-empty markdown document was audited
    pub validation: Option<ValidationReport>,
    pub migration: Option<MigrationReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub backup: PathBuf,
    pub migrated_tasks: usize,
    #[serde(skip)]
    pub warnings: Vec<Warning>,
}

#[derive(Debug, Clone)]
pub struct TaskStore {
    config: StoreConfig,
}

impl TaskStore {
    pub fn new(config: StoreConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Path to the markdown document
    pub fn path(&self) -> &Path {
        &self.config.path
    }

    fn lock(&self) -> Result<DocumentLock> {
        DocumentLock::acquire_with_retry(
            self.config.lock_path(),
            self.config.lock_timeout_ms,
            self.config.lock_retry_ms,
        )
    }

    /// Create an empty document if none exists; returns whether one was made
    pub fn init(&self) -> Result<bool> {
        self.migrate_legacy()?;
        let _lock = self.lock()?;
        if self.path().exists() {
            return Ok(false);
        }
        write_atomic_str(self.path(), "")?;
        tracing::info!(path = %self.path().display(), "created task document");
        Ok(true)
    }

    /// Convert a legacy `.jsonl` document when the markdown one is absent
    pub fn migrate_legacy(&self) -> Result<Option<MigrationReport>> {
        let source = self.config.legacy_path();
        if self.path().exists() || !source.exists() || source == self.config.path {
            return Ok(None);
        }

        let _lock = self.lock()?;
        // Another process may have migrated while we waited.
        if self.path().exists() {
            return Ok(None);
        }

        let text = fs::read_to_string(&source)?;
        let (tasks, warnings) = parse_jsonl(&text, &source);
        let backup = self.config.legacy_backup_path();
        fs::copy(&source, &backup)?;
        write_atomic_str(self.path(), &render_document(&tasks))?;

        tracing::info!(
            source = %source.display(),
            target = %self.path().display(),
            tasks = tasks.len(),
            "migrated legacy task document"
        );
        Ok(Some(MigrationReport {
            source,
            target: self.config.path.clone(),
            backup,
            migrated_tasks: tasks.len(),
            warnings,
        }))
    }

    /// Load every task
    pub fn load(&self) -> Result<Vec<Task>> {
        Ok(self.load_with_report()?.tasks)
    }

    /// Load every task, keeping warnings and the validation audit
    pub fn load_with_report(&self) -> Result<LoadReport> {
        let migration = self.migrate_legacy()?;
        let (tasks, format, mut warnings) = self.read()?;
        if let Some(migration) = &migration {
            warnings.extend(migration.warnings.iter().cloned());
        }

        let validation = if format == DocumentFormat::Markdown && !tasks.is_empty() {
            let report = validate(&tasks);
            if !report.errors.is_empty() {
                tracing::warn!(
                    path = %self.path().display(),
                    errors = report.errors.len(),
                    "task document loaded with validation errors"
                );
            }
            warnings.extend(report.to_warnings());
            Some(report)
        } else {
            None
        };

        Ok(LoadReport {
            tasks,
            format,
            warnings,
            validation,
            migration,
        })
    }

    fn read(&self) -> Result<(Vec<Task>, DocumentFormat, Vec<Warning>)> {
        let text = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Ok((Vec::new(), DocumentFormat::Markdown, Vec::new()))
            }
            Err(e) => return Err(e.into()),
        };

        Ok(match detect_format(&text) {
            DocumentFormat::Jsonl => {
                let (tasks, warnings) = parse_jsonl(&text, self.path());
                (tasks, DocumentFormat::Jsonl, warnings)
            }
            DocumentFormat::Markdown => (parse_document(&text), DocumentFormat::Markdown, Vec::new()),
        })
    }

    fn current_format(&self) -> Result<DocumentFormat> {
        match fs::read_to_string(self.path()) {
            Ok(text) => Ok(detect_format(&text)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(DocumentFormat::Markdown),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, tasks: &[Task], format: DocumentFormat) -> Result<()> {
        let text = match format {
            DocumentFormat::Markdown => render_document(tasks),
            DocumentFormat::Jsonl => render_jsonl(tasks)?,
        };
        write_atomic_str(self.path(), &text)?;
        tracing::debug!(path = %self.path().display(), tasks = tasks.len(), "saved task document");
        Ok(())
    }

    /// Replace the whole document with `tasks`
    ///
    /// A legacy document is migrated first so its backup is kept.
    pub fn save_all(&self, tasks: &[Task]) -> Result<()> {
        self.migrate_legacy()?;
        let _lock = self.lock()?;
        let format = self.current_format()?;
        self.write(tasks, format)
    }

    /// Add one task to the end of the document without rewriting it
    pub fn append_one(&self, task: &Task) -> Result<()> {
        self.migrate_legacy()?;
        let _lock = self.lock()?;

        let existing = match fs::read_to_string(self.path()) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
            Err(e) => return Err(e.into()),
        };

        let chunk = match detect_format(&existing) {
            DocumentFormat::Jsonl => {
                let mut line = serde_json::to_string(task)?;
                line.push('\n');
                if !existing.is_empty() && !existing.ends_with('\n') {
                    line.insert(0, '\n');
                }
                line
            }
            DocumentFormat::Markdown if existing.trim().is_empty() => render_task(task),
            DocumentFormat::Markdown => format!("{}{}", TASK_SEPARATOR, render_task(task)),
        };

        if let Some(parent) = self.path().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path())?;
        file.write_all(chunk.as_bytes())?;
        file.sync_all()?;
        tracing::debug!(task = %task.id, "appended task");
        Ok(())
    }

    /// Find the single task whose id starts with `prefix`
    ///
    /// An id equal to `prefix` wins even when longer ids also start with it.
    pub fn find_by_id_prefix(&self, prefix: &str) -> Result<Task> {
        let mut tasks = self.load()?;
        let idx = resolve_index(&tasks, prefix)?;
        Ok(tasks.swap_remove(idx))
    }

    /// Load, mutate and save while holding the lock throughout
    ///
    /// Nothing is written when `apply` fails.
    pub fn update<T>(&self, apply: impl FnOnce(&mut Vec<Task>) -> Result<T>) -> Result<T> {
        self.migrate_legacy()?;
        let _lock = self.lock()?;
        let (mut tasks, format, _) = self.read()?;
        let value = apply(&mut tasks)?;
        self.write(&tasks, format)?;
        Ok(value)
    }
}
