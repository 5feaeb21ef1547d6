#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use readyq::config::StoreConfig;
use readyq::store::TaskStore;
use readyq::task::Task;
use tempfile::TempDir;

/// Scratch directory holding one task document
pub struct TestDb {
    dir: TempDir,
}

impl TestDb {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("failed to create tempdir");
        Self { dir }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.path().join(".readyq.md")
    }

    pub fn config(&self) -> StoreConfig {
        StoreConfig::for_path(self.db_path())
    }

    pub fn store(&self) -> TaskStore {
        TaskStore::new(self.config())
    }

    pub fn write_file(&self, rel_path: &str, contents: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(rel_path);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, contents)?;
        Ok(path)
    }

    pub fn read_db(&self) -> String {
        fs::read_to_string(self.db_path()).unwrap_or_default()
    }

    /// `readyq` running inside the scratch directory
    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("readyq").expect("binary");
        cmd.current_dir(self.path())
            .env_remove("READYQ_DB")
            .env_remove("READYQ_CONFIG")
            .env_remove("RUST_LOG");
        cmd
    }
}

/// Task with a recognisable id: `prefix` padded with zeros to 32 hex digits
pub fn task_with_id(prefix: &str, title: &str) -> Task {
    let mut task = Task::new(title, "");
    task.id = format!("{prefix:0<32}");
    task
}
