//! readyq init command implementation
//!
//! Creates an empty task document, converting a legacy one first.

use std::path::PathBuf;

use crate::error::Result;
use crate::output::{emit_success, push_warnings, HumanOutput};
use crate::store::{MigrationReport, TaskStore};

use super::task::Context;

#[derive(serde::Serialize)]
struct InitReport {
    path: PathBuf,
    created: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    migration: Option<MigrationReport>,
}

pub fn run(ctx: Context) -> Result<()> {
    let store = TaskStore::new(ctx.store.clone());
    let migration = store.migrate_legacy()?;
    let created = store.init()?;

    let header = match (&migration, created) {
        (Some(_), _) => "readyq init: migrated legacy document",
        (None, true) => "readyq init: created task document",
        (None, false) => "readyq init: nothing to do",
    };

    let mut human = HumanOutput::new(header);
    human.push_summary("document", store.path().display().to_string());
    if let Some(migration) = &migration {
        human.push_summary("migrated tasks", migration.migrated_tasks.to_string());
        human.push_summary("backup", migration.backup.display().to_string());
        push_warnings(&mut human, &migration.warnings);
    }
    human.push_next_step("readyq new \"<title>\"");
    human.push_next_step("readyq ready");

    let report = InitReport {
        path: store.path().to_path_buf(),
        created: created || migration.is_some(),
        migration,
    };

    emit_success(ctx.output(), "init", &report, Some(&human))
}
