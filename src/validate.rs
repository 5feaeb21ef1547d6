//! Integrity audit of a loaded task collection.
//!
//! Read-only: problems are reported, never repaired, and never stop the
//! caller from using the collection.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::Serialize;

use crate::error::Warning;
use crate::graph::detect_cycle;
use crate::task::{is_valid_task_id, Task};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }

    /// Errors and warnings as non-fatal load warnings
    pub fn to_warnings(&self) -> Vec<Warning> {
        self.errors
            .iter()
            .chain(self.warnings.iter())
            .map(|message| Warning::Validation(message.clone()))
            .collect()
    }
}

/// Audit `tasks` for missing fields, malformed ids, dangling edges,
/// duplicate ids and dependency cycles
pub fn validate(tasks: &[Task]) -> ValidationReport {
    let mut report = ValidationReport::default();
    let known: HashSet<&str> = tasks
        .iter()
        .filter(|task| !task.id.is_empty())
        .map(|task| task.id.as_str())
        .collect();

    for task in tasks {
        validate_task(task, &known, &mut report.errors);
    }

    let mut seen: HashMap<&str, usize> = HashMap::new();
    for task in tasks.iter().filter(|task| !task.id.is_empty()) {
        *seen.entry(task.id.as_str()).or_default() += 1;
    }
    let mut duplicates: Vec<&str> = seen
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, _)| id)
        .collect();
    duplicates.sort_unstable();
    for id in duplicates {
        report.errors.push(format!(
            "Duplicate task ID {id} - each task must have unique ID"
        ));
    }

    if let Some(cycle) = detect_cycle(tasks) {
        report
            .errors
            .push(format!("Circular dependency detected: {}", cycle.join(" → ")));
    }

    report
}

fn validate_task(task: &Task, known: &HashSet<&str>, errors: &mut Vec<String>) {
    let name = if task.title.trim().is_empty() {
        "Unknown"
    } else {
        task.title.as_str()
    };

    let required = [
        ("title", &task.title),
        ("id", &task.id),
        ("created_at", &task.created_at),
        ("updated_at", &task.updated_at),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(format!("Task '{name}' missing required field: {field}"));
        }
    }

    if !task.id.is_empty() && !is_valid_task_id(&task.id) {
        errors.push(format!("Task '{name}' has invalid ID format: {}", task.id));
    }

    for (list, ids) in [("blocks", &task.blocks), ("blocked_by", &task.blocked_by)] {
        for id in ids.iter().filter(|id| !known.contains(id.as_str())) {
            errors.push(format!(
                "Task '{name}' references non-existent task in {list}: {id}"
            ));
        }
    }
}

fn fix_hint(error: &str) -> &'static str {
    if error.contains("missing required field") {
        "Add the missing field with proper markdown format"
    } else if error.contains("invalid ID format") {
        "Use a 32-character lowercase hex id (a UUID without dashes)"
    } else if error.contains("non-existent task") {
        "Update dependency to valid task ID or remove it"
    } else if error.contains("Circular dependency") {
        "Break the cycle by removing one dependency"
    } else if error.contains("Duplicate task ID") {
        "Change one task ID to be unique"
    } else {
        "Review and fix the issue above"
    }
}

/// Human-readable report with a fix hint per error
pub fn render_report(report: &ValidationReport, path: &Path) -> String {
    if report.is_clean() {
        return format!("{} validation passed - no issues found", path.display());
    }

    let mut lines = vec![format!("Validation Report for {}", path.display())];

    if !report.errors.is_empty() {
        lines.push(String::new());
        lines.push(format!("{} Error(s) Found:", report.errors.len()));
        for (idx, error) in report.errors.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, error));
            lines.push(format!("   hint: {}", fix_hint(error)));
        }
    }

    if !report.warnings.is_empty() {
        lines.push(String::new());
        lines.push(format!("{} Warning(s):", report.warnings.len()));
        for (idx, warning) in report.warnings.iter().enumerate() {
            lines.push(format!("{}. {}", idx + 1, warning));
        }
    }

    lines.join("\n")
}
