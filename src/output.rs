//! Human and JSON output for readyq commands.
//!
//! Each command builds a [`HumanOutput`] alongside its serializable result.
//! With `--json` the result is printed inside the `readyq.v1` envelope and
//! the human sections are ignored apart from warnings and next steps.
//! Otherwise the sections print in a fixed order: header, summary, task
//! table, description, session logs, notes, next steps.

use serde::Serialize;

use crate::error::{Error, Result};
use crate::task::{short_id, SessionLog, Task, TaskStatus};

pub const SCHEMA_VERSION: &str = "readyq.v1";

#[derive(Debug, Clone, Copy)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
    /// Full ids instead of short ones
    pub verbose: bool,
}

impl OutputOptions {
    pub fn id<'a>(&self, id: &'a str) -> &'a str {
        display_id(id, self.verbose)
    }

    /// Ids joined for a summary line
    pub fn ids(&self, ids: &[String]) -> String {
        ids.iter()
            .map(|id| self.id(id))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Full id under `--verbose`, the short form otherwise
pub fn display_id(id: &str, verbose: bool) -> &str {
    if verbose {
        id
    } else {
        short_id(id)
    }
}

#[derive(Debug, Clone)]
struct TaskRow {
    id: String,
    status: TaskStatus,
    blocked: bool,
    title: String,
}

#[derive(Debug, Clone)]
pub struct HumanOutput {
    header: String,
    summary: Vec<(String, String)>,
    table: Option<Vec<TaskRow>>,
    description: Option<String>,
    sessions: Option<Vec<SessionLog>>,
    notes: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            summary: Vec::new(),
            table: None,
            description: None,
            sessions: None,
            notes: Vec::new(),
            warnings: Vec::new(),
            next_steps: Vec::new(),
        }
    }

    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.summary.push((key.into(), value.into()));
    }

    pub fn push_note(&mut self, value: impl Into<String>) {
        self.notes.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }

    /// One row per task: id, status, whether anything blocks it, title
    pub fn set_task_table(&mut self, tasks: &[&Task], options: OutputOptions) {
        let rows = tasks
            .iter()
            .map(|task| TaskRow {
                id: options.id(&task.id).to_string(),
                status: task.status,
                blocked: !task.blocked_by.is_empty(),
                title: task.title.clone(),
            })
            .collect();
        self.table = Some(rows);
    }

    /// Show a task's description; an empty one is left out
    pub fn set_description(&mut self, description: &str) {
        if !description.is_empty() {
            self.description = Some(description.to_string());
        }
    }

    /// Show session logs numbered from 0, the index `--delete-log` takes
    pub fn set_session_logs(&mut self, sessions: &[SessionLog]) {
        self.sessions = Some(sessions.to_vec());
    }
}

pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let warnings = human.map(|h| h.warnings.clone()).unwrap_or_default();
        let next_steps = human.map(|h| h.next_steps.clone()).unwrap_or_default();

        #[derive(Serialize)]
        struct Envelope<'a, T: Serialize> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            data: &'a T,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            warnings: Vec<String>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "success",
            data,
            warnings,
            next_steps,
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if let Some(human) = human {
        // Warnings still reach stderr under --quiet.
        for warning in &human.warnings {
            eprintln!("warning: {warning}");
        }
        if !options.quiet {
            println!("{}", format_human(human));
        }
    }

    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let hint = error_hint(err);
    if json {
        #[derive(Serialize)]
        struct ErrorBody<'a> {
            message: &'a str,
            code: i32,
            kind: &'static str,
            #[serde(skip_serializing_if = "Option::is_none")]
            details: Option<serde_json::Value>,
        }

        #[derive(Serialize)]
        struct Envelope<'a> {
            schema_version: &'static str,
            command: &'a str,
            status: &'static str,
            error: ErrorBody<'a>,
            #[serde(skip_serializing_if = "Vec::is_empty")]
            next_steps: Vec<String>,
        }

        let payload = Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: "error",
            error: ErrorBody {
                message: &err.to_string(),
                code: err.exit_code(),
                kind: error_kind(err),
                details: err.details(),
            },
            next_steps: hint.into_iter().collect(),
        };

        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    eprintln!("error: {err}");
    if let Some(hint) = hint {
        eprintln!("hint: {hint}");
    }
    Ok(())
}

/// Warnings go to the human section as-is; `Display` already reads well
pub fn push_warnings<'a, W>(human: &mut HumanOutput, warnings: impl IntoIterator<Item = &'a W>)
where
    W: std::fmt::Display + 'a,
{
    for warning in warnings {
        human.push_warning(warning.to_string());
    }
}

pub fn format_human(output: &HumanOutput) -> String {
    let mut lines = vec![output.header.clone()];

    push_summary(&mut lines, &output.summary);
    if let Some(rows) = &output.table {
        push_task_table(&mut lines, rows);
    }
    if let Some(description) = &output.description {
        lines.push(String::new());
        lines.push("Description:".to_string());
        push_indented(&mut lines, description);
    }
    if let Some(sessions) = &output.sessions {
        push_session_logs(&mut lines, sessions);
    }
    push_list(&mut lines, "Notes", &output.notes);
    push_list(&mut lines, "Next steps", &output.next_steps);

    lines.join("\n")
}

/// First non-flag argument, skipping the values of global options
pub fn infer_command_name_from_args() -> String {
    let mut args = std::env::args().skip(1);
    let takes_value = ["--db-file", "--config"];

    while let Some(arg) = args.next() {
        if takes_value.contains(&arg.as_str()) {
            args.next();
            continue;
        }
        if arg.starts_with('-') {
            continue;
        }
        return arg;
    }
    "readyq".to_string()
}

fn error_kind(err: &Error) -> &'static str {
    match err.exit_code() {
        2 => "user_error",
        3 => "lock_contended",
        _ => "operation_failed",
    }
}

fn error_hint(err: &Error) -> Option<String> {
    match err {
        Error::NotFound(_) => Some("readyq list".to_string()),
        Error::Ambiguous { .. } => Some("use a longer id prefix".to_string()),
        Error::InvalidLogIndex { .. } => Some("readyq show <id>".to_string()),
        Error::LockTimeout { path, .. } => Some(format!(
            "if no other readyq process is running, remove {}",
            path.display()
        )),
        Error::InvalidConfig(_) => Some("fix .readyq.toml then retry".to_string()),
        _ => None,
    }
}

fn push_summary(lines: &mut Vec<String>, summary: &[(String, String)]) {
    if summary.is_empty() {
        return;
    }

    lines.push(String::new());
    for (key, value) in summary {
        lines.push(format!("{key}: {value}"));
    }
}

fn push_task_table(lines: &mut Vec<String>, rows: &[TaskRow]) {
    lines.push(String::new());
    if rows.is_empty() {
        lines.push("No tasks found.".to_string());
        return;
    }

    let id_width = rows.iter().map(|row| row.id.len()).max().unwrap_or(0).max(2);
    // Wide enough for `in_progress`.
    let status_width = 11;
    lines.push(format!(
        "{:<id_width$}  {:<status_width$}  {:<7}  TITLE",
        "ID", "STATUS", "BLOCKED"
    ));
    for row in rows {
        let blocked = if row.blocked { "yes" } else { "no" };
        lines.push(format!(
            "{:<id_width$}  {:<status_width$}  {:<7}  {}",
            row.id,
            row.status.as_str(),
            blocked,
            row.title
        ));
    }
}

fn push_session_logs(lines: &mut Vec<String>, sessions: &[SessionLog]) {
    lines.push(String::new());
    if sessions.is_empty() {
        lines.push("Session logs: none".to_string());
        return;
    }

    lines.push("Session logs:".to_string());
    for (idx, session) in sessions.iter().enumerate() {
        lines.push(format!("[{idx}] {}", session.timestamp));
        push_indented(lines, &session.log);
    }
}

fn push_indented(lines: &mut Vec<String>, text: &str) {
    for line in text.lines() {
        if line.is_empty() {
            lines.push(String::new());
        } else {
            lines.push(format!("    {line}"));
        }
    }
}

fn push_list(lines: &mut Vec<String>, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }

    lines.push(String::new());
    lines.push(format!("{title}:"));
    for item in items {
        lines.push(format!("- {item}"));
    }
}
