//! Markdown document codec.
//!
//! The document is a sequence of task blocks:
//!
//! ```text
//! document  := preamble? block ( separator block )*
//! separator := "---" blank-line
//! block     := "# Task: " title
//!              metadata*            (**ID**, **Created**, **Updated**, **Blocks**, **Blocked By**)
//!              "## Status"          checklist, one "- [x]" item
//!              "## Description"     <description> ... </description>
//!              "## Session Logs"?   ( "### " timestamp <log> ... </log> )*
//! ```
//!
//! Description and log bodies are read as opaque runs of lines between their
//! start and end markers, so nothing inside them (rules, headings, metadata,
//! further markers) is ever seen by the block scanner. The end marker must
//! stand alone on its line. A body line that would read as its own end
//! marker is written with one extra leading backslash (`\</log>`), which
//! parsing strips again. Bodies written before the markers existed run until
//! the next heading or rule instead; that form is only tried when the start
//! marker is absent.
//!
//! Two things are normalised rather than kept: titles are trimmed, and line
//! endings inside bodies come back as `\n` whatever was written.
//!
//! Parsing never fails: missing pieces fall back to empty lists, `open`
//! status, an empty description and no sessions.

use crate::task::{SessionLog, Task, TaskStatus};

const TASK_HEADER: &str = "# Task:";
const SEPARATOR: &str = "---";
const DESCRIPTION_OPEN: &str = "<description>";
const DESCRIPTION_CLOSE: &str = "</description>";
const LOG_OPEN: &str = "<log>";
const LOG_CLOSE: &str = "</log>";

/// Text placed between two rendered tasks
pub const TASK_SEPARATOR: &str = "\n---\n\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Metadata,
    Status,
    Other,
}

#[derive(Debug, Default)]
struct TaskDraft {
    title: String,
    id: String,
    created_at: String,
    updated_at: String,
    blocks: Vec<String>,
    blocked_by: Vec<String>,
    status: Option<TaskStatus>,
    description: Option<String>,
    sessions: Vec<SessionLog>,
}

impl TaskDraft {
    fn new(title: &str) -> Self {
        Self {
            title: title.trim().to_string(),
            ..Self::default()
        }
    }

    fn apply_field(&mut self, field: &str, value: &str) {
        match field {
            "id" => self.id = value.to_string(),
            "created" | "created_at" => self.created_at = value.to_string(),
            "updated" | "updated_at" => self.updated_at = value.to_string(),
            "blocks" => self.blocks = parse_id_list(value),
            "blocked_by" => self.blocked_by = parse_id_list(value),
            _ => {}
        }
    }

    fn finish(self) -> Task {
        Task {
            id: self.id,
            title: self.title,
            description: self.description.unwrap_or_default(),
            status: self.status.unwrap_or_default(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            blocks: self.blocks,
            blocked_by: self.blocked_by,
            sessions: self.sessions,
        }
    }
}

struct Scanner<'a> {
    lines: Vec<&'a str>,
    pos: usize,
}

impl<'a> Scanner<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            pos: 0,
        }
    }

    fn next_line(&mut self) -> Option<&'a str> {
        let line = self.lines.get(self.pos).copied();
        if line.is_some() {
            self.pos += 1;
        }
        line
    }

    fn peek(&self) -> Option<&'a str> {
        self.lines.get(self.pos).copied()
    }

    fn skip_blank(&mut self) {
        while self.peek().is_some_and(|line| line.trim().is_empty()) {
            self.pos += 1;
        }
    }

    /// Body of a section that may be wrapped in `open`/`close` markers.
    ///
    /// The wrapped form is taken verbatim. Without an opening marker (or with
    /// one that is never closed) the body runs until `stops` says otherwise
    /// and is trimmed.
    fn read_body(&mut self, open: &str, close: &str, stops: fn(&str) -> bool) -> String {
        self.skip_blank();
        if self.peek().map(str::trim) == Some(open) {
            let start = self.pos + 1;
            let end = self.lines[start..]
                .iter()
                .position(|line| *line == close)
                .map(|offset| start + offset);
            if let Some(end) = end {
                self.pos = end + 1;
                return self.lines[start..end]
                    .iter()
                    .map(|line| unescape_line(line, close))
                    .collect::<Vec<_>>()
                    .join("\n");
            }
            self.pos = start;
        }

        let start = self.pos;
        while self.peek().is_some_and(|line| !stops(line)) {
            self.pos += 1;
        }
        self.lines[start..self.pos].join("\n").trim().to_string()
    }
}

/// Parse a whole document into tasks, in document order
pub fn parse_document(text: &str) -> Vec<Task> {
    let mut scanner = Scanner::new(text);
    let mut tasks = Vec::new();
    let mut current: Option<TaskDraft> = None;
    let mut section = Section::Metadata;

    while let Some(line) = scanner.next_line() {
        if let Some(title) = line.strip_prefix(TASK_HEADER) {
            tasks.extend(current.take().map(TaskDraft::finish));
            current = Some(TaskDraft::new(title));
            section = Section::Metadata;
            continue;
        }

        if is_separator(line, scanner.peek()) {
            tasks.extend(current.take().map(TaskDraft::finish));
            continue;
        }

        // Anything before the first header or between a separator and the
        // next header belongs to no task.
        let Some(draft) = current.as_mut() else {
            continue;
        };

        let trimmed = line.trim();
        if let Some(heading) = trimmed.strip_prefix("## ") {
            section = match heading.trim() {
                "Status" => Section::Status,
                "Description" => {
                    let body = scanner.read_body(
                        DESCRIPTION_OPEN,
                        DESCRIPTION_CLOSE,
                        ends_legacy_body,
                    );
                    draft.description.get_or_insert(body);
                    Section::Other
                }
                _ => Section::Other,
            };
            continue;
        }

        if let Some(timestamp) = session_timestamp(trimmed) {
            let log = scanner.read_body(LOG_OPEN, LOG_CLOSE, ends_legacy_body);
            draft.sessions.push(SessionLog::new(timestamp, log));
            continue;
        }

        if section == Section::Status {
            if let Some(status) = checked_status(trimmed) {
                draft.status.get_or_insert(status);
            }
            continue;
        }

        if let Some((field, value)) = metadata_line(trimmed) {
            draft.apply_field(&field, value);
        }
    }

    tasks.extend(current.map(TaskDraft::finish));
    tasks
}

/// Render a whole document
pub fn render_document(tasks: &[Task]) -> String {
    tasks
        .iter()
        .map(render_task)
        .collect::<Vec<_>>()
        .join(TASK_SEPARATOR)
}

/// Render one task block, as written by append
pub fn render_task(task: &Task) -> String {
    let mut md = String::new();
    md.push_str(&format!("{} {}\n\n", TASK_HEADER, single_line(&task.title)));

    md.push_str(&format!("**ID**: {}\n", task.id));
    md.push_str(&format!("**Created**: {}\n", task.created_at));
    md.push_str(&format!("**Updated**: {}\n", task.updated_at));
    md.push_str(&format!("**Blocks**: {}\n", task.blocks.join(", ")));
    md.push_str(&format!("**Blocked By**: {}\n", task.blocked_by.join(", ")));

    md.push_str("\n## Status\n\n");
    for status in TaskStatus::ALL {
        let mark = if task.status == status { "[x]" } else { "[ ]" };
        md.push_str(&format!("- {} {}\n", mark, status.label()));
    }

    md.push_str("\n## Description\n\n");
    push_wrapped(&mut md, DESCRIPTION_OPEN, DESCRIPTION_CLOSE, &task.description);

    if !task.sessions.is_empty() {
        md.push_str("\n## Session Logs\n\n");
        for session in &task.sessions {
            md.push_str(&format!("### {}\n", single_line(&session.timestamp)));
            push_wrapped(&mut md, LOG_OPEN, LOG_CLOSE, &session.log);
            md.push('\n');
        }
    }

    md
}

/// Write `body` between its markers, escaping lines that would close it early
fn push_wrapped(md: &mut String, open: &str, close: &str, body: &str) {
    md.push_str(open);
    md.push('\n');
    for (idx, line) in body.split('\n').enumerate() {
        if idx > 0 {
            md.push('\n');
        }
        let bare = line.strip_suffix('\r').unwrap_or(line);
        if bare.trim_start_matches('\\') == close {
            md.push('\\');
        }
        md.push_str(line);
    }
    md.push('\n');
    md.push_str(close);
    md.push('\n');
}

/// Undo the escape added by `push_wrapped`
fn unescape_line<'a>(line: &'a str, close: &str) -> &'a str {
    match line.strip_prefix('\\') {
        Some(rest) if rest.trim_start_matches('\\') == close => rest,
        _ => line,
    }
}

/// A rule only separates tasks when a blank line (or the end) follows it
fn is_separator(line: &str, next: Option<&str>) -> bool {
    line.trim() == SEPARATOR && next.map_or(true, |next| next.trim().is_empty())
}

/// Unwrapped bodies stop at the next heading, rule or task header
fn ends_legacy_body(line: &str) -> bool {
    line.starts_with("##") || line.starts_with(SEPARATOR) || line.starts_with(TASK_HEADER)
}

/// `### 2024-01-31T...` opens a session entry
fn session_timestamp(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("### ")?.trim();
    let bytes = rest.as_bytes();
    let shaped = bytes.len() >= 11
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
        && bytes[10] == b'T';
    shaped.then_some(rest)
}

/// `- [x] In Progress` yields the status; unknown labels count as open
fn checked_status(line: &str) -> Option<TaskStatus> {
    let rest = line.strip_prefix("- [")?;
    let (mark, label) = rest.split_once(']')?;
    if !mark.eq_ignore_ascii_case("x") {
        return None;
    }
    Some(TaskStatus::from_label(label).unwrap_or(TaskStatus::Open))
}

/// `**Field**: value` or `**Field** value`, field normalised to snake_case
fn metadata_line(line: &str) -> Option<(String, &str)> {
    let rest = line.strip_prefix("**")?;
    let (field, value) = match rest.split_once("**:") {
        Some((field, value)) => (field, value),
        None => rest.split_once("**")?,
    };
    let field = field
        .replace('*', "")
        .trim()
        .to_lowercase()
        .replace(' ', "_");
    Some((field, value.trim()))
}

/// Comma-joined ids, blanks dropped, first occurrence kept
pub fn parse_id_list(value: &str) -> Vec<String> {
    let mut ids: Vec<String> = Vec::new();
    for id in value.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        if !ids.iter().any(|existing| existing == id) {
            ids.push(id.to_string());
        }
    }
    ids
}

fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}
