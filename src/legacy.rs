//! Line-delimited JSON documents from before the markdown format.
//!
//! One task object per line. Undecodable lines are skipped and reported, the
//! rest of the file still loads.

use std::path::Path;

use crate::error::{Result, Warning};
use crate::task::Task;

/// On-disk shape of a document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Markdown,
    Jsonl,
}

/// Guess the format from the first line: JSON objects mean the legacy format
pub fn detect_format(text: &str) -> DocumentFormat {
    let first = text.lines().next().unwrap_or("").trim();
    if first.starts_with('{') {
        DocumentFormat::Jsonl
    } else {
        DocumentFormat::Markdown
    }
}

/// Decode every well-formed line; `path` only labels the warnings
pub fn parse_jsonl(text: &str, path: &Path) -> (Vec<Task>, Vec<Warning>) {
    let mut tasks = Vec::new();
    let mut warnings = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<Task>(line) {
            Ok(task) => tasks.push(task),
            Err(err) => {
                tracing::warn!(path = %path.display(), line = idx + 1, error = %err, "skipping malformed line");
                warnings.push(Warning::MalformedRecord {
                    path: path.to_path_buf(),
                    line: idx + 1,
                });
            }
        }
    }

    (tasks, warnings)
}

/// Encode tasks one JSON object per line
pub fn render_jsonl(tasks: &[Task]) -> Result<String> {
    let mut out = String::new();
    for task in tasks {
        out.push_str(&serde_json::to_string(task)?);
        out.push('\n');
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::TaskStatus;

    #[test]
    fn detects_format_from_first_line() {
        assert_eq!(detect_format("{\"id\": \"a\"}\n"), DocumentFormat::Jsonl);
        assert_eq!(detect_format("  {\n"), DocumentFormat::Jsonl);
        assert_eq!(detect_format("# Task: x\n"), DocumentFormat::Markdown);
        assert_eq!(detect_format(""), DocumentFormat::Markdown);
    }

    #[test]
    fn malformed_lines_are_skipped_with_warning() {
        let text = concat!(
            "{\"id\":\"a\",\"title\":\"A\",\"status\":\"in_progress\",\"created_at\":\"t\",\"updated_at\":\"t\"}\n",
            "not json\n",
            "\n",
            "{\"id\":\"b\",\"title\":\"B\",\"status\":\"done\",\"blocks\":[],\"blocked_by\":[],",
            "\"sessions\":[{\"timestamp\":\"t\",\"log\":\"l\"}]}\n",
        );
        let (tasks, warnings) = parse_jsonl(text, Path::new(".readyq.jsonl"));
        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].status, TaskStatus::InProgress);
        assert!(tasks[0].blocks.is_empty());
        assert_eq!(tasks[1].sessions[0].log, "l");
        assert_eq!(
            warnings,
            vec![Warning::MalformedRecord {
                path: ".readyq.jsonl".into(),
                line: 2
            }]
        );
    }

    #[test]
    fn render_then_parse_keeps_tasks() {
        let tasks = vec![Task::new("one", "d"), Task::new("two", "")];
        let text = render_jsonl(&tasks).unwrap();
        let (parsed, warnings) = parse_jsonl(&text, Path::new("x"));
        assert!(warnings.is_empty());
        assert_eq!(parsed, tasks);
    }
}
