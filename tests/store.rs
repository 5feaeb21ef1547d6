mod support;

use std::fs;

use readyq::error::{Error, Warning};
use readyq::legacy::{render_jsonl, DocumentFormat};
use readyq::task::{SessionLog, Task, TaskStatus};
use readyq::update::{apply_update, create_task, update_task, NewTask, TaskUpdate};

use support::{task_with_id, TestDb};

#[test]
fn append_then_rewrite_keeps_every_task() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();

    let first = Task::new("first", "one");
    let second = Task::new("second", "two");
    store.append_one(&first)?;
    store.append_one(&second)?;
    assert_eq!(db.read_db().matches("\n---\n\n").count(), 1);

    let mut tasks = store.load()?;
    tasks[1].status = TaskStatus::InProgress;
    store.save_all(&tasks)?;

    let reloaded = store.load()?;
    assert_eq!(reloaded.len(), 2);
    assert_eq!(reloaded[0], first);
    assert_eq!(reloaded[1].status, TaskStatus::InProgress);
    Ok(())
}

#[test]
fn find_by_prefix_through_the_store() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    store.save_all(&[task_with_id("aa1", "one"), task_with_id("aa2", "two")])?;

    assert_eq!(store.find_by_id_prefix("aa2")?.title, "two");
    assert!(matches!(store.find_by_id_prefix("aa"), Err(Error::Ambiguous { .. })));
    assert!(matches!(store.find_by_id_prefix("bb"), Err(Error::NotFound(_))));
    Ok(())
}

#[test]
fn exact_id_wins_over_longer_ids_it_prefixes() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    let mut short = Task::new("exact", "");
    short.id = "abc".to_string();
    store.save_all(&[task_with_id("abc1", "longer"), short])?;

    assert_eq!(store.find_by_id_prefix("abc")?.title, "exact");
    assert!(matches!(store.find_by_id_prefix("ab"), Err(Error::Ambiguous { .. })));
    Ok(())
}

#[test]
fn update_workflow_persists_graph_changes() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    let blocker = create_task(
        &store,
        NewTask {
            title: "blocker".to_string(),
            ..NewTask::default()
        },
    )?
    .task;
    let waiting = create_task(
        &store,
        NewTask {
            title: "waiting".to_string(),
            blocked_by: vec![blocker.id.clone()],
            ..NewTask::default()
        },
    )?
    .task;
    assert_eq!(waiting.status, TaskStatus::Blocked);

    let outcome = update_task(
        &store,
        blocker.short_id(),
        &TaskUpdate {
            log: Some("finished the groundwork".to_string()),
            status: Some(TaskStatus::Done),
            ..TaskUpdate::default()
        },
    )?;
    assert_eq!(outcome.unblocked, vec![waiting.id.clone()]);

    let tasks = store.load()?;
    let blocker = tasks.iter().find(|t| t.id == blocker.id).expect("blocker");
    let waiting = tasks.iter().find(|t| t.id == waiting.id).expect("waiting");
    assert!(blocker.is_done());
    assert_eq!(blocker.sessions.len(), 1);
    assert_eq!(blocker.sessions[0].log, "finished the groundwork");
    assert!(blocker.blocks.is_empty());
    assert_eq!(waiting.status, TaskStatus::Open);
    assert!(waiting.blocked_by.is_empty());
    Ok(())
}

#[test]
fn failed_update_leaves_document_untouched() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    let mut task = task_with_id("c0", "logged");
    task.sessions.push(SessionLog::new("2024-01-01T00:00:00+00:00", "only"));
    store.save_all(&[task])?;
    let before = db.read_db();

    let result = store.update(|tasks| {
        apply_update(
            tasks,
            "c0",
            &TaskUpdate {
                title: Some("renamed".to_string()),
                delete_log: Some(5),
                ..TaskUpdate::default()
            },
            "2030-01-01T00:00:00+00:00",
        )
    });
    assert!(matches!(result, Err(Error::InvalidLogIndex { index: 5, len: 1 })));
    assert_eq!(db.read_db(), before);
    Ok(())
}

#[test]
fn legacy_document_migrates_once() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let legacy = vec![task_with_id("1e", "from jsonl")];
    let text = format!("{}not json at all\n", render_jsonl(&legacy)?);
    db.write_file(".readyq.jsonl", &text)?;

    let store = db.store();
    let report = store.load_with_report()?;
    assert_eq!(report.format, DocumentFormat::Markdown);
    assert_eq!(report.tasks, legacy);
    assert!(report
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::MalformedRecord { line: 2, .. })));
    assert!(report.migration.is_some());

    assert_eq!(fs::read_to_string(db.path().join(".readyq.jsonl.backup"))?, text);
    assert!(db.read_db().starts_with("# Task: from jsonl"));

    let again = store.load_with_report()?;
    assert!(again.migration.is_none());
    assert_eq!(again.tasks, legacy);
    Ok(())
}

#[test]
fn rewrite_over_a_legacy_document_keeps_its_backup() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let legacy = vec![task_with_id("1a", "old one"), task_with_id("1b", "old two")];
    let text = render_jsonl(&legacy)?;
    db.write_file(".readyq.jsonl", &text)?;

    let fresh = task_with_id("2a", "fresh");
    db.store().save_all(std::slice::from_ref(&fresh))?;

    assert_eq!(fs::read_to_string(db.path().join(".readyq.jsonl.backup"))?, text);
    assert_eq!(db.store().load()?, vec![fresh]);
    assert!(db.read_db().starts_with("# Task: fresh"));
    Ok(())
}

#[test]
fn legacy_format_at_document_path_is_saved_back_as_legacy() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    db.write_file(".readyq.md", &render_jsonl(&[task_with_id("aa", "json here")])?)?;

    let report = store.load_with_report()?;
    assert_eq!(report.format, DocumentFormat::Jsonl);
    assert!(report.validation.is_none());

    store.update(|tasks| {
        tasks[0].title = "still json".to_string();
        Ok(())
    })?;
    let text = db.read_db();
    assert!(text.starts_with('{'));
    assert!(text.contains("still json"));
    Ok(())
}

#[test]
fn init_is_idempotent() -> Result<(), Box<dyn std::error::Error>> {
    let db = TestDb::new();
    let store = db.store();
    assert!(store.init()?);
    store.append_one(&Task::new("kept", ""))?;
    assert!(!store.init()?);
    assert_eq!(store.load()?.len(), 1);
    Ok(())
}
