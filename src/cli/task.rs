//! readyq task command implementations.

use serde::Serialize;

use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::graph::{delete_task, ready_set};
use crate::output::{emit_success, push_warnings, HumanOutput, OutputOptions};
use crate::store::TaskStore;
use crate::task::{now_timestamp, Task, TaskStatus};
use crate::update::{create_task, update_task, NewTask, TaskUpdate};
use crate::validate::{render_report, validate};

/// Settings shared by every command
pub struct Context {
    pub store: StoreConfig,
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
}

impl Context {
    pub fn output(&self) -> OutputOptions {
        OutputOptions {
            json: self.json,
            quiet: self.quiet,
            verbose: self.verbose,
        }
    }

    fn task_store(&self) -> TaskStore {
        TaskStore::new(self.store.clone())
    }
}

pub struct NewOptions {
    pub title: String,
    pub description: Option<String>,
    pub blocked_by: Vec<String>,
}

pub struct UpdateOptions {
    pub id: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub delete_log: Option<usize>,
    pub log: Option<String>,
    pub add_blocks: Vec<String>,
    pub add_blocked_by: Vec<String>,
    pub remove_blocks: Vec<String>,
    pub remove_blocked_by: Vec<String>,
    pub status: Option<String>,
}

#[derive(Serialize)]
struct TaskListOutput<'a> {
    total: usize,
    tasks: Vec<&'a Task>,
}

#[derive(Serialize)]
struct DeleteOutput {
    id: String,
    title: String,
    unblocked: Vec<String>,
}

pub fn run_new(ctx: Context, options: NewOptions) -> Result<()> {
    let store = ctx.task_store();
    let outcome = create_task(
        &store,
        NewTask {
            title: options.title,
            description: options.description.unwrap_or_default(),
            blocked_by: without_blanks(options.blocked_by),
        },
    )?;

    let out = ctx.output();
    let mut human = HumanOutput::new(format!("Created new task: {}", out.id(&outcome.task.id)));
    human.push_summary("Title", outcome.task.title.clone());
    human.push_summary("Status", outcome.task.status.as_str());
    if !outcome.task.blocked_by.is_empty() {
        human.push_summary("Blocked by", out.ids(&outcome.task.blocked_by));
    }
    push_warnings(&mut human, &outcome.warnings);

    emit_success(out, "new", &outcome, Some(&human))
}

pub fn run_list(ctx: Context) -> Result<()> {
    let tasks = load_reporting(&ctx)?;
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    emit_task_list(&ctx, "list", "Tasks", sorted)
}

pub fn run_ready(ctx: Context) -> Result<()> {
    let tasks = load_reporting(&ctx)?;
    emit_task_list(&ctx, "ready", "Ready tasks", ready_set(&tasks))
}

pub fn run_show(ctx: Context, id: &str) -> Result<()> {
    let task = ctx.task_store().find_by_id_prefix(id)?;
    let out = ctx.output();

    let mut human = HumanOutput::new(format!("Task {}", task.id));
    human.push_summary("Title", task.title.clone());
    human.push_summary("Status", task.status.as_str());
    human.push_summary("Created", task.created_at.clone());
    human.push_summary("Updated", task.updated_at.clone());
    if !task.blocks.is_empty() {
        human.push_summary("Blocks", out.ids(&task.blocks));
    }
    if !task.blocked_by.is_empty() {
        human.push_summary("Blocked by", out.ids(&task.blocked_by));
    }
    human.set_description(&task.description);
    human.set_session_logs(&task.sessions);

    emit_success(out, "show", &task, Some(&human))
}

pub fn run_update(ctx: Context, options: UpdateOptions) -> Result<()> {
    let status = options
        .status
        .as_deref()
        .map(str::parse::<TaskStatus>)
        .transpose()?;
    let update = TaskUpdate {
        title: options.title,
        description: options.description,
        delete_log: options.delete_log,
        log: options.log,
        add_blocks: without_blanks(options.add_blocks),
        add_blocked_by: without_blanks(options.add_blocked_by),
        remove_blocks: without_blanks(options.remove_blocks),
        remove_blocked_by: without_blanks(options.remove_blocked_by),
        status,
    };

    let outcome = update_task(&ctx.task_store(), &options.id, &update)?;

    let out = ctx.output();
    let mut human = HumanOutput::new(format!("Updated task {}", out.id(&outcome.id)));
    for change in &outcome.changes {
        human.push_note(change.clone());
    }
    for id in &outcome.unblocked {
        human.push_note(format!("Task {} is now unblocked", out.id(id)));
    }
    push_warnings(&mut human, &outcome.warnings);

    emit_success(out, "update", &outcome, Some(&human))
}

pub fn run_delete(ctx: Context, id: &str) -> Result<()> {
    let now = now_timestamp();
    let outcome = ctx.task_store().update(|tasks| delete_task(tasks, id, &now))?;

    let out = ctx.output();
    let mut human = HumanOutput::new(format!(
        "Deleted task {}: {}",
        out.id(&outcome.removed.id),
        outcome.removed.title
    ));
    for id in &outcome.unblocked {
        human.push_note(format!("Task {} is now unblocked", out.id(id)));
    }

    let output = DeleteOutput {
        id: outcome.removed.id,
        title: outcome.removed.title,
        unblocked: outcome.unblocked,
    };
    emit_success(out, "delete", &output, Some(&human))
}

pub fn run_validate(ctx: Context) -> Result<()> {
    let store = ctx.task_store();
    let tasks = store.load()?;
    let report = validate(&tasks);

    if report.errors.is_empty() {
        let mut human = HumanOutput::new(render_report(&report, store.path()));
        human.push_summary("Tasks", tasks.len().to_string());
        return emit_success(ctx.output(), "validate", &report, Some(&human));
    }

    if !ctx.json && !ctx.quiet {
        println!("{}", render_report(&report, store.path()));
    }
    Err(Error::ValidationFailed(report.errors))
}

/// Load through the repository, surfacing load warnings on the way
fn load_reporting(ctx: &Context) -> Result<Vec<Task>> {
    let report = ctx.task_store().load_with_report()?;
    if !ctx.json {
        for warning in &report.warnings {
            eprintln!("warning: {warning}");
        }
    }
    Ok(report.tasks)
}

fn emit_task_list(ctx: &Context, command: &str, header: &str, tasks: Vec<&Task>) -> Result<()> {
    let mut human = HumanOutput::new(header);
    human.push_summary("Total", tasks.len().to_string());
    human.set_task_table(&tasks, ctx.output());

    let output = TaskListOutput {
        total: tasks.len(),
        tasks,
    };
    emit_success(ctx.output(), command, &output, Some(&human))
}

fn without_blanks(refs: Vec<String>) -> Vec<String> {
    refs.into_iter()
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty())
        .collect()
}
