// SPDX-License-Identifier: MIT
//! Subcommand definitions and their implementations. Each variant below
//! maps directly onto one of `lattice-storage`'s callee-facing functions
//! (spec §6) — this file is deliberately thin.

use std::collections::BTreeMap;

use anyhow::{Context as _, Result};
use clap::{Args, Subcommand};
use serde_json::Value;

use lattice_core::{Actor, BuiltinEventKind, Context, EventSpec, TaskId, TaskSnapshot};
use lattice_storage::{
    allocate_short_id, archive, doctor, list_active_tasks, load_snapshot, rebuild, resolve,
    scan_events, unarchive, write_task_event, LockManager, Paths, RebuildReport, Selection,
    TaskFilter,
};

use crate::output::{print_json, OutputFormat};

#[derive(Subcommand)]
pub enum Command {
    /// Initialize `.lattice/` in the current (or given) directory.
    Init,
    /// Create a new task.
    Create(CreateArgs),
    /// Show one task's snapshot.
    Show(ShowArgs),
    /// List active tasks, optionally filtered.
    List(ListArgs),
    /// Change a task's status.
    Status(StatusArgs),
    /// Add a comment to a task.
    Comment(CommentArgs),
    /// Add a relationship from one task to another.
    Relate(RelateArgs),
    /// Change a task's assignee.
    Assign(AssignArgs),
    /// Update a single field.
    Field(FieldArgs),
    /// Allocate a short ID for a task.
    ShortId(ShortIdArgs),
    /// Resolve a short or long task ID.
    Resolve(ResolveArgs),
    /// Archive a task.
    Archive(ArchiveArgs),
    /// Unarchive a task.
    Unarchive(ArchiveArgs),
    /// Replay event logs to regenerate snapshots and derived indexes.
    Rebuild(RebuildArgs),
    /// Run structural integrity checks.
    Doctor(DoctorArgs),
}

#[derive(Args)]
pub struct CreateArgs {
    /// Task title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long, default_value = "backlog")]
    pub status: String,
    #[arg(long)]
    pub priority: Option<String>,
    #[arg(long)]
    pub urgency: Option<String>,
    #[arg(long = "type")]
    pub task_type: Option<String>,
    #[arg(long = "tag")]
    pub tags: Vec<String>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    /// Caller-supplied task ID, for idempotent retries of the same create
    /// call. Omit to generate a fresh one.
    #[arg(long)]
    pub id: Option<String>,
}

#[derive(Args)]
pub struct ShowArgs {
    pub task_id: String,
}

#[derive(Args)]
pub struct ListArgs {
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub assigned_to: Option<String>,
    #[arg(long)]
    pub tag: Option<String>,
}

#[derive(Args)]
pub struct StatusArgs {
    pub task_id: String,
    pub to: String,
    /// Bypass the workflow transition table.
    #[arg(long)]
    pub forced: bool,
}

#[derive(Args)]
pub struct CommentArgs {
    pub task_id: String,
    pub body: String,
}

#[derive(Args)]
pub struct RelateArgs {
    pub task_id: String,
    pub rel_type: String,
    pub target: String,
    #[arg(long)]
    pub note: Option<String>,
}

#[derive(Args)]
pub struct AssignArgs {
    pub task_id: String,
    /// Assignee, or omit to clear the current assignment.
    pub to: Option<String>,
}

#[derive(Args)]
pub struct FieldArgs {
    pub task_id: String,
    pub field: String,
    /// New value, parsed as JSON (bare words are treated as strings).
    pub value: String,
}

#[derive(Args)]
pub struct ShortIdArgs {
    pub task_id: String,
    #[arg(long)]
    pub prefix: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    pub id: String,
}

#[derive(Args)]
pub struct ArchiveArgs {
    pub task_id: String,
}

#[derive(Args)]
pub struct RebuildArgs {
    /// Task ID to rebuild, or omit to rebuild every task.
    pub task_id: Option<String>,
}

#[derive(Args)]
pub struct DoctorArgs {
    /// Apply the permitted repairs (truncated-line trim, index regeneration).
    #[arg(long)]
    pub fix: bool,
}

fn parse_field_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn print_snapshot(snapshot: &TaskSnapshot, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(snapshot)?,
        OutputFormat::Text => {
            println!(
                "{} [{}] {}",
                snapshot.short_id.as_deref().unwrap_or(snapshot.id.as_str()),
                snapshot.status,
                snapshot.title
            );
            if let Some(assignee) = &snapshot.assigned_to {
                println!("  assigned_to: {assignee}");
            }
            if !snapshot.tags.is_empty() {
                let tags: Vec<&str> = snapshot.tags.iter().map(String::as_str).collect();
                println!("  tags: {}", tags.join(", "));
            }
            println!("  updated_at: {}", snapshot.updated_at.to_rfc3339());
        }
    }
    Ok(())
}

pub fn run(
    command: Command,
    root: &std::path::Path,
    ctx: &Context,
    paths: &Paths,
    locks: &LockManager,
    actor: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    match command {
        Command::Init => {
            let outcome = lattice_storage::init(root)?;
            println!("{outcome:?}");
        }

        Command::Create(args) => {
            let actor = require_actor(actor)?;
            let task_id = match &args.id {
                Some(id) => TaskId::new(id.clone()),
                None => TaskId::generate(ctx.id_gen()),
            };
            let spec = EventSpec::builtin(
                BuiltinEventKind::TaskCreated {
                    title: args.title,
                    description: args.description,
                    status: args.status,
                    priority: args.priority,
                    urgency: args.urgency,
                    task_type: args.task_type,
                    tags: args.tags,
                    assigned_to: args.assigned_to,
                    custom_fields: BTreeMap::new(),
                },
                actor,
            );
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Show(args) => {
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let snapshot = load_snapshot(paths, &task_id)?
                .with_context(|| format!("no such task: {}", args.task_id))?;
            match format {
                OutputFormat::Json => {
                    let events = scan_events(paths, &task_id)?;
                    print_json(&serde_json::json!({ "snapshot": snapshot, "events": events }))?;
                }
                OutputFormat::Text => {
                    print_snapshot(&snapshot, OutputFormat::Text)?;
                    let events = scan_events(paths, &task_id)?;
                    println!("  events: {}", events.len());
                }
            }
        }

        Command::List(args) => {
            let filter = TaskFilter {
                status: args.status,
                assigned_to: args.assigned_to,
                tag: args.tag,
            };
            let tasks = list_active_tasks(paths, Some(&filter))?;
            match format {
                OutputFormat::Json => print_json(&tasks)?,
                OutputFormat::Text => {
                    for task in &tasks {
                        print_snapshot(task, OutputFormat::Text)?;
                    }
                }
            }
        }

        Command::Status(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let spec = EventSpec::builtin(
                BuiltinEventKind::StatusChanged {
                    from: current_status(paths, &task_id)?,
                    to: args.to,
                    forced: args.forced,
                },
                actor,
            );
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Comment(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let spec = EventSpec::builtin(BuiltinEventKind::CommentAdded { body: args.body }, actor);
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Relate(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let target = resolve_task_id(paths, &args.target)?;
            let spec = EventSpec::builtin(
                BuiltinEventKind::RelationshipAdded {
                    rel_type: args.rel_type,
                    target,
                    note: args.note,
                },
                actor,
            );
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Assign(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let spec = EventSpec::builtin(BuiltinEventKind::AssignmentChanged { to: args.to }, actor);
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Field(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let spec = EventSpec::builtin(
                BuiltinEventKind::FieldUpdated {
                    field: args.field,
                    to: parse_field_value(&args.value),
                },
                actor,
            );
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::ShortId(args) => {
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let prefix = args
                .prefix
                .or_else(|| ctx.config().project_code.clone())
                .context("no --prefix given and no project_code configured")?;
            let short_id = allocate_short_id(paths, locks, &prefix, &task_id)?;
            let spec = EventSpec::builtin(
                BuiltinEventKind::TaskShortIdAssigned {
                    short_id: short_id.clone(),
                },
                require_actor(actor)?,
            );
            let snapshot = write_task_event(ctx, paths, locks, &task_id, vec![spec])?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Resolve(args) => {
            let resolved = resolve(paths, &args.id)?
                .with_context(|| format!("no such short or task ID: {}", args.id))?;
            match format {
                OutputFormat::Json => print_json(&resolved)?,
                OutputFormat::Text => println!("{resolved}"),
            }
        }

        Command::Archive(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let snapshot = archive(ctx, paths, locks, &task_id, actor)?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Unarchive(args) => {
            let actor = require_actor(actor)?;
            let task_id = resolve_task_id(paths, &args.task_id)?;
            let snapshot = unarchive(ctx, paths, locks, &task_id, actor)?;
            print_snapshot(&snapshot, format)?;
        }

        Command::Rebuild(args) => {
            let selection = match args.task_id {
                Some(id) => Selection::Task(resolve_task_id(paths, &id)?),
                None => Selection::All,
            };
            let report: RebuildReport = rebuild(paths, locks, &ctx.config().workflow, selection)?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({
                    "tasks_rebuilt": report.tasks_rebuilt,
                    "lifecycle_events_written": report.lifecycle_events_written,
                    "short_ids_indexed": report.short_ids_indexed,
                }))?,
                OutputFormat::Text => {
                    println!(
                        "rebuilt {} task(s), {} lifecycle event(s), {} short ID(s)",
                        report.tasks_rebuilt.len(),
                        report.lifecycle_events_written,
                        report.short_ids_indexed
                    );
                }
            }
        }

        Command::Doctor(args) => {
            let report = doctor(paths, locks, args.fix)?;
            match format {
                OutputFormat::Json => {
                    let findings: Vec<String> =
                        report.findings.iter().map(|f| format!("{f:?}")).collect();
                    print_json(&serde_json::json!({
                        "findings": findings,
                        "truncated_tails_fixed": report.truncated_tails_fixed,
                        "indexes_regenerated": report.indexes_regenerated,
                    }))?;
                }
                OutputFormat::Text => {
                    if report.is_clean() {
                        println!("clean");
                    } else {
                        for finding in &report.findings {
                            println!("{finding:?}");
                        }
                    }
                    if args.fix {
                        println!(
                            "fixed {} truncated tail(s); indexes regenerated: {}",
                            report.truncated_tails_fixed, report.indexes_regenerated
                        );
                    }
                }
            }
        }
    }

    Ok(())
}

fn require_actor(actor: Option<&str>) -> Result<Actor> {
    let raw = actor.context("this command requires --actor (or $LATTICE_ACTOR)")?;
    Ok(Actor::parse(raw)?)
}

fn resolve_task_id(paths: &Paths, raw: &str) -> Result<TaskId> {
    resolve(paths, raw)?.with_context(|| format!("no such short or task ID: {raw}"))
}

fn current_status(paths: &Paths, task_id: &TaskId) -> Result<String> {
    let snapshot = load_snapshot(paths, task_id)?
        .with_context(|| format!("no such task: {task_id}"))?;
    Ok(snapshot.status)
}

#[cfg(test)]
#[path = "commands_tests.rs"]
mod tests;
