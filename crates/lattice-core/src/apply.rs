// SPDX-License-Identifier: MIT
//! The pure event/snapshot algebra (spec §4.3): `apply(snapshot, event) ->
//! snapshot'`. No I/O, no clock, no ID generation — every input the
//! function needs is already sitting in the event and the prior snapshot.
//! This is what `rebuild` replays and what the write pipeline calls inside
//! the lock after appending.

use crate::config::WorkflowConfig;
use crate::error::{LatticeError, Result};
use crate::event::{is_protected_field, BuiltinEventKind, Event, EventPayload};
use crate::snapshot::{ActiveProcess, Relationship, TaskSnapshot};

/// Apply one event to a task's current snapshot, producing the next
/// snapshot. `existing` is `None` only for the task's first event, which
/// must be `task_created`.
pub fn apply(
    existing: Option<&TaskSnapshot>,
    event: &Event,
    workflow: &WorkflowConfig,
) -> Result<TaskSnapshot> {
    let payload = event.payload()?;

    let EventPayload::Builtin(BuiltinEventKind::TaskCreated { .. }) = &payload else {
        let Some(snap) = existing else {
            return Err(LatticeError::Integrity(format!(
                "event '{}' applied before task_created",
                event.event_type
            )));
        };
        return apply_to_existing(snap, event, &payload, workflow);
    };

    match existing {
        None => init_snapshot(event, &payload),
        Some(snap) => reconcile_idempotent_creation(snap, &payload),
    }
}

fn init_snapshot(event: &Event, payload: &EventPayload) -> Result<TaskSnapshot> {
    let EventPayload::Builtin(BuiltinEventKind::TaskCreated {
        title,
        description,
        status,
        priority,
        urgency,
        task_type,
        tags,
        assigned_to,
        custom_fields,
    }) = payload
    else {
        unreachable!("caller matched TaskCreated")
    };

    let task_id = event
        .task_id
        .clone()
        .ok_or_else(|| LatticeError::Integrity("task_created event missing task_id".into()))?;

    Ok(TaskSnapshot {
        schema_version: event.schema_version,
        id: task_id,
        short_id: None,
        title: title.clone(),
        description: description.clone(),
        status: status.clone(),
        priority: priority.clone(),
        urgency: urgency.clone(),
        task_type: task_type.clone(),
        tags: tags.iter().cloned().collect(),
        assigned_to: assigned_to.clone(),
        created_by: event.actor.to_string(),
        created_at: event.ts,
        updated_at: event.ts,
        relationships_out: Vec::new(),
        artifact_refs: Vec::new(),
        active_processes: Vec::new(),
        last_event_id: event.id.clone(),
        archived: false,
        custom_fields: custom_fields.clone(),
    })
}

/// A second `task_created` for an already-created task is only valid if its
/// payload is identical to the one that created the task (spec §4.3:
/// idempotent creation). Anything else is a conflict.
fn reconcile_idempotent_creation(
    snap: &TaskSnapshot,
    payload: &EventPayload,
) -> Result<TaskSnapshot> {
    let EventPayload::Builtin(BuiltinEventKind::TaskCreated {
        title,
        description,
        status,
        priority,
        urgency,
        task_type,
        tags,
        assigned_to,
        custom_fields,
    }) = payload
    else {
        unreachable!("caller matched TaskCreated")
    };

    let tags: std::collections::BTreeSet<String> = tags.iter().cloned().collect();
    let matches = *title == snap.title
        && *description == snap.description
        && *status == snap.status
        && *priority == snap.priority
        && *urgency == snap.urgency
        && *task_type == snap.task_type
        && tags == snap.tags
        && *assigned_to == snap.assigned_to
        && *custom_fields == snap.custom_fields;

    if matches {
        Ok(snap.clone())
    } else {
        Err(LatticeError::Conflict(format!(
            "task '{}' already exists with different creation payload",
            snap.id
        )))
    }
}

fn apply_to_existing(
    snap: &TaskSnapshot,
    event: &Event,
    payload: &EventPayload,
    workflow: &WorkflowConfig,
) -> Result<TaskSnapshot> {
    let mut next = snap.clone();

    match payload {
        EventPayload::Builtin(kind) => apply_builtin(&mut next, event, kind, workflow)?,
        EventPayload::Custom { .. } => {}
    }

    next.updated_at = event.ts;
    next.last_event_id = event.id.clone();
    Ok(next)
}

fn apply_builtin(
    next: &mut TaskSnapshot,
    event: &Event,
    kind: &BuiltinEventKind,
    workflow: &WorkflowConfig,
) -> Result<()> {
    match kind {
        BuiltinEventKind::TaskCreated { .. } => unreachable!("handled by caller"),

        BuiltinEventKind::TaskArchived {} => next.archived = true,
        BuiltinEventKind::TaskUnarchived {} => next.archived = false,

        BuiltinEventKind::TaskShortIdAssigned { short_id } => {
            next.short_id = Some(short_id.clone());
        }

        BuiltinEventKind::StatusChanged { from, to, forced } => {
            if next.status != *from {
                return Err(LatticeError::Integrity(format!(
                    "status_changed expected current status '{}', found '{}'",
                    from, next.status
                )));
            }
            if !forced && !workflow.allows_transition(from, to) {
                return Err(LatticeError::InvalidTransition {
                    from: from.clone(),
                    to: to.clone(),
                });
            }
            next.status = to.clone();
        }

        BuiltinEventKind::AssignmentChanged { to } => next.assigned_to = to.clone(),

        BuiltinEventKind::FieldUpdated { field, to } => apply_field_update(next, field, to)?,

        BuiltinEventKind::CommentAdded { .. } => {}

        BuiltinEventKind::RelationshipAdded {
            rel_type,
            target,
            note,
        } => {
            if *target == next.id {
                return Err(LatticeError::InvalidId(format!(
                    "task '{}' cannot have a relationship to itself",
                    next.id
                )));
            }
            if !next.has_relationship(rel_type, target) {
                next.relationships_out.push(Relationship {
                    rel_type: rel_type.clone(),
                    target_task_id: target.clone(),
                    created_at: event.ts,
                    created_by: event.actor.to_string(),
                    note: note.clone(),
                });
            }
        }

        BuiltinEventKind::RelationshipRemoved { rel_type, target } => {
            next.relationships_out
                .retain(|r| !(r.rel_type == *rel_type && r.target_task_id == *target));
        }

        BuiltinEventKind::ArtifactAttached { artifact_id } => {
            if !next.artifact_refs.contains(artifact_id) {
                next.artifact_refs.push(artifact_id.clone());
            }
        }

        BuiltinEventKind::ProcessStarted { label } => {
            next.active_processes.push(ActiveProcess {
                started_event_id: event.id.clone(),
                started_at: event.ts,
                label: label.clone(),
            });
        }

        BuiltinEventKind::ProcessCompleted { started_event_id }
        | BuiltinEventKind::ProcessFailed { started_event_id, .. } => {
            next.active_processes
                .retain(|p| p.started_event_id != *started_event_id);
        }

        BuiltinEventKind::GitEvent { .. } => {}
    }
    Ok(())
}

fn apply_field_update(
    next: &mut TaskSnapshot,
    field: &str,
    to: &serde_json::Value,
) -> Result<()> {
    if is_protected_field(field) {
        return Err(LatticeError::ProtectedField(field.to_string()));
    }

    fn as_opt_string(v: &serde_json::Value, field: &str) -> Result<Option<String>> {
        match v {
            serde_json::Value::Null => Ok(None),
            serde_json::Value::String(s) => Ok(Some(s.clone())),
            _ => Err(LatticeError::Integrity(format!(
                "field '{field}' expects a string or null"
            ))),
        }
    }

    match field {
        "title" => {
            next.title = to
                .as_str()
                .ok_or_else(|| LatticeError::Integrity("field 'title' expects a string".into()))?
                .to_string();
        }
        "description" => next.description = as_opt_string(to, field)?,
        "priority" => next.priority = as_opt_string(to, field)?,
        "urgency" => next.urgency = as_opt_string(to, field)?,
        "type" => next.task_type = as_opt_string(to, field)?,
        "assigned_to" => next.assigned_to = as_opt_string(to, field)?,
        "tags" => {
            let array = to.as_array().ok_or_else(|| {
                LatticeError::Integrity("field 'tags' expects an array of strings".into())
            })?;
            let mut tags = std::collections::BTreeSet::new();
            for v in array {
                let tag = v.as_str().ok_or_else(|| {
                    LatticeError::Integrity("field 'tags' expects an array of strings".into())
                })?;
                tags.insert(tag.to_string());
            }
            next.tags = tags;
        }
        _ => {
            next.custom_fields.insert(field.to_string(), to.clone());
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "apply_tests.rs"]
mod tests;
