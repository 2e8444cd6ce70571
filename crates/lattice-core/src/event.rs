// SPDX-License-Identifier: MIT
//! Event types (spec §3.1, §4.3): an immutable, append-only log record.
//!
//! On the wire an event is `{schema_version, id, ts, type, actor, data, ...}`
//! where `data` is a nested object (spec §3.1). Internally, built-in event
//! types are modeled as a single tagged enum, [`BuiltinEventKind`], the way
//! the teacher's `oj_core::Event` models its event set, rather than as an
//! open map the caller has to interpret by hand. [`BuiltinEventKind`] derives
//! serde's default externally-tagged representation (`{"status_changed": {
//! "from": ..., "to": ... }}`), which is exactly a `type` tag plus a nested
//! `data` object once unwrapped — see [`wrap_tag`]/[`unwrap_tag`]. `x_`-prefixed
//! custom events skip this enum entirely and keep `data` as an open
//! `serde_json::Value`, per spec §9.

use crate::actor::Actor;
use crate::error::{LatticeError, Result};
use crate::id::{ArtifactId, EventId, IdGen, TaskId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// The closed set of built-in event types (spec §3.1).
pub const BUILTIN_EVENT_TYPES: &[&str] = &[
    "task_created",
    "task_archived",
    "task_unarchived",
    "task_short_id_assigned",
    "status_changed",
    "assignment_changed",
    "field_updated",
    "comment_added",
    "relationship_added",
    "relationship_removed",
    "artifact_attached",
    "process_started",
    "process_completed",
    "process_failed",
    "git_event",
];

/// The lifecycle subset, duplicated into the global lifecycle log.
pub const LIFECYCLE_EVENT_TYPES: &[&str] = &["task_created", "task_archived", "task_unarchived"];

/// Fields of a [`crate::snapshot::TaskSnapshot`] that `field_updated` may
/// never target (spec §4.3).
pub const PROTECTED_FIELDS: &[&str] = &[
    "id",
    "short_id",
    "created_at",
    "created_by",
    "relationships_out",
    "artifact_refs",
    "active_processes",
    "last_event_id",
];

pub fn is_protected_field(name: &str) -> bool {
    PROTECTED_FIELDS.contains(&name)
}

pub fn is_builtin_event_type(name: &str) -> bool {
    BUILTIN_EVENT_TYPES.contains(&name)
}

pub fn is_lifecycle_event_type(name: &str) -> bool {
    LIFECYCLE_EVENT_TYPES.contains(&name)
}

/// Agent metadata attached to an event, carried through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AgentMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

/// OpenTelemetry trace context attached to an event, carried through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtelContext {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
}

/// The typed payload of every built-in event type. Each variant's fields are
/// exactly that event type's `data` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuiltinEventKind {
    TaskCreated {
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        status: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        priority: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        urgency: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_type: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        assigned_to: Option<String>,
        #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
        custom_fields: BTreeMap<String, Value>,
    },
    TaskArchived {},
    TaskUnarchived {},
    TaskShortIdAssigned {
        short_id: String,
    },
    StatusChanged {
        from: String,
        to: String,
        #[serde(default)]
        forced: bool,
    },
    AssignmentChanged {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<String>,
    },
    FieldUpdated {
        field: String,
        to: Value,
    },
    CommentAdded {
        body: String,
    },
    RelationshipAdded {
        #[serde(rename = "type")]
        rel_type: String,
        target: TaskId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    RelationshipRemoved {
        #[serde(rename = "type")]
        rel_type: String,
        target: TaskId,
    },
    ArtifactAttached {
        artifact_id: ArtifactId,
    },
    ProcessStarted {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    ProcessCompleted {
        started_event_id: EventId,
    },
    ProcessFailed {
        started_event_id: EventId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    GitEvent {
        #[serde(default)]
        data: Value,
    },
}

/// Wrap a built-in event's `data` object back into `{type: data}` so it can
/// be fed through `BuiltinEventKind`'s externally-tagged (de)serialization.
fn wrap_tag(type_name: &str, data: Value) -> Value {
    serde_json::json!({ type_name: data })
}

/// Unwrap an externally-tagged `{type: data}` value into its pieces.
fn unwrap_tag(value: Value) -> Result<(String, Value)> {
    let Value::Object(mut map) = value else {
        return Err(LatticeError::Integrity(
            "expected a single-key tagged object".into(),
        ));
    };
    if map.len() != 1 {
        return Err(LatticeError::Integrity(format!(
            "expected exactly one tag key, got {}",
            map.len()
        )));
    }
    let (tag, data) = map.drain().next().expect("checked len == 1 above");
    Ok((tag, data))
}

impl BuiltinEventKind {
    /// Parse a built-in event's `type` + `data` into its typed form.
    pub fn from_type_and_data(type_name: &str, data: Value) -> Result<Self> {
        let wrapped = wrap_tag(type_name, data);
        serde_json::from_value(wrapped)
            .map_err(|e| LatticeError::Integrity(format!("event '{type_name}': {e}")))
    }

    /// Split back into `(type, data)`.
    pub fn into_type_and_data(self) -> (String, Value) {
        let value = serde_json::to_value(&self).expect("BuiltinEventKind always serializes");
        unwrap_tag(value).expect("BuiltinEventKind always serializes to a single-key object")
    }
}

/// The payload of an event, distinguishing built-in types (closed, typed)
/// from `x_`-prefixed custom types (open `data` map, per spec §9).
#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    Builtin(BuiltinEventKind),
    Custom { name: String, data: Value },
}

impl EventPayload {
    pub fn type_name(&self) -> &str {
        match self {
            EventPayload::Builtin(kind) => builtin_type_name(kind),
            EventPayload::Custom { name, .. } => name.as_str(),
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        is_lifecycle_event_type(self.type_name())
    }
}

/// The externally-tagged variant name as the spec's snake_case wire string,
/// without serializing the whole payload just to read the tag.
fn builtin_type_name(kind: &BuiltinEventKind) -> &'static str {
    match kind {
        BuiltinEventKind::TaskCreated { .. } => "task_created",
        BuiltinEventKind::TaskArchived {} => "task_archived",
        BuiltinEventKind::TaskUnarchived {} => "task_unarchived",
        BuiltinEventKind::TaskShortIdAssigned { .. } => "task_short_id_assigned",
        BuiltinEventKind::StatusChanged { .. } => "status_changed",
        BuiltinEventKind::AssignmentChanged { .. } => "assignment_changed",
        BuiltinEventKind::FieldUpdated { .. } => "field_updated",
        BuiltinEventKind::CommentAdded { .. } => "comment_added",
        BuiltinEventKind::RelationshipAdded { .. } => "relationship_added",
        BuiltinEventKind::RelationshipRemoved { .. } => "relationship_removed",
        BuiltinEventKind::ArtifactAttached { .. } => "artifact_attached",
        BuiltinEventKind::ProcessStarted { .. } => "process_started",
        BuiltinEventKind::ProcessCompleted { .. } => "process_completed",
        BuiltinEventKind::ProcessFailed { .. } => "process_failed",
        BuiltinEventKind::GitEvent { .. } => "git_event",
    }
}

/// An immutable, append-only event record (spec §3.1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub id: EventId,
    pub ts: DateTime<Utc>,
    #[serde(rename = "type")]
    pub event_type: String,
    pub actor: Actor,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_meta: Option<AgentMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub otel: Option<OtelContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

fn default_schema_version() -> u32 {
    1
}

impl Event {
    /// Decode this event's `(type, data)` into a typed [`EventPayload`].
    pub fn payload(&self) -> Result<EventPayload> {
        if is_builtin_event_type(&self.event_type) {
            let kind = BuiltinEventKind::from_type_and_data(&self.event_type, self.data.clone())?;
            Ok(EventPayload::Builtin(kind))
        } else {
            Ok(EventPayload::Custom {
                name: self.event_type.clone(),
                data: self.data.clone(),
            })
        }
    }

    pub fn is_lifecycle(&self) -> bool {
        is_lifecycle_event_type(&self.event_type)
    }
}

/// Inputs to [`build_event`], the pure event constructor (spec §4.3).
pub struct EventSpec {
    pub payload: EventPayload,
    pub actor: Actor,
    pub task_id: Option<TaskId>,
    pub id: Option<EventId>,
    pub agent_meta: Option<AgentMeta>,
    pub otel: Option<OtelContext>,
    pub metrics: Option<Value>,
    pub run_id: Option<String>,
}

impl EventSpec {
    pub fn builtin(kind: BuiltinEventKind, actor: Actor) -> Self {
        Self::new(EventPayload::Builtin(kind), actor)
    }

    pub fn custom(name: impl Into<String>, data: Value, actor: Actor) -> Self {
        Self::new(
            EventPayload::Custom {
                name: name.into(),
                data,
            },
            actor,
        )
    }

    fn new(payload: EventPayload, actor: Actor) -> Self {
        Self {
            payload,
            actor,
            task_id: None,
            id: None,
            agent_meta: None,
            otel: None,
            metrics: None,
            run_id: None,
        }
    }

    pub fn with_task_id(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    pub fn with_id(mut self, id: EventId) -> Self {
        self.id = Some(id);
        self
    }
}

/// Validate a custom event type string: must be `x_`-prefixed and non-empty
/// after the prefix. Built-in types are always valid.
pub fn validate_event_type(name: &str) -> Result<()> {
    if is_builtin_event_type(name) {
        return Ok(());
    }
    match name.strip_prefix("x_") {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(LatticeError::InvalidId(format!(
            "event type '{name}' is neither a built-in type nor x_-prefixed"
        ))),
    }
}

/// Construct and validate an event: validate the actor (already validated by
/// [`Actor::parse`]) and type, allocate an ID if none was supplied, and stamp
/// `ts`. Pure — `now` and `id_gen` are passed in rather than read from
/// ambient state (spec §9).
pub fn build_event(spec: EventSpec, now: DateTime<Utc>, id_gen: &dyn IdGen) -> Result<Event> {
    validate_event_type(spec.payload.type_name())?;

    let id = spec.id.unwrap_or_else(|| EventId::generate(id_gen));
    let (event_type, data) = match spec.payload {
        EventPayload::Builtin(kind) => kind.into_type_and_data(),
        EventPayload::Custom { name, data } => (name, data),
    };

    Ok(Event {
        schema_version: default_schema_version(),
        id,
        ts: now,
        event_type,
        actor: spec.actor,
        data,
        task_id: spec.task_id,
        agent_meta: spec.agent_meta,
        otel: spec.otel,
        metrics: spec.metrics,
        run_id: spec.run_id,
    })
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
