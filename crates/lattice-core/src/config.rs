// SPDX-License-Identifier: MIT
//! Project configuration (spec §3.1): the workflow's status set and
//! transition table, hooks, and the project's short-ID prefix.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

fn default_schema_version() -> u32 {
    1
}

/// The status workflow: which statuses exist, which transitions between
/// them are permitted, optional WIP limits, and statuses reachable from
/// any other status (spec glossary: "universal target", e.g. `cancelled`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub statuses: Vec<String>,
    #[serde(default)]
    pub transitions: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub wip_limits: BTreeMap<String, u32>,
    #[serde(default)]
    pub universal_targets: BTreeSet<String>,
}

impl WorkflowConfig {
    pub fn is_known_status(&self, status: &str) -> bool {
        self.statuses.iter().any(|s| s == status)
    }

    /// True if `from -> to` is either explicitly permitted or `to` is a
    /// universal target (spec §4.3).
    pub fn allows_transition(&self, from: &str, to: &str) -> bool {
        if self.universal_targets.contains(to) {
            return true;
        }
        self.transitions
            .get(from)
            .is_some_and(|allowed| allowed.iter().any(|s| s == to))
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let statuses = vec![
            "backlog".to_string(),
            "ready".to_string(),
            "in_progress".to_string(),
            "blocked".to_string(),
            "in_review".to_string(),
            "done".to_string(),
            "cancelled".to_string(),
        ];
        let mut transitions = BTreeMap::new();
        transitions.insert("backlog".to_string(), vec!["ready".to_string()]);
        transitions.insert(
            "ready".to_string(),
            vec!["in_progress".to_string(), "backlog".to_string()],
        );
        transitions.insert(
            "in_progress".to_string(),
            vec![
                "in_review".to_string(),
                "blocked".to_string(),
                "ready".to_string(),
            ],
        );
        transitions.insert(
            "blocked".to_string(),
            vec!["in_progress".to_string(), "ready".to_string()],
        );
        transitions.insert(
            "in_review".to_string(),
            vec!["done".to_string(), "in_progress".to_string()],
        );
        Self {
            statuses,
            transitions,
            wip_limits: BTreeMap::new(),
            universal_targets: BTreeSet::from(["cancelled".to_string()]),
        }
    }
}

/// Deserialize a map, but treat any non-object JSON value as an empty map
/// instead of erroring — spec §4.3: "Non-dict hook configurations are
/// treated as empty rather than raised."
fn lenient_map<'de, D, T>(deserializer: D) -> std::result::Result<BTreeMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).or(Ok(BTreeMap::new())),
        _ => Ok(BTreeMap::new()),
    }
}

/// Hook configuration (spec §3.1, §4.3, §4.4).
///
/// `on` maps an event type to a shell command. `transitions` maps a
/// `"from -> to"` pattern (whitespace-tolerant around the arrow, `*`
/// meaning "any") to a shell command. Both are parsed leniently: a
/// non-object value collapses to an empty map rather than failing config
/// load.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct HooksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_event: Option<String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub on: BTreeMap<String, String>,
    #[serde(default, deserialize_with = "lenient_map")]
    pub transitions: BTreeMap<String, String>,
}

/// Project-level configuration (spec §3.1, on-disk as `config.json`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub workflow: WorkflowConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_policy: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_policies: Option<Value>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            workflow: WorkflowConfig::default(),
            project_code: Some("LAT".to_string()),
            hooks: None,
            completion_policy: None,
            worker_policies: None,
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
