// SPDX-License-Identifier: MIT
//! Pure hook-pattern resolution (spec §4.3, §4.4). No I/O and no process
//! spawning lives here — this module only decides *which* command string
//! (if any) applies to a given event or transition; running it is
//! `lattice-storage`'s job, fired outside the write lock.

use std::collections::BTreeMap;

/// Precedence tier for a transition pattern match, lowest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Tier {
    Exact,
    WildcardSource,
    WildcardTarget,
    DoubleWildcard,
}

fn parse_pattern(pattern: &str) -> Option<(&str, &str)> {
    let (from, to) = pattern.split_once("->")?;
    let from = from.trim();
    let to = to.trim();
    if from.is_empty() || to.is_empty() {
        return None;
    }
    Some((from, to))
}

fn tier_for(pattern_from: &str, pattern_to: &str, from: &str, to: &str) -> Option<Tier> {
    let from_matches = pattern_from == "*" || pattern_from == from;
    let to_matches = pattern_to == "*" || pattern_to == to;
    if !from_matches || !to_matches {
        return None;
    }
    Some(match (pattern_from == "*", pattern_to == "*") {
        (false, false) => Tier::Exact,
        (true, false) => Tier::WildcardSource,
        (false, true) => Tier::WildcardTarget,
        (true, true) => Tier::DoubleWildcard,
    })
}

/// Resolve the hook command for a `from -> to` status transition, per the
/// precedence order exact > wildcard-source > wildcard-target >
/// double-wildcard. Malformed patterns (missing `->`, empty side) are
/// ignored rather than rejected.
pub fn resolve_transition_hook<'a>(
    transitions: &'a BTreeMap<String, String>,
    from: &str,
    to: &str,
) -> Option<&'a str> {
    let mut best: Option<(Tier, &str)> = None;
    for (pattern, command) in transitions {
        let Some((pfrom, pto)) = parse_pattern(pattern) else {
            continue;
        };
        let Some(tier) = tier_for(pfrom, pto, from, to) else {
            continue;
        };
        match best {
            Some((best_tier, _)) if best_tier <= tier => {}
            _ => best = Some((tier, command.as_str())),
        }
    }
    best.map(|(_, command)| command)
}

/// Resolve the hook command for a bare event type (spec `hooks.on`). Exact
/// match only — no wildcard support for event-type hooks.
pub fn resolve_event_hook<'a>(on: &'a BTreeMap<String, String>, event_type: &str) -> Option<&'a str> {
    on.get(event_type).map(String::as_str)
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
