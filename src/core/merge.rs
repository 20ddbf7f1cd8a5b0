//! Reconciliation of persisted mappings against the current action set
//!
//! A mapping written by an older release may be missing actions added since,
//! and may contain actions that no longer exist. [`merge`] brings such a
//! mapping up to date without ever letting a newly introduced default steal
//! a key sequence the user already assigned to something else.
//!
//! The policy is a pure function over data so it can be tested without any
//! OS or I/O dependency.

use crate::core::types::{Action, KeyCombination};

/// Reconciles `persisted` against `known` actions and their `defaults`.
///
/// Rules, in order:
/// - An action present in `persisted` keeps its combination unchanged.
/// - A known action missing from `persisted` receives its default, unless
///   that default collides with a combination persisted for a *different*
///   action; then it is inserted unbound so two actions never silently share
///   one key sequence after an upgrade.
/// - Actions present in `persisted` but absent from `known` are dropped.
///
/// Output order follows `known`, not `persisted`. The function is
/// idempotent: merging its own output changes nothing.
pub fn merge(
    persisted: &[(Action, KeyCombination)],
    known: &[Action],
    defaults: &[(Action, KeyCombination)],
) -> Vec<(Action, KeyCombination)> {
    let mut merged = Vec::with_capacity(known.len());

    for &action in known {
        if let Some(&(_, combination)) = persisted.iter().find(|(a, _)| *a == action) {
            merged.push((action, combination));
            continue;
        }

        let default = defaults
            .iter()
            .find(|(a, _)| *a == action)
            .map(|&(_, c)| c)
            .unwrap_or_else(KeyCombination::unbound);

        let collides = default.is_bound()
            && persisted
                .iter()
                .any(|&(other, c)| other != action && c == default);

        merged.push((
            action,
            if collides {
                KeyCombination::unbound()
            } else {
                default
            },
        ));
    }

    merged
}

/// The standard default table for every known action, in canonical order.
pub fn standard_defaults() -> Vec<(Action, KeyCombination)> {
    Action::ALL
        .into_iter()
        .map(|a| (a, a.default_combination()))
        .collect()
}

/// [`merge`] against the full action set and the standard defaults, the
/// form used at startup.
pub fn merge_with_defaults(
    persisted: &[(Action, KeyCombination)],
) -> Vec<(Action, KeyCombination)> {
    merge(persisted, &Action::ALL, &standard_defaults())
}
