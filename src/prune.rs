use std::collections::{BTreeSet, HashMap, HashSet};

use crate::graph::{Edge, User, UserId};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PruneReport {
    pub pruned: usize,
    pub missing: BTreeSet<UserId>,
}

/// Drops every edge with an endpoint missing from `users`.
///
/// Afterwards both endpoints of each remaining edge resolve in `users`.
pub fn prune(users: &HashMap<UserId, User>, edges: &mut HashSet<Edge>) -> PruneReport {
    let mut report = PruneReport::default();

    edges.retain(|edge| {
        let has_a = users.contains_key(&edge.a);
        let has_b = users.contains_key(&edge.b);
        if has_a && has_b {
            return true;
        }

        if !has_a {
            report.missing.insert(edge.a);
        }
        if !has_b {
            report.missing.insert(edge.b);
        }
        report.pruned += 1;
        false
    });

    report
}

/// Removes self-loops, returning how many were dropped.
pub fn prune_self_loops(edges: &mut HashSet<Edge>) -> usize {
    let before = edges.len();
    edges.retain(|edge| !edge.is_self_loop());
    before - edges.len()
}
