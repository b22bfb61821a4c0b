use petgraph::graphmap::UnGraphMap;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{Result, SocialMapError};
use crate::graph::{Edge, User, UserId};

/// Final graph, ready for a renderer.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct GraphExport {
    pub users: Vec<User>,
    pub edges: Vec<Edge>,
}

/// Users come out ordered by id, edges by first then second endpoint.
pub fn export(users: &HashMap<UserId, User>, edges: &HashSet<Edge>) -> GraphExport {
    let mut users: Vec<User> = users.values().cloned().collect();
    users.sort_by_key(|u| u.id);

    let mut edges: Vec<Edge> = edges.iter().copied().collect();
    edges.sort();

    GraphExport { users, edges }
}

/// Groups a sorted edge list by first endpoint in a single pass.
pub fn clusters(edges: &[Edge]) -> impl Iterator<Item = (UserId, &[Edge])> {
    edges
        .chunk_by(|x, y| x.a == y.a)
        .map(|run| (run[0].a, run))
}

/// Sub-graph of everything within `depth` hops of `root`.
pub fn neighborhood(graph: &GraphExport, root: UserId, depth: usize) -> Result<GraphExport> {
    if !graph.users.iter().any(|u| u.id == root) {
        return Err(SocialMapError::UnknownUser(root));
    }

    let mut network: UnGraphMap<UserId, ()> =
        UnGraphMap::from_edges(graph.edges.iter().map(|e| (e.a, e.b)));
    network.add_node(root);

    let mut distance: HashMap<UserId, usize> = HashMap::new();
    let mut queue = VecDeque::new();
    distance.insert(root, 0);
    queue.push_back(root);

    while let Some(node) = queue.pop_front() {
        let d = distance[&node];
        if d == depth {
            continue;
        }
        for next in network.neighbors(node) {
            if !distance.contains_key(&next) {
                distance.insert(next, d + 1);
                queue.push_back(next);
            }
        }
    }

    // an edge is walked only from an endpoint short of the horizon
    let within = |id: &UserId| distance.get(id).is_some_and(|d| *d < depth);

    Ok(GraphExport {
        users: graph
            .users
            .iter()
            .filter(|u| distance.contains_key(&u.id))
            .cloned()
            .collect(),
        edges: graph
            .edges
            .iter()
            .filter(|e| within(&e.a) || within(&e.b))
            .copied()
            .collect(),
    })
}
