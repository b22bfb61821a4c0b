use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::warn;

pub type UserId = i64;

/// One entry of a user's contact list, as found on disk.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ContactRecord {
    #[serde(rename = "userId")]
    pub id: UserId,
    #[serde(rename = "userName")]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "userId")]
    pub id: UserId,
    #[serde(rename = "userName")]
    pub name: String,
    pub title: String,
}

impl From<&ContactRecord> for User {
    fn from(record: &ContactRecord) -> Self {
        User {
            id: record.id,
            name: record.name.clone(),
            title: record.title.clone().unwrap_or_default(),
        }
    }
}

/// Undirected acquaintance between two users, always stored with `a <= b`.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    #[serde(rename = "A")]
    pub a: UserId,
    #[serde(rename = "B")]
    pub b: UserId,
}

impl Edge {
    pub fn new(x: UserId, y: UserId) -> Self {
        Edge {
            a: x.min(y),
            b: x.max(y),
        }
    }

    pub fn is_self_loop(&self) -> bool {
        self.a == self.b
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EdgePolicy {
    /// Link the owner of a list to every contact on it.
    #[default]
    Star,
    /// Like `Star`, and also link every pair of contacts within one list.
    Clique,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Stats {
    pub user_hit: usize,
    pub user_miss: usize,
    pub edge_hit: usize,
    pub edge_miss: usize,
    /// contact-list length -> number of files with that length
    pub contacts_per_file: BTreeMap<usize, usize>,
}

#[derive(Debug, Default)]
pub struct GraphBuilder {
    pub users: HashMap<UserId, User>,
    pub edges: HashSet<Edge>,
    pub stats: Stats,
    policy: EdgePolicy,
}

impl GraphBuilder {
    pub fn new(policy: EdgePolicy) -> Self {
        GraphBuilder {
            policy,
            ..Default::default()
        }
    }

    /// Merges one contact list into the graph and returns how many new
    /// self-loops it produced.
    pub fn observe(&mut self, owner: UserId, contacts: &[ContactRecord]) -> usize {
        let mut self_loops = 0;

        for contact in contacts {
            // first-seen data wins
            if self.users.contains_key(&contact.id) {
                self.stats.user_hit += 1;
            } else {
                self.users.insert(contact.id, User::from(contact));
                self.stats.user_miss += 1;
            }

            if self.link(owner, contact.id) {
                self_loops += 1;
            }
        }

        if self.policy == EdgePolicy::Clique {
            for i in 0..contacts.len() {
                for j in i + 1..contacts.len() {
                    // a contact listed twice is not its own acquaintance
                    if contacts[i].id == contacts[j].id {
                        continue;
                    }
                    if self.link(contacts[i].id, contacts[j].id) {
                        self_loops += 1;
                    }
                }
            }
        }

        *self
            .stats
            .contacts_per_file
            .entry(contacts.len())
            .or_insert(0) += 1;

        self_loops
    }

    /// Records the pair, returning true when it is a new self-loop.
    fn link(&mut self, x: UserId, y: UserId) -> bool {
        let edge = Edge::new(x, y);
        if !self.edges.insert(edge) {
            self.stats.edge_hit += 1;
            return false;
        }
        self.stats.edge_miss += 1;

        if edge.is_self_loop() {
            let name = self.users.get(&x).map_or("", |u| u.name.as_str());
            warn!("user '{}' (#{}) maps to itself", name, x);
            return true;
        }
        false
    }
}
