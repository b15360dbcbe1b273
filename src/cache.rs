use std::collections::{HashMap, HashSet};

use crate::action::{Command, Request, Ticket};
use crate::types::CommitChange;

/// Secondary data shown next to a pull request commit. Each half resolves
/// independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitDetails {
    pub changes: Option<Vec<CommitChange>>,
    pub diff: Option<String>,
}

impl CommitDetails {
    pub fn is_complete(&self) -> bool {
        self.changes.is_some() && self.diff.is_some()
    }
}

/// Session-long memo of commit change lists and diffs keyed by commit hash.
/// Entries are never evicted and never overwritten once populated.
#[derive(Debug, Default)]
pub struct CommitCache {
    entries: HashMap<String, CommitDetails>,
    changes_in_flight: HashSet<String>,
    diff_in_flight: HashSet<String>,
}

impl CommitCache {
    pub fn get(&self, hash: &str) -> Option<&CommitDetails> {
        self.entries.get(hash)
    }

    pub fn is_in_flight(&self, hash: &str) -> bool {
        self.changes_in_flight.contains(hash) || self.diff_in_flight.contains(hash)
    }

    /// Return what is cached for `hash` and the fetches needed for any part
    /// that is neither resolved nor already requested.
    pub fn get_or_fetch(
        &mut self,
        repo: &str,
        hash: &str,
        ticket: Ticket,
    ) -> (Option<&CommitDetails>, Vec<Command>) {
        let cached = self.entries.get(hash);
        if cached.is_some_and(CommitDetails::is_complete) {
            return (cached, Vec::new());
        }

        let mut commands = Vec::new();

        let has_changes = cached.is_some_and(|e| e.changes.is_some());
        if !has_changes && self.changes_in_flight.insert(hash.to_string()) {
            commands.push(Command::Fetch {
                ticket,
                request: Request::CommitChanges {
                    repo: repo.to_string(),
                    hash: hash.to_string(),
                },
            });
        }

        let has_diff = cached.is_some_and(|e| e.diff.is_some());
        if !has_diff && self.diff_in_flight.insert(hash.to_string()) {
            commands.push(Command::Fetch {
                ticket,
                request: Request::CommitDiff {
                    repo: repo.to_string(),
                    hash: hash.to_string(),
                },
            });
        }

        (self.entries.get(hash), commands)
    }

    /// Record a resolved change list. A failure only releases the in-flight
    /// marker so the part can be requested again later.
    pub fn record_changes(&mut self, hash: &str, changes: Option<Vec<CommitChange>>) {
        self.changes_in_flight.remove(hash);
        if let Some(changes) = changes {
            let entry = self.entries.entry(hash.to_string()).or_default();
            if entry.changes.is_none() {
                entry.changes = Some(changes);
            }
        }
    }

    pub fn record_diff(&mut self, hash: &str, diff: Option<String>) {
        self.diff_in_flight.remove(hash);
        if let Some(diff) = diff {
            let entry = self.entries.entry(hash.to_string()).or_default();
            if entry.diff.is_none() {
                entry.diff = Some(diff);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn change(path: &str) -> CommitChange {
        CommitChange {
            status: "modified".to_string(),
            path: path.to_string(),
            old_path: None,
            lines_added: 1,
            lines_removed: 0,
        }
    }

    #[test]
    fn first_lookup_issues_both_fetches() {
        let mut cache = CommitCache::default();
        let (cached, commands) = cache.get_or_fetch("svc-a", "abc", 1);
        assert!(cached.is_none());
        assert_eq!(commands.len(), 2);
        assert!(matches!(
            &commands[0],
            Command::Fetch { request: Request::CommitChanges { hash, .. }, .. } if hash == "abc"
        ));
        assert!(matches!(
            &commands[1],
            Command::Fetch { request: Request::CommitDiff { hash, .. }, .. } if hash == "abc"
        ));
    }

    #[test]
    fn in_flight_lookup_is_coalesced() {
        let mut cache = CommitCache::default();
        let (_, first) = cache.get_or_fetch("svc-a", "abc", 1);
        let (_, second) = cache.get_or_fetch("svc-a", "abc", 2);
        assert_eq!(first.len(), 2);
        assert!(second.is_empty());
        assert!(cache.is_in_flight("abc"));
    }

    #[test]
    fn parts_resolve_independently() {
        let mut cache = CommitCache::default();
        cache.get_or_fetch("svc-a", "abc", 1);

        cache.record_diff("abc", Some("diff --git".to_string()));
        let entry = cache.get("abc").unwrap();
        assert_eq!(entry.diff.as_deref(), Some("diff --git"));
        assert!(entry.changes.is_none());
        assert!(!entry.is_complete());

        // changes are still in flight, nothing new to issue
        let (_, commands) = cache.get_or_fetch("svc-a", "abc", 2);
        assert!(commands.is_empty());

        cache.record_changes("abc", Some(vec![change("src/lib.rs")]));
        let (cached, commands) = cache.get_or_fetch("svc-a", "abc", 3);
        assert!(cached.unwrap().is_complete());
        assert!(commands.is_empty());
    }

    #[test]
    fn entries_are_not_overwritten() {
        let mut cache = CommitCache::default();
        cache.get_or_fetch("svc-a", "abc", 1);
        cache.record_diff("abc", Some("first".to_string()));
        cache.record_diff("abc", Some("second".to_string()));
        assert_eq!(cache.get("abc").unwrap().diff.as_deref(), Some("first"));
    }

    #[test]
    fn failed_part_can_be_requested_again() {
        let mut cache = CommitCache::default();
        cache.get_or_fetch("svc-a", "abc", 1);
        cache.record_changes("abc", None);
        cache.record_diff("abc", Some("d".to_string()));

        let (_, commands) = cache.get_or_fetch("svc-a", "abc", 2);
        assert_eq!(commands.len(), 1);
        assert!(matches!(
            &commands[0],
            Command::Fetch { request: Request::CommitChanges { .. }, .. }
        ));
    }
}
