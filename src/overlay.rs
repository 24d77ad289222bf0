//! Optimistic overlay on top of a canonical list.
//!
//! The rendered list is always `canonical ++ created`, minus anything whose id was
//! locally deleted. Each overlay entry remembers which mutation introduced it so the
//! entry can be confirmed, rolled back, or dropped once a fresh snapshot arrives.

use std::collections::HashSet;

use tracing::{debug, trace};

use crate::types::Entity;

/// Merge a canonical snapshot with locally created entities and locally deleted ids.
///
/// Created entities keep their insertion order after the canonical ones. The delete
/// filter runs after the concatenation, so an id that was both created and deleted
/// never shows up.
pub fn reconcile<'a, T, I>(canonical: &'a [T], created: I, deleted: &HashSet<&str>) -> Vec<T>
where
    T: Entity + Clone + 'a,
    I: IntoIterator<Item = &'a T>,
{
    canonical
        .iter()
        .chain(created)
        .filter(|item| !deleted.contains(item.id()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MutationId(u64);

/// What happens to an optimistic entry when its network call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Leave the entry applied until the next canonical snapshot replaces it.
    #[default]
    Keep,
    /// Retract the entry immediately.
    Rollback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlayState {
    /// Nothing overlaid; the view equals the canonical list.
    Synced,
    /// At least one mutation is still waiting on the network.
    OverlayPending,
    /// Every mutation has resolved; waiting for the refetch that supersedes them.
    Reconciling,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    InFlight,
    Confirmed,
    Failed,
}

#[derive(Debug, Clone)]
enum Change<T> {
    Create(T),
    Delete(String),
}

#[derive(Debug, Clone)]
struct Entry<T> {
    mutation: MutationId,
    change: Change<T>,
    stage: Stage,
}

#[derive(Debug, Clone)]
pub struct Overlay<T> {
    entries: Vec<Entry<T>>,
    next_mutation: u64,
    policy: FailurePolicy,
}

impl<T> Default for Overlay<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_mutation: 0,
            policy: FailurePolicy::default(),
        }
    }
}

impl<T: Entity + Clone> Overlay<T> {
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            entries: Vec::new(),
            next_mutation: 0,
            policy,
        }
    }

    pub fn state(&self) -> OverlayState {
        if self.entries.is_empty() {
            OverlayState::Synced
        } else if self.entries.iter().any(|e| e.stage == Stage::InFlight) {
            OverlayState::OverlayPending
        } else {
            OverlayState::Reconciling
        }
    }

    pub fn apply_create(&mut self, entity: T) -> MutationId {
        debug!(id = entity.id(), "optimistic create");
        self.push(Change::Create(entity))
    }

    pub fn apply_delete(&mut self, id: impl Into<String>) -> MutationId {
        let id = id.into();
        debug!(%id, "optimistic delete");
        self.push(Change::Delete(id))
    }

    fn push(&mut self, change: Change<T>) -> MutationId {
        self.next_mutation += 1;
        let mutation = MutationId(self.next_mutation);
        self.entries.push(Entry {
            mutation,
            change,
            stage: Stage::InFlight,
        });
        mutation
    }

    /// The server accepted the mutation. Returns `false` for an unknown id.
    pub fn confirm(&mut self, mutation: MutationId) -> bool {
        match self.entry_mut(mutation) {
            Some(entry) => {
                entry.stage = Stage::Confirmed;
                true
            }
            None => false,
        }
    }

    /// The server rejected the mutation. Returns `false` for an unknown id.
    pub fn fail(&mut self, mutation: MutationId) -> bool {
        match self.policy {
            FailurePolicy::Rollback => {
                let before = self.entries.len();
                self.entries.retain(|e| e.mutation != mutation);
                let removed = self.entries.len() != before;
                if removed {
                    debug!(?mutation, "rolled back optimistic entry");
                }
                removed
            }
            FailurePolicy::Keep => match self.entry_mut(mutation) {
                Some(entry) => {
                    entry.stage = Stage::Failed;
                    true
                }
                None => false,
            },
        }
    }

    /// A fresh canonical snapshot was accepted. Only mutations still in flight survive.
    pub fn settle(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|e| e.stage == Stage::InFlight);
        trace!(dropped = before - self.entries.len(), "overlay settled");
    }

    /// Render the overlay on top of `canonical`. A created entity the snapshot
    /// already carries is shown once, at its canonical position.
    pub fn view(&self, canonical: &[T]) -> Vec<T> {
        let known: HashSet<&str> = canonical.iter().map(|item| item.id()).collect();
        let created = self.entries.iter().filter_map(|e| match &e.change {
            Change::Create(entity) if !known.contains(entity.id()) => Some(entity),
            _ => None,
        });
        let deleted: HashSet<&str> = self
            .entries
            .iter()
            .filter_map(|e| match &e.change {
                Change::Delete(id) => Some(id.as_str()),
                Change::Create(_) => None,
            })
            .collect();

        reconcile(canonical, created, &deleted)
    }

    fn entry_mut(&mut self, mutation: MutationId) -> Option<&mut Entry<T>> {
        self.entries.iter_mut().find(|e| e.mutation == mutation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::User;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            email: format!("{id}@mail.com"),
        }
    }

    fn ids(users: &[User]) -> Vec<&str> {
        users.iter().map(|u| u.id.as_str()).collect()
    }

    /// Straightforward restatement of the merge rule to compare against.
    fn concat_then_filter(canonical: &[User], created: &[User], deleted: &[&str]) -> Vec<User> {
        let mut all = canonical.to_vec();
        all.extend_from_slice(created);
        all.retain(|u| !deleted.contains(&u.id.as_str()));
        all
    }

    #[test]
    fn test_reconcile_matches_concat_then_filter() {
        let cases: Vec<(Vec<User>, Vec<User>, Vec<&str>)> = vec![
            (vec![], vec![], vec![]),
            (vec![user("a"), user("b")], vec![], vec![]),
            (vec![], vec![user("c")], vec!["c"]),
            (vec![user("a"), user("b")], vec![user("c"), user("d")], vec!["b", "d"]),
            (vec![user("a")], vec![user("a")], vec![]),
            (vec![user("a")], vec![user("b")], vec!["zzz"]),
        ];

        for (canonical, created, deleted) in cases {
            let set: HashSet<&str> = deleted.iter().copied().collect();
            let merged = reconcile(&canonical, &created, &set);
            assert_eq!(merged, concat_then_filter(&canonical, &created, &deleted));

            let again = reconcile(&canonical, &created, &set);
            assert_eq!(merged, again);
        }
    }

    #[test]
    fn test_created_then_deleted_is_absent() {
        let mut overlay = Overlay::default();
        overlay.apply_create(user("c"));
        overlay.apply_delete("c");
        assert!(overlay.view(&[user("a")]).iter().all(|u| u.id != "c"));
    }

    #[test]
    fn test_creates_keep_insertion_order() {
        let mut overlay = Overlay::default();
        overlay.apply_create(user("z"));
        overlay.apply_create(user("m"));
        overlay.apply_create(user("a"));
        assert_eq!(ids(&overlay.view(&[user("b")])), vec!["b", "z", "m", "a"]);
    }

    #[test]
    fn test_state_transitions() {
        let mut overlay = Overlay::default();
        assert_eq!(overlay.state(), OverlayState::Synced);

        let first = overlay.apply_create(user("c"));
        let second = overlay.apply_delete("a");
        assert_eq!(overlay.state(), OverlayState::OverlayPending);

        assert!(overlay.confirm(first));
        assert_eq!(overlay.state(), OverlayState::OverlayPending);

        assert!(overlay.confirm(second));
        assert_eq!(overlay.state(), OverlayState::Reconciling);

        overlay.settle();
        assert_eq!(overlay.state(), OverlayState::Synced);
    }

    #[test]
    fn test_settle_keeps_in_flight_entries() {
        let mut overlay = Overlay::default();
        let confirmed = overlay.apply_create(user("c"));
        overlay.apply_create(user("d"));
        overlay.confirm(confirmed);

        overlay.settle();

        assert_eq!(overlay.state(), OverlayState::OverlayPending);
        assert_eq!(ids(&overlay.view(&[])), vec!["d"]);
    }

    #[test]
    fn test_rollback_on_failure() {
        let mut overlay = Overlay::new(FailurePolicy::Rollback);
        let create = overlay.apply_create(user("c"));
        let delete = overlay.apply_delete("a");

        assert!(overlay.fail(create));
        assert!(overlay.fail(delete));

        assert_eq!(overlay.state(), OverlayState::Synced);
        assert_eq!(ids(&overlay.view(&[user("a")])), vec!["a"]);
    }

    #[test]
    fn test_keep_on_failure_until_next_snapshot() {
        let mut overlay = Overlay::new(FailurePolicy::Keep);
        let delete = overlay.apply_delete("a");

        assert!(overlay.fail(delete));
        assert_eq!(overlay.state(), OverlayState::Reconciling);
        assert!(overlay.view(&[user("a")]).is_empty());

        overlay.settle();
        assert_eq!(ids(&overlay.view(&[user("a")])), vec!["a"]);
    }

    #[test]
    fn test_default_policy_keeps_failed_entries() {
        let mut overlay = Overlay::default();
        let delete = overlay.apply_delete("a");

        assert!(overlay.fail(delete));
        assert_eq!(ids(&overlay.view(&[user("a"), user("b")])), vec!["b"]);
    }

    #[test]
    fn test_in_flight_create_already_in_snapshot_shows_once() {
        let mut overlay = Overlay::default();
        overlay.apply_create(user("c"));
        overlay.settle();

        assert_eq!(overlay.state(), OverlayState::OverlayPending);
        assert_eq!(ids(&overlay.view(&[user("a"), user("c")])), vec!["a", "c"]);
        assert_eq!(ids(&overlay.view(&[user("a")])), vec!["a", "c"]);
    }

    #[test]
    fn test_unknown_mutation_is_ignored() {
        let mut other = Overlay::<User>::default();
        let foreign = other.apply_create(user("x"));

        let mut overlay = Overlay::<User>::default();
        overlay.settle();
        assert!(!overlay.confirm(foreign));
        assert!(!overlay.fail(foreign));
    }
}
