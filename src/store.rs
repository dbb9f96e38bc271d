//! In-memory notification cache with resurrection suppression.
//!
//! The store exclusively owns the `id → Notification` map plus two
//! tracking sets:
//! - **deleted-set**: ids removed locally; a stale server response that
//!   still contains one of these must never bring it back.
//! - **seen-set**: ids already reported as "new"; reappearance in a later
//!   fetch must not trigger a second alert.
//!
//! All mutation flows through these methods (the poller's merge step and
//! the reconciler's optimistic writes), which is what makes arbitrary
//! interleaving of the two convergent.

use std::collections::{HashMap, HashSet};

use crate::model::Notification;

/// Result of a [`NotificationStore::merge`] call.
#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    /// Entries never cached nor seen before, in server order.
    pub new_items: Vec<Notification>,
    /// Unread count after the merge.
    pub unread_count: u64,
}

#[derive(Debug, Default)]
pub struct NotificationStore {
    cache: HashMap<String, Notification>,
    deleted: HashSet<String>,
    seen: HashSet<String>,
    unread: u64,
}

impl NotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The authoritative merge: diff-by-identity against the latest
    /// server-reported list.
    ///
    /// Entries in the deleted-set are filtered out, `new_items` are those
    /// neither cached nor seen, every surviving id enters the seen-set,
    /// and the cache is replaced wholesale with the filtered list. A
    /// notification whose fields changed server-side but kept its id is
    /// not "new".
    pub fn merge(&mut self, fresh: Vec<Notification>) -> MergeOutcome {
        let mut next: HashMap<String, Notification> = HashMap::with_capacity(fresh.len());
        let mut new_items = Vec::new();
        for item in fresh {
            if self.deleted.contains(&item.id) {
                continue;
            }
            if !self.cache.contains_key(&item.id)
                && !self.seen.contains(&item.id)
                && !next.contains_key(&item.id)
            {
                new_items.push(item.clone());
            }
            // Duplicate ids within one page: last occurrence wins.
            next.insert(item.id.clone(), item);
        }
        for id in next.keys() {
            self.seen.insert(id.clone());
        }
        self.cache = next;
        self.unread = self.cache.values().filter(|n| !n.is_read).count() as u64;
        MergeOutcome {
            new_items,
            unread_count: self.unread,
        }
    }

    /// Flip a cached entry to read. The counter only moves on an actual
    /// `false → true` transition, keeping it equal to the number of
    /// unread entries. Returns whether anything changed.
    pub fn mark_read(&mut self, id: &str) -> bool {
        match self.cache.get_mut(id) {
            Some(entry) if !entry.is_read => {
                entry.is_read = true;
                self.unread = self.unread.saturating_sub(1);
                true
            }
            _ => false,
        }
    }

    pub fn mark_all_read(&mut self) {
        for entry in self.cache.values_mut() {
            entry.is_read = true;
        }
        self.unread = 0;
    }

    /// Drop an entry and remember its id in the deleted-set. Unknown ids
    /// still enter the set, masking out-of-order deletes of entries the
    /// cache has not fetched yet. Returns whether an entry was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        self.deleted.insert(id.to_string());
        match self.cache.remove(id) {
            Some(entry) => {
                if !entry.is_read {
                    self.unread = self.unread.saturating_sub(1);
                }
                true
            }
            None => false,
        }
    }

    pub fn remove_all(&mut self) {
        self.deleted.extend(self.cache.keys().cloned());
        self.cache.clear();
        self.unread = 0;
    }

    /// Clear both tracking sets. Called on user/session change only,
    /// never mid-session.
    pub fn reset_tracking(&mut self) {
        self.deleted.clear();
        self.seen.clear();
    }

    /// Cached entries in display order: newest first, ties broken by id.
    pub fn notifications(&self) -> Vec<Notification> {
        let mut items: Vec<Notification> = self.cache.values().cloned().collect();
        items.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        items
    }

    pub fn unread_count(&self) -> u64 {
        self.unread
    }

    pub fn len(&self) -> usize {
        self.cache.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Notification> {
        self.cache.get(id)
    }

    pub fn is_deleted(&self, id: &str) -> bool {
        self.deleted.contains(id)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::NotificationType;

    fn note(id: &str, is_read: bool, minute: u32) -> Notification {
        Notification {
            id: id.to_string(),
            title: format!("title {id}"),
            message: format!("message {id}"),
            kind: NotificationType::BudgetWarning,
            is_read,
            related_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 1, 10, minute, 0).single().expect("valid timestamp"),
        }
    }

    #[test]
    fn first_merge_reports_everything_new() {
        let mut store = NotificationStore::new();
        let outcome = store.merge(vec![note("n1", false, 0), note("n2", true, 1)]);

        assert_eq!(outcome.new_items.len(), 2);
        assert_eq!(outcome.unread_count, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn merge_is_idempotent() {
        let mut store = NotificationStore::new();
        let list = vec![note("n1", false, 0), note("n2", true, 1)];
        store.merge(list.clone());
        let second = store.merge(list);

        assert!(second.new_items.is_empty());
        assert_eq!(store.len(), 2);
        assert_eq!(store.unread_count(), 1);
    }

    #[test]
    fn deleted_id_never_resurrects() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", false, 1)]);
        store.remove("n2");
        assert_eq!(store.len(), 1);

        // Stale server response still contains n2.
        let outcome = store.merge(vec![note("n1", false, 0), note("n2", false, 1)]);
        assert!(outcome.new_items.is_empty());
        assert_eq!(store.len(), 1);
        assert!(store.get("n2").is_none());
        assert!(store.is_deleted("n2"));
    }

    #[test]
    fn seen_id_reported_new_at_most_once() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0)]);
        // n1 drops out of one fetch, then reappears.
        store.merge(vec![]);
        let outcome = store.merge(vec![note("n1", false, 0)]);

        assert!(outcome.new_items.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn reset_tracking_allows_rediscovery() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0)]);
        store.remove("n1");
        store.reset_tracking();

        let outcome = store.merge(vec![note("n1", false, 0)]);
        assert_eq!(outcome.new_items.len(), 1);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn unread_count_never_negative() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0)]);
        store.mark_read("n1");
        store.mark_read("n1");
        store.remove("n1");
        store.remove("n1");
        store.mark_read("ghost");

        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn mark_read_on_read_entry_keeps_counter_exact() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", true, 1)]);

        assert!(!store.mark_read("n2"));
        assert_eq!(store.unread_count(), 1);
        assert!(store.mark_read("n1"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn mark_all_read_zeroes_counter() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", true, 1)]);
        store.mark_all_read();

        assert_eq!(store.unread_count(), 0);
        assert!(store.notifications().iter().all(|n| n.is_read));
    }

    #[test]
    fn remove_unread_entry_decrements_counter() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", true, 1)]);
        store.remove("n1");
        assert_eq!(store.unread_count(), 0);
        store.remove("n2");
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn remove_unknown_id_still_masks_future_merges() {
        let mut store = NotificationStore::new();
        assert!(!store.remove("n9"));

        let outcome = store.merge(vec![note("n9", false, 0)]);
        assert!(outcome.new_items.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn remove_all_masks_every_cached_id() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", false, 1)]);
        store.remove_all();

        assert!(store.is_empty());
        assert_eq!(store.unread_count(), 0);

        let outcome = store.merge(vec![note("n1", false, 0), note("n2", false, 1)]);
        assert!(outcome.new_items.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn content_change_with_stable_id_is_not_new() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0)]);

        let mut updated = note("n1", false, 0);
        updated.title = "rewritten server-side".to_string();
        let outcome = store.merge(vec![updated.clone()]);

        assert!(outcome.new_items.is_empty());
        assert_eq!(store.get("n1").map(|n| n.title.as_str()), Some("rewritten server-side"));
    }

    #[test]
    fn duplicate_ids_within_one_page_collapse() {
        let mut store = NotificationStore::new();
        let mut later = note("n1", true, 5);
        later.title = "second occurrence".to_string();
        let outcome = store.merge(vec![note("n1", false, 0), later]);

        assert_eq!(outcome.new_items.len(), 1);
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("n1").map(|n| n.title.as_str()), Some("second occurrence"));
        assert_eq!(store.unread_count(), 0);
    }

    #[test]
    fn notifications_sorted_newest_first() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("old", false, 0), note("new", false, 30), note("mid", false, 15)]);

        let ordered: Vec<String> = store.notifications().into_iter().map(|n| n.id).collect();
        assert_eq!(ordered, vec!["new", "mid", "old"]);
    }

    #[test]
    fn unread_recount_after_merge_matches_contents() {
        let mut store = NotificationStore::new();
        store.merge(vec![note("n1", false, 0), note("n2", false, 1)]);
        store.mark_read("n1");
        // Server catches up: n1 read, n2 still unread, n3 appears.
        let outcome = store.merge(vec![note("n1", true, 0), note("n2", false, 1), note("n3", false, 2)]);

        assert_eq!(outcome.new_items.len(), 1);
        assert_eq!(outcome.new_items[0].id, "n3");
        assert_eq!(store.unread_count(), 2);
    }
}
