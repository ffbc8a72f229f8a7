//! Recency tracker: per-category record of when each question was last served.
//!
//! A question served within the cooldown window is "recently used" and is
//! deprioritized by the selector. Each category's table sits behind its own
//! mutex; the selector holds it across partition, draw and marking so two
//! concurrent selections for one category always see each other's marks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::{Duration, SystemTime};

use tracing::{debug, instrument};

use crate::domain::QuestionId;

/// Last-served timestamps for one category.
#[derive(Debug, Default, Clone)]
pub struct RecencyTable {
    entries: HashMap<QuestionId, SystemTime>,
}

impl RecencyTable {
    pub fn last_served(&self, id: &QuestionId) -> Option<SystemTime> {
        self.entries.get(id).copied()
    }

    /// Last-served time of `id`, if that is still within `cooldown` of `now`.
    pub fn served_within(&self, id: &QuestionId, now: SystemTime, cooldown: Duration) -> Option<SystemTime> {
        self.last_served(id).filter(|at| !is_expired(*at, now, cooldown))
    }

    /// Upsert; a re-served question restarts its cooldown.
    pub fn mark_used(&mut self, id: QuestionId, at: SystemTime) {
        self.entries.insert(id, at);
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries still inside `cooldown` at `now`. Does not mutate.
    pub fn active_count(&self, now: SystemTime, cooldown: Duration) -> usize {
        self.entries.values().filter(|at| !is_expired(**at, now, cooldown)).count()
    }

    /// Drop entries at least `cooldown` old. Returns how many were removed.
    fn sweep(&mut self, now: SystemTime, cooldown: Duration) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, at| !is_expired(*at, now, cooldown));
        before - self.entries.len()
    }
}

fn is_expired(at: SystemTime, now: SystemTime, cooldown: Duration) -> bool {
    // Entries stamped in the future (clock skew) count as age zero.
    now.duration_since(at).map_or(false, |age| age >= cooldown)
}

fn lock(table: &Mutex<RecencyTable>) -> MutexGuard<'_, RecencyTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owns one `RecencyTable` per category, created on first use.
#[derive(Debug)]
pub struct RecencyTracker {
    cooldown: Duration,
    tables: RwLock<HashMap<String, Arc<Mutex<RecencyTable>>>>,
}

impl RecencyTracker {
    pub fn new(cooldown: Duration) -> Self {
        Self { cooldown, tables: RwLock::new(HashMap::new()) }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    /// Handle to a category's table, creating it if needed.
    pub fn table(&self, category: &str) -> Arc<Mutex<RecencyTable>> {
        if let Some(t) = self.tables.read().unwrap_or_else(PoisonError::into_inner).get(category) {
            return t.clone();
        }
        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(category.to_string())
            .or_default()
            .clone()
    }

    fn tables_snapshot(&self) -> Vec<(String, Arc<Mutex<RecencyTable>>)> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Remove expired entries across every category. Idempotent.
    #[instrument(level = "debug", skip(self))]
    pub fn sweep(&self, now: SystemTime) -> usize {
        let mut removed = 0;
        for (category, table) in self.tables_snapshot() {
            let n = lock(&table).sweep(now, self.cooldown);
            if n > 0 {
                debug!(target: "selection", %category, removed = n, "Expired recency entries");
            }
            removed += n;
        }
        removed
    }

    /// How many questions of `category` are inside their cooldown at `now`.
    /// Read-only: expired entries are counted out, not removed.
    pub fn recent_count(&self, category: &str, now: SystemTime) -> usize {
        let Some(table) = self.existing_table(category) else { return 0 };
        let n = lock(&table).active_count(now, self.cooldown);
        n
    }

    /// True if `id` was served in `category` less than one cooldown before `now`.
    #[cfg(test)]
    pub fn is_recently_used(&self, category: &str, id: &QuestionId, now: SystemTime) -> bool {
        let Some(table) = self.existing_table(category) else { return false };
        let recent = lock(&table).served_within(id, now, self.cooldown).is_some();
        recent
    }

    #[cfg(test)]
    pub fn mark_used(&self, category: &str, id: QuestionId, at: SystemTime) {
        lock(&self.table(category)).mark_used(id, at);
    }

    /// Run `f` with exclusive access to a category's table.
    pub fn with_table<R>(&self, category: &str, f: impl FnOnce(&mut RecencyTable) -> R) -> R {
        let table = self.table(category);
        let mut guard = lock(&table);
        f(&mut *guard)
    }

    /// Copy of a category's table; empty if the category was never touched.
    #[cfg(test)]
    pub fn snapshot(&self, category: &str) -> RecencyTable {
        match self.existing_table(category) {
            Some(table) => {
                let copy = lock(&table).clone();
                copy
            }
            None => RecencyTable::default(),
        }
    }

    fn existing_table(&self, category: &str) -> Option<Arc<Mutex<RecencyTable>>> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner).get(category).cloned()
    }
}
