use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Lifecycle state of an alert as reported by Azure Monitor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum AlertCondition {
    Fired,
    Resolved,
}

impl AlertCondition {
    /// Case-insensitive, matching the `in~` filter of the query.
    pub fn parse(raw: &str) -> Option<Self> {
        if raw.eq_ignore_ascii_case("fired") {
            Some(Self::Fired)
        } else if raw.eq_ignore_ascii_case("resolved") {
            Some(Self::Resolved)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fired => "Fired",
            Self::Resolved => "Resolved",
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetched alert, flattened into fixed columns.
#[derive(Clone, Debug, PartialEq)]
pub struct AlertRecord {
    pub name: String,
    pub severity: String,
    pub affected_resource: String,
    pub target_resource_type: String,
    pub condition: AlertCondition,
    pub description: String,
    pub monitor_service: String,
    pub signal_type: String,
    /// `None` when the upstream value is not a parseable timestamp.
    pub fire_time: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub subscription: String,
    pub target_resource_group: String,
    pub suppressed: bool,
}

/// All records for one request, in the order the query returned them
/// (newest fire time first).
pub type AlertTable = Vec<AlertRecord>;

/// Grouping key paired with the number of occurrences.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CountTable<K> {
    rows: Vec<(K, usize)>,
}

impl<K> Default for CountTable<K> {
    fn default() -> Self {
        Self { rows: Vec::new() }
    }
}

impl<K: Eq + Hash + Clone> CountTable<K> {
    /// Counts in descending order. Equal counts keep first-seen order.
    pub fn by_frequency<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut rows = tally(keys);
        rows.sort_by(|a, b| b.1.cmp(&a.1));
        Self { rows }
    }
}

impl<K: Eq + Hash + Clone + Ord> CountTable<K> {
    /// Counts in ascending key order.
    pub fn by_key<I: IntoIterator<Item = K>>(keys: I) -> Self {
        let mut rows = tally(keys);
        rows.sort_by(|a, b| a.0.cmp(&b.0));
        Self { rows }
    }
}

impl<K> CountTable<K> {
    pub fn rows(&self) -> &[(K, usize)] {
        &self.rows
    }
}

#[cfg(test)]
impl<K: PartialEq> CountTable<K> {
    pub fn get(&self, key: &K) -> Option<usize> {
        self.rows.iter().find(|(k, _)| k == key).map(|(_, c)| *c)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.iter().map(|(_, c)| c).sum()
    }
}

fn tally<K: Eq + Hash + Clone, I: IntoIterator<Item = K>>(keys: I) -> Vec<(K, usize)> {
    let mut index: HashMap<K, usize> = HashMap::new();
    let mut rows: Vec<(K, usize)> = Vec::new();

    for key in keys {
        match index.get(&key) {
            Some(&i) => rows[i].1 += 1,
            None => {
                index.insert(key.clone(), rows.len());
                rows.push((key, 1));
            }
        }
    }
    rows
}
