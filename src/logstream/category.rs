//! Log categories
//!
//! The registry starts with the categories the log servers are expected to
//! advertise and grows as `available` frames announce new ones. Keys match the
//! `type`/`log_type` fields on the wire.

use std::collections::{BTreeMap, HashMap};

/// Category for the tool's own informational and error messages
pub const INFO: &str = "info";

/// Category for the tool's own protocol chatter
pub const DEBUG: &str = "debug";

/// A kind of log line (or local message) that can be shown or hidden
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogCategory {
    pub key: String,
    pub display_name: String,
    /// `false` for categories the user cannot hide
    pub togglable: bool,
    pub enabled: bool,
    /// Upstream servers this category was announced on, in announcement order
    pub servers: Vec<String>,
}

impl LogCategory {
    fn new(key: &str, display_name: &str) -> Self {
        Self {
            key: key.to_string(),
            display_name: display_name.to_string(),
            togglable: true,
            enabled: true,
            servers: Vec::new(),
        }
    }

    fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    fn locked(mut self) -> Self {
        self.togglable = false;
        self
    }
}

/// Default categories, in display order
fn default_categories() -> Vec<LogCategory> {
    vec![
        LogCategory::new("apache-error", "Apache error"),
        LogCategory::new("apache-request", "Apache request"),
        LogCategory::new("bal-request", "Balancer request"),
        LogCategory::new("drupal-request", "Drupal request"),
        LogCategory::new("drupal-watchdog", "Drupal watchdog"),
        LogCategory::new("mysql-slow", "MySQL slow query"),
        LogCategory::new("php-error", "PHP error"),
        LogCategory::new("varnish-request", "Varnish request"),
        LogCategory::new(DEBUG, "Debug").disabled(),
        LogCategory::new(INFO, "Info").locked(),
    ]
}

/// Known categories, keyed by wire name, iterated in insertion order
#[derive(Debug, Clone)]
pub struct LogTypeRegistry {
    categories: Vec<LogCategory>,
    index: HashMap<String, usize>,
    /// Restored flags for categories no server has announced yet
    pending: BTreeMap<String, bool>,
}

impl Default for LogTypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LogTypeRegistry {
    /// Registry seeded with the default categories
    pub fn new() -> Self {
        let categories = default_categories();
        let index = categories
            .iter()
            .enumerate()
            .map(|(i, c)| (c.key.clone(), i))
            .collect();
        Self {
            categories,
            index,
            pending: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&LogCategory> {
        self.index.get(key).map(|&i| &self.categories[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Register a category or record another server for an existing one
    ///
    /// New categories are togglable and start enabled unless a restored flag
    /// says otherwise. Existing entries keep their name and flags and only
    /// gain `server`. Returns `true` if the key was new.
    pub fn upsert(&mut self, key: &str, display_name: &str, server: &str) -> bool {
        let (idx, created) = match self.index.get(key) {
            Some(&i) => (i, false),
            None => {
                let name = if display_name.is_empty() {
                    key
                } else {
                    display_name
                };
                let mut category = LogCategory::new(key, name);
                category.enabled = self.pending.remove(key).unwrap_or(true);
                self.categories.push(category);
                let i = self.categories.len() - 1;
                self.index.insert(key.to_string(), i);
                (i, true)
            }
        };

        let category = &mut self.categories[idx];
        if !server.is_empty() && !category.servers.iter().any(|s| s == server) {
            category.servers.push(server.to_string());
        }
        created
    }

    /// Change a category's enabled flag
    ///
    /// Unknown and locked categories are left alone. Returns `true` if the
    /// flag actually changed.
    pub fn set_enabled(&mut self, key: &str, enabled: bool) -> bool {
        let Some(&i) = self.index.get(key) else {
            return false;
        };
        let category = &mut self.categories[i];
        if !category.togglable || category.enabled == enabled {
            return false;
        }
        category.enabled = enabled;
        true
    }

    /// Whether messages of this category are shown (unknown keys count as enabled)
    pub fn is_enabled(&self, key: &str) -> bool {
        self.get(key).map(|c| c.enabled).unwrap_or(true)
    }

    pub fn iter(&self) -> impl Iterator<Item = &LogCategory> {
        self.categories.iter()
    }

    /// Categories the user may toggle, in display order
    pub fn togglable(&self) -> impl Iterator<Item = &LogCategory> {
        self.categories.iter().filter(|c| c.togglable)
    }

    /// Togglable categories bound to number keys, in display order
    ///
    /// `debug` is left out, it has its own key.
    pub fn numbered(&self) -> impl Iterator<Item = &LogCategory> {
        self.togglable().filter(|c| c.key != DEBUG)
    }

    /// Snapshot of the enabled flags of every togglable category
    ///
    /// Restored flags of categories not announced this run are carried over.
    pub fn enabled_keys(&self) -> BTreeMap<String, bool> {
        let mut flags = self.pending.clone();
        flags.extend(self.togglable().map(|c| (c.key.clone(), c.enabled)));
        flags
    }

    /// Restore enabled flags from a snapshot
    ///
    /// Flags for keys not registered yet are kept and applied when the
    /// category is announced. Locked categories are left alone.
    pub fn apply_enabled(&mut self, flags: &BTreeMap<String, bool>) {
        for (key, &enabled) in flags {
            if self.contains(key) {
                self.set_enabled(key, enabled);
            } else {
                self.pending.insert(key.clone(), enabled);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}
