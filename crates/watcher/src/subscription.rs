//! Watch subscriptions and the table that owns them

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// How a root was registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WatchMode {
    /// Registered with `watch`: only the root itself is watched and
    /// notifications carry just the event key
    Simple,
    /// Registered with `watch_one_level`: immediate subdirectories are
    /// tracked too and notifications carry key, path and operation
    OneLevel,
}

/// Position of a subscription in the watched tree
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Depth {
    Root,
    /// Subdirectory discovered under `root`
    Child { root: PathBuf },
}

/// One watched path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchSubscription {
    pub path: PathBuf,
    pub event_key: String,
    pub depth: Depth,
    pub mode: WatchMode,
}

impl WatchSubscription {
    pub fn root(path: impl Into<PathBuf>, event_key: impl Into<String>, mode: WatchMode) -> Self {
        Self {
            path: path.into(),
            event_key: event_key.into(),
            depth: Depth::Root,
            mode,
        }
    }

    /// Child subscription inheriting key and mode from `root`
    pub fn child(path: impl Into<PathBuf>, root: &WatchSubscription) -> Self {
        Self {
            path: path.into(),
            event_key: root.event_key.clone(),
            depth: Depth::Child {
                root: root.path.clone(),
            },
            mode: root.mode,
        }
    }

    pub fn is_root(&self) -> bool {
        matches!(self.depth, Depth::Root)
    }

    /// Owning root path (a root owns itself)
    pub fn owner(&self) -> &Path {
        match &self.depth {
            Depth::Root => &self.path,
            Depth::Child { root } => root,
        }
    }
}

/// Membership of a path in the table, as seen by the reconciliation planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    Untracked,
    Root(WatchMode),
    Child,
}

/// Path → subscription map
#[derive(Debug, Default)]
pub(crate) struct SubscriptionTable {
    entries: HashMap<PathBuf, WatchSubscription>,
}

impl SubscriptionTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, path: &Path) -> Option<&WatchSubscription> {
        self.entries.get(path)
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.entries.contains_key(path)
    }

    pub fn membership(&self, path: &Path) -> Membership {
        match self.entries.get(path) {
            None => Membership::Untracked,
            Some(sub) if sub.is_root() => Membership::Root(sub.mode),
            Some(_) => Membership::Child,
        }
    }

    /// Insert a subscription, returning the one it replaced
    pub fn insert(&mut self, subscription: WatchSubscription) -> Option<WatchSubscription> {
        self.entries
            .insert(subscription.path.clone(), subscription)
    }

    /// Remove a subscription; removing a root also removes its children.
    ///
    /// The removed entries are returned with the requested path first.
    pub fn remove(&mut self, path: &Path) -> Vec<WatchSubscription> {
        let Some(removed) = self.entries.remove(path) else {
            return Vec::new();
        };

        let mut result = Vec::new();
        if removed.is_root() {
            let children: Vec<PathBuf> = self
                .children_of(path)
                .into_iter()
                .map(|child| child.path.clone())
                .collect();
            result.push(removed);
            for child in children {
                if let Some(sub) = self.entries.remove(&child) {
                    result.push(sub);
                }
            }
        } else {
            result.push(removed);
        }
        result
    }

    pub fn children_of(&self, root: &Path) -> Vec<&WatchSubscription> {
        self.entries
            .values()
            .filter(|sub| matches!(&sub.depth, Depth::Child { root: owner } if owner == root))
            .collect()
    }

    /// All watched paths, sorted
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = self.entries.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
