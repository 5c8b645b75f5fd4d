//! Event types flowing through the watch registry
//!
//! Raw `notify` events are classified into [`RawEvent`]s with one of four
//! structural operations. The dispatch loop turns those into
//! [`Notification`]s for the sink.

use notify::event::{ModifyKind, RenameMode};
use notify::{Event as NotifyEvent, EventKind};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Reserved event key for faults reported by the native watcher
pub const WATCHER_ERROR_KEY: &str = "watcher-error";

/// Structural filesystem operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Create,
    Remove,
    Rename,
    Write,
}

impl OperationKind {
    /// Create, remove and rename change a directory listing; writes don't
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::Write)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Remove => "REMOVE",
            Self::Rename => "RENAME",
            Self::Write => "WRITE",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single classified filesystem change
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawEvent {
    pub path: PathBuf,
    pub op: OperationKind,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, op: OperationKind) -> Self {
        Self {
            path: path.into(),
            op,
        }
    }
}

/// Classify a native event into zero or more raw events
///
/// Renames are split into their halves: the old name is reported as
/// `Rename` and the new name as `Create`. Paired `Both` events are skipped
/// because backends that emit them have already emitted `From` and `To`.
pub(crate) fn classify(event: &NotifyEvent) -> Vec<RawEvent> {
    let op_for = |path: &Path| -> Option<OperationKind> {
        match event.kind {
            EventKind::Create(_) => Some(OperationKind::Create),
            EventKind::Remove(_) => Some(OperationKind::Remove),
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Some(OperationKind::Rename),
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Some(OperationKind::Create),
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => None,
            EventKind::Modify(ModifyKind::Name(_)) => {
                if path.exists() {
                    Some(OperationKind::Create)
                } else {
                    Some(OperationKind::Rename)
                }
            }
            EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any) => {
                Some(OperationKind::Write)
            }
            _ => None,
        }
    };

    event
        .paths
        .iter()
        .filter_map(|path| op_for(path).map(|op| RawEvent::new(path.clone(), op)))
        .collect()
}

/// Notification delivered to the external sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// Minimal payload for roots registered with `watch`
    Changed { key: String },
    /// Full payload for roots registered with `watch_one_level`
    PathChanged {
        key: String,
        path: PathBuf,
        op: OperationKind,
    },
    /// Fault reported by the native watcher, published under [`WATCHER_ERROR_KEY`]
    WatcherError { message: String },
}

impl Notification {
    /// Event key the notification is published under
    pub fn key(&self) -> &str {
        match self {
            Self::Changed { key } | Self::PathChanged { key, .. } => key,
            Self::WatcherError { .. } => WATCHER_ERROR_KEY,
        }
    }

    /// Changed path, if the payload carries one
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::PathChanged { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Operation, if the payload carries one
    pub fn op(&self) -> Option<OperationKind> {
        match self {
            Self::PathChanged { op, .. } => Some(*op),
            _ => None,
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Changed { key } => write!(f, "{key}"),
            Self::PathChanged { key, path, op } => {
                write!(f, "{key}: {op} {}", path.display())
            }
            Self::WatcherError { message } => write!(f, "{WATCHER_ERROR_KEY}: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};
    use pretty_assertions::assert_eq;

    fn event(kind: EventKind, paths: &[&str]) -> NotifyEvent {
        let mut event = NotifyEvent::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_classify_create_and_remove() {
        let created = classify(&event(
            EventKind::Create(CreateKind::Folder),
            &["/mods/CharacterA"],
        ));
        assert_eq!(
            created,
            vec![RawEvent::new("/mods/CharacterA", OperationKind::Create)]
        );

        let removed = classify(&event(
            EventKind::Remove(RemoveKind::Any),
            &["/mods/CharacterA"],
        ));
        assert_eq!(
            removed,
            vec![RawEvent::new("/mods/CharacterA", OperationKind::Remove)]
        );
    }

    #[test]
    fn test_classify_rename_halves() {
        let from = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::From)),
            &["/mods/ModA"],
        ));
        assert_eq!(from, vec![RawEvent::new("/mods/ModA", OperationKind::Rename)]);

        let to = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::To)),
            &["/mods/DISABLED ModA"],
        ));
        assert_eq!(
            to,
            vec![RawEvent::new("/mods/DISABLED ModA", OperationKind::Create)]
        );
    }

    #[test]
    fn test_classify_skips_paired_rename() {
        let both = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)),
            &["/mods/ModA", "/mods/DISABLED ModA"],
        ));
        assert!(both.is_empty());
    }

    #[test]
    fn test_classify_ambiguous_rename_checks_existence() {
        let dir = tempfile::tempdir().expect("test setup failed");
        let existing = dir.path().to_string_lossy().to_string();
        let missing = dir.path().join("gone").to_string_lossy().to_string();

        let events = classify(&event(
            EventKind::Modify(ModifyKind::Name(RenameMode::Any)),
            &[&existing, &missing],
        ));
        assert_eq!(events[0].op, OperationKind::Create);
        assert_eq!(events[1].op, OperationKind::Rename);
    }

    #[test]
    fn test_classify_writes_and_noise() {
        let write = classify(&event(
            EventKind::Modify(ModifyKind::Data(DataChange::Content)),
            &["/mods/ModA/merged.ini"],
        ));
        assert_eq!(write[0].op, OperationKind::Write);

        let metadata = classify(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::Permissions)),
            &["/mods/ModA"],
        ));
        assert!(metadata.is_empty());

        let access = classify(&event(
            EventKind::Access(notify::event::AccessKind::Any),
            &["/mods/ModA"],
        ));
        assert!(access.is_empty());
    }

    #[test]
    fn test_notification_keys() {
        let simple = Notification::Changed {
            key: "mods-changed".to_string(),
        };
        assert_eq!(simple.key(), "mods-changed");
        assert_eq!(simple.path(), None);

        let detailed = Notification::PathChanged {
            key: "mods-changed".to_string(),
            path: PathBuf::from("/mods/CharacterA"),
            op: OperationKind::Create,
        };
        assert_eq!(detailed.op(), Some(OperationKind::Create));
        assert_eq!(detailed.to_string(), "mods-changed: CREATE /mods/CharacterA");

        let error = Notification::WatcherError {
            message: "queue overflow".to_string(),
        };
        assert_eq!(error.key(), WATCHER_ERROR_KEY);
    }

    #[test]
    fn test_operation_is_structural() {
        assert!(OperationKind::Create.is_structural());
        assert!(OperationKind::Rename.is_structural());
        assert!(!OperationKind::Write.is_structural());
    }
}
