//! Reconciliation planning
//!
//! Given the current subscription table and one classified event, decide
//! how the watch set changes and what gets published. Planning is pure so
//! it can be exercised without a native event source; the registry applies
//! the plan under its write lock.
//!
//! | op              | membership(path) | membership(parent)  | action  |
//! |-----------------|------------------|---------------------|---------|
//! | Create (dir)    | Untracked        | Root(OneLevel)      | Promote |
//! | Remove / Rename | Root             | any                 | Demote (with children) |
//! | Remove / Rename | Child            | any                 | Demote  |
//! | anything else   |                  |                     | none    |

use crate::events::{Notification, OperationKind, RawEvent};
use crate::subscription::{Membership, SubscriptionTable, WatchMode};
use std::path::PathBuf;

/// Change to the watch set
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Action {
    /// Track a new subdirectory of a one-level root
    Promote { path: PathBuf, root: PathBuf },
    /// Stop tracking a path (and its children if it is a root)
    Demote { path: PathBuf },
    None,
}

/// Outcome of reconciling one event
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Plan {
    pub action: Action,
    pub notification: Option<Notification>,
}

pub(crate) fn plan(table: &SubscriptionTable, event: &RawEvent, is_dir: bool) -> Plan {
    Plan {
        action: plan_action(table, event, is_dir),
        notification: resolve_notification(table, event),
    }
}

fn plan_action(table: &SubscriptionTable, event: &RawEvent, is_dir: bool) -> Action {
    let own = table.membership(&event.path);
    let parent = event
        .path
        .parent()
        .map(|p| table.membership(p))
        .unwrap_or(Membership::Untracked);

    match (event.op, own, parent) {
        (OperationKind::Create, Membership::Untracked, Membership::Root(WatchMode::OneLevel))
            if is_dir =>
        {
            Action::Promote {
                path: event.path.clone(),
                // parent() is Some, otherwise membership would be Untracked
                root: event.path.parent().map(PathBuf::from).unwrap_or_default(),
            }
        }
        (
            OperationKind::Remove | OperationKind::Rename,
            Membership::Root(_) | Membership::Child,
            _,
        ) => Action::Demote {
            path: event.path.clone(),
        },
        _ => Action::None,
    }
}

/// Resolve the event key for an event.
///
/// One-level subscriptions are keyed by the directory containing the
/// change; simple roots by the changed path itself, falling back to its
/// parent. Simple roots only hear about structural changes.
fn resolve_notification(table: &SubscriptionTable, event: &RawEvent) -> Option<Notification> {
    let own = table.get(&event.path);
    let parent = event.path.parent().and_then(|p| table.get(p));

    let one_level = parent
        .filter(|sub| sub.mode == WatchMode::OneLevel)
        .or_else(|| own.filter(|sub| sub.is_root() && sub.mode == WatchMode::OneLevel));
    if let Some(context) = one_level {
        return Some(Notification::PathChanged {
            key: context.event_key.clone(),
            path: event.path.clone(),
            op: event.op,
        });
    }

    if !event.op.is_structural() {
        return None;
    }

    own.filter(|sub| sub.is_root() && sub.mode == WatchMode::Simple)
        .or_else(|| parent.filter(|sub| sub.is_root() && sub.mode == WatchMode::Simple))
        .map(|context| Notification::Changed {
            key: context.event_key.clone(),
        })
}
