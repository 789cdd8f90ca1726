use crate::roster::{Roster, RosterChange};

use models::{RosterEntry, UserId};

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak};

use log::trace;

type ChangeCallback = Arc<dyn Fn(RosterChange) + Send + Sync>;
type EntryCallback = Arc<dyn Fn(usize, &RosterEntry) + Send + Sync>;

#[derive(Default)]
struct Observers {
    next_id: AtomicU64,
    changes: RwLock<BTreeMap<u64, ChangeCallback>>,
    entries: RwLock<BTreeMap<u64, EntryCallback>>,
}

struct Inner {
    roster: RwLock<Roster>,
    observers: Observers,
}

/// Shared, observable roster.
///
/// Reads take a shared lock; mutations are crate-private and run from the
/// single event-processing task. Observers are called after the lock is
/// released, in registration order, once per structural change.
#[derive(Clone)]
pub struct RosterModel {
    inner: Arc<Inner>,
}

impl Default for RosterModel {
    fn default() -> Self {
        Self::new()
    }
}

impl RosterModel {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                roster: RwLock::new(Roster::new()),
                observers: Observers::default(),
            }),
        }
    }

    /// Register a callback for structural changes (insert, remove, replace, clear).
    pub fn subscribe<F>(&self, callback: F) -> ObserverHandle
    where
        F: Fn(RosterChange) + Send + Sync + 'static,
    {
        let id = self.inner.observers.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.inner.observers.changes).insert(id, Arc::new(callback));
        ObserverHandle {
            id,
            kind: ObserverKind::Changes,
            model: Arc::downgrade(&self.inner),
        }
    }

    /// Register a callback for in-place attribute updates (speaking flag)
    /// that leave positions untouched.
    pub fn subscribe_entries<F>(&self, callback: F) -> ObserverHandle
    where
        F: Fn(usize, &RosterEntry) + Send + Sync + 'static,
    {
        let id = self.inner.observers.next_id.fetch_add(1, Ordering::Relaxed);
        write(&self.inner.observers.entries).insert(id, Arc::new(callback));
        ObserverHandle {
            id,
            kind: ObserverKind::Entries,
            model: Arc::downgrade(&self.inner),
        }
    }

    pub fn ids(&self) -> Vec<UserId> {
        self.roster().ids()
    }

    pub fn entries(&self) -> Vec<RosterEntry> {
        self.roster().entries()
    }

    pub fn get_by_id(&self, id: &UserId) -> Option<RosterEntry> {
        self.roster().get_by_id(id).cloned()
    }

    pub fn get(&self, position: usize) -> Option<RosterEntry> {
        self.roster().get(position).cloned()
    }

    pub fn len(&self) -> usize {
        self.roster().len()
    }

    pub fn is_empty(&self) -> bool {
        self.roster().is_empty()
    }

    pub(crate) fn insert(&self, entry: RosterEntry) -> RosterChange {
        let change = write(&self.inner.roster).insert(entry);
        self.notify(change);
        change
    }

    pub(crate) fn remove_by_id(&self, id: &UserId) -> Option<RosterChange> {
        let change = write(&self.inner.roster).remove_by_id(id);
        if let Some(change) = change {
            self.notify(change);
        }
        change
    }

    pub(crate) fn replace_by_id(&self, id: &UserId, entry: RosterEntry) -> Option<RosterChange> {
        let change = write(&self.inner.roster).replace_by_id(id, entry);
        if let Some(change) = change {
            self.notify(change);
        }
        change
    }

    pub(crate) fn clear(&self) -> Option<RosterChange> {
        let change = write(&self.inner.roster).clear();
        if let Some(change) = change {
            self.notify(change);
        }
        change
    }

    /// Update one entry's speaking flag. Returns `false` for unknown ids.
    ///
    /// Entry observers only fire when the flag actually flips.
    pub(crate) fn set_speaking(&self, id: &UserId, speaking: bool) -> bool {
        let updated = {
            let mut roster = write(&self.inner.roster);
            match roster.get_by_id_mut(id) {
                Some((position, entry)) if entry.speaking != speaking => {
                    entry.speaking = speaking;
                    Some((position, entry.clone()))
                }
                Some(_) => return true,
                None => return false,
            }
        };

        if let Some((position, entry)) = updated {
            let callbacks: Vec<EntryCallback> =
                read(&self.inner.observers.entries).values().cloned().collect();
            for callback in callbacks {
                callback(position, &entry);
            }
        }
        true
    }

    fn roster(&self) -> RwLockReadGuard<'_, Roster> {
        read(&self.inner.roster)
    }

    fn notify(&self, change: RosterChange) {
        trace!(
            "Roster change at {}: -{} +{}",
            change.position, change.removed, change.added
        );
        let callbacks: Vec<ChangeCallback> =
            read(&self.inner.observers.changes).values().cloned().collect();
        for callback in callbacks {
            callback(change);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ObserverKind {
    Changes,
    Entries,
}

/// Registration returned by [`RosterModel::subscribe`].
///
/// The callback stays registered until [`ObserverHandle::unsubscribe`] is called.
#[derive(Debug)]
pub struct ObserverHandle {
    id: u64,
    kind: ObserverKind,
    model: Weak<Inner>,
}

impl ObserverHandle {
    pub fn unsubscribe(self) {
        let Some(inner) = self.model.upgrade() else {
            return;
        };
        match self.kind {
            ObserverKind::Changes => {
                write(&inner.observers.changes).remove(&self.id);
            }
            ObserverKind::Entries => {
                write(&inner.observers.entries).remove(&self.id);
            }
        }
    }
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
