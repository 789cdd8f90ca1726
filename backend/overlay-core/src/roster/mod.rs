//! Ordered, id-unique roster of the current voice channel.
//!
//! [`Roster`] is the plain collection; [`RosterModel`] shares it with
//! observers and announces every structural change as
//! `(position, removed, added)`.

mod model;

pub use model::{ObserverHandle, RosterModel};

use models::{RosterEntry, UserId};

use indexmap::IndexMap;

/// One structural mutation, expressed as a splice at `position`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RosterChange {
    pub position: usize,
    pub removed: usize,
    pub added: usize,
}

impl RosterChange {
    pub fn new(position: usize, removed: usize, added: usize) -> Self {
        Self {
            position,
            removed,
            added,
        }
    }
}

/// Insertion-ordered collection of entries keyed by user id.
///
/// Order only changes through explicit removal; replacements keep their slot.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    entries: IndexMap<UserId, RosterEntry>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry.
    ///
    /// An entry whose id is already present replaces the existing one in
    /// place, keeping ids unique.
    pub fn insert(&mut self, entry: RosterEntry) -> RosterChange {
        if let Some(position) = self.entries.get_index_of(&entry.id) {
            self.entries.insert(entry.id.clone(), entry);
            return RosterChange::new(position, 1, 1);
        }

        let position = self.entries.len();
        self.entries.insert(entry.id.clone(), entry);
        RosterChange::new(position, 0, 1)
    }

    /// Remove by id, shifting later entries up. No-op when absent.
    pub fn remove_by_id(&mut self, id: &UserId) -> Option<RosterChange> {
        self.entries
            .shift_remove_full(id)
            .map(|(position, _, _)| RosterChange::new(position, 1, 0))
    }

    /// Replace by id at the same position. No-op when absent.
    pub fn replace_by_id(&mut self, id: &UserId, entry: RosterEntry) -> Option<RosterChange> {
        let position = self.entries.get_index_of(id)?;

        if entry.id == *id {
            if let Some(slot) = self.entries.get_index_mut(position).map(|(_, slot)| slot) {
                *slot = entry;
            }
            return Some(RosterChange::new(position, 1, 1));
        }

        // Re-keyed replacement: the new id must not collide with another entry.
        if self.entries.contains_key(&entry.id) {
            return None;
        }
        self.entries.shift_remove_index(position);
        let new_id = entry.id.clone();
        self.entries.insert(new_id.clone(), entry);
        let last = self.entries.len() - 1;
        self.entries.move_index(last, position);
        Some(RosterChange::new(position, 1, 1))
    }

    /// Remove everything. Returns `None` when already empty.
    pub fn clear(&mut self) -> Option<RosterChange> {
        let removed = self.entries.len();
        if removed == 0 {
            return None;
        }
        self.entries.clear();
        Some(RosterChange::new(0, removed, 0))
    }

    pub fn get_by_id(&self, id: &UserId) -> Option<&RosterEntry> {
        self.entries.get(id)
    }

    /// Mutable lookup for in-place attribute updates that keep the position.
    pub fn get_by_id_mut(&mut self, id: &UserId) -> Option<(usize, &mut RosterEntry)> {
        self.entries
            .get_full_mut(id)
            .map(|(position, _, entry)| (position, entry))
    }

    pub fn get(&self, position: usize) -> Option<&RosterEntry> {
        self.entries.get_index(position).map(|(_, entry)| entry)
    }

    pub fn position_of(&self, id: &UserId) -> Option<usize> {
        self.entries.get_index_of(id)
    }

    pub fn ids(&self) -> Vec<UserId> {
        self.entries.keys().cloned().collect()
    }

    pub fn entries(&self) -> Vec<RosterEntry> {
        self.entries.values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
