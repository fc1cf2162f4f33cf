//! Name-keyed collection merges.
//!
//! Every collection in the game state is a set keyed by lowercased name.
//! These helpers keep that invariant while applying model updates.

use std::collections::{HashMap, HashSet};

use crate::model::game_state::{
    CharacterStat, Companion, DiscoveredEntity, Faction, GameItem, Npc, Quest, Skill,
    StatusEffect,
};

pub trait Named {
    fn name(&self) -> &str;
}

macro_rules! impl_named {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Named for $ty {
                fn name(&self) -> &str {
                    &self.name
                }
            }
        )*
    };
}

impl_named!(
    CharacterStat,
    GameItem,
    StatusEffect,
    Skill,
    Quest,
    Companion,
    Npc,
    Faction,
    DiscoveredEntity,
);

/// Case-insensitive identity of a name. Surrounding whitespace is ignored.
pub fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Replaced,
}

/// Inserts `item`, or fully replaces the entry that shares its name.
pub fn upsert_by_name<T: Named>(list: &mut Vec<T>, item: T) -> Upsert {
    let key = name_key(item.name());
    match list.iter().position(|e| name_key(e.name()) == key) {
        Some(index) => {
            list[index] = item;
            Upsert::Replaced
        }
        None => {
            list.push(item);
            Upsert::Inserted
        }
    }
}

/// Runs `patch` on the entry named `name`, leaving its other fields alone.
/// Returns false when there is no such entry.
pub fn patch_by_name<T: Named>(list: &mut [T], name: &str, patch: impl FnOnce(&mut T)) -> bool {
    let key = name_key(name);
    match list.iter_mut().find(|e| name_key(e.name()) == key) {
        Some(entry) => {
            patch(entry);
            true
        }
        None => false,
    }
}

/// Removes every entry named `name`. Returns whether anything was removed.
pub fn remove_by_name<T: Named>(list: &mut Vec<T>, name: &str) -> bool {
    let key = name_key(name);
    let before = list.len();
    list.retain(|e| name_key(e.name()) != key);
    list.len() != before
}

/// Applies signed quantity deltas to an inventory.
///
/// Existing entries are adjusted in place (a positive delta with a description
/// also refreshes the description); unknown names are added only for positive
/// deltas. Entries ending at zero or below are dropped once all deltas are in.
pub fn merge_inventory(current: &[GameItem], deltas: &[GameItem]) -> Vec<GameItem> {
    if deltas.is_empty() {
        return current.to_vec();
    }

    let mut items: Vec<GameItem> = Vec::with_capacity(current.len() + deltas.len());
    let mut index: HashMap<String, usize> = HashMap::new();

    for item in current {
        let key = name_key(&item.name);
        match index.get(&key) {
            Some(&i) => items[i] = item.clone(),
            None => {
                index.insert(key, items.len());
                items.push(item.clone());
            }
        }
    }

    for delta in deltas {
        if delta.name.trim().is_empty() {
            continue;
        }
        let key = name_key(&delta.name);

        match index.get(&key) {
            Some(&i) => {
                let existing = &mut items[i];
                existing.quantity = existing.quantity.saturating_add(delta.quantity);
                if delta.quantity > 0 && !delta.description.is_empty() {
                    existing.description = delta.description.clone();
                }
            }
            None if delta.quantity > 0 => {
                index.insert(key, items.len());
                items.push(delta.clone());
            }
            None => {}
        }
    }

    items.retain(|item| item.quantity > 0);
    items
}

/// Merges an externally sourced list into an existing one.
/// On a name collision the incoming entry wins; entries without a name are dropped.
pub fn merge_incoming_first<T: Named + Clone>(existing: &[T], incoming: &[T]) -> Vec<T> {
    let mut seen = HashSet::new();
    incoming
        .iter()
        .chain(existing.iter())
        .filter(|item| !item.name().trim().is_empty())
        .filter(|item| seen.insert(name_key(item.name())))
        .cloned()
        .collect()
}
