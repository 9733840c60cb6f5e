//! Identity-keyed storage for module entities.
//!
//! Entities (types, functions, globals, ...) are referenced by a typed [`Id`]
//! rather than by their wire index. An [`EntityList`] owns the entities in an
//! append-only arena and keeps a separate `order` vector that defines the
//! index space. Inserting or removing entries only touches `order`, so ids
//! held by instructions, exports and segments stay valid; wire indices are
//! derived from `order` when the module is encoded.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

use super::module::ImportName;

pub struct Id<T> {
    slot: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Id<T> {
    fn new(slot: usize) -> Id<T> {
        Id { slot: slot as u32, _marker: PhantomData }
    }

    /// Arena slot; stable for the lifetime of the owning list.
    pub fn slot(self) -> u32 {
        self.slot
    }
}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.slot == other.slot
    }
}

impl<T> Eq for Id<T> {}

impl<T> PartialOrd for Id<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Id<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.slot.cmp(&other.slot)
    }
}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slot.hash(state);
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot)
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.slot)
    }
}

#[derive(Debug, Clone)]
pub struct EntityList<T> {
    items: Vec<T>,
    order: Vec<Id<T>>,
}

impl<T> Default for EntityList<T> {
    fn default() -> Self {
        EntityList { items: Vec::new(), order: Vec::new() }
    }
}

impl<T> EntityList<T> {
    pub fn new() -> EntityList<T> {
        EntityList::default()
    }

    /// Number of entries in the index space.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Appends at the end of the index space.
    pub fn push(&mut self, item: T) -> Id<T> {
        let id = Id::new(self.items.len());
        self.items.push(item);
        self.order.push(id);
        id
    }

    /// Inserts at `position` in the index space, shifting later entries.
    pub fn insert(&mut self, position: usize, item: T) -> Id<T> {
        let id = Id::new(self.items.len());
        self.items.push(item);
        self.order.insert(position.min(self.order.len()), id);
        id
    }

    /// Removes `id` from the index space. The item stays in the arena so
    /// stale ids never alias a different entity; they simply stop resolving
    /// to a wire index.
    pub fn remove(&mut self, id: Id<T>) -> bool {
        match self.position_of(id) {
            Some(position) => {
                self.order.remove(position);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, id: Id<T>) -> bool {
        self.order.contains(&id)
    }

    pub fn get(&self, id: Id<T>) -> Option<&T> {
        self.items.get(id.slot as usize)
    }

    pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
        self.items.get_mut(id.slot as usize)
    }

    /// Id at a wire index.
    pub fn id_at(&self, index: u32) -> Option<Id<T>> {
        self.order.get(index as usize).copied()
    }

    /// Wire index of `id`. Linear; the encoder uses [`EntityList::positions`].
    pub fn position_of(&self, id: Id<T>) -> Option<usize> {
        self.order.iter().position(|candidate| *candidate == id)
    }

    pub fn ids(&self) -> impl Iterator<Item = Id<T>> + '_ {
        self.order.iter().copied()
    }

    /// Entries in index-space order.
    pub fn iter(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.order.iter().map(move |id| (*id, &self.items[id.slot as usize]))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.order.iter().map(move |id| &self.items[id.slot as usize])
    }

    /// Mutable access to every live entry, in index-space order.
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut T> + '_ {
        let mut live = vec![false; self.items.len()];
        for id in &self.order {
            live[id.slot as usize] = true;
        }
        self.items.iter_mut().zip(live).filter_map(|(item, live)| if live { Some(item) } else { None })
    }

    /// Snapshot of every id's wire index.
    pub fn positions(&self) -> Positions<T> {
        let mut slots = vec![None; self.items.len()];
        for (position, id) in self.order.iter().enumerate() {
            slots[id.slot as usize] = Some(position as u32);
        }
        Positions { slots, _marker: PhantomData }
    }
}

impl<T> Index<Id<T>> for EntityList<T> {
    type Output = T;

    fn index(&self, id: Id<T>) -> &T {
        &self.items[id.slot as usize]
    }
}

impl<T> IndexMut<Id<T>> for EntityList<T> {
    fn index_mut(&mut self, id: Id<T>) -> &mut T {
        &mut self.items[id.slot as usize]
    }
}

/// Entities that may be imported rather than defined.
pub trait Importable {
    fn import(&self) -> Option<&ImportName>;

    fn is_imported(&self) -> bool {
        self.import().is_some()
    }
}

impl<T: Importable> EntityList<T> {
    /// Length of the leading run of imported entries.
    pub fn imported_count(&self) -> usize {
        self.values().take_while(|item| item.is_imported()).count()
    }

    /// True when no imported entry follows a defined one.
    pub fn imports_form_prefix(&self) -> bool {
        let prefix = self.imported_count();
        self.values().skip(prefix).all(|item| !item.is_imported())
    }

    /// Inserts an imported entry at the end of the imported prefix.
    pub fn insert_import(&mut self, item: T) -> Id<T> {
        let position = self.imported_count();
        self.insert(position, item)
    }

    pub fn defined(&self) -> impl Iterator<Item = (Id<T>, &T)> + '_ {
        self.iter().filter(|(_, item)| !item.is_imported())
    }
}

/// Wire indices for one entity kind, computed once per encode.
#[derive(Debug, Clone)]
pub struct Positions<T> {
    slots: Vec<Option<u32>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Positions<T> {
    pub fn get(&self, id: Id<T>) -> Option<u32> {
        self.slots.get(id.slot as usize).copied().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Item {
        name: &'static str,
        import: Option<ImportName>,
    }

    impl Importable for Item {
        fn import(&self) -> Option<&ImportName> {
            self.import.as_ref()
        }
    }

    fn defined(name: &'static str) -> Item {
        Item { name, import: None }
    }

    fn imported(name: &'static str) -> Item {
        Item { name, import: Some(ImportName::new("env", name)) }
    }

    #[test]
    fn test_ids_survive_insertion() {
        let mut list = EntityList::new();
        let a = list.push(defined("a"));
        let b = list.push(defined("b"));
        let i = list.insert_import(imported("i"));

        assert_eq!(list.position_of(i), Some(0));
        assert_eq!(list.position_of(a), Some(1));
        assert_eq!(list[b].name, "b");

        let positions = list.positions();
        assert_eq!(positions.get(b), Some(2));
    }

    #[test]
    fn test_removed_id_stops_resolving() {
        let mut list = EntityList::new();
        let a = list.push(defined("a"));
        let b = list.push(defined("b"));
        assert!(list.remove(a));
        assert!(!list.remove(a));
        assert_eq!(list.len(), 1);
        assert_eq!(list.positions().get(a), None);
        assert_eq!(list.positions().get(b), Some(0));
        assert_eq!(list.values_mut().count(), 1);
    }

    #[test]
    fn test_import_prefix() {
        let mut list = EntityList::new();
        list.push(imported("x"));
        list.push(defined("a"));
        assert!(list.imports_form_prefix());
        assert_eq!(list.imported_count(), 1);

        list.push(imported("late"));
        assert!(!list.imports_form_prefix());

        let names: Vec<_> = list.defined().map(|(_, item)| item.name).collect();
        assert_eq!(names, vec!["a"]);
    }
}
