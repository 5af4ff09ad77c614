//! Ordered, id-keyed storage for registered bodies
//!
//! Iteration order is insertion order, which keeps collision tie-breaking
//! deterministic.

use super::body::BodyId;
use super::error::SimError;

/// Parallel id/item storage
#[derive(Debug)]
pub struct Registry<T> {
    ids: Vec<BodyId>,
    items: Vec<T>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            ids: Vec::new(),
            items: Vec::new(),
        }
    }
}

impl<T> Registry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `item` under `id`. Duplicates are rejected.
    pub fn insert(&mut self, id: BodyId, item: T) -> Result<(), SimError> {
        if self.contains(id) {
            return Err(SimError::DuplicateBody(id));
        }
        self.ids.push(id);
        self.items.push(item);
        Ok(())
    }

    /// Unregister and hand back the item
    pub fn remove(&mut self, id: BodyId) -> Option<T> {
        let index = self.index_of(id)?;
        self.ids.remove(index);
        Some(self.items.remove(index))
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.items.clear();
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.ids.contains(&id)
    }

    pub fn index_of(&self, id: BodyId) -> Option<usize> {
        self.ids.iter().position(|&existing| existing == id)
    }

    pub fn get(&self, id: BodyId) -> Option<&T> {
        self.index_of(id).map(|i| &self.items[i])
    }

    pub fn get_mut(&mut self, id: BodyId) -> Option<&mut T> {
        self.index_of(id).map(move |i| &mut self.items[i])
    }

    pub fn ids(&self) -> &[BodyId] {
        &self.ids
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn items_mut(&mut self) -> &mut [T] {
        &mut self.items
    }

    /// Ids alongside mutable items, for passes that need both
    pub fn split_mut(&mut self) -> (&[BodyId], &mut [T]) {
        (&self.ids, &mut self.items)
    }

    pub fn iter(&self) -> impl Iterator<Item = (BodyId, &T)> {
        self.ids.iter().copied().zip(self.items.iter())
    }
}
