use crate::domain::{Comment, CommentId, Problem, ProblemId, Solution, SolutionId};
use std::fmt::Debug;

/// Anything held in an id-keyed [`Collection`].
pub trait Entity: Clone {
    type Id: Clone + Eq + Debug;

    fn id(&self) -> &Self::Id;
}

impl Entity for Problem {
    type Id = ProblemId;

    fn id(&self) -> &ProblemId {
        &self.id
    }
}

impl Entity for Solution {
    type Id = SolutionId;

    fn id(&self) -> &SolutionId {
        &self.id
    }
}

impl Entity for Comment {
    type Id = CommentId;

    fn id(&self) -> &CommentId {
        &self.id
    }
}

/// Most-recent-first list in which every id appears at most once.
///
/// All edits are keyed by identity, never by position.
#[derive(Debug, Clone)]
pub struct Collection<T> {
    items: Vec<T>,
}

impl<T> Default for Collection<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T: Entity> Collection<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first occurrence of any repeated id.
    pub fn from_items(items: impl IntoIterator<Item = T>) -> Self {
        let mut collection = Self::new();
        for item in items {
            if !collection.contains(item.id()) {
                collection.items.push(item);
            }
        }
        collection
    }

    /// Inserts at the head, displacing any entry that already carries the id.
    pub fn prepend(&mut self, item: T) {
        self.items.retain(|existing| existing.id() != item.id());
        self.items.insert(0, item);
    }

    pub fn replace_by_id(&mut self, item: T) -> bool {
        match self.items.iter_mut().find(|existing| existing.id() == item.id()) {
            Some(slot) => {
                *slot = item;
                true
            }
            None => false,
        }
    }

    pub fn remove_by_id(&mut self, id: &T::Id) -> Option<T> {
        let index = self.items.iter().position(|item| item.id() == id)?;
        Some(self.items.remove(index))
    }

    pub fn get(&self, id: &T::Id) -> Option<&T> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn contains(&self, id: &T::Id) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.items.iter()
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.items.clone()
    }
}
