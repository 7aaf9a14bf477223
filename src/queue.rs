//! Triage queue - the bounded batch of cards the user swipes through

use crate::catalog::Item;
use std::collections::VecDeque;

/// Ordered window over the filtered candidate list. Head is the visible top
/// card. Invariant: nothing in the queue is in the processed set; the
/// decision engine removes from the head exactly when it marks processed,
/// and undo unmarks exactly when it reinserts at the head.
#[derive(Debug, Default)]
pub struct TriageQueue {
    items: VecDeque<Item>,
}

impl TriageQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Materialize a batch from the front of the filtered candidate list.
    /// `batch_size` is a soft cap from user preferences.
    pub fn load_batch(candidates: &[Item], batch_size: usize) -> Self {
        Self {
            items: candidates.iter().take(batch_size).cloned().collect(),
        }
    }

    pub fn head(&self) -> Option<&Item> {
        self.items.front()
    }

    /// Drop and return the head card
    pub fn advance(&mut self) -> Option<Item> {
        self.items.pop_front()
    }

    /// Splice an undone item back in as the new head
    pub fn reinsert_at_head(&mut self, item: Item) {
        self.items.push_front(item);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn contains(&self, id: i64) -> bool {
        self.items.iter().any(|i| i.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.iter()
    }

    /// Copy-on-write replacement of an item still sitting in the queue
    pub fn replace(&mut self, item: Item) {
        if let Some(slot) = self.items.iter_mut().find(|i| i.id == item.id) {
            *slot = item;
        }
    }
}
