//! Newest-first list of generated artifacts.

use serde::{Deserialize, Serialize};

/// Ordered collection of results, most recent first.
///
/// New batches are prepended as a block: their internal order is kept
/// and everything already in the gallery shifts back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gallery<T> {
    items: Vec<T>,
}

impl<T> Default for Gallery<T> {
    fn default() -> Self {
        Self { items: Vec::new() }
    }
}

impl<T> Gallery<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Put a batch in front of the existing entries.
    pub fn prepend_batch(&mut self, batch: impl IntoIterator<Item = T>) {
        let mut merged: Vec<T> = batch.into_iter().collect();
        merged.append(&mut self.items);
        self.items = merged;
    }

    /// Put a single item in front of the existing entries.
    pub fn prepend(&mut self, item: T) {
        self.items.insert(0, item);
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn latest(&self) -> Option<&T> {
        self.items.first()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn into_vec(self) -> Vec<T> {
        self.items
    }
}

impl<T> From<Vec<T>> for Gallery<T> {
    fn from(items: Vec<T>) -> Self {
        Self { items }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batch_goes_in_front_in_order() {
        let mut gallery = Gallery::from(vec!["old-1", "old-2"]);
        gallery.prepend_batch(vec!["new-1", "new-2", "new-3"]);
        assert_eq!(
            gallery.items(),
            &["new-1", "new-2", "new-3", "old-1", "old-2"]
        );
    }

    #[test]
    fn successive_batches_stack_newest_first() {
        let mut gallery = Gallery::new();
        gallery.prepend_batch(vec![1, 2]);
        gallery.prepend_batch(vec![3]);
        assert_eq!(gallery.into_vec(), vec![3, 1, 2]);
    }

    #[test]
    fn empty_batch_is_a_noop() {
        let mut gallery = Gallery::from(vec!["a"]);
        gallery.prepend_batch(Vec::new());
        assert_eq!(gallery.items(), &["a"]);
    }

    #[test]
    fn single_prepend_becomes_latest() {
        let mut gallery = Gallery::from(vec!["a"]);
        gallery.prepend("b");
        assert_eq!(gallery.latest(), Some(&"b"));
        assert_eq!(gallery.len(), 2);
        assert!(!gallery.is_empty());
    }

    #[test]
    fn serializes_as_plain_list() {
        let gallery = Gallery::from(vec!["x".to_string()]);
        assert_eq!(serde_json::to_string(&gallery).unwrap(), r#"["x"]"#);
    }
}
