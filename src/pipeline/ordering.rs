use std::collections::BTreeMap;

/// Restores input order over results that arrive out of order
///
/// Items are released as soon as every earlier position has either been
/// released or skipped, so a gap left by a failed unit never stalls output.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: usize,
    pending: BTreeMap<usize, Option<T>>,
}

impl<T> Default for ReorderBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ReorderBuffer<T> {
    pub fn new() -> Self {
        Self {
            next: 0,
            pending: BTreeMap::new(),
        }
    }

    /// Accept the item at `position` and return everything now releasable
    pub fn push(&mut self, position: usize, item: T) -> Vec<T> {
        self.pending.insert(position, Some(item));
        self.release()
    }

    /// Mark `position` as never arriving
    pub fn skip(&mut self, position: usize) -> Vec<T> {
        self.pending.insert(position, None);
        self.release()
    }

    /// Items held back waiting for an earlier position
    pub fn pending(&self) -> usize {
        self.pending.values().filter(|entry| entry.is_some()).count()
    }

    /// Whatever is still held, in position order, ignoring gaps
    pub fn into_remaining(self) -> Vec<T> {
        self.pending.into_values().flatten().collect()
    }

    fn release(&mut self) -> Vec<T> {
        let mut ready = Vec::new();
        while let Some(entry) = self.pending.remove(&self.next) {
            ready.extend(entry);
            self.next += 1;
        }
        ready
    }
}
