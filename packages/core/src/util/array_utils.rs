//! Array helpers
//!
//! A sorted key/value store over a flat vector. Keys stay in ascending order so lookups are a
//! binary search, and setting an existing key replaces the value in place.

/// Inserts `value` at `index` (clamped to the length), shifting later items to the right.
fn array_insert<T>(array: &mut Vec<T>, index: usize, value: T) {
    let index = index.min(array.len());
    array.insert(index, value);
}

/// Removes `count` items starting at `index` and returns them.
fn array_remove<T>(array: &mut Vec<T>, index: usize, count: usize) -> Vec<T> {
    if index >= array.len() {
        return Vec::new();
    }
    let end = (index + count).min(array.len());
    array.drain(index..end).collect()
}

/// Sorted key/value array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValueArray<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for KeyValueArray<V> {
    fn default() -> Self {
        KeyValueArray {
            entries: Vec::new(),
        }
    }
}

impl<V> KeyValueArray<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Position of `key`, or the insertion point when absent.
    pub fn index_of(&self, key: &str) -> Result<usize, usize> {
        self.entries
            .binary_search_by(|(existing, _)| existing.as_str().cmp(key))
    }

    /// Sets `key` to `value`, returning the position of the entry.
    pub fn set(&mut self, key: impl Into<String>, value: V) -> usize {
        let key = key.into();
        match self.index_of(&key) {
            Ok(index) => {
                self.entries[index].1 = value;
                index
            }
            Err(index) => {
                array_insert(&mut self.entries, index, (key, value));
                index
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&V> {
        self.index_of(key).ok().map(|index| &self.entries[index].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.index_of(key).is_ok()
    }

    /// Removes `key`, returning its former position.
    pub fn delete(&mut self, key: &str) -> Option<usize> {
        let index = self.index_of(key).ok()?;
        array_remove(&mut self.entries, index, 1);
        Some(index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }
}
