// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Thread-safe indexed store.
//!
//! Each watched kind is held in an [`IndexedStore`]: a map keyed by
//! `namespace/name` plus named secondary indexes mapping a string key to the set
//! of object keys that currently advertise it. Index entries are rebuilt for an
//! object on every add, update and delete under a single write lock, so a reader
//! sees either the old or the new object and never a stale index entry.
//!
//! Iteration order is the key order of the underlying maps, which keeps answers
//! stable for a given snapshot.

use crate::errors::StoreError;
use crate::object::{ClusterObject, Object};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Function computing the index keys an object advertises for one index.
pub type IndexFunc<T> = fn(&T) -> Vec<String>;

/// A concurrent store with named secondary indexes.
pub struct IndexedStore<T: ClusterObject> {
    inner: RwLock<StoreInner<T>>,
    indexers: BTreeMap<&'static str, IndexFunc<T>>,
}

struct StoreInner<T> {
    items: BTreeMap<String, Arc<T>>,
    /// index name -> index key -> object keys
    indices: BTreeMap<&'static str, BTreeMap<String, BTreeSet<String>>>,
}

impl<T: ClusterObject> IndexedStore<T> {
    /// Create an empty store without indexes.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(StoreInner {
                items: BTreeMap::new(),
                indices: BTreeMap::new(),
            }),
            indexers: BTreeMap::new(),
        }
    }

    /// Register a named index. Must be called before any object is added.
    #[must_use]
    pub fn with_index(mut self, name: &'static str, func: IndexFunc<T>) -> Self {
        self.indexers.insert(name, func);
        self.inner.get_mut().indices.insert(name, BTreeMap::new());
        self
    }

    /// Insert an object, replacing any object with the same key.
    ///
    /// Returns the replaced object, if any.
    pub fn add(&self, obj: T) -> Option<Arc<T>> {
        let key = obj.key();
        let obj = Arc::new(obj);
        let mut inner = self.inner.write();
        let old = inner.items.insert(key.clone(), obj.clone());
        if let Some(old) = old.as_ref() {
            self.unindex(&mut inner, &key, old);
        }
        self.index(&mut inner, &key, &obj);
        old
    }

    /// Replace an object. Identical to [`IndexedStore::add`].
    pub fn update(&self, obj: T) -> Option<Arc<T>> {
        self.add(obj)
    }

    /// Remove the object with the same key as `obj`.
    ///
    /// Returns the removed object, if any.
    pub fn delete(&self, obj: &T) -> Option<Arc<T>> {
        self.delete_by_key(&obj.key())
    }

    /// Remove the object stored under `key`.
    pub fn delete_by_key(&self, key: &str) -> Option<Arc<T>> {
        let mut inner = self.inner.write();
        let old = inner.items.remove(key);
        if let Some(old) = old.as_ref() {
            self.unindex(&mut inner, key, old);
        }
        old
    }

    /// Apply a tagged object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WrongType`] if the object is of another kind; the
    /// store is left untouched.
    pub fn add_object(&self, obj: Object) -> Result<Option<Arc<T>>, StoreError> {
        Ok(self.add(T::from_object(obj)?))
    }

    /// Remove a tagged object.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::WrongType`] if the object is of another kind.
    pub fn delete_object(&self, obj: Object) -> Result<Option<Arc<T>>, StoreError> {
        let obj = T::from_object(obj)?;
        Ok(self.delete(&obj))
    }

    /// Snapshot of every stored object in key order.
    #[must_use]
    pub fn list(&self) -> Vec<Arc<T>> {
        self.inner.read().items.values().cloned().collect()
    }

    /// Snapshot of every stored key.
    #[must_use]
    pub fn list_keys(&self) -> Vec<String> {
        self.inner.read().items.keys().cloned().collect()
    }

    /// Look up an object by its store key.
    #[must_use]
    pub fn get_by_key(&self, key: &str) -> Option<Arc<T>> {
        self.inner.read().items.get(key).cloned()
    }

    /// Objects advertising `key` in the named index. Unknown indexes yield nothing.
    #[must_use]
    pub fn by_index(&self, index_name: &str, key: &str) -> Vec<Arc<T>> {
        let inner = self.inner.read();
        let Some(keys) = inner.indices.get(index_name).and_then(|i| i.get(key)) else {
            return Vec::new();
        };
        keys.iter()
            .filter_map(|k| inner.items.get(k).cloned())
            .collect()
    }

    /// Number of stored objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().items.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().items.is_empty()
    }

    fn index(&self, inner: &mut StoreInner<T>, key: &str, obj: &T) {
        for (name, func) in &self.indexers {
            let index = inner.indices.entry(name).or_default();
            for value in func(obj) {
                index.entry(value).or_default().insert(key.to_string());
            }
        }
    }

    fn unindex(&self, inner: &mut StoreInner<T>, key: &str, obj: &T) {
        for (name, func) in &self.indexers {
            let Some(index) = inner.indices.get_mut(name) else {
                continue;
            };
            for value in func(obj) {
                if let Some(keys) = index.get_mut(&value) {
                    keys.remove(key);
                    if keys.is_empty() {
                        index.remove(&value);
                    }
                }
            }
        }
    }
}

impl<T: ClusterObject> Default for IndexedStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;
