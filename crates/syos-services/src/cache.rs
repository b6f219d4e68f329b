//! # Product Cache
//!
//! In-memory copy of the product table, keyed by product code.
//!
//! ## Ownership
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ProductCache (DashMap<String, Product>)                               │
//! │        │                                                                │
//! │        ├── get(code)  ──► Product (clone, owned by the caller)          │
//! │        ├── values()   ──► Vec<Product> (clones)                         │
//! │        │                                                                │
//! │        └── put / remove / load ◄── InventoryService, write lock held    │
//! │                                                                         │
//! │   Nothing outside the cache ever holds a reference into the map.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cache does not go to the store on a miss. The inventory coordinator
//! decides that, and serialises every mutation with its own lock; the map
//! itself only has to be safe to share.

use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

use syos_core::Product;

/// Counters describing how the cache has been used.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries added by read-miss fills.
    pub fills: u64,
    /// Full reloads from the store.
    pub reloads: u64,
}

/// Product code → product.
#[derive(Debug, Default)]
pub struct ProductCache {
    entries: DashMap<String, Product>,
    hits: AtomicU64,
    misses: AtomicU64,
    fills: AtomicU64,
    reloads: AtomicU64,
}

impl ProductCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole contents with `products`.
    pub fn load(&self, products: Vec<Product>) {
        self.entries.clear();
        for product in products {
            self.entries.insert(product.code.clone(), product);
        }
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns a copy of the cached product, if any.
    pub fn get(&self, code: &str) -> Option<Product> {
        match self.entries.get(code) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value().clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Version of the cached entry, without counting a hit or miss.
    pub fn cached_version(&self, code: &str) -> Option<i64> {
        self.entries.get(code).map(|entry| entry.version)
    }

    pub fn contains(&self, code: &str) -> bool {
        self.entries.contains_key(code)
    }

    /// Stores a confirmed write.
    pub fn put(&self, product: Product) {
        self.entries.insert(product.code.clone(), product);
    }

    /// Inserts `product` unless an entry already exists, returning whatever
    /// the cache holds afterwards.
    ///
    /// Two readers that missed on the same code both load it from the store;
    /// only the first fill lands.
    pub fn fill_if_absent(&self, product: Product) -> Product {
        let entry = self.entries.entry(product.code.clone()).or_insert_with(|| {
            self.fills.fetch_add(1, Ordering::Relaxed);
            product
        });
        entry.value().clone()
    }

    pub fn remove(&self, code: &str) -> Option<Product> {
        self.entries.remove(code).map(|(_, product)| product)
    }

    /// Copies of every entry, ordered by code.
    pub fn values(&self) -> Vec<Product> {
        let mut products: Vec<Product> = self.entries.iter().map(|e| e.value().clone()).collect();
        products.sort_by(|a, b| a.code.cmp(&b.code));
        products
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            fills: self.fills.load(Ordering::Relaxed),
            reloads: self.reloads.load(Ordering::Relaxed),
        }
    }
}
