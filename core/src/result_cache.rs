//! Memoization of aggregate results.
//!
//! Keys always carry the configuration fingerprint, so a stale entry is
//! simply never looked up again. Explicit invalidation exists to free
//! memory when a template's configuration is known to have moved on.

use crate::{fingerprint::Fingerprint, types::TemplateId};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultKind {
    CategoryRanking,
    CombinedRanking,
    Distribution,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResultKind,
    pub template_id: TemplateId,
    /// Ids narrowing the computation (event, position, aspect, ...).
    pub scope: Vec<i64>,
    /// Category code or other textual discriminator; empty when unused.
    pub subject: String,
    pub fingerprint: Fingerprint,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

pub trait ResultCache<V> {
    fn get(&mut self, key: &CacheKey) -> Option<V>;

    fn put(&mut self, key: CacheKey, value: V);

    fn invalidate_template(&mut self, template_id: TemplateId);

    fn clear(&mut self);

    fn stats(&self) -> CacheStats;
}

#[derive(Debug)]
pub struct InMemoryResultCache<V> {
    entries: HashMap<CacheKey, V>,
    hits: u64,
    misses: u64,
}

impl<V> Default for InMemoryResultCache<V> {
    fn default() -> Self {
        Self {
            entries: HashMap::new(),
            hits: 0,
            misses: 0,
        }
    }
}

impl<V> InMemoryResultCache<V> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<V: Clone> ResultCache<V> for InMemoryResultCache<V> {
    fn get(&mut self, key: &CacheKey) -> Option<V> {
        match self.entries.get(key) {
            Some(value) => {
                self.hits += 1;
                Some(value.clone())
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    fn put(&mut self, key: CacheKey, value: V) {
        // Older fingerprints for the same computation can never be hit again.
        self.entries.retain(|k, _| {
            !(k.kind == key.kind
                && k.template_id == key.template_id
                && k.scope == key.scope
                && k.subject == key.subject)
        });
        self.entries.insert(key, value);
    }

    fn invalidate_template(&mut self, template_id: TemplateId) {
        self.entries.retain(|k, _| k.template_id != template_id);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            entries: self.entries.len(),
        }
    }
}
