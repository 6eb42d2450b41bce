//! Bounded FIFO cache of audio results.
//!
//! Eviction is by insertion order, not by use: reading an entry does not
//! keep it alive.

use std::collections::{HashMap, VecDeque};

use crate::domain::{AudioResult, Gender, Style};

pub const DEFAULT_CACHE_SIZE: usize = 50;

/// 32-bit rolling hash (`hash * 31 + code`) over UTF-16 code units
pub fn text_hash(text: &str) -> i32 {
    text.encode_utf16()
        .fold(0i32, |hash, code| hash.wrapping_mul(31).wrapping_add(code as i32))
}

/// Cache key for a synthesis request
pub fn cache_key(style: Style, gender: Gender, text: &str) -> String {
    format!("{}_{}_{}", style, gender, text_hash(text))
}

#[derive(Debug)]
pub struct AudioCache {
    entries: HashMap<String, AudioResult>,
    order: VecDeque<String>,
    capacity: usize,
}

impl Default for AudioCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_SIZE)
    }
}

impl AudioCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    pub fn get(&self, key: &str) -> Option<&AudioResult> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Insert, evicting the oldest-inserted entries beyond capacity.
    ///
    /// Re-inserting an existing key replaces the value but keeps its
    /// original position in the eviction order.
    pub fn insert(&mut self, key: String, value: AudioResult) {
        if self.capacity == 0 {
            return;
        }

        if let Some(existing) = self.entries.get_mut(&key) {
            *existing = value;
            return;
        }

        self.order.push_back(key.clone());
        self.entries.insert(key, value);

        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}
