//! Append-only name <-> id mapping for labels and features.

use std::collections::HashMap;

/// Bidirectional mapping between names and dense ids.
///
/// Ids are assigned in first-seen order starting at zero and are never
/// reused or reassigned.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    ids: HashMap<String, usize>,
    names: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the id for `name`, creating one when `create` is set.
    ///
    /// Returns `None` for an unknown name when `create` is false.
    pub fn resolve(&mut self, name: &str, create: bool) -> Option<usize> {
        if let Some(&id) = self.ids.get(name) {
            return Some(id);
        }
        if !create {
            return None;
        }
        Some(self.intern(name))
    }

    /// Return the id for `name`, always creating it when absent.
    pub fn intern(&mut self, name: &str) -> usize {
        if let Some(&id) = self.ids.get(name) {
            return id;
        }
        let id = self.names.len();
        self.names.push(name.to_string());
        self.ids.insert(name.to_string(), id);
        id
    }

    /// Look up an existing id without growing the vocabulary.
    pub fn get(&self, name: &str) -> Option<usize> {
        self.ids.get(name).copied()
    }

    pub fn name(&self, id: usize) -> Option<&str> {
        self.names.get(id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Names in id order.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}
