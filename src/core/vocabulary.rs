use std::collections::HashMap;
use crate::core::normalize::SubjectSet;

/// Per-call subject vocabulary
///
/// Maps each normalized subject name to a fixed vector position, in first-seen
/// order. Rebuilt for every engine call since subject names are free text.
#[derive(Debug, Clone, Default)]
pub struct Vocabulary {
    index: HashMap<String, usize>,
    terms: Vec<String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subject key, returning its position
    pub fn insert(&mut self, key: &str) -> usize {
        if let Some(&position) = self.index.get(key) {
            return position;
        }
        let position = self.terms.len();
        self.terms.push(key.to_string());
        self.index.insert(key.to_string(), position);
        position
    }

    pub fn extend_from(&mut self, subjects: &SubjectSet) {
        for subject in subjects.iter() {
            self.insert(&subject.key);
        }
    }

    pub fn index_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Proficiency-weighted presence vector for one subject list
    ///
    /// Listed subjects carry their clamped proficiency, every other position is 0.
    /// Subjects missing from the vocabulary are dropped.
    pub fn vectorize(&self, subjects: &SubjectSet) -> Vec<f64> {
        let mut vector = vec![0.0; self.terms.len()];
        for subject in subjects.iter() {
            if let Some(position) = self.index_of(&subject.key) {
                vector[position] = subject.proficiency as f64;
            }
        }
        vector
    }
}
