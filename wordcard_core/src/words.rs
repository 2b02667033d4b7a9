//! Word entries and the case-insensitive word list

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::store::WordStore;

/// One English-Korean pair. `tag` is an optional part of speech.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordEntry {
    #[serde(alias = "english", alias = "word")]
    pub term: String,
    #[serde(alias = "korean", alias = "meaning")]
    pub definition: String,
    #[serde(default, alias = "pos", skip_serializing_if = "String::is_empty")]
    pub tag: String,
}

impl WordEntry {
    pub fn new(term: &str, definition: &str, tag: &str) -> Self {
        Self {
            term: term.trim().to_string(),
            definition: definition.trim().to_string(),
            tag: tag.trim().to_string(),
        }
    }

    /// Identity key used for duplicate detection.
    pub fn key(&self) -> String {
        term_key(&self.term)
    }

    pub fn is_complete(&self) -> bool {
        !self.term.is_empty() && !self.definition.is_empty()
    }
}

pub(crate) fn term_key(term: &str) -> String {
    term.trim().to_lowercase()
}

/// Outcome of a bulk add.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub added: usize,
    pub duplicates: usize,
}

/// Ordered word list. No two entries share a term, ignoring case.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WordList {
    entries: Vec<WordEntry>,
}

impl WordList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from arbitrary entries, keeping the first of any duplicate terms
    /// and dropping incomplete ones.
    pub fn from_entries(entries: Vec<WordEntry>) -> Self {
        let mut list = Self::new();
        for entry in entries {
            let entry = WordEntry::new(&entry.term, &entry.definition, &entry.tag);
            if entry.is_complete() && !list.contains(&entry.term) {
                list.entries.push(entry);
            }
        }
        list
    }

    pub fn load(store: &dyn WordStore) -> Result<Self> {
        let list = Self::from_entries(store.load()?);
        debug!(count = list.len(), "loaded word list");
        Ok(list)
    }

    pub fn save(&self, store: &mut dyn WordStore) -> Result<()> {
        store.save(&self.entries)
    }

    pub fn entries(&self) -> &[WordEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, WordEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, term: &str) -> bool {
        self.find(term).is_some()
    }

    /// Look a word up by term, ignoring case.
    pub fn find(&self, term: &str) -> Option<&WordEntry> {
        let key = term_key(term);
        self.entries.iter().find(|e| e.key() == key)
    }

    /// Add a single word typed in by the user.
    pub fn add(&mut self, term: &str, definition: &str, tag: &str) -> Result<&WordEntry> {
        let entry = WordEntry::new(term, definition, tag);
        if !entry.is_complete() {
            return Err(Error::Validation(
                "both the English word and the Korean meaning are required".into(),
            ));
        }
        if self.contains(&entry.term) {
            return Err(Error::DuplicateEntry(entry.term));
        }
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Bulk add. Incomplete entries are dropped silently; collisions are
    /// counted and the existing entry is left untouched.
    pub fn merge(&mut self, incoming: Vec<WordEntry>) -> Result<ImportSummary> {
        let candidates: Vec<WordEntry> = incoming
            .into_iter()
            .map(|e| WordEntry::new(&e.term, &e.definition, &e.tag))
            .filter(WordEntry::is_complete)
            .collect();

        if candidates.is_empty() {
            return Err(Error::ImportFormat("no usable entries found".into()));
        }

        let mut summary = ImportSummary::default();
        for entry in candidates {
            if self.contains(&entry.term) {
                summary.duplicates += 1;
            } else {
                self.entries.push(entry);
                summary.added += 1;
            }
        }

        info!(added = summary.added, duplicates = summary.duplicates, "merged words");
        Ok(summary)
    }

    pub fn remove(&mut self, term: &str) -> Option<WordEntry> {
        let key = term_key(term);
        let index = self.entries.iter().position(|e| e.key() == key)?;
        Some(self.entries.remove(index))
    }

    pub fn remove_at(&mut self, index: usize) -> Option<WordEntry> {
        if index < self.entries.len() {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<'a> IntoIterator for &'a WordList {
    type Item = &'a WordEntry;
    type IntoIter = std::slice::Iter<'a, WordEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
