//! Collapses repeated texts into unique work items and maps results back.
//!
//! Equality is exact: no trimming and no case folding, so texts that differ
//! only in surrounding whitespace stay separate.

use std::collections::HashMap;

/// One distinct text and the positions it stands for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueWorkItem {
    pub text: String,
    /// Indices into the collapsed input
    pub members: Vec<usize>,
}

/// Result of [`collapse`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Collapsed {
    /// Distinct texts in first-occurrence order
    pub items: Vec<UniqueWorkItem>,
    /// For each input position, the index of its unique item
    pub index_of: Vec<usize>,
}

impl Collapsed {
    /// Distinct texts in first-occurrence order
    pub fn unique_texts(&self) -> Vec<String> {
        self.items.iter().map(|item| item.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Collapse `texts` into unique work items
pub fn collapse<S: AsRef<str>>(texts: &[S]) -> Collapsed {
    let mut positions: HashMap<&str, usize> = HashMap::with_capacity(texts.len());
    let mut collapsed = Collapsed {
        items: Vec::new(),
        index_of: Vec::with_capacity(texts.len()),
    };

    for (i, text) in texts.iter().enumerate() {
        let text = text.as_ref();
        let unique = *positions.entry(text).or_insert_with(|| {
            collapsed.items.push(UniqueWorkItem { text: text.to_string(), members: Vec::new() });
            collapsed.items.len() - 1
        });
        collapsed.items[unique].members.push(i);
        collapsed.index_of.push(unique);
    }

    collapsed
}

/// Map translated unique texts back onto every original position
pub fn expand(translated_unique: &[String], index_of: &[usize]) -> Vec<String> {
    index_of
        .iter()
        .map(|&unique| translated_unique.get(unique).cloned().unwrap_or_default())
        .collect()
}
