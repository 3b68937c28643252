//! Tree labels: which languages hang off which node, and which nodes are in scope.

use std::collections::{BTreeSet, HashMap, HashSet};

use generational_arena::Index;
use itertools::Itertools;
use tracing::{debug, trace};

use crate::domain::arena::TreeArena;
use crate::domain::entities::Language;

/// Maps a tree-node name to the languages attached to it.
///
/// Names and language ids keep the order they were first seen in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelIndex {
    order: Vec<String>,
    languages: HashMap<String, Vec<String>>,
}

impl LabelIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the index from each language's Glottolog code.
    pub fn from_languages<'a>(languages: impl IntoIterator<Item = &'a Language>) -> Self {
        let mut index = Self::new();
        for language in languages {
            if let Some(code) = language.glottocode.as_deref().filter(|c| !c.is_empty()) {
                index.attach(code, &language.id);
            }
        }
        debug!("label index: {} labels", index.len());
        index
    }

    pub fn attach(&mut self, label: &str, language_id: &str) {
        if !self.languages.contains_key(label) {
            self.order.push(label.to_string());
        }
        let ids = self.languages.entry(label.to_string()).or_default();
        if !ids.iter().any(|id| id == language_id) {
            ids.push(language_id.to_string());
        }
    }

    /// Language ids attached to `label`, empty when unknown.
    pub fn languages(&self, label: &str) -> &[String] {
        self.languages.get(label).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Label names in first-seen order.
    pub fn treelabels(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Names of tree nodes that must survive pruning.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSet {
    names: BTreeSet<String>,
}

impl ScopeSet {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Keeps every label with at least one attached language that has data.
    pub fn from_labels(index: &LabelIndex, has_data: impl Fn(&str) -> bool) -> Self {
        let names = index
            .treelabels()
            .filter(|label| index.languages(label).iter().any(|id| has_data(id.as_str())))
            .map(str::to_string)
            .collect();
        Self { names }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Resolves the scope to nodes of `tree`, in tree order.
    ///
    /// Names absent from the tree are skipped.
    pub fn targets(&self, tree: &TreeArena) -> Vec<Index> {
        let index = tree.name_index();
        let missing: Vec<&str> = self.iter().filter(|name| !index.contains_key(*name)).collect();
        if !missing.is_empty() {
            trace!("scope names not in tree: {}", missing.iter().join(", "));
        }
        let wanted: HashSet<Index> = self
            .names
            .iter()
            .filter_map(|name| index.get(name).copied())
            .collect();
        tree.iter()
            .map(|(idx, _)| idx)
            .filter(|idx| wanted.contains(idx))
            .collect()
    }
}
