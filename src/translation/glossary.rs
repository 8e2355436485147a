/*!
 * Terminology glossary shared across windows.
 *
 * Terms are keyed by their source text and never overwritten: the first
 * translation recorded for a term is the one every later window is told to
 * use. Lookup decides relevance through a `TermMatcher`; the default is
 * plain substring containment over the window text, which can over-match
 * short or generic terms.
 */

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// A terminology entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    /// Term as it appears in the source text
    pub source: String,
    /// Translation to use consistently
    pub target: String,
    /// Free-form remark from the model, possibly empty
    #[serde(default)]
    pub note: String,
}

impl Term {
    pub fn new(source: impl Into<String>, target: impl Into<String>, note: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            note: note.into(),
        }
    }
}

/// Decides whether a stored term is relevant to a piece of text
pub trait TermMatcher: Send + Sync + Debug {
    fn matches(&self, term: &Term, text: &str) -> bool;
}

/// Relevant when the term's source occurs anywhere in the text
#[derive(Debug, Clone, Copy, Default)]
pub struct SubstringMatcher;

impl TermMatcher for SubstringMatcher {
    fn matches(&self, term: &Term, text: &str) -> bool {
        text.contains(term.source.as_str())
    }
}

/// Insertion-ordered, first-definition-wins term collection
#[derive(Debug)]
pub struct TermStore {
    terms: IndexMap<String, Term>,
    matcher: Box<dyn TermMatcher>,
}

impl Default for TermStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for TermStore {
    fn eq(&self, other: &Self) -> bool {
        self.terms.len() == other.terms.len() && self.iter().eq(other.iter())
    }
}

impl TermStore {
    /// Create an empty store using substring matching
    pub fn new() -> Self {
        Self::with_matcher(Box::new(SubstringMatcher))
    }

    /// Create an empty store with a custom relevance policy
    pub fn with_matcher(matcher: Box<dyn TermMatcher>) -> Self {
        Self {
            terms: IndexMap::new(),
            matcher,
        }
    }

    /// Build a store from terms in order; duplicates keep their first occurrence
    pub fn from_terms<I: IntoIterator<Item = Term>>(terms: I) -> Self {
        let mut store = Self::new();
        store.merge(terms);
        store
    }

    /// Insert terms whose source is not yet present; returns how many were added
    pub fn merge<I: IntoIterator<Item = Term>>(&mut self, new_terms: I) -> usize {
        let mut added = 0;
        for term in new_terms {
            if !self.terms.contains_key(&term.source) {
                self.terms.insert(term.source.clone(), term);
                added += 1;
            }
        }
        added
    }

    /// Terms relevant to the given lines, in store order
    pub fn lookup<S: AsRef<str>>(&self, text: &[S]) -> Vec<&Term> {
        let joined = text.iter().map(|s| s.as_ref()).collect::<Vec<_>>().join(" ");
        self.terms
            .values()
            .filter(|term| self.matcher.matches(term, &joined))
            .collect()
    }

    pub fn get(&self, source: &str) -> Option<&Term> {
        self.terms.get(source)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.terms.values()
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
