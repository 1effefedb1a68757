//! Rule-based taxonomy classifier.
//!
//! Produces `modality` and `category` tags from a token list. The same
//! [`Classifier`] runs at ingestion time on names/descriptions and at query
//! time on the live query string, so the resulting sets are comparable.

pub mod vocab;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::AimkgError;
use crate::nodes::NONE_SENTINEL;
use crate::utils::tokenize;

/// Coarse data-type tag. Declaration order is the classifier's priority order
/// and the rendering order of a [`ModalitySet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Image,
    Text,
    Audio,
    Video,
    Multimodal,
}

impl Modality {
    pub fn as_str(self) -> &'static str {
        match self {
            Modality::Image => "image",
            Modality::Text => "text",
            Modality::Audio => "audio",
            Modality::Video => "video",
            Modality::Multimodal => "multimodal",
        }
    }

    /// True for the four base super-classes (everything but multimodal).
    pub fn is_base(self) -> bool {
        !matches!(self, Modality::Multimodal)
    }

    fn vocabulary(self) -> &'static [&'static str] {
        match self {
            Modality::Image => vocab::IMAGE,
            Modality::Text => vocab::TEXT,
            Modality::Audio => vocab::AUDIO,
            Modality::Video => vocab::VIDEO,
            Modality::Multimodal => vocab::MULTI,
        }
    }
}

const PRIORITY: [Modality; 5] = [
    Modality::Image,
    Modality::Text,
    Modality::Audio,
    Modality::Video,
    Modality::Multimodal,
];

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Modality {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim();
        PRIORITY
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| AimkgError::Validation(format!("unknown modality '{s}'")))
    }
}

/// When to add [`Modality::Multimodal`] on top of the matched base modalities.
///
/// Two thresholds exist in practice and neither is canonical, so the choice is
/// configuration (`MULTIMODAL_RULE`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MultimodalRule {
    /// More than one distinct base modality matched.
    #[default]
    MoreThanOne,
    /// Any base modality matched at all.
    AnyMatch,
}

impl MultimodalRule {
    fn triggers(self, base_matches: usize) -> bool {
        match self {
            MultimodalRule::MoreThanOne => base_matches > 1,
            MultimodalRule::AnyMatch => base_matches > 0,
        }
    }
}

impl FromStr for MultimodalRule {
    type Err = AimkgError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "more-than-one" => Ok(MultimodalRule::MoreThanOne),
            "any-match" => Ok(MultimodalRule::AnyMatch),
            other => Err(AimkgError::Validation(format!(
                "MULTIMODAL_RULE must be 'more-than-one' or 'any-match', got '{other}'"
            ))),
        }
    }
}

/// A set of modalities. Renders as a comma-joined list in priority order, or
/// `"none"` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModalitySet(BTreeSet<Modality>);

impl ModalitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a stored comma-joined value. `"none"`, empty pieces and unknown
    /// tags are skipped.
    pub fn parse_lenient(s: &str) -> Self {
        Self(s.split(',').filter_map(|t| t.parse().ok()).collect())
    }

    pub fn insert(&mut self, modality: Modality) -> bool {
        self.0.insert(modality)
    }

    pub fn contains(&self, modality: Modality) -> bool {
        self.0.contains(&modality)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = Modality> + '_ {
        self.0.iter().copied()
    }

    pub fn as_set(&self) -> &BTreeSet<Modality> {
        &self.0
    }

    pub fn base_count(&self) -> usize {
        self.0.iter().filter(|m| m.is_base()).count()
    }

    /// Add every modality of `other`.
    pub fn extend(&mut self, other: &ModalitySet) {
        self.0.extend(other.iter());
    }

    /// Add [`Modality::Multimodal`] if `rule` fires for the base modalities
    /// currently in the set.
    pub fn apply_rule(&mut self, rule: MultimodalRule) {
        if rule.triggers(self.base_count()) {
            self.0.insert(Modality::Multimodal);
        }
    }
}

impl FromIterator<Modality> for ModalitySet {
    fn from_iter<I: IntoIterator<Item = Modality>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl fmt::Display for ModalitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(NONE_SENTINEL);
        }
        let joined: Vec<&str> = self.0.iter().map(|m| m.as_str()).collect();
        f.write_str(&joined.join(","))
    }
}

/// A set of free-form action tags. Renders sorted and comma-joined, or
/// `"none"` when empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySet(BTreeSet<String>);

impl CategorySet {
    pub fn parse_lenient(s: &str) -> Self {
        Self(
            s.split(',')
                .map(|t| t.trim().to_lowercase())
                .filter(|t| !t.is_empty() && t != NONE_SENTINEL)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.contains(tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.0.iter().map(String::as_str)
    }

    pub fn as_set(&self) -> &BTreeSet<String> {
        &self.0
    }
}

impl fmt::Display for CategorySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str(NONE_SENTINEL);
        }
        let joined: Vec<&str> = self.iter().collect();
        f.write_str(&joined.join(","))
    }
}

/// Keyword classifier producing modality and category tags.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    rule: MultimodalRule,
}

impl Classifier {
    pub fn new(rule: MultimodalRule) -> Self {
        Self { rule }
    }

    pub fn rule(&self) -> MultimodalRule {
        self.rule
    }

    /// Every vocabulary with a hit contributes its modality, checked in
    /// priority order; then the multimodal rule is applied.
    pub fn modality<S: AsRef<str>>(&self, tokens: &[S]) -> ModalitySet {
        let tokens: BTreeSet<&str> = tokens.iter().map(|t| t.as_ref()).collect();
        let mut set: ModalitySet = PRIORITY
            .into_iter()
            .filter(|m| m.vocabulary().iter().any(|w| tokens.contains(w)))
            .collect();
        set.apply_rule(self.rule);
        set
    }

    /// Multi-label intersection with the category vocabulary.
    pub fn category<S: AsRef<str>>(&self, tokens: &[S]) -> CategorySet {
        CategorySet(
            tokens
                .iter()
                .map(|t| t.as_ref())
                .filter(|t| vocab::CATEGORY.contains(t))
                .map(str::to_string)
                .collect(),
        )
    }

    /// Tokenize free text and classify it.
    pub fn classify_text(&self, text: &str) -> (ModalitySet, CategorySet) {
        let tokens = tokenize(text);
        (self.modality(&tokens), self.category(&tokens))
    }
}
