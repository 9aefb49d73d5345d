//! Tag-overlap relevance filtering of the preset catalog.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use creative_core::types::{CreativeBrief, CreativeDimensionValue, Dimension};
use serde::Serialize;
use tracing::debug;

use crate::catalog::PresetCatalog;

const SECTOR_WEIGHT: u32 = 3;
const CATEGORY_WEIGHT: u32 = 2;
const MOOD_WEIGHT: u32 = 1;
const UNIVERSAL_SECTOR: &str = "all";

/// Candidates for one dimension, best match first.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DimensionCandidates {
    pub values: Vec<CreativeDimensionValue>,
    /// Nothing matched, so the whole catalog dimension was used.
    pub widened: bool,
}

impl DimensionCandidates {
    pub fn contains(&self, id: &str) -> bool {
        self.values.iter().any(|v| v.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// Per-request subset of the catalog, keyed by dimension.
#[derive(Debug, Clone, Default, Serialize)]
pub struct FilteredCandidateSet {
    dimensions: BTreeMap<Dimension, DimensionCandidates>,
}

impl FilteredCandidateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caller-supplied candidates for a dimension, taken as-is.
    pub fn with_values(
        mut self,
        dimension: Dimension,
        values: Vec<CreativeDimensionValue>,
    ) -> Self {
        self.insert(
            dimension,
            DimensionCandidates {
                values,
                widened: false,
            },
        );
        self
    }

    pub fn insert(&mut self, dimension: Dimension, candidates: DimensionCandidates) {
        self.dimensions.insert(dimension, candidates);
    }

    pub fn get(&self, dimension: Dimension) -> Option<&DimensionCandidates> {
        self.dimensions.get(&dimension)
    }

    /// Values for a dimension, empty if the dimension was not filtered.
    pub fn values(&self, dimension: Dimension) -> &[CreativeDimensionValue] {
        self.dimensions
            .get(&dimension)
            .map(|c| c.values.as_slice())
            .unwrap_or(&[])
    }

    pub fn dimensions(&self) -> impl Iterator<Item = Dimension> + '_ {
        self.dimensions.keys().copied()
    }

    pub fn is_widened(&self, dimension: Dimension) -> bool {
        self.dimensions.get(&dimension).is_some_and(|c| c.widened)
    }
}

/// Lowercased keyword sets extracted from a brief.
#[derive(Debug, Default)]
struct MatchProfile {
    sectors: HashSet<String>,
    categories: HashSet<String>,
    moods: HashSet<String>,
}

impl MatchProfile {
    fn from_brief(brief: &CreativeBrief) -> Self {
        let mut profile = Self::default();

        add_phrase(&mut profile.sectors, &brief.brand.sector);
        add_phrase(&mut profile.categories, &brief.product.category);

        let campaign = &brief.campaign;
        let mood_sources = campaign
            .themes
            .iter()
            .chain(campaign.tone.iter())
            .chain(campaign.objective.iter())
            .chain(brief.brand.values.iter())
            .chain(brief.product.usage_occasions.iter());
        for phrase in mood_sources {
            add_phrase(&mut profile.moods, phrase);
        }
        profile
    }

    fn score(&self, value: &CreativeDimensionValue) -> u32 {
        let mut score = 0;
        for tag in &value.sector_tags {
            let tag = tag.to_lowercase();
            if tag == UNIVERSAL_SECTOR {
                score += 1;
            } else if self.sectors.contains(&tag) {
                score += SECTOR_WEIGHT;
            }
        }
        score += CATEGORY_WEIGHT * hits(&self.categories, &value.category_tags);
        score += MOOD_WEIGHT * hits(&self.moods, &value.mood_tags);
        score
    }
}

/// Adds the whole phrase plus each alphanumeric word of it.
fn add_phrase(into: &mut HashSet<String>, phrase: &str) {
    let phrase = phrase.trim().to_lowercase();
    if phrase.is_empty() {
        return;
    }
    for word in phrase.split(|c: char| !c.is_alphanumeric()) {
        if !word.is_empty() {
            into.insert(word.to_string());
        }
    }
    into.insert(phrase);
}

fn hits(keywords: &HashSet<String>, tags: &[String]) -> u32 {
    tags.iter()
        .filter(|t| keywords.contains(&t.to_lowercase()))
        .count() as u32
}

/// Narrows catalog dimensions to values relevant to a brief. Pure and
/// deterministic for a given catalog and brief.
#[derive(Debug, Clone)]
pub struct RelevanceFilter {
    catalog: Arc<PresetCatalog>,
    max_candidates: usize,
}

impl RelevanceFilter {
    /// `max_candidates` of zero disables the cap.
    pub fn new(catalog: Arc<PresetCatalog>, max_candidates: usize) -> Self {
        Self {
            catalog,
            max_candidates,
        }
    }

    pub fn catalog(&self) -> &Arc<PresetCatalog> {
        &self.catalog
    }

    /// Filter every dimension present in the catalog.
    pub fn filter(&self, brief: &CreativeBrief) -> FilteredCandidateSet {
        let dimensions: Vec<Dimension> = self.catalog.dimensions().collect();
        self.filter_dimensions(brief, &dimensions)
    }

    pub fn filter_dimensions(
        &self,
        brief: &CreativeBrief,
        dimensions: &[Dimension],
    ) -> FilteredCandidateSet {
        let profile = MatchProfile::from_brief(brief);
        let mut set = FilteredCandidateSet::new();
        for &dimension in dimensions {
            set.insert(dimension, self.rank(&profile, dimension));
        }
        set
    }

    fn rank(&self, profile: &MatchProfile, dimension: Dimension) -> DimensionCandidates {
        let all = self.catalog.values(dimension);

        let mut scored: Vec<(u32, &CreativeDimensionValue)> = all
            .iter()
            .map(|v| (profile.score(v), v))
            .filter(|(score, _)| *score > 0)
            .collect();

        if scored.is_empty() {
            debug!(%dimension, catalog = all.len(), "no relevant values, widening to full catalog");
            return DimensionCandidates {
                values: all.to_vec(),
                widened: true,
            };
        }

        // Stable sort keeps catalog order among equal scores.
        scored.sort_by(|a, b| b.0.cmp(&a.0));
        if self.max_candidates > 0 {
            scored.truncate(self.max_candidates);
        }

        DimensionCandidates {
            values: scored.into_iter().map(|(_, v)| v.clone()).collect(),
            widened: false,
        }
    }
}
