use std::collections::{BTreeMap, HashMap};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An independent creative axis whose value is chosen once per generation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    // Image presets
    Style,
    Palette,
    Context,
    Lighting,
    Framework,
    // Video scripts
    Angle,
    Technique,
    Concept,
}

impl Dimension {
    pub const ALL: [Dimension; 8] = [
        Dimension::Style,
        Dimension::Palette,
        Dimension::Context,
        Dimension::Lighting,
        Dimension::Framework,
        Dimension::Angle,
        Dimension::Technique,
        Dimension::Concept,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::Style => "style",
            Dimension::Palette => "palette",
            Dimension::Context => "context",
            Dimension::Lighting => "lighting",
            Dimension::Framework => "framework",
            Dimension::Angle => "angle",
            Dimension::Technique => "technique",
            Dimension::Concept => "concept",
        }
    }

    /// Human label used in prompts and usage history lines.
    pub fn label(&self) -> &'static str {
        match self {
            Dimension::Style => "Style",
            Dimension::Palette => "Palette",
            Dimension::Context => "Context",
            Dimension::Lighting => "Lighting",
            Dimension::Framework => "Framework",
            Dimension::Angle => "Angle",
            Dimension::Technique => "Technique",
            Dimension::Concept => "Concept",
        }
    }

    /// Case-insensitive lookup by name or label.
    pub fn parse(raw: &str) -> Option<Dimension> {
        let needle = raw.trim().to_lowercase();
        Dimension::ALL.into_iter().find(|d| d.as_str() == needle)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of content being generated; decides which dimensions are selected.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    #[default]
    Image,
    Video,
}

impl MediaKind {
    pub fn dimensions(&self) -> &'static [Dimension] {
        match self {
            MediaKind::Image => &[
                Dimension::Style,
                Dimension::Palette,
                Dimension::Context,
                Dimension::Lighting,
                Dimension::Framework,
            ],
            MediaKind::Video => &[Dimension::Angle, Dimension::Technique, Dimension::Concept],
        }
    }
}

/// One selectable value of a creative dimension (a photographic style, a
/// palette, a narrative angle, ...). Loaded once at startup and never mutated.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreativeDimensionValue {
    pub id: String,
    pub name: String,
    pub dimension: Dimension,
    #[serde(default)]
    pub description: String,
    /// Brand sectors this value suits. `all` marks a universal value.
    #[serde(default)]
    pub sector_tags: Vec<String>,
    /// Product categories this value suits.
    #[serde(default)]
    pub category_tags: Vec<String>,
    #[serde(default)]
    pub mood_tags: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// Brand data relevant to creative selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct BrandContext {
    #[serde(default)]
    pub brand_id: Option<String>,
    pub name: String,
    pub sector: String,
    #[serde(default)]
    pub price_positioning: Option<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
}

/// Product data relevant to creative selection.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ProductContext {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub usage_occasions: Vec<String>,
    #[serde(default)]
    pub selling_points: Vec<String>,
}

/// Campaign-level creative direction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CampaignContext {
    #[serde(default)]
    pub objective: Option<String>,
    #[serde(default)]
    pub themes: Vec<String>,
    #[serde(default)]
    pub tone: Option<String>,
}

/// Everything known about one generation request's creative direction.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CreativeBrief {
    pub brand: BrandContext,
    pub product: ProductContext,
    #[serde(default)]
    pub campaign: CampaignContext,
}

impl CreativeBrief {
    pub fn new(brand: BrandContext, product: ProductContext, campaign: CampaignContext) -> Self {
        Self {
            brand,
            product,
            campaign,
        }
    }
}

/// Which selection strategy produced a value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Advisor,
    SeededRandom,
}

/// A value chosen for one dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DimensionChoice {
    pub value: CreativeDimensionValue,
    pub source: SelectionSource,
    /// True when every candidate had been used recently and repetition was accepted.
    pub repeated: bool,
}

/// Outcome of one selection: a value per requested dimension.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectionResult {
    pub campaign_id: String,
    pub request_index: u64,
    pub choices: HashMap<Dimension, DimensionChoice>,
    #[serde(default)]
    pub advisor_justification: Option<String>,
    pub duplicate_warning: bool,
    pub selected_at: DateTime<Utc>,
}

impl SelectionResult {
    pub fn value(&self, dimension: Dimension) -> Option<&CreativeDimensionValue> {
        self.choices.get(&dimension).map(|c| &c.value)
    }

    pub fn value_id(&self, dimension: Dimension) -> Option<&str> {
        self.value(dimension).map(|v| v.id.as_str())
    }

    /// `"Style: Studio Minimal"` lines in dimension order.
    pub fn describe(&self) -> Vec<String> {
        let mut dims: Vec<&Dimension> = self.choices.keys().collect();
        dims.sort();
        dims.into_iter()
            .filter_map(|d| {
                self.choices
                    .get(d)
                    .map(|c| format!("{}: {}", d.label(), c.value.name))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_parse() {
        assert_eq!(Dimension::parse("Style"), Some(Dimension::Style));
        assert_eq!(Dimension::parse(" lighting "), Some(Dimension::Lighting));
        assert_eq!(Dimension::parse("mood"), None);
    }

    #[test]
    fn test_value_deserializes_with_defaults() {
        let json = r#"{"id":"s1","name":"Studio","dimension":"style"}"#;
        let value: CreativeDimensionValue = serde_json::from_str(json).unwrap();
        assert_eq!(value.dimension, Dimension::Style);
        assert!(value.sector_tags.is_empty());
        assert!(value.attributes.is_empty());
    }

    #[test]
    fn test_media_dimensions_disjoint() {
        for d in MediaKind::Image.dimensions() {
            assert!(!MediaKind::Video.dimensions().contains(d));
        }
    }
}
