//! Optional LLM-backed advisor that recommends one value per dimension.

use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;

use async_trait::async_trait;
use creative_core::types::{CreativeBrief, CreativeDimensionValue, Dimension};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const REPLY_START: &str = "---PRESET---";
const REPLY_END: &str = "---END---";
const DEFAULT_TEMPERATURE: f32 = 0.8;

/// What the advisor is asked to choose from.
#[derive(Debug, Clone, Serialize)]
pub struct AdvisorRequest {
    pub campaign_id: String,
    pub request_index: u64,
    pub brief: CreativeBrief,
    /// Eligible values per dimension, in the order they are presented.
    pub candidates: BTreeMap<Dimension, Vec<CreativeDimensionValue>>,
    /// `"Style: Studio Minimal"` lines for values used recently.
    pub usage_history: Vec<String>,
}

/// Chosen value id per dimension. Dimensions may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdvisorResponse {
    pub picks: HashMap<Dimension, String>,
    #[serde(default)]
    pub justification: Option<String>,
}

/// Why an advisor recommendation could not be used. Always recovered from.
#[derive(Debug, Error)]
pub enum AdvisorUnavailable {
    #[error("advisor timed out after {after_ms}ms")]
    Timeout { after_ms: u64 },

    #[error("advisor call failed: {0}")]
    Failed(String),

    #[error("advisor returned an invalid response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait AdvisorClient: Send + Sync {
    fn name(&self) -> &str;

    /// Callers time-box this; implementations need not.
    async fn recommend(&self, request: &AdvisorRequest) -> anyhow::Result<AdvisorResponse>;
}

/// Raw text completion against some LLM provider.
#[async_trait]
pub trait TextCompletion: Send + Sync {
    async fn complete(&self, prompt: &str, temperature: f32) -> anyhow::Result<String>;
}

/// Advisor that renders a text prompt and parses an indexed reply block.
pub struct PromptAdvisor<C> {
    completion: C,
    temperature: f32,
}

impl<C: TextCompletion> PromptAdvisor<C> {
    pub fn new(completion: C) -> Self {
        Self {
            completion,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[async_trait]
impl<C: TextCompletion> AdvisorClient for PromptAdvisor<C> {
    fn name(&self) -> &str {
        "prompt"
    }

    async fn recommend(&self, request: &AdvisorRequest) -> anyhow::Result<AdvisorResponse> {
        let prompt = build_prompt(request);
        let reply = self.completion.complete(&prompt, self.temperature).await?;
        let response = parse_reply(&reply, request)?;
        debug!(
            campaign_id = %request.campaign_id,
            picks = response.picks.len(),
            "advisor reply parsed"
        );
        Ok(response)
    }
}

fn or_unspecified(items: &[String]) -> String {
    if items.is_empty() {
        "Not specified".to_string()
    } else {
        items.join(", ")
    }
}

/// Render the advisor prompt. Candidates are listed with zero-based indices.
pub fn build_prompt(request: &AdvisorRequest) -> String {
    let brand = &request.brief.brand;
    let product = &request.brief.product;
    let campaign = &request.brief.campaign;
    let mut out = String::new();

    let _ = writeln!(out, "You are an art director choosing a creative direction for one post.\n");
    let _ = writeln!(out, "BRAND:");
    let _ = writeln!(out, "Name: {}", brand.name);
    let _ = writeln!(out, "Sector: {}", brand.sector);
    let _ = writeln!(
        out,
        "Positioning: {}",
        brand.price_positioning.as_deref().unwrap_or("Not specified")
    );
    let _ = writeln!(out, "Values: {}", or_unspecified(&brand.values));
    if let Some(color) = &brand.primary_color {
        let _ = writeln!(out, "Primary color: {color}");
    }

    let _ = writeln!(out, "\nPRODUCT:");
    let _ = writeln!(out, "Name: {}", product.name);
    let _ = writeln!(out, "Category: {}", product.category);
    if !product.description.is_empty() {
        let _ = writeln!(out, "Description: {}", product.description);
    }
    let _ = writeln!(out, "Selling points: {}", or_unspecified(&product.selling_points));
    let _ = writeln!(out, "Usage occasions: {}", or_unspecified(&product.usage_occasions));

    let _ = writeln!(out, "\nCAMPAIGN:");
    let _ = writeln!(
        out,
        "Objective: {}",
        campaign.objective.as_deref().unwrap_or("Not specified")
    );
    let _ = writeln!(out, "Themes: {}", or_unspecified(&campaign.themes));
    let _ = writeln!(out, "Tone: {}", campaign.tone.as_deref().unwrap_or("Not specified"));

    let _ = writeln!(out, "\nDIVERSITY:");
    let _ = writeln!(out, "Post number: {}", request.request_index + 1);
    if request.usage_history.is_empty() {
        let _ = writeln!(out, "First post of the campaign. Choose the best fit.");
    } else {
        let _ = writeln!(out, "Already used in this campaign:");
        for line in &request.usage_history {
            let _ = writeln!(out, "- {line}");
        }
        let _ = writeln!(out, "You MUST choose values different from the ones already used.");
    }

    for (dimension, values) in &request.candidates {
        let _ = writeln!(out, "\n{} OPTIONS ({}):", dimension.label().to_uppercase(), values.len());
        for (i, value) in values.iter().enumerate() {
            let _ = writeln!(out, "{i}. {}", value.name);
            if !value.description.is_empty() {
                let _ = writeln!(out, "   {}", value.description);
            }
            if !value.mood_tags.is_empty() {
                let _ = writeln!(out, "   Mood: {}", value.mood_tags.join(", "));
            }
        }
    }

    let _ = writeln!(out, "\nReply ONLY with this block:");
    let _ = writeln!(out, "{REPLY_START}");
    for dimension in request.candidates.keys() {
        let _ = writeln!(out, "{}: <index>", dimension.label());
    }
    let _ = writeln!(out, "Justification: <one short sentence>");
    let _ = write!(out, "{REPLY_END}");
    out
}

/// Parse a reply block into value ids. Unknown labels and out-of-range
/// indices are skipped so the caller can fall back per dimension.
pub fn parse_reply(
    reply: &str,
    request: &AdvisorRequest,
) -> Result<AdvisorResponse, AdvisorUnavailable> {
    let start = reply
        .find(REPLY_START)
        .ok_or_else(|| AdvisorUnavailable::InvalidResponse("missing start marker".into()))?;
    let body = &reply[start + REPLY_START.len()..];
    let end = body
        .find(REPLY_END)
        .ok_or_else(|| AdvisorUnavailable::InvalidResponse("missing end marker".into()))?;

    let mut response = AdvisorResponse::default();
    for line in body[..end].lines() {
        let Some((label, raw)) = line.split_once(':') else {
            continue;
        };
        let label = label.trim();
        let raw = raw.trim();

        if label.eq_ignore_ascii_case("justification") {
            if !raw.is_empty() {
                response.justification = Some(raw.to_string());
            }
            continue;
        }

        let Some(dimension) = Dimension::parse(label) else {
            continue;
        };
        let index: Option<usize> = raw
            .split(|c: char| !c.is_ascii_digit())
            .find(|s| !s.is_empty())
            .and_then(|s| s.parse().ok());
        let picked = index.and_then(|i| request.candidates.get(&dimension)?.get(i));
        if let Some(value) = picked {
            response.picks.insert(dimension, value.id.clone());
        }
    }

    if response.picks.is_empty() {
        return Err(AdvisorUnavailable::InvalidResponse(
            "no usable dimension picks".into(),
        ));
    }
    Ok(response)
}
