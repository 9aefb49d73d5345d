//! Diversity simulator: drives several campaigns through the selection and
//! regeneration pipeline with a template generator and prints what each
//! campaign ended up using.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use clap::{Parser, ValueEnum};
use creative_core::config::AppConfig;
use creative_core::types::{
    BrandContext, CampaignContext, CreativeBrief, MediaKind, ProductContext,
};
use creative_diversity::{
    ContentGenerator, DiversityEngine, GenerationRequest, PresetCatalog, SeedDeriver,
};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "diversity-sim")]
#[command(about = "Simulate creative diversity selection across campaigns")]
#[command(version)]
struct Cli {
    /// Number of simulated campaigns
    #[arg(long, default_value_t = 3)]
    campaigns: usize,

    /// Posts generated per campaign
    #[arg(long, default_value_t = 10)]
    posts: u64,

    /// Values remembered per dimension (overrides config)
    #[arg(long, env = "CREATIVE_DIVERSITY__DIVERSITY__MAX_HISTORY")]
    max_history: Option<usize>,

    /// JSON catalog file; the built-in catalog is used when absent
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Media::Image)]
    media: Media,

    /// Fixed seed salt for reproducible runs (disables clock salting)
    #[arg(long)]
    seed_salt: Option<u64>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Media {
    Image,
    Video,
}

impl From<Media> for MediaKind {
    fn from(media: Media) -> Self {
        match media {
            Media::Image => MediaKind::Image,
            Media::Video => MediaKind::Video,
        }
    }
}

const VARIATIONS: &[&str] = &[
    "",
    "seen through an unexpected vantage point",
    "reimagined with playful contrast and surprise",
];

/// Writes a caption from the selected values; regeneration attempts append
/// a variation phrase.
struct TemplateGenerator;

#[async_trait]
impl ContentGenerator for TemplateGenerator {
    async fn generate(&self, request: &GenerationRequest<'_>) -> anyhow::Result<String> {
        let product = &request.brief.product.name;
        let mut names: Vec<&str> = request
            .selection
            .choices
            .values()
            .map(|c| c.value.name.as_str())
            .collect();
        names.sort_unstable();

        let variation = VARIATIONS
            .get(request.attempt as usize)
            .copied()
            .unwrap_or_default();
        Ok(format!("{product} featured as {} {variation}", names.join(" ")))
    }
}

fn sample_briefs() -> Vec<CreativeBrief> {
    let brief = |brand: &str, sector: &str, product: &str, category: &str, themes: &[&str]| {
        CreativeBrief::new(
            BrandContext {
                name: brand.into(),
                sector: sector.into(),
                ..Default::default()
            },
            ProductContext {
                name: product.into(),
                category: category.into(),
                ..Default::default()
            },
            CampaignContext {
                themes: themes.iter().map(|t| t.to_string()).collect(),
                ..Default::default()
            },
        )
    };
    vec![
        brief("Fizzly", "beverage", "Lemon Soda", "soda", &["summer", "party"]),
        brief("Maison Dore", "food", "Butter Croissant", "pastry", &["morning", "family"]),
        brief("Lumen Skin", "cosmetic", "Night Serum", "serum", &["selfcare", "calm"]),
        brief("Volt Audio", "tech", "Studio Headphones", "audio", &["focused", "urban"]),
    ]
}

#[derive(Debug, Serialize)]
struct CampaignReport {
    campaign_id: String,
    brand: String,
    posts: u64,
    duplicate_warnings: u64,
    regenerations: u64,
    stats: std::collections::BTreeMap<String, usize>,
    usage_history: Vec<String>,
    first_seen: Option<DateTime<Utc>>,
    last_updated: Option<DateTime<Utc>>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "diversity_sim=info,creative_diversity=warn".into()),
        )
        .json()
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load().unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });
    if let Some(max_history) = cli.max_history {
        config.diversity.max_history = max_history.max(1);
    }
    if cli.seed_salt.is_some() {
        config.diversity.salt_seed_with_clock = false;
    }
    config.validate()?;

    let catalog = match &cli.catalog {
        Some(path) => PresetCatalog::from_json_file(path)?,
        None => PresetCatalog::builtin()?,
    };

    info!(
        campaigns = cli.campaigns,
        posts = cli.posts,
        media = ?cli.media,
        max_history = config.diversity.max_history,
        "Diversity simulation starting"
    );

    let mut engine = DiversityEngine::new(catalog, &config);
    if let Some(salt) = cli.seed_salt {
        engine = engine.with_seeds(SeedDeriver::fixed(salt));
    }

    let briefs = sample_briefs();
    let media = MediaKind::from(cli.media);
    let mut reports = Vec::with_capacity(cli.campaigns);

    for (n, brief) in briefs.iter().cycle().take(cli.campaigns).enumerate() {
        let campaign_id = format!("campaign-{}", n + 1);
        let mut duplicate_warnings = 0;
        let mut regenerations = 0;

        for post in 0..cli.posts {
            let output = engine
                .generate_with_diversity(&campaign_id, brief, media, post, &TemplateGenerator, None)
                .await?;
            if output.selection.duplicate_warning {
                duplicate_warnings += 1;
            }
            regenerations += u64::from(output.attempts.saturating_sub(1));
        }

        let ledger_stats = engine.ledger().stats(&campaign_id);
        reports.push(CampaignReport {
            campaign_id: campaign_id.clone(),
            brand: brief.brand.name.clone(),
            posts: cli.posts,
            duplicate_warnings,
            regenerations,
            stats: engine.diversity_stats(&campaign_id).into_iter().collect(),
            usage_history: engine.usage_history(&campaign_id),
            first_seen: ledger_stats.created_at,
            last_updated: ledger_stats.updated_at,
        });
    }

    println!("{}", serde_json::to_string_pretty(&reports)?);
    info!("Diversity simulation complete");
    Ok(())
}
