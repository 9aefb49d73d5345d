use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use creative_core::config::AppConfig;
use creative_core::error::DiversityResult;
use creative_core::types::{
    BrandContext, CampaignContext, CreativeBrief, Dimension, MediaKind, ProductContext,
    SelectionResult,
};
use creative_ledger::CampaignDiversityLedger;
use serde::Serialize;
use tracing::info;

use crate::advisor::AdvisorClient;
use crate::catalog::PresetCatalog;
use crate::filter::{FilteredCandidateSet, RelevanceFilter};
use crate::picker::SeedDeriver;
use crate::regeneration::{ContentGenerator, LoopState, RegenerationLoop, RegenerationPolicy};
use crate::selector::DiversitySelector;
use crate::strategy::AdvisedStrategy;

/// Recent distinct values per dimension quoted back in avoidance instructions.
const AVOIDANCE_WINDOW: usize = 7;

/// Generated content together with the selection it was generated from.
#[derive(Debug, Clone, Serialize)]
pub struct GenerationOutput {
    pub content: String,
    pub selection: SelectionResult,
    pub fingerprint: u32,
    pub attempts: u32,
    pub trace: Vec<LoopState>,
}

/// Facade wiring catalog, filter, ledger, selector and regeneration loop.
pub struct DiversityEngine {
    catalog: Arc<PresetCatalog>,
    filter: RelevanceFilter,
    ledger: Arc<CampaignDiversityLedger>,
    selector: DiversitySelector,
    policy: RegenerationPolicy,
    advisor_enabled: bool,
}

impl DiversityEngine {
    pub fn new(catalog: PresetCatalog, config: &AppConfig) -> Self {
        let ledger = Arc::new(CampaignDiversityLedger::from_config(&config.diversity));
        Self::with_ledger(catalog, config, ledger)
    }

    /// Build around an existing ledger, e.g. one shared by several engines.
    pub fn with_ledger(
        catalog: PresetCatalog,
        config: &AppConfig,
        ledger: Arc<CampaignDiversityLedger>,
    ) -> Self {
        let catalog = Arc::new(catalog);
        let filter = RelevanceFilter::new(
            catalog.clone(),
            config.diversity.max_candidates_per_dimension,
        );
        let selector = DiversitySelector::new(
            ledger.clone(),
            catalog.clone(),
            SeedDeriver::new(config.diversity.salt_seed_with_clock),
            Duration::from_millis(config.advisor.timeout_ms),
        );

        info!(
            values = catalog.len(),
            max_history = ledger.max_history(),
            fingerprint_history = ledger.fingerprint_history(),
            "diversity engine initialized"
        );

        Self {
            catalog,
            filter,
            ledger,
            selector,
            policy: RegenerationPolicy::from_config(&config.regeneration),
            advisor_enabled: config.advisor.enabled,
        }
    }

    /// Attach an advisor ahead of the seeded fallback. Ignored when the
    /// advisor is disabled in configuration.
    pub fn with_advisor(mut self, client: Arc<dyn AdvisorClient>) -> Self {
        if !self.advisor_enabled {
            info!(advisor = client.name(), "advisor disabled by configuration");
            return self;
        }
        self.selector = self
            .selector
            .with_strategy(Arc::new(AdvisedStrategy::new(client)));
        self
    }

    /// Replace the seed deriver, e.g. with [`SeedDeriver::fixed`] for replays.
    pub fn with_seeds(mut self, seeds: SeedDeriver) -> Self {
        self.selector = self.selector.with_seeds(seeds);
        self
    }

    pub fn catalog(&self) -> &Arc<PresetCatalog> {
        &self.catalog
    }

    pub fn ledger(&self) -> &Arc<CampaignDiversityLedger> {
        &self.ledger
    }

    /// Relevance-filter every catalog dimension.
    pub fn filter_candidates(
        &self,
        brand: &BrandContext,
        product: &ProductContext,
        campaign: &CampaignContext,
    ) -> FilteredCandidateSet {
        let brief = CreativeBrief::new(brand.clone(), product.clone(), campaign.clone());
        self.filter.filter(&brief)
    }

    /// Relevance-filter the dimensions used by one media kind.
    pub fn filter_for(&self, brief: &CreativeBrief, media: MediaKind) -> FilteredCandidateSet {
        self.filter.filter_dimensions(brief, media.dimensions())
    }

    /// Select one value per dimension of `candidates` and record the picks.
    pub async fn select_creative(
        &self,
        campaign_id: &str,
        brief: &CreativeBrief,
        candidates: &FilteredCandidateSet,
        request_index: u64,
    ) -> DiversityResult<SelectionResult> {
        self.selector
            .select_creative(brief, candidates, campaign_id, request_index)
            .await
    }

    /// Filter for `media` then select.
    pub async fn select(
        &self,
        campaign_id: &str,
        brief: &CreativeBrief,
        media: MediaKind,
        request_index: u64,
    ) -> DiversityResult<SelectionResult> {
        let candidates = self.filter_for(brief, media);
        self.select_creative(campaign_id, brief, &candidates, request_index)
            .await
    }

    /// Select, generate, and regenerate on duplicate content.
    /// `max_attempts` overrides the configured attempt budget.
    pub async fn generate_with_diversity(
        &self,
        campaign_id: &str,
        brief: &CreativeBrief,
        media: MediaKind,
        request_index: u64,
        generator: &dyn ContentGenerator,
        max_attempts: Option<u32>,
    ) -> DiversityResult<GenerationOutput> {
        let recent = self.recent_names(campaign_id);
        let mut selection = self.select(campaign_id, brief, media, request_index).await?;

        let policy = match max_attempts {
            Some(n) => self.policy.clone().with_max_attempts(n),
            None => self.policy.clone(),
        };
        let outcome = RegenerationLoop::new(self.ledger.clone(), policy)
            .run(campaign_id, brief, &selection, &recent, generator)
            .await?;

        selection.duplicate_warning = outcome.duplicate_warning;
        Ok(GenerationOutput {
            content: outcome.content,
            selection,
            fingerprint: outcome.fingerprint,
            attempts: outcome.attempts,
            trace: outcome.trace,
        })
    }

    /// Distinct values per dimension window plus a `fingerprints` count.
    pub fn diversity_stats(&self, campaign_id: &str) -> HashMap<String, usize> {
        self.ledger.stats(campaign_id).as_map()
    }

    pub fn usage_history(&self, campaign_id: &str) -> Vec<String> {
        self.selector.usage_history(campaign_id)
    }

    pub fn reset_campaign(&self, campaign_id: &str) {
        self.ledger.reset(campaign_id);
    }

    fn recent_names(&self, campaign_id: &str) -> BTreeMap<Dimension, Vec<String>> {
        self.ledger
            .avoidance_summary(campaign_id, AVOIDANCE_WINDOW)
            .into_iter()
            .map(|(dimension, ids)| {
                let names = ids
                    .iter()
                    .map(|id| self.catalog.name_of(id).to_string())
                    .collect();
                (dimension, names)
            })
            .collect()
    }
}
