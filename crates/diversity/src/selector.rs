//! Anti-repetition selection over filtered candidates.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use creative_core::error::{DiversityError, DiversityResult};
use creative_core::types::{
    CreativeBrief, CreativeDimensionValue, Dimension, DimensionChoice, SelectionResult,
    SelectionSource,
};
use creative_ledger::CampaignDiversityLedger;
use tracing::{debug, info, warn};

use crate::advisor::AdvisorUnavailable;
use crate::catalog::PresetCatalog;
use crate::filter::FilteredCandidateSet;
use crate::picker::SeedDeriver;
use crate::strategy::{SeededRandomStrategy, SelectionStrategy, StrategyInput};

/// Eligible values for one dimension and whether repetition was forced.
struct Eligible {
    values: Vec<CreativeDimensionValue>,
    repeated: bool,
}

/// Picks one value per dimension, avoiding values the campaign used
/// recently. Strategies are tried in order under a shared timeout and the
/// seeded random picker covers whatever they left unresolved.
pub struct DiversitySelector {
    ledger: Arc<CampaignDiversityLedger>,
    catalog: Arc<PresetCatalog>,
    strategies: Vec<Arc<dyn SelectionStrategy>>,
    fallback: SeededRandomStrategy,
    seeds: SeedDeriver,
    strategy_timeout: Duration,
}

impl DiversitySelector {
    pub fn new(
        ledger: Arc<CampaignDiversityLedger>,
        catalog: Arc<PresetCatalog>,
        seeds: SeedDeriver,
        strategy_timeout: Duration,
    ) -> Self {
        Self {
            ledger,
            catalog,
            strategies: Vec::new(),
            fallback: SeededRandomStrategy::default(),
            seeds,
            strategy_timeout,
        }
    }

    /// Append a strategy. Earlier strategies take precedence.
    pub fn with_strategy(mut self, strategy: Arc<dyn SelectionStrategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    pub fn with_seeds(mut self, seeds: SeedDeriver) -> Self {
        self.seeds = seeds;
        self
    }

    pub fn ledger(&self) -> &Arc<CampaignDiversityLedger> {
        &self.ledger
    }

    /// Display lines of what the campaign used recently.
    pub fn usage_history(&self, campaign_id: &str) -> Vec<String> {
        self.ledger
            .usage_history(campaign_id, |id| self.catalog.name_of(id).to_string())
    }

    /// Choose a single dimension with an explicit seed.
    pub async fn select(
        &self,
        brief: &CreativeBrief,
        candidates: &FilteredCandidateSet,
        campaign_id: &str,
        dimension: Dimension,
        seed: u64,
    ) -> DiversityResult<CreativeDimensionValue> {
        let mut result = self
            .select_with_seed(brief, candidates, campaign_id, &[dimension], 0, seed)
            .await?;
        result
            .choices
            .remove(&dimension)
            .map(|c| c.value)
            .ok_or(DiversityError::CatalogEmpty { dimension })
    }

    /// Choose every dimension present in `candidates`. Each position in the
    /// strategy chain is an attempt: strategy `n` and then the fallback get
    /// the seed derived from `(campaign_id, request_index, n)`.
    pub async fn select_creative(
        &self,
        brief: &CreativeBrief,
        candidates: &FilteredCandidateSet,
        campaign_id: &str,
        request_index: u64,
    ) -> DiversityResult<SelectionResult> {
        let dimensions: Vec<Dimension> = candidates.dimensions().collect();
        let seed_for = |attempt: u32| self.seeds.derive(campaign_id, request_index, attempt);
        self.run_chain(brief, candidates, campaign_id, &dimensions, request_index, &seed_for)
            .await
    }

    /// Choose `dimensions` with one seed shared by every attempt.
    pub async fn select_with_seed(
        &self,
        brief: &CreativeBrief,
        candidates: &FilteredCandidateSet,
        campaign_id: &str,
        dimensions: &[Dimension],
        request_index: u64,
        seed: u64,
    ) -> DiversityResult<SelectionResult> {
        let seed_for = |_attempt: u32| seed;
        self.run_chain(brief, candidates, campaign_id, dimensions, request_index, &seed_for)
            .await
    }

    async fn run_chain(
        &self,
        brief: &CreativeBrief,
        candidates: &FilteredCandidateSet,
        campaign_id: &str,
        dimensions: &[Dimension],
        request_index: u64,
        seed_for: &(dyn Fn(u32) -> u64 + Sync),
    ) -> DiversityResult<SelectionResult> {
        let mut pending = BTreeMap::new();
        for &dimension in dimensions {
            pending.insert(dimension, self.eligible(candidates, campaign_id, dimension)?);
        }

        let usage_history = self.usage_history(campaign_id);
        let mut choices: HashMap<Dimension, DimensionChoice> = HashMap::new();
        let mut justification = None;

        for (attempt, strategy) in (0u32..).zip(&self.strategies) {
            if pending.is_empty() {
                break;
            }
            let eligible: BTreeMap<Dimension, Vec<CreativeDimensionValue>> = pending
                .iter()
                .map(|(d, e)| (*d, e.values.clone()))
                .collect();
            let input = StrategyInput {
                campaign_id,
                request_index,
                brief,
                eligible: &eligible,
                usage_history: &usage_history,
                seed: seed_for(attempt),
            };

            let picks =
                match tokio::time::timeout(self.strategy_timeout, strategy.choose(&input)).await {
                    Ok(Ok(picks)) => picks,
                    Ok(Err(e)) => {
                        let reason = AdvisorUnavailable::Failed(e.to_string());
                        warn!(
                            campaign_id,
                            strategy = strategy.name(),
                            error = %reason,
                            "strategy failed, falling back"
                        );
                        continue;
                    }
                    Err(_) => {
                        let reason = AdvisorUnavailable::Timeout {
                            after_ms: self.strategy_timeout.as_millis() as u64,
                        };
                        warn!(
                            campaign_id,
                            strategy = strategy.name(),
                            error = %reason,
                            "strategy timed out, falling back"
                        );
                        continue;
                    }
                };

            for (dimension, id) in picks.picks {
                let Some(entry) = pending.get(&dimension) else {
                    continue;
                };
                match entry.values.iter().find(|v| v.id == id) {
                    Some(value) => {
                        let choice = DimensionChoice {
                            value: value.clone(),
                            source: strategy.source(),
                            repeated: entry.repeated,
                        };
                        if strategy.source() == SelectionSource::Advisor {
                            metrics::counter!("diversity.selection.advisor").increment(1);
                        }
                        choices.insert(dimension, choice);
                        pending.remove(&dimension);
                    }
                    None => {
                        let reason = AdvisorUnavailable::InvalidResponse(format!(
                            "'{id}' is not an eligible {dimension}"
                        ));
                        warn!(
                            campaign_id,
                            strategy = strategy.name(),
                            error = %reason,
                            "rejected pick"
                        );
                    }
                }
            }
            if picks.justification.is_some() {
                justification = picks.justification;
            }
        }

        if !pending.is_empty() {
            let eligible: BTreeMap<Dimension, Vec<CreativeDimensionValue>> = pending
                .iter()
                .map(|(d, e)| (*d, e.values.clone()))
                .collect();
            let attempt = u32::try_from(self.strategies.len()).unwrap_or(u32::MAX);
            let picks = self.fallback.pick_all(&eligible, seed_for(attempt));
            for (dimension, entry) in pending {
                let value = picks
                    .get(&dimension)
                    .and_then(|id| entry.values.iter().find(|v| &v.id == id))
                    .cloned()
                    .ok_or(DiversityError::CatalogEmpty { dimension })?;
                metrics::counter!("diversity.selection.fallback").increment(1);
                choices.insert(
                    dimension,
                    DimensionChoice {
                        value,
                        source: SelectionSource::SeededRandom,
                        repeated: entry.repeated,
                    },
                );
            }
        }

        for (dimension, choice) in &choices {
            self.ledger
                .record_selection(campaign_id, *dimension, &choice.value.id);
        }
        metrics::counter!("diversity.selection.total").increment(1);

        let result = SelectionResult {
            campaign_id: campaign_id.to_string(),
            request_index,
            choices,
            advisor_justification: justification,
            duplicate_warning: false,
            selected_at: Utc::now(),
        };
        info!(
            campaign_id,
            request_index,
            selection = ?result.describe(),
            "creative selection complete"
        );
        Ok(result)
    }

    /// Candidates minus recent picks, or all candidates when every one was
    /// used recently.
    fn eligible(
        &self,
        candidates: &FilteredCandidateSet,
        campaign_id: &str,
        dimension: Dimension,
    ) -> DiversityResult<Eligible> {
        let all = candidates.values(dimension);
        if all.is_empty() {
            return Err(DiversityError::CatalogEmpty { dimension });
        }

        let used = self.ledger.recently_used(campaign_id, dimension);
        let fresh: Vec<CreativeDimensionValue> =
            all.iter().filter(|v| !used.contains(&v.id)).cloned().collect();

        if fresh.is_empty() {
            debug!(
                campaign_id,
                %dimension,
                candidates = all.len(),
                "all candidates used recently, accepting repetition"
            );
            return Ok(Eligible {
                values: all.to_vec(),
                repeated: true,
            });
        }
        Ok(Eligible {
            values: fresh,
            repeated: false,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::strategy::StrategyPicks;
    use async_trait::async_trait;

    fn value(id: &str, dimension: Dimension) -> CreativeDimensionValue {
        CreativeDimensionValue {
            id: id.to_string(),
            name: id.to_uppercase(),
            dimension,
            description: String::new(),
            sector_tags: vec![],
            category_tags: vec![],
            mood_tags: vec![],
            attributes: Default::default(),
        }
    }

    fn candidates(ids: &[&str]) -> FilteredCandidateSet {
        FilteredCandidateSet::new().with_values(
            Dimension::Style,
            ids.iter().map(|id| value(id, Dimension::Style)).collect(),
        )
    }

    fn selector(max_history: usize) -> DiversitySelector {
        DiversitySelector::new(
            Arc::new(CampaignDiversityLedger::new(max_history, 5)),
            Arc::new(PresetCatalog::default()),
            SeedDeriver::fixed(0),
            Duration::from_millis(50),
        )
    }

    /// Always proposes the given id.
    struct Fixed(&'static str);

    #[async_trait]
    impl SelectionStrategy for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn source(&self) -> SelectionSource {
            SelectionSource::Advisor
        }
        async fn choose(&self, _input: &StrategyInput<'_>) -> anyhow::Result<StrategyPicks> {
            let mut picks = HashMap::new();
            picks.insert(Dimension::Style, self.0.to_string());
            Ok(StrategyPicks {
                picks,
                justification: Some("fixed".into()),
            })
        }
    }

    /// Proposes nothing and remembers the seed it was handed.
    #[derive(Default)]
    struct SeedRecorder {
        seeds: parking_lot::Mutex<Vec<u64>>,
    }

    #[async_trait]
    impl SelectionStrategy for SeedRecorder {
        fn name(&self) -> &str {
            "recorder"
        }
        fn source(&self) -> SelectionSource {
            SelectionSource::Advisor
        }
        async fn choose(&self, input: &StrategyInput<'_>) -> anyhow::Result<StrategyPicks> {
            self.seeds.lock().push(input.seed);
            Ok(StrategyPicks::default())
        }
    }

    #[tokio::test]
    async fn test_each_chain_position_gets_its_own_attempt_seed() {
        let first = Arc::new(SeedRecorder::default());
        let second = Arc::new(SeedRecorder::default());
        let selector = selector(5)
            .with_strategy(first.clone())
            .with_strategy(second.clone());
        let set = candidates(&["a", "b", "c", "d", "e", "f", "g", "h"]);

        let result = selector
            .select_creative(&CreativeBrief::default(), &set, "c1", 4)
            .await
            .unwrap();

        let seeds = SeedDeriver::fixed(0);
        assert_eq!(*first.seeds.lock(), vec![seeds.derive("c1", 4, 0)]);
        assert_eq!(*second.seeds.lock(), vec![seeds.derive("c1", 4, 1)]);

        let eligible = BTreeMap::from([(Dimension::Style, set.values(Dimension::Style).to_vec())]);
        let expected =
            SeededRandomStrategy::default().pick_all(&eligible, seeds.derive("c1", 4, 2));
        assert_eq!(result.value_id(Dimension::Style), Some(expected[&Dimension::Style].as_str()));
        assert_eq!(result.choices[&Dimension::Style].source, SelectionSource::SeededRandom);
    }

    #[tokio::test]
    async fn test_sequential_picks_are_distinct_within_history() {
        let selector = selector(5);
        let set = candidates(&["a", "b", "c", "d", "e", "f"]);
        let brief = CreativeBrief::default();

        let mut seen = std::collections::HashSet::new();
        for i in 0..5 {
            let result = selector.select_creative(&brief, &set, "c1", i).await.unwrap();
            let choice = &result.choices[&Dimension::Style];
            assert_eq!(choice.source, SelectionSource::SeededRandom);
            assert!(!choice.repeated);
            assert!(seen.insert(choice.value.id.clone()));
        }
        assert_eq!(selector.ledger().history_len("c1", Dimension::Style), 5);
    }

    #[tokio::test]
    async fn test_exhausted_candidates_allow_repetition() {
        let selector = selector(5);
        let set = candidates(&["a", "b"]);
        let brief = CreativeBrief::default();

        selector.select_creative(&brief, &set, "c1", 0).await.unwrap();
        selector.select_creative(&brief, &set, "c1", 1).await.unwrap();
        let third = selector.select_creative(&brief, &set, "c1", 2).await.unwrap();
        assert!(third.choices[&Dimension::Style].repeated);
    }

    #[tokio::test]
    async fn test_empty_dimension_is_an_error() {
        let selector = selector(5);
        let set = FilteredCandidateSet::new().with_values(Dimension::Angle, vec![]);
        let err = selector
            .select_creative(&CreativeBrief::default(), &set, "c1", 0)
            .await
            .unwrap_err();
        assert!(matches!(err, DiversityError::CatalogEmpty { dimension: Dimension::Angle }));
    }

    #[tokio::test]
    async fn test_valid_strategy_pick_is_used() {
        let selector = selector(5).with_strategy(Arc::new(Fixed("b")));
        let set = candidates(&["a", "b", "c"]);
        let result = selector
            .select_creative(&CreativeBrief::default(), &set, "c1", 0)
            .await
            .unwrap();
        assert_eq!(result.value_id(Dimension::Style), Some("b"));
        assert_eq!(result.choices[&Dimension::Style].source, SelectionSource::Advisor);
        assert_eq!(result.advisor_justification.as_deref(), Some("fixed"));
    }

    #[tokio::test]
    async fn test_recently_used_strategy_pick_is_rejected() {
        let selector = selector(5).with_strategy(Arc::new(Fixed("b")));
        let set = candidates(&["a", "b", "c"]);
        let brief = CreativeBrief::default();
        selector.select_creative(&brief, &set, "c1", 0).await.unwrap();

        let second = selector.select_creative(&brief, &set, "c1", 1).await.unwrap();
        let choice = &second.choices[&Dimension::Style];
        assert_eq!(choice.source, SelectionSource::SeededRandom);
        assert_ne!(choice.value.id, "b");
    }

    #[tokio::test]
    async fn test_single_dimension_select_records() {
        let selector = selector(5);
        let set = candidates(&["a", "b", "c"]);
        let value = selector
            .select(&CreativeBrief::default(), &set, "c1", Dimension::Style, 99)
            .await
            .unwrap();
        assert!(selector
            .ledger()
            .recently_used("c1", Dimension::Style)
            .contains(&value.id));
        assert_eq!(selector.usage_history("c1").len(), 1);
    }
}
