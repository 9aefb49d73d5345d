//! Pluggable selection strategies tried in order by the selector.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use creative_core::types::{CreativeBrief, CreativeDimensionValue, Dimension, SelectionSource};

use crate::advisor::{AdvisorClient, AdvisorRequest};
use crate::picker::{SeedDeriver, SeededRandomPicker};

/// Everything a strategy may look at for one selection.
#[derive(Debug)]
pub struct StrategyInput<'a> {
    pub campaign_id: &'a str,
    pub request_index: u64,
    pub brief: &'a CreativeBrief,
    /// Eligible (not recently used) values per dimension still to be chosen.
    pub eligible: &'a BTreeMap<Dimension, Vec<CreativeDimensionValue>>,
    pub usage_history: &'a [String],
    pub seed: u64,
}

/// Value ids proposed by a strategy. The selector validates them.
#[derive(Debug, Clone, Default)]
pub struct StrategyPicks {
    pub picks: HashMap<Dimension, String>,
    pub justification: Option<String>,
}

#[async_trait]
pub trait SelectionStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn source(&self) -> SelectionSource;

    async fn choose(&self, input: &StrategyInput<'_>) -> anyhow::Result<StrategyPicks>;
}

/// Delegates to an [`AdvisorClient`].
pub struct AdvisedStrategy {
    client: Arc<dyn AdvisorClient>,
}

impl AdvisedStrategy {
    pub fn new(client: Arc<dyn AdvisorClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl SelectionStrategy for AdvisedStrategy {
    fn name(&self) -> &str {
        self.client.name()
    }

    fn source(&self) -> SelectionSource {
        SelectionSource::Advisor
    }

    async fn choose(&self, input: &StrategyInput<'_>) -> anyhow::Result<StrategyPicks> {
        let request = AdvisorRequest {
            campaign_id: input.campaign_id.to_string(),
            request_index: input.request_index,
            brief: input.brief.clone(),
            candidates: input.eligible.clone(),
            usage_history: input.usage_history.to_vec(),
        };
        let response = self.client.recommend(&request).await?;
        Ok(StrategyPicks {
            picks: response.picks,
            justification: response.justification,
        })
    }
}

/// Terminal fallback: a seeded uniform pick per dimension.
#[derive(Debug, Clone, Copy, Default)]
pub struct SeededRandomStrategy {
    picker: SeededRandomPicker,
}

impl SeededRandomStrategy {
    /// Infallible pick for every non-empty dimension of `eligible`.
    pub fn pick_all(
        &self,
        eligible: &BTreeMap<Dimension, Vec<CreativeDimensionValue>>,
        seed: u64,
    ) -> HashMap<Dimension, String> {
        eligible
            .iter()
            .filter_map(|(dimension, values)| {
                let dim_seed = SeedDeriver::for_dimension(seed, *dimension);
                self.picker
                    .pick(values, dim_seed)
                    .map(|v| (*dimension, v.id.clone()))
            })
            .collect()
    }
}

#[async_trait]
impl SelectionStrategy for SeededRandomStrategy {
    fn name(&self) -> &str {
        "seeded_random"
    }

    fn source(&self) -> SelectionSource {
        SelectionSource::SeededRandom
    }

    async fn choose(&self, input: &StrategyInput<'_>) -> anyhow::Result<StrategyPicks> {
        Ok(StrategyPicks {
            picks: self.pick_all(input.eligible, input.seed),
            justification: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::advisor::AdvisorResponse;

    fn values(prefix: &str, dimension: Dimension, n: usize) -> Vec<CreativeDimensionValue> {
        (0..n)
            .map(|i| CreativeDimensionValue {
                id: format!("{prefix}{i}"),
                name: format!("{prefix} {i}"),
                dimension,
                description: String::new(),
                sector_tags: vec![],
                category_tags: vec![],
                mood_tags: vec![],
                attributes: Default::default(),
            })
            .collect()
    }

    fn eligible() -> BTreeMap<Dimension, Vec<CreativeDimensionValue>> {
        let mut map = BTreeMap::new();
        map.insert(Dimension::Style, values("s", Dimension::Style, 4));
        map.insert(Dimension::Palette, values("p", Dimension::Palette, 3));
        map.insert(Dimension::Concept, vec![]);
        map
    }

    #[tokio::test]
    async fn test_seeded_random_covers_non_empty_dimensions() {
        let eligible = eligible();
        let brief = CreativeBrief::default();
        let input = StrategyInput {
            campaign_id: "c1",
            request_index: 0,
            brief: &brief,
            eligible: &eligible,
            usage_history: &[],
            seed: 11,
        };
        let picks = SeededRandomStrategy::default().choose(&input).await.unwrap();
        assert_eq!(picks.picks.len(), 2);
        assert!(picks.picks[&Dimension::Style].starts_with('s'));
        assert!(picks.picks[&Dimension::Palette].starts_with('p'));

        let again = SeededRandomStrategy::default().pick_all(&eligible, 11);
        assert_eq!(again, picks.picks);
    }

    struct FirstChoice;

    #[async_trait]
    impl AdvisorClient for FirstChoice {
        fn name(&self) -> &str {
            "first"
        }

        async fn recommend(&self, request: &AdvisorRequest) -> anyhow::Result<AdvisorResponse> {
            let picks = request
                .candidates
                .iter()
                .filter_map(|(d, v)| v.first().map(|v| (*d, v.id.clone())))
                .collect();
            Ok(AdvisorResponse {
                picks,
                justification: Some(format!("{} lines of history", request.usage_history.len())),
            })
        }
    }

    #[tokio::test]
    async fn test_advised_strategy_forwards_request() {
        let eligible = eligible();
        let brief = CreativeBrief::default();
        let history = vec!["Style: s 1".to_string()];
        let input = StrategyInput {
            campaign_id: "c1",
            request_index: 4,
            brief: &brief,
            eligible: &eligible,
            usage_history: &history,
            seed: 0,
        };
        let strategy = AdvisedStrategy::new(Arc::new(FirstChoice));
        let picks = strategy.choose(&input).await.unwrap();
        assert_eq!(strategy.name(), "first");
        assert_eq!(strategy.source(), SelectionSource::Advisor);
        assert_eq!(picks.picks[&Dimension::Style], "s0");
        assert_eq!(picks.justification.as_deref(), Some("1 lines of history"));
    }
}
