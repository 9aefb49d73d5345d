//! Bounded regenerate-on-duplicate loop around an external content generator.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use creative_core::config::RegenerationConfig;
use creative_core::error::{DiversityError, DiversityResult};
use creative_core::types::{CreativeBrief, Dimension, SelectionResult};
use creative_ledger::CampaignDiversityLedger;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::fingerprint::ContentHasher;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopState {
    Initial,
    Generated,
    DuplicateDetected,
    Regenerating,
    Accepted,
    Exhausted,
}

/// One call to the content generator.
#[derive(Debug)]
pub struct GenerationRequest<'a> {
    pub campaign_id: &'a str,
    pub brief: &'a CreativeBrief,
    pub selection: &'a SelectionResult,
    /// Zero-based attempt number.
    pub attempt: u32,
    /// Sampling temperature handed to the provider.
    pub randomness: f64,
    /// Extra instruction sent on regeneration attempts.
    pub avoidance: Option<String>,
}

#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, request: &GenerationRequest<'_>) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct RegenerationPolicy {
    pub max_attempts: u32,
    pub base_randomness: f64,
    pub randomness_step: f64,
    pub max_randomness: f64,
    pub generation_timeout: Duration,
}

impl RegenerationPolicy {
    pub fn from_config(config: &RegenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_randomness: config.base_randomness,
            randomness_step: config.randomness_step,
            max_randomness: config.max_randomness,
            generation_timeout: Duration::from_millis(config.generation_timeout_ms),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Base randomness raised by one step per attempt, capped.
    pub fn randomness_for(&self, attempt: u32) -> f64 {
        (self.base_randomness + self.randomness_step * f64::from(attempt)).min(self.max_randomness)
    }
}

impl Default for RegenerationPolicy {
    fn default() -> Self {
        Self::from_config(&RegenerationConfig::default())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RegenerationOutcome {
    pub content: String,
    pub fingerprint: u32,
    pub attempts: u32,
    pub duplicate_warning: bool,
    pub trace: Vec<LoopState>,
}

/// Instruction listing recent values per dimension and colliding fingerprints.
pub fn avoidance_instructions(
    recent: &BTreeMap<Dimension, Vec<String>>,
    collisions: &[u32],
) -> String {
    let mut out = String::from(
        "The previous draft was too similar to recent content. Write something clearly different.",
    );
    if !recent.is_empty() {
        out.push_str("\nAvoid repeating these recently used directions:");
        for (dimension, names) in recent {
            if names.is_empty() {
                continue;
            }
            let _ = write!(out, "\n- {}: {}", dimension.label(), names.join(", "));
        }
    }
    if !collisions.is_empty() {
        let joined: Vec<String> = collisions.iter().map(u32::to_string).collect();
        let _ = write!(out, "\nColliding content fingerprints: {}", joined.join(", "));
    }
    out
}

pub struct RegenerationLoop {
    ledger: Arc<CampaignDiversityLedger>,
    hasher: ContentHasher,
    policy: RegenerationPolicy,
}

impl RegenerationLoop {
    pub fn new(ledger: Arc<CampaignDiversityLedger>, policy: RegenerationPolicy) -> Self {
        Self {
            ledger,
            hasher: ContentHasher,
            policy,
        }
    }

    pub fn policy(&self) -> &RegenerationPolicy {
        &self.policy
    }

    /// Generate until the content fingerprint is new to the campaign or the
    /// attempt budget runs out. `recent` holds display names of values the
    /// campaign used before this selection.
    pub async fn run(
        &self,
        campaign_id: &str,
        brief: &CreativeBrief,
        selection: &SelectionResult,
        recent: &BTreeMap<Dimension, Vec<String>>,
        generator: &dyn ContentGenerator,
    ) -> DiversityResult<RegenerationOutcome> {
        let mut trace = vec![LoopState::Initial];
        let mut collisions: Vec<u32> = Vec::new();
        let mut last_draft: Option<(String, u32)> = None;
        let mut last_error: Option<anyhow::Error> = None;
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempts = 0;

        while attempts < max_attempts {
            let attempt = attempts;
            attempts += 1;
            if attempt > 0 {
                trace.push(LoopState::Regenerating);
            }

            let request = GenerationRequest {
                campaign_id,
                brief,
                selection,
                attempt,
                randomness: self.policy.randomness_for(attempt),
                avoidance: (attempt > 0).then(|| avoidance_instructions(recent, &collisions)),
            };
            debug!(campaign_id, attempt, randomness = request.randomness, "generating content");

            let content = match tokio::time::timeout(
                self.policy.generation_timeout,
                generator.generate(&request),
            )
            .await
            {
                Ok(Ok(content)) => content,
                Ok(Err(e)) => {
                    warn!(campaign_id, attempt, error = %e, "content generation failed");
                    last_error = Some(e);
                    continue;
                }
                Err(_) => {
                    let timeout_ms = self.policy.generation_timeout.as_millis() as u64;
                    warn!(campaign_id, attempt, timeout_ms, "content generation timed out");
                    last_error = Some(anyhow::anyhow!(
                        "content generation timed out after {timeout_ms}ms"
                    ));
                    continue;
                }
            };
            trace.push(LoopState::Generated);

            let fingerprint = self.hasher.fingerprint(&content);
            if self.ledger.check_and_record_fingerprint(campaign_id, fingerprint) {
                trace.push(LoopState::Accepted);
                info!(campaign_id, attempts, fingerprint, "content accepted");
                return Ok(RegenerationOutcome {
                    content,
                    fingerprint,
                    attempts,
                    duplicate_warning: false,
                    trace,
                });
            }

            trace.push(LoopState::DuplicateDetected);
            metrics::counter!("diversity.regeneration.duplicate").increment(1);
            debug!(campaign_id, attempt, fingerprint, "duplicate content fingerprint");
            collisions.push(fingerprint);
            last_draft = Some((content, fingerprint));
        }

        trace.push(LoopState::Exhausted);
        let Some((content, fingerprint)) = last_draft else {
            return Err(DiversityError::GenerationFailed {
                attempts,
                source: last_error
                    .unwrap_or_else(|| anyhow::anyhow!("generator produced no content")),
            });
        };

        self.ledger.record_fingerprint(campaign_id, fingerprint);
        trace.push(LoopState::Accepted);
        metrics::counter!("diversity.regeneration.exhausted").increment(1);
        warn!(
            campaign_id,
            attempts, fingerprint, "regeneration attempts exhausted, accepting duplicate draft"
        );
        Ok(RegenerationOutcome {
            content,
            fingerprint,
            attempts,
            duplicate_warning: true,
            trace,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicU32, Ordering};

    use chrono::Utc;
    use parking_lot::Mutex;

    fn selection() -> SelectionResult {
        SelectionResult {
            campaign_id: "c1".into(),
            request_index: 0,
            choices: HashMap::new(),
            advisor_justification: None,
            duplicate_warning: false,
            selected_at: Utc::now(),
        }
    }

    /// Returns scripted replies in order, repeating the last one.
    struct Scripted {
        replies: Vec<anyhow::Result<String>>,
        calls: AtomicU32,
        seen: Mutex<Vec<(f64, Option<String>)>>,
    }

    impl Scripted {
        fn new(replies: Vec<anyhow::Result<String>>) -> Self {
            Self {
                replies,
                calls: AtomicU32::new(0),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContentGenerator for Scripted {
        async fn generate(&self, request: &GenerationRequest<'_>) -> anyhow::Result<String> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) as usize;
            self.seen
                .lock()
                .push((request.randomness, request.avoidance.clone()));
            match &self.replies[n.min(self.replies.len() - 1)] {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!("{e}")),
            }
        }
    }

    fn looper(max_attempts: u32) -> (Arc<CampaignDiversityLedger>, RegenerationLoop) {
        let ledger = Arc::new(CampaignDiversityLedger::new(10, 10));
        let policy = RegenerationPolicy::default().with_max_attempts(max_attempts);
        (ledger.clone(), RegenerationLoop::new(ledger, policy))
    }

    #[test]
    fn test_randomness_escalates_and_caps() {
        let policy = RegenerationPolicy::default();
        assert!((policy.randomness_for(0) - 0.9).abs() < 1e-9);
        assert!((policy.randomness_for(1) - 0.95).abs() < 1e-9);
        assert!((policy.randomness_for(5) - 1.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_fresh_content_accepted_first_try() {
        let (ledger, looper) = looper(3);
        let generator = Scripted::new(vec![Ok("sunny beach picnic basket".into())]);
        let outcome = looper
            .run("c1", &CreativeBrief::default(), &selection(), &BTreeMap::new(), &generator)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 1);
        assert!(!outcome.duplicate_warning);
        assert_eq!(
            outcome.trace,
            vec![LoopState::Initial, LoopState::Generated, LoopState::Accepted]
        );
        assert!(ledger.is_fingerprint_seen("c1", outcome.fingerprint));
    }

    #[tokio::test]
    async fn test_duplicate_triggers_regeneration_with_avoidance() {
        let (ledger, looper) = looper(3);
        let hasher = ContentHasher;
        ledger.record_fingerprint("c1", hasher.fingerprint("golden morning light"));

        let generator = Scripted::new(vec![
            Ok("Golden morning light!".into()),
            Ok("midnight neon skyline".into()),
        ]);
        let mut recent = BTreeMap::new();
        recent.insert(Dimension::Lighting, vec!["Golden Hour Morning".to_string()]);

        let outcome = looper
            .run("c1", &CreativeBrief::default(), &selection(), &recent, &generator)
            .await
            .unwrap();
        assert_eq!(outcome.attempts, 2);
        assert!(!outcome.duplicate_warning);
        assert_eq!(outcome.content, "midnight neon skyline");

        let seen = generator.seen.lock();
        assert!(seen[0].1.is_none());
        let avoidance = seen[1].1.as_deref().unwrap();
        assert!(avoidance.contains("Lighting: Golden Hour Morning"));
        assert!(seen[1].0 > seen[0].0);
    }

    #[tokio::test]
    async fn test_failures_consume_attempts_then_surface() {
        let (_, looper) = looper(2);
        let generator = Scripted::new(vec![Err(anyhow::anyhow!("provider down"))]);
        let err = looper
            .run("c1", &CreativeBrief::default(), &selection(), &BTreeMap::new(), &generator)
            .await
            .unwrap_err();
        match err {
            DiversityError::GenerationFailed { attempts, source } => {
                assert_eq!(attempts, 2);
                assert!(source.to_string().contains("provider down"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(generator.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_after_duplicate_accepts_draft() {
        let (ledger, looper) = looper(2);
        ledger.record_fingerprint("c1", ContentHasher.fingerprint("same words again"));
        let generator = Scripted::new(vec![
            Ok("same words again".into()),
            Err(anyhow::anyhow!("boom")),
        ]);
        let outcome = looper
            .run("c1", &CreativeBrief::default(), &selection(), &BTreeMap::new(), &generator)
            .await
            .unwrap();
        assert!(outcome.duplicate_warning);
        assert_eq!(outcome.content, "same words again");
    }

    struct Slow;

    #[async_trait]
    impl ContentGenerator for Slow {
        async fn generate(&self, _request: &GenerationRequest<'_>) -> anyhow::Result<String> {
            tokio::time::sleep(Duration::from_secs(120)).await;
            Ok("late".into())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_generation_timeout_counts_as_failure() {
        let (_, looper) = looper(1);
        let err = looper
            .run("c1", &CreativeBrief::default(), &selection(), &BTreeMap::new(), &Slow)
            .await
            .unwrap_err();
        assert!(matches!(err, DiversityError::GenerationFailed { attempts: 1, .. }));
    }

    struct Constant(&'static str);

    #[async_trait]
    impl ContentGenerator for Constant {
        async fn generate(&self, _request: &GenerationRequest<'_>) -> anyhow::Result<String> {
            tokio::task::yield_now().await;
            Ok(self.0.to_string())
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_identical_drafts_accept_one_as_new() {
        let ledger = Arc::new(CampaignDiversityLedger::new(10, 10));
        let mut handles = Vec::new();
        for _ in 0..8 {
            let policy = RegenerationPolicy::default().with_max_attempts(1);
            let looper = RegenerationLoop::new(ledger.clone(), policy);
            handles.push(tokio::spawn(async move {
                let brief = CreativeBrief::default();
                let generator = Constant("same launch teaser copy");
                looper
                    .run("c1", &brief, &selection(), &BTreeMap::new(), &generator)
                    .await
                    .unwrap()
            }));
        }

        let mut fresh = 0;
        for handle in handles {
            if !handle.await.unwrap().duplicate_warning {
                fresh += 1;
            }
        }
        assert_eq!(fresh, 1);
        assert_eq!(ledger.recent_fingerprints("c1").len(), 8);
    }

    #[test]
    fn test_avoidance_instructions_lists_everything() {
        let mut recent = BTreeMap::new();
        recent.insert(Dimension::Style, vec!["A".to_string(), "B".to_string()]);
        let text = avoidance_instructions(&recent, &[12, 34]);
        assert!(text.contains("- Style: A, B"));
        assert!(text.contains("12, 34"));
    }
}
