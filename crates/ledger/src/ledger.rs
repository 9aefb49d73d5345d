//! Per-campaign anti-repetition ledger.
//!
//! Campaign states live in a `DashMap`, each behind its own mutex, so writes
//! for one campaign are serialized while other campaigns proceed untouched.
//! The map shard guard is always released before a campaign lock is taken.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use creative_core::config::DiversityConfig;
use creative_core::types::Dimension;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info};

use crate::history::BoundedHistory;

/// Mutable diversity state of a single campaign.
#[derive(Debug)]
pub struct CampaignDiversityState {
    selections: HashMap<Dimension, BoundedHistory<String>>,
    fingerprints: BoundedHistory<u32>,
    max_history: usize,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl CampaignDiversityState {
    fn new(max_history: usize, fingerprint_history: usize) -> Self {
        let now = Utc::now();
        Self {
            selections: HashMap::new(),
            fingerprints: BoundedHistory::new(fingerprint_history),
            max_history,
            created_at: now,
            updated_at: now,
        }
    }

    fn record_selection(&mut self, dimension: Dimension, value_id: String) -> Option<String> {
        self.updated_at = Utc::now();
        let max_history = self.max_history;
        self.selections
            .entry(dimension)
            .or_insert_with(|| BoundedHistory::new(max_history))
            .push(value_id)
    }

    fn record_fingerprint(&mut self, fingerprint: u32) -> Option<u32> {
        self.updated_at = Utc::now();
        self.fingerprints.push(fingerprint)
    }

    /// Record `fingerprint` unless already in the window. `None` means it
    /// was a duplicate; otherwise carries whatever the push evicted.
    fn record_new_fingerprint(&mut self, fingerprint: u32) -> Option<Option<u32>> {
        if self.fingerprints.contains(&fingerprint) {
            return None;
        }
        Some(self.record_fingerprint(fingerprint))
    }

    fn clear(&mut self) {
        self.selections.clear();
        self.fingerprints.clear();
        self.updated_at = Utc::now();
    }
}

/// Snapshot of a campaign's diversity windows.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DiversityStats {
    /// Distinct values currently in each dimension's window.
    pub distinct_per_dimension: BTreeMap<Dimension, usize>,
    /// Raw window length per dimension (including repeats).
    pub window_len_per_dimension: BTreeMap<Dimension, usize>,
    pub fingerprints: usize,
    /// When the campaign state was first created. `None` for unknown campaigns.
    pub created_at: Option<DateTime<Utc>>,
    /// Last write to the campaign state.
    pub updated_at: Option<DateTime<Utc>>,
}

impl DiversityStats {
    /// Flattened `name -> count` view: one key per dimension plus `fingerprints`.
    pub fn as_map(&self) -> HashMap<String, usize> {
        let mut out: HashMap<String, usize> = self
            .distinct_per_dimension
            .iter()
            .map(|(d, n)| (d.as_str().to_string(), *n))
            .collect();
        out.insert("fingerprints".to_string(), self.fingerprints);
        out
    }
}

/// Registry of campaign diversity states. Construct once per process and
/// share it (behind an `Arc`) with every selector.
pub struct CampaignDiversityLedger {
    campaigns: DashMap<String, Arc<Mutex<CampaignDiversityState>>>,
    max_history: usize,
    fingerprint_history: usize,
}

impl CampaignDiversityLedger {
    pub fn new(max_history: usize, fingerprint_history: usize) -> Self {
        Self {
            campaigns: DashMap::new(),
            max_history: max_history.max(1),
            fingerprint_history: fingerprint_history.max(1),
        }
    }

    pub fn from_config(config: &DiversityConfig) -> Self {
        Self::new(config.max_history, config.fingerprint_history)
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    pub fn fingerprint_history(&self) -> usize {
        self.fingerprint_history
    }

    /// Get or lazily create the state handle for a campaign.
    fn state(&self, campaign_id: &str) -> Arc<Mutex<CampaignDiversityState>> {
        if let Some(existing) = self.campaigns.get(campaign_id) {
            return existing.value().clone();
        }
        self.campaigns
            .entry(campaign_id.to_string())
            .or_insert_with(|| {
                info!(campaign_id, "creating campaign diversity state");
                Arc::new(Mutex::new(CampaignDiversityState::new(
                    self.max_history,
                    self.fingerprint_history,
                )))
            })
            .value()
            .clone()
    }

    /// Existing state handle, without creating one.
    fn peek(&self, campaign_id: &str) -> Option<Arc<Mutex<CampaignDiversityState>>> {
        self.campaigns.get(campaign_id).map(|e| e.value().clone())
    }

    /// Append a chosen value to the dimension's window, evicting the oldest
    /// entry when the window is full. Returns the evicted id.
    pub fn record_selection(
        &self,
        campaign_id: &str,
        dimension: Dimension,
        value_id: &str,
    ) -> Option<String> {
        let state = self.state(campaign_id);
        let evicted = state.lock().record_selection(dimension, value_id.to_string());
        if let Some(old) = &evicted {
            metrics::counter!("diversity.ledger.evictions").increment(1);
            debug!(campaign_id, %dimension, evicted = %old, "selection evicted from history");
        }
        evicted
    }

    /// Run `f` against an existing campaign state under its lock.
    fn with_state<R>(
        &self,
        campaign_id: &str,
        f: impl FnOnce(&CampaignDiversityState) -> R,
    ) -> Option<R> {
        let state = self.peek(campaign_id)?;
        let guard = state.lock();
        Some(f(&*guard))
    }

    /// Ids currently in the dimension's window.
    pub fn recently_used(&self, campaign_id: &str, dimension: Dimension) -> HashSet<String> {
        self.with_state(campaign_id, |s| {
            s.selections.get(&dimension).map(|h| h.to_set()).unwrap_or_default()
        })
        .unwrap_or_default()
    }

    pub fn history_len(&self, campaign_id: &str, dimension: Dimension) -> usize {
        self.with_state(campaign_id, |s| s.selections.get(&dimension).map_or(0, |h| h.len()))
            .unwrap_or(0)
    }

    /// Window contents per dimension, oldest first.
    pub fn history(&self, campaign_id: &str) -> BTreeMap<Dimension, Vec<String>> {
        self.with_state(campaign_id, |s| {
            s.selections
                .iter()
                .map(|(d, h)| (*d, h.iter().cloned().collect()))
                .collect()
        })
        .unwrap_or_default()
    }

    /// `"Style: Studio Minimal"` lines for every distinct value still in a
    /// window, in dimension order then oldest first. `name_of` resolves ids
    /// to display names.
    pub fn usage_history(
        &self,
        campaign_id: &str,
        name_of: impl Fn(&str) -> String,
    ) -> Vec<String> {
        let mut lines = Vec::new();
        for (dimension, ids) in self.history(campaign_id) {
            let mut seen = HashSet::new();
            for id in ids {
                if seen.insert(id.clone()) {
                    lines.push(format!("{}: {}", dimension.label(), name_of(&id)));
                }
            }
        }
        lines
    }

    /// Up to `window` most recent distinct ids per dimension, newest first.
    pub fn avoidance_summary(
        &self,
        campaign_id: &str,
        window: usize,
    ) -> BTreeMap<Dimension, Vec<String>> {
        self.with_state(campaign_id, |s| {
            s.selections
                .iter()
                .filter(|(_, h)| !h.is_empty())
                .map(|(d, h)| (*d, h.recent_distinct(window)))
                .collect()
        })
        .unwrap_or_default()
    }

    pub fn record_fingerprint(&self, campaign_id: &str, fingerprint: u32) -> Option<u32> {
        let state = self.state(campaign_id);
        let evicted = state.lock().record_fingerprint(fingerprint);
        if evicted.is_some() {
            metrics::counter!("diversity.ledger.evictions").increment(1);
        }
        evicted
    }

    /// Record `fingerprint` only if the window does not already hold it,
    /// under a single campaign lock. Returns `true` when it was new.
    pub fn check_and_record_fingerprint(&self, campaign_id: &str, fingerprint: u32) -> bool {
        let state = self.state(campaign_id);
        let outcome = state.lock().record_new_fingerprint(fingerprint);
        match outcome {
            Some(evicted) => {
                if evicted.is_some() {
                    metrics::counter!("diversity.ledger.evictions").increment(1);
                }
                true
            }
            None => false,
        }
    }

    pub fn is_fingerprint_seen(&self, campaign_id: &str, fingerprint: u32) -> bool {
        self.with_state(campaign_id, |s| s.fingerprints.contains(&fingerprint))
            .unwrap_or(false)
    }

    /// Fingerprints in the window, oldest first.
    pub fn recent_fingerprints(&self, campaign_id: &str) -> Vec<u32> {
        self.with_state(campaign_id, |s| s.fingerprints.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Clear all state for one campaign. Never called automatically.
    pub fn reset(&self, campaign_id: &str) {
        if let Some(state) = self.peek(campaign_id) {
            state.lock().clear();
            info!(campaign_id, "campaign diversity state reset");
        }
    }

    pub fn stats(&self, campaign_id: &str) -> DiversityStats {
        self.with_state(campaign_id, |s| DiversityStats {
            distinct_per_dimension: s
                .selections
                .iter()
                .map(|(d, h)| (*d, h.distinct_count()))
                .collect(),
            window_len_per_dimension: s.selections.iter().map(|(d, h)| (*d, h.len())).collect(),
            fingerprints: s.fingerprints.len(),
            created_at: Some(s.created_at),
            updated_at: Some(s.updated_at),
        })
        .unwrap_or_default()
    }

    pub fn campaign_count(&self) -> usize {
        self.campaigns.len()
    }
}

impl Default for CampaignDiversityLedger {
    fn default() -> Self {
        Self::from_config(&DiversityConfig::default())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_recently_used() {
        let ledger = CampaignDiversityLedger::new(3, 5);
        ledger.record_selection("c1", Dimension::Style, "s1");
        ledger.record_selection("c1", Dimension::Style, "s2");

        let used = ledger.recently_used("c1", Dimension::Style);
        assert!(used.contains("s1"));
        assert!(used.contains("s2"));
        assert!(ledger.recently_used("c1", Dimension::Palette).is_empty());
    }

    #[test]
    fn test_value_stays_until_max_history_insertions() {
        let ledger = CampaignDiversityLedger::new(3, 5);
        ledger.record_selection("c1", Dimension::Style, "v");
        for i in 0..2 {
            ledger.record_selection("c1", Dimension::Style, &format!("x{i}"));
            assert!(ledger.recently_used("c1", Dimension::Style).contains("v"));
        }
        let evicted = ledger.record_selection("c1", Dimension::Style, "x2");
        assert_eq!(evicted.as_deref(), Some("v"));
        assert!(!ledger.recently_used("c1", Dimension::Style).contains("v"));
    }

    #[test]
    fn test_history_bounded() {
        let ledger = CampaignDiversityLedger::new(4, 5);
        for i in 0..50 {
            ledger.record_selection("c1", Dimension::Lighting, &format!("l{i}"));
            assert!(ledger.history_len("c1", Dimension::Lighting) <= 4);
        }
        for i in 0..50 {
            ledger.record_fingerprint("c1", i);
        }
        assert_eq!(ledger.recent_fingerprints("c1").len(), 5);
        assert!(ledger.is_fingerprint_seen("c1", 49));
        assert!(!ledger.is_fingerprint_seen("c1", 0));
    }

    #[test]
    fn test_campaigns_are_isolated() {
        let ledger = CampaignDiversityLedger::new(5, 5);
        ledger.record_selection("c1", Dimension::Style, "s1");
        ledger.record_fingerprint("c1", 42);
        ledger.record_selection("c2", Dimension::Style, "s2");

        assert!(!ledger.recently_used("c2", Dimension::Style).contains("s1"));
        assert!(!ledger.is_fingerprint_seen("c2", 42));

        ledger.reset("c1");
        assert!(ledger.recently_used("c1", Dimension::Style).is_empty());
        assert!(!ledger.is_fingerprint_seen("c1", 42));
        assert!(ledger.recently_used("c2", Dimension::Style).contains("s2"));
    }

    #[test]
    fn test_reads_do_not_create_state() {
        let ledger = CampaignDiversityLedger::new(5, 5);
        assert!(ledger.recently_used("ghost", Dimension::Style).is_empty());
        assert!(!ledger.is_fingerprint_seen("ghost", 1));
        ledger.reset("ghost");
        assert_eq!(ledger.campaign_count(), 0);
    }

    #[test]
    fn test_stats_and_avoidance_summary() {
        let ledger = CampaignDiversityLedger::new(10, 5);
        for v in ["a", "b", "a"] {
            ledger.record_selection("c1", Dimension::Angle, v);
        }
        ledger.record_fingerprint("c1", 7);

        let stats = ledger.stats("c1");
        assert_eq!(stats.distinct_per_dimension[&Dimension::Angle], 2);
        assert_eq!(stats.window_len_per_dimension[&Dimension::Angle], 3);
        assert_eq!(stats.fingerprints, 1);

        let map = stats.as_map();
        assert_eq!(map["angle"], 2);
        assert_eq!(map["fingerprints"], 1);

        let summary = ledger.avoidance_summary("c1", 7);
        assert_eq!(summary[&Dimension::Angle], vec!["a", "b"]);
    }

    #[test]
    fn test_concurrent_writers_keep_bounds() {
        let ledger = Arc::new(CampaignDiversityLedger::new(8, 8));
        std::thread::scope(|scope| {
            for t in 0..8 {
                let ledger = ledger.clone();
                scope.spawn(move || {
                    let campaign = format!("c{}", t % 2);
                    for i in 0..200 {
                        ledger.record_selection(&campaign, Dimension::Style, &format!("t{t}-{i}"));
                        ledger.record_fingerprint(&campaign, i);
                    }
                });
            }
        });

        assert_eq!(ledger.campaign_count(), 2);
        for c in ["c0", "c1"] {
            assert_eq!(ledger.history_len(c, Dimension::Style), 8);
            assert_eq!(ledger.recent_fingerprints(c).len(), 8);
        }
    }

    #[test]
    fn test_usage_history_lines() {
        let ledger = CampaignDiversityLedger::new(10, 5);
        ledger.record_selection("c1", Dimension::Palette, "p1");
        ledger.record_selection("c1", Dimension::Style, "s1");
        ledger.record_selection("c1", Dimension::Style, "s2");
        ledger.record_selection("c1", Dimension::Style, "s1");

        let lines = ledger.usage_history("c1", |id| id.to_uppercase());
        assert_eq!(lines, vec!["Style: S1", "Style: S2", "Palette: P1"]);
        assert!(ledger.usage_history("c2", |id| id.to_string()).is_empty());
    }

    #[test]
    fn test_check_and_record_fingerprint() {
        let ledger = CampaignDiversityLedger::new(5, 2);
        assert!(ledger.check_and_record_fingerprint("c1", 7));
        assert!(!ledger.check_and_record_fingerprint("c1", 7));
        assert_eq!(ledger.recent_fingerprints("c1"), vec![7]);

        assert!(ledger.check_and_record_fingerprint("c1", 8));
        assert!(ledger.check_and_record_fingerprint("c1", 9));
        // 7 has left the two-entry window.
        assert!(ledger.check_and_record_fingerprint("c1", 7));
        assert_eq!(ledger.recent_fingerprints("c1"), vec![9, 7]);
    }

    #[test]
    fn test_concurrent_fingerprint_claims_admit_one_writer() {
        let ledger = Arc::new(CampaignDiversityLedger::new(5, 20));
        let barrier = std::sync::Barrier::new(8);
        let accepted = std::sync::atomic::AtomicUsize::new(0);
        std::thread::scope(|scope| {
            for _ in 0..8 {
                scope.spawn(|| {
                    barrier.wait();
                    for fp in 0..10 {
                        if ledger.check_and_record_fingerprint("c1", fp) {
                            accepted.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                        }
                    }
                });
            }
        });

        assert_eq!(accepted.into_inner(), 10);
        assert_eq!(ledger.recent_fingerprints("c1").len(), 10);
    }

    #[test]
    fn test_stats_track_timestamps() {
        let ledger = CampaignDiversityLedger::new(3, 3);
        let unknown = ledger.stats("c1");
        assert!(unknown.created_at.is_none());
        assert!(unknown.updated_at.is_none());

        ledger.record_selection("c1", Dimension::Style, "s1");
        let first = ledger.stats("c1");
        ledger.record_fingerprint("c1", 1);
        let second = ledger.stats("c1");

        assert_eq!(first.created_at, second.created_at);
        assert!(second.updated_at >= first.updated_at);
        assert!(second.updated_at >= second.created_at);
    }

    #[test]
    fn test_stats_serialize() {
        let ledger = CampaignDiversityLedger::new(3, 3);
        ledger.record_selection("c1", Dimension::Palette, "p1");
        let json = serde_json::to_string(&ledger.stats("c1")).unwrap();
        assert!(json.contains("palette"));
    }
}
