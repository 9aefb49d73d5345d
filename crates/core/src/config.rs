use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CREATIVE_DIVERSITY__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub diversity: DiversityConfig,
    #[serde(default)]
    pub advisor: AdvisorConfig,
    #[serde(default)]
    pub regeneration: RegenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiversityConfig {
    /// Recently used values remembered per dimension and campaign.
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    /// Content fingerprints remembered per campaign.
    #[serde(default = "default_fingerprint_history")]
    pub fingerprint_history: usize,
    /// Top-ranked candidates kept per dimension after relevance filtering.
    /// Zero keeps every match; a non-zero cap must be at least `max_history`
    /// or the history window can never fill with distinct values.
    #[serde(default = "default_max_candidates_per_dimension")]
    pub max_candidates_per_dimension: usize,
    /// Mix the wall clock into fallback seeds so identical requests diverge.
    #[serde(default = "default_salt_seed_with_clock")]
    pub salt_seed_with_clock: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdvisorConfig {
    #[serde(default = "default_advisor_enabled")]
    pub enabled: bool,
    #[serde(default = "default_advisor_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegenerationConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_randomness")]
    pub base_randomness: f64,
    #[serde(default = "default_randomness_step")]
    pub randomness_step: f64,
    #[serde(default = "default_max_randomness")]
    pub max_randomness: f64,
    #[serde(default = "default_generation_timeout_ms")]
    pub generation_timeout_ms: u64,
}

fn default_max_history() -> usize {
    15
}
fn default_fingerprint_history() -> usize {
    20
}
fn default_max_candidates_per_dimension() -> usize {
    0
}
fn default_salt_seed_with_clock() -> bool {
    true
}
fn default_advisor_enabled() -> bool {
    true
}
fn default_advisor_timeout_ms() -> u64 {
    8000
}
fn default_max_attempts() -> u32 {
    3
}
fn default_base_randomness() -> f64 {
    0.9
}
fn default_randomness_step() -> f64 {
    0.05
}
fn default_max_randomness() -> f64 {
    1.0
}
fn default_generation_timeout_ms() -> u64 {
    60_000
}

impl Default for DiversityConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
            fingerprint_history: default_fingerprint_history(),
            max_candidates_per_dimension: default_max_candidates_per_dimension(),
            salt_seed_with_clock: default_salt_seed_with_clock(),
        }
    }
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: default_advisor_enabled(),
            timeout_ms: default_advisor_timeout_ms(),
        }
    }
}

impl Default for RegenerationConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_randomness: default_base_randomness(),
            randomness_step: default_randomness_step(),
            max_randomness: default_max_randomness(),
            generation_timeout_ms: default_generation_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            diversity: DiversityConfig::default(),
            advisor: AdvisorConfig::default(),
            regeneration: RegenerationConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("CREATIVE_DIVERSITY")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let loaded: AppConfig = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject values the engine cannot honour.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.diversity.max_history == 0 {
            return Err(config::ConfigError::Message(
                "diversity.max_history must be at least 1".into(),
            ));
        }
        if self.diversity.fingerprint_history == 0 {
            return Err(config::ConfigError::Message(
                "diversity.fingerprint_history must be at least 1".into(),
            ));
        }
        let cap = self.diversity.max_candidates_per_dimension;
        if cap > 0 && cap < self.diversity.max_history {
            return Err(config::ConfigError::Message(format!(
                "diversity.max_candidates_per_dimension ({cap}) is below max_history ({})",
                self.diversity.max_history
            )));
        }
        if self.regeneration.max_attempts == 0 {
            return Err(config::ConfigError::Message(
                "regeneration.max_attempts must be at least 1".into(),
            ));
        }
        if self.regeneration.base_randomness > self.regeneration.max_randomness {
            return Err(config::ConfigError::Message(
                "regeneration.base_randomness exceeds max_randomness".into(),
            ));
        }
        Ok(())
    }
}
