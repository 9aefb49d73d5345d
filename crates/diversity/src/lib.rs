//! Creative diversity selection: narrows a preset catalog to what fits a
//! brand, picks one value per creative dimension while steering away from
//! what a campaign used recently, and regenerates content whose fingerprint
//! collides with recent output.

#![warn(clippy::unwrap_used)]

pub mod advisor;
pub mod catalog;
pub mod engine;
pub mod filter;
pub mod fingerprint;
pub mod picker;
pub mod presets;
pub mod regeneration;
pub mod selector;
pub mod strategy;

pub use advisor::{
    AdvisorClient, AdvisorRequest, AdvisorResponse, AdvisorUnavailable, PromptAdvisor,
    TextCompletion,
};
pub use catalog::PresetCatalog;
pub use engine::{DiversityEngine, GenerationOutput};
pub use filter::{DimensionCandidates, FilteredCandidateSet, RelevanceFilter};
pub use fingerprint::ContentHasher;
pub use picker::{SeedDeriver, SeededRandomPicker};
pub use regeneration::{
    ContentGenerator, GenerationRequest, LoopState, RegenerationLoop, RegenerationOutcome,
    RegenerationPolicy,
};
pub use selector::DiversitySelector;
pub use strategy::{AdvisedStrategy, SeededRandomStrategy, SelectionStrategy, StrategyInput};
