#![warn(clippy::unwrap_used)]

pub mod history;
pub mod ledger;

pub use history::BoundedHistory;
pub use ledger::{CampaignDiversityLedger, CampaignDiversityState, DiversityStats};
