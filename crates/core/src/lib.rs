pub mod config;
pub mod error;
pub mod types;

pub use config::AppConfig;
pub use error::{DiversityError, DiversityResult};
pub use types::{
    BrandContext, CampaignContext, CreativeBrief, CreativeDimensionValue, Dimension,
    DimensionChoice, MediaKind, ProductContext, SelectionResult, SelectionSource,
};
