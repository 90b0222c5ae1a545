pub mod cli;
pub mod context;
pub mod copy_strategy;
pub mod error;
pub mod executor;
pub mod manifest;
pub mod mask;
pub mod platform;
pub mod target_description;

pub use context::StageContext;
pub use error::{StageError, StageResult};
pub use executor::{BuildStatus, StageExecutor, StageReport};
pub use manifest::{Manifest, ManifestBuilder, StageRule};
