pub mod combine;
pub mod config;
pub mod core;
pub mod error;
pub mod model;
pub mod precombined;

pub use combine::{ChainEnumerator, ChainSet, CombinationEngine, CombinationResult, Generation};
pub use config::{load_config, CombinerConfig};
pub use error::{CombineError, Result};
pub use precombined::PrecombinedBuilder;
