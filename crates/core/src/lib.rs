pub mod config;
pub mod record;
pub mod region;

pub use config::{AppConfig, ConfigError, ExtractConfig, SeedConfig};
pub use record::{CoreError, Dataset, ExtractionRecord};
pub use region::{AnnotatedRegion, NormalizedBox, PixelRegion, RegionKind};
