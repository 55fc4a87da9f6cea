mod client;
mod error;
pub mod parsing;
mod source;
mod types;

pub use client::{is_catalog_number, CatalogBatch, CatalogClient, FetchPolicy};
pub use error::CatalogError;
pub use parsing::{parse_tle, parse_tle_lines};
pub use source::{CatalogQuery, CatalogSource, CelestrakSource, CELESTRAK_GP_URL};
pub use types::{SatelliteGroup, Source, TleRecord};
