//! Remote catalog of media assets.
//!
//! The catalog is read-only from this crate's point of view: assets are
//! listed, filtered against the dedup cache, and one is picked at random
//! for the run.

mod drive;
mod error;
mod select;
mod traits;
mod types;

pub use drive::DriveCatalog;
pub use error::CatalogError;
pub use select::{eligible_assets, pick_uniform};
pub use traits::CatalogClient;
pub use types::{Asset, AssetTag};
