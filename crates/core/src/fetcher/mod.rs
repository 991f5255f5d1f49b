//! Download of catalog assets into the staging folder.

mod drive;
mod error;
mod traits;
mod types;

pub use drive::DriveFetcher;
pub use error::FetchError;
pub use traits::Fetcher;
pub use types::{DownloadProgress, StagedFile, PART_SUFFIX};
