//! Pushes staged files into the distribution channel.
//!
//! Distribution works by sweep: every recognized media file in the staging
//! folder is offered to the channel on each run, so files left behind by an
//! interrupted run are picked up by the next one. Delivered files are
//! remembered in the dedup cache under [`crate::cache::DISTRIBUTED_PREFIX`].

mod error;
mod sweep;
mod telegram;
mod traits;
mod types;

pub use error::DistributeError;
pub use sweep::{list_staged_media, sweep, SweepFailure, SweepReport};
pub use telegram::TelegramDistributor;
pub use traits::Distributor;
pub use types::{has_extension, paid_star_count, DeliveryReceipt};
