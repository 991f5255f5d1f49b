//! Posting excerpts to the public feed.
//!
//! A publish is upload, processing wait and post creation, retried as a
//! whole on transient platform errors under a [`crate::retry::RetryPolicy`].

mod config;
mod error;
mod publish;
mod traits;
mod types;
mod x;

pub use config::{PublisherConfig, LINK_PLACEHOLDER};
pub use error::PublishError;
pub use publish::Publisher;
pub use traits::FeedClient;
pub use types::{ProcessingStatus, PublishFailure, PublishReport, UploadedMedia};
pub use x::XFeedClient;
