pub mod client;
pub mod models;
pub mod source;

#[cfg(test)]
pub mod fake;

pub use client::HttpMediaSource;
pub use models::ApiConfig;
pub use source::{ApiError, MediaSource};
