//! REST client for the VolumeRead backend.
//!
//! - `types` - JSON models for `/api/data` and `/api/articles`
//! - `error` - uniform failure outcome for every request
//! - `client` - endpoint calls plus the mutate-then-resync contract

mod client;
mod error;
mod types;

pub use client::{ApiClient, DataSequence, Mutation, RefreshSummary, Resynced};
pub use error::ApiError;
pub use types::{
    AppData, Article, ArticleQuery, ArticlesPage, Category, CustomStream, CustomStreamFeedLink,
    Feed, RemovedFeed, RemovedStream,
};
