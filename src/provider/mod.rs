//! The provider capability and the aggregator that fans out across providers.
//!
//! A provider is one integration (GitHub, Jira, a notes vault, ...) that can
//! list the user's work items for a time window. The [`Aggregator`] queries
//! every registered provider and merges what they return into a single
//! [`Summary`](crate::activity::Summary), isolating failures per provider.

mod aggregator;
mod basic_auth;
mod error;

pub use aggregator::{Aggregation, Aggregator, ProviderOutcome};
pub(crate) use basic_auth::BasicAuthClient;
pub use error::ProviderError;

use async_trait::async_trait;

use crate::activity::{TimeWindow, WorkItem};

/// A data source that can list work items for a time window.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Provider: Send + Sync {
    /// Short lowercase name, e.g. `github`.
    fn name(&self) -> &'static str;

    /// Returns true when the provider has everything it needs to run.
    fn is_configured(&self) -> bool;

    /// Lists the user's work items that changed inside `window`.
    async fn activities(&self, window: &TimeWindow) -> Result<Vec<WorkItem>, ProviderError>;
}
