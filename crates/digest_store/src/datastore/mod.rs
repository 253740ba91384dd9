use std::future::Future;

use crate::{CachedSummary, RequestLog, UsageTransaction};

pub mod postgres;

pub trait DataStore {
    /// Current credit balance, `None` if the user has no ledger entry
    fn get_credits(
        &self,
        user_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<i64>>> + Send;

    /// Atomically takes one credit and records the transaction.
    /// Returns the remaining balance; fails with [`crate::InsufficientCredits`]
    /// if the balance is already below one.
    fn deduct_credit(
        &self,
        transaction: &UsageTransaction,
    ) -> impl Future<Output = anyhow::Result<i64>> + Send;

    fn get_cached_summary(
        &self,
        video_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<CachedSummary>>> + Send;

    fn cache_summary(
        &self,
        cached: &CachedSummary,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn record_request(&self, log: &RequestLog) -> impl Future<Output = anyhow::Result<()>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn get_credits(&self, user_id: &str) -> anyhow::Result<Option<i64>> {
        (**self).get_credits(user_id).await
    }

    async fn deduct_credit(&self, transaction: &UsageTransaction) -> anyhow::Result<i64> {
        (**self).deduct_credit(transaction).await
    }

    async fn get_cached_summary(&self, video_id: &str) -> anyhow::Result<Option<CachedSummary>> {
        (**self).get_cached_summary(video_id).await
    }

    async fn cache_summary(&self, cached: &CachedSummary) -> anyhow::Result<()> {
        (**self).cache_summary(cached).await
    }

    async fn record_request(&self, log: &RequestLog) -> anyhow::Result<()> {
        (**self).record_request(log).await
    }
}
