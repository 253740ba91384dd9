use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chrono::Utc;
use digest_store::{CachedSummary, DataStore, InsufficientCredits, RequestLog, UsageTransaction};

#[derive(Clone, Default)]
pub struct MockDataStore {
    pub credits: Arc<Mutex<HashMap<String, i64>>>,
    pub cache: Arc<Mutex<HashMap<String, CachedSummary>>>,
    pub transactions: Arc<Mutex<Vec<UsageTransaction>>>,
    pub logs: Arc<Mutex<Vec<RequestLog>>>,
    pub fail_with: Option<String>,
    /// Balance is drained by another request right before each deduction
    pub concurrent_spend: bool,
}

impl MockDataStore {
    pub fn with_credits(self, user_id: &str, credits: i64) -> Self {
        self.credits
            .lock()
            .unwrap()
            .insert(user_id.to_string(), credits);
        self
    }

    pub fn with_cached(self, video_id: &str, summary: &str, provider: &str) -> Self {
        self.cache.lock().unwrap().insert(
            video_id.to_string(),
            CachedSummary {
                video_id: video_id.to_string(),
                summary: summary.to_string(),
                provider: provider.to_string(),
                transcript_length: 100,
                created_at: Utc::now(),
            },
        );
        self
    }

    pub fn with_concurrent_spend(mut self) -> Self {
        self.concurrent_spend = true;
        self
    }

    /// Reads succeed, every write fails
    pub fn failing(msg: &str) -> Self {
        Self {
            fail_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    fn check_write(&self) -> anyhow::Result<()> {
        match &self.fail_with {
            Some(msg) => Err(anyhow::anyhow!("{}", msg)),
            None => Ok(()),
        }
    }
}

impl DataStore for MockDataStore {
    async fn get_credits(&self, user_id: &str) -> anyhow::Result<Option<i64>> {
        Ok(self.credits.lock().unwrap().get(user_id).copied())
    }

    async fn deduct_credit(&self, transaction: &UsageTransaction) -> anyhow::Result<i64> {
        self.check_write()?;
        let mut credits = self.credits.lock().unwrap();
        if self.concurrent_spend {
            credits.insert(transaction.user_id.clone(), 0);
        }
        let balance = credits
            .get_mut(&transaction.user_id)
            .filter(|balance| **balance >= 1)
            .ok_or_else(|| InsufficientCredits {
                user_id: transaction.user_id.clone(),
            })?;
        *balance -= 1;
        self.transactions.lock().unwrap().push(transaction.clone());
        Ok(*balance)
    }

    async fn get_cached_summary(&self, video_id: &str) -> anyhow::Result<Option<CachedSummary>> {
        Ok(self.cache.lock().unwrap().get(video_id).cloned())
    }

    async fn cache_summary(&self, cached: &CachedSummary) -> anyhow::Result<()> {
        self.check_write()?;
        self.cache
            .lock()
            .unwrap()
            .insert(cached.video_id.clone(), cached.clone());
        Ok(())
    }

    async fn record_request(&self, log: &RequestLog) -> anyhow::Result<()> {
        self.check_write()?;
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
}
