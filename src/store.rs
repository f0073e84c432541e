use async_trait::async_trait;
use chrono::{DateTime, Utc};
#[cfg(test)]
use tokio::sync::RwLock;

use crate::models::CheckIn;

/// Append-only check-in storage with a time-window read.
#[async_trait]
pub trait CheckInStore: Send + Sync {
    async fn append(&self, check_in: CheckIn) -> anyhow::Result<()>;

    /// Check-ins for `venue_id` created at or after `since`, newest first.
    async fn since(&self, venue_id: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<CheckIn>>;
}

/// Process-local store for exercising callers without Postgres.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    records: RwLock<Vec<CheckIn>>,
}

#[cfg(test)]
impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
#[async_trait]
impl CheckInStore for MemoryStore {
    async fn append(&self, check_in: CheckIn) -> anyhow::Result<()> {
        self.records.write().await.push(check_in);
        Ok(())
    }

    async fn since(&self, venue_id: &str, since: DateTime<Utc>) -> anyhow::Result<Vec<CheckIn>> {
        let records = self.records.read().await;
        let mut matching: Vec<CheckIn> = records
            .iter()
            .filter(|c| c.venue_id == venue_id && c.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matching)
    }
}
