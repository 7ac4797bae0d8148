use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use sip_core::{Result, SeenLedger};
use tokio::sync::RwLock;

/// Ledger kept in process memory. Clones share the same set.
#[derive(Debug, Clone, Default)]
pub struct MemoryLedger {
    seen: Arc<RwLock<HashSet<String>>>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seen<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seen: Arc::new(RwLock::new(urls.into_iter().map(Into::into).collect())),
        }
    }

    pub async fn len(&self) -> usize {
        self.seen.read().await.len()
    }

    pub async fn contains(&self, url: &str) -> bool {
        self.seen.read().await.contains(url)
    }
}

#[async_trait]
impl SeenLedger for MemoryLedger {
    async fn load(&self) -> Result<HashSet<String>> {
        Ok(self.seen.read().await.clone())
    }

    async fn save(&self, seen: &HashSet<String>) -> Result<()> {
        *self.seen.write().await = seen.clone();
        Ok(())
    }
}
