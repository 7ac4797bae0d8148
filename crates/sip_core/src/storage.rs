use std::collections::HashSet;

use async_trait::async_trait;
use crate::Result;

/// Persists the set of article URLs that have already been handled.
#[async_trait]
pub trait SeenLedger: Send + Sync {
    /// Load the URLs recorded by previous runs
    async fn load(&self) -> Result<HashSet<String>>;

    /// Replace the recorded URLs with `seen`
    async fn save(&self, seen: &HashSet<String>) -> Result<()>;
}
