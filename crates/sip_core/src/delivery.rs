use std::time::Duration;

use async_trait::async_trait;
use crate::types::MessageUnit;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Sent,
    /// The transport was rate limited, waited, and the retry went through.
    SentAfterRateLimit { waited: Duration },
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &str;

    /// Deliver a single unit. Units of one article are delivered in order.
    async fn deliver(&self, unit: &MessageUnit) -> Result<Delivery>;
}
