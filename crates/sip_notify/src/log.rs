use async_trait::async_trait;
use sip_core::{Delivery, MessageUnit, Notifier, Result};
use tracing::info;

/// Logs units instead of posting them. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier;

impl LogNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &str {
        "log"
    }

    async fn deliver(&self, unit: &MessageUnit) -> Result<Delivery> {
        match unit {
            MessageUnit::Primary(primary) => {
                info!("📝 [{}] {}", unit.footer(), primary.title);
                info!("   {}", primary.url);
                for line in primary.description.lines() {
                    info!("   | {}", line);
                }
            }
            MessageUnit::Continuation(_) => info!("📝 [{}]", unit.footer()),
        }
        for field in unit.fields() {
            info!("   {}: {}", field.name, field.value.replace('\n', " ⏎ "));
        }
        Ok(Delivery::Sent)
    }
}
