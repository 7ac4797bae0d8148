use std::path::PathBuf;
use std::sync::Arc;

use sip_core::SeenLedger;

pub mod backends;

pub use backends::*;

/// Where the seen-URL ledger lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerConfig {
    Memory,
    JsonFile(PathBuf),
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self::JsonFile(PathBuf::from("state.json"))
    }
}

pub fn open_ledger(config: &LedgerConfig) -> Arc<dyn SeenLedger> {
    match config {
        LedgerConfig::Memory => Arc::new(MemoryLedger::new()),
        LedgerConfig::JsonFile(path) => Arc::new(JsonFileLedger::new(path.clone())),
    }
}

pub mod prelude {
    pub use super::backends::*;
    pub use super::{open_ledger, LedgerConfig};
    pub use sip_core::SeenLedger;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_open_memory_ledger() {
        let ledger = open_ledger(&LedgerConfig::Memory);
        let seen: HashSet<String> = ["https://sip.elfak.ni.ac.rs/article/1".to_string()].into();
        ledger.save(&seen).await.unwrap();
        assert_eq!(ledger.load().await.unwrap(), seen);
    }

    #[test]
    fn test_default_is_state_file() {
        assert_eq!(
            LedgerConfig::default(),
            LedgerConfig::JsonFile(PathBuf::from("state.json"))
        );
    }
}
