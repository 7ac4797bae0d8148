use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sip_core::{Error, Result, SeenLedger};
use tracing::{info, warn};

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    seen_urls: Vec<String>,
    #[serde(default)]
    last_checked: Option<DateTime<Utc>>,
}

/// Ledger persisted as a pretty-printed JSON file:
/// `{"seen_urls": [...], "last_checked": "<RFC 3339>"}`.
///
/// A missing or unreadable file loads as an empty set.
#[derive(Debug, Clone)]
pub struct JsonFileLedger {
    path: PathBuf,
}

impl JsonFileLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// When the ledger was last saved, if the file says so.
    pub async fn last_checked(&self) -> Option<DateTime<Utc>> {
        let text = tokio::fs::read_to_string(&self.path).await.ok()?;
        serde_json::from_str::<StateFile>(&text).ok()?.last_checked
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "state.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl SeenLedger for JsonFileLedger {
    async fn load(&self) -> Result<HashSet<String>> {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("📋 No state file at {}, starting fresh", self.path.display());
                return Ok(HashSet::new());
            }
            Err(e) => {
                warn!("⚠️ Could not read state file {}: {}", self.path.display(), e);
                return Ok(HashSet::new());
            }
        };

        match serde_json::from_str::<StateFile>(&text) {
            Ok(state) => {
                info!("📋 Loaded state: {} URLs already seen", state.seen_urls.len());
                Ok(state.seen_urls.into_iter().collect())
            }
            Err(e) => {
                warn!("⚠️ Error loading state {}: {}", self.path.display(), e);
                Ok(HashSet::new())
            }
        }
    }

    async fn save(&self, seen: &HashSet<String>) -> Result<()> {
        let mut seen_urls: Vec<String> = seen.iter().cloned().collect();
        seen_urls.sort();
        let state = StateFile {
            seen_urls,
            last_checked: Some(Utc::now()),
        };
        let text = serde_json::to_string_pretty(&state)?;

        let storage_error =
            |e: std::io::Error| Error::Storage(format!("{}: {}", self.path.display(), e));
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(storage_error)?;
        }
        let temp = self.temp_path();
        tokio::fs::write(&temp, text).await.map_err(storage_error)?;
        tokio::fs::rename(&temp, &self.path).await.map_err(storage_error)?;

        info!("✅ State saved: {} URLs tracked", seen.len());
        Ok(())
    }
}
