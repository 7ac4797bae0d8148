use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use clap::Parser;
use sip_core::{Error, Notifier, Result};
use sip_notify::{DiscordNotifier, LogNotifier, WebhookSettings};
use sip_scrapers::scrapers::serbia;
use sip_scrapers::{
    handle_command, init_logging, FetchConfig, Fetcher, RunSettings, ScraperCommands,
    ScraperManager, DEFAULT_CUTOFF,
};
use sip_storage::{open_ledger, LedgerConfig};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HumanDuration(Duration);

impl FromStr for HumanDuration {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let mut total_millis = 0u64;
        let mut current_number = String::new();
        let mut has_unit = false;
        let mut chars = s.chars().peekable();

        while let Some(c) = chars.next() {
            if c.is_ascii_digit() {
                current_number.push(c);
            } else if let Ok(num) = current_number.parse::<u64>() {
                let unit_millis = match c {
                    'm' if chars.peek() == Some(&'s') => {
                        chars.next();
                        1
                    }
                    's' => 1_000,
                    'm' => 60_000,
                    'h' => 3_600_000,
                    'd' => 86_400_000,
                    _ => return Err(format!("Invalid duration unit: {}", c)),
                };
                total_millis += num * unit_millis;
                current_number.clear();
                has_unit = true;
            } else if !c.is_whitespace() {
                return Err(format!("Invalid character in duration: {}", c));
            }
        }

        // A trailing bare number counts as seconds
        if !current_number.is_empty() {
            match current_number.parse::<u64>() {
                Ok(num) => {
                    total_millis += num * 1_000;
                    has_unit = true;
                }
                Err(_) => return Err("Invalid number in duration".to_string()),
            }
        }

        if !has_unit {
            return Err("Duration must include a number".to_string());
        }

        Ok(HumanDuration(Duration::from_millis(total_millis)))
    }
}

fn parse_cutoff(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| format!("Invalid RFC 3339 timestamp {}: {}", s, e))
}

/// Watches the SIP Elfak news board and forwards new articles to Discord.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Discord webhook URL
    #[arg(long, env = "DISCORD_WEBHOOK", hide_env_values = true)]
    webhook: Option<String>,
    /// Where the seen-URL ledger is kept
    #[arg(long, env = "SIP_STATE_FILE", default_value = "state.json")]
    state_file: PathBuf,
    /// Articles published before this instant are skipped
    #[arg(long, default_value = DEFAULT_CUTOFF, value_parser = parse_cutoff)]
    cutoff: DateTime<Utc>,
    /// Pause between article fetches (e.g. 500ms, 1s)
    #[arg(long, default_value = "500ms")]
    fetch_delay: HumanDuration,
    /// Pause between delivered articles
    #[arg(long, default_value = "2s")]
    send_delay: HumanDuration,
    /// Repeat runs forever with this pause in between (e.g. 30m, 1h15m)
    #[arg(long)]
    interval: Option<HumanDuration>,
    /// Log messages instead of posting them and leave the ledger untouched
    #[arg(long)]
    dry_run: bool,
    #[command(subcommand)]
    command: Option<ScraperCommands>,
}

impl Cli {
    fn needs_webhook(&self) -> bool {
        !self.dry_run
            && matches!(
                self.command,
                None | Some(ScraperCommands::Run) | Some(ScraperCommands::Url { send: true, .. })
            )
    }

    fn notifier(&self) -> Result<Arc<dyn Notifier>> {
        match &self.webhook {
            Some(webhook) if !self.dry_run => Ok(Arc::new(DiscordNotifier::new(
                webhook.clone(),
                WebhookSettings::default(),
            )?)),
            _ if self.needs_webhook() => Err(Error::Delivery(
                "DISCORD_WEBHOOK environment variable is required".to_string(),
            )),
            _ => Ok(Arc::new(LogNotifier::new())),
        }
    }

    fn run_settings(&self) -> RunSettings {
        RunSettings {
            cutoff: self.cutoff,
            fetch_delay: self.fetch_delay.0,
            send_delay: self.send_delay.0,
            dry_run: self.dry_run,
            ..RunSettings::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let logger = init_logging();
    let cli = Cli::parse();

    let notifier = cli.notifier()?;
    info!("📣 Notifier initialized (using {})", notifier.name());

    let ledger = open_ledger(&LedgerConfig::JsonFile(cli.state_file.clone()));
    info!("💾 State file: {}", cli.state_file.display());

    let fetcher = Fetcher::new(FetchConfig::default())?;
    let manager = ScraperManager::new(ledger, notifier, cli.run_settings())
        .with_scrapers(serbia::get_scrapers(fetcher)?)
        .with_logger(logger);
    let names: Vec<&str> = manager.scrapers().iter().map(|s| s.source()).collect();
    info!("🦗 Scrapers initialized successfully: {}", names.join(", "));

    let command = cli.command.clone().unwrap_or_default();
    match (&command, cli.interval) {
        (ScraperCommands::Run, Some(interval)) => {
            info!("⏰ Running in periodic mode every {}s", interval.0.as_secs());
            loop {
                info!("🔄 Starting check at {}", Utc::now().to_rfc3339());
                if let Err(e) = handle_command(&command, &manager).await {
                    error!("❌ Run failed: {}", e);
                }
                info!("😴 Waiting {}s before next check", interval.0.as_secs());
                tokio::time::sleep(interval.0).await;
            }
        }
        _ => handle_command(&command, &manager).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_human_duration() {
        let parse = |s: &str| HumanDuration::from_str(s).map(|d| d.0);
        assert_eq!(parse("30s"), Ok(Duration::from_secs(30)));
        assert_eq!(parse("1h15m30s"), Ok(Duration::from_secs(4530)));
        assert_eq!(parse("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse("1m500ms"), Ok(Duration::from_millis(60_500)));
        assert_eq!(parse("1d"), Ok(Duration::from_secs(86_400)));
        assert_eq!(parse("45"), Ok(Duration::from_secs(45)));
        assert!(parse("").is_err());
        assert!(parse("5w").is_err());
        assert!(parse("h").is_err());
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["sip-watch", "--webhook", "https://discord.test/hook"]);
        assert_eq!(cli.state_file, PathBuf::from("state.json"));
        assert_eq!(cli.cutoff, parse_cutoff("2025-12-01T00:00:00Z").unwrap());
        let settings = cli.run_settings();
        assert_eq!(settings.fetch_delay, Duration::from_millis(500));
        assert_eq!(settings.send_delay, Duration::from_secs(2));
        assert!(cli.command.is_none());
        assert!(cli.needs_webhook());
    }

    #[test]
    fn test_webhook_requirement() {
        let list = Cli::parse_from(["sip-watch", "--dry-run", "list"]);
        assert!(!list.needs_webhook());
        assert_eq!(list.notifier().unwrap().name(), "log");

        let url = Cli::parse_from(["sip-watch", "url", "https://sip.elfak.ni.ac.rs/article/1"]);
        assert!(!url.needs_webhook());

        let send = Cli::parse_from(["sip-watch", "url", "https://sip.elfak.ni.ac.rs/article/1", "--send"]);
        assert!(send.needs_webhook());

        let dry = Cli::parse_from(["sip-watch", "--dry-run", "--webhook", "https://discord.test/hook"]);
        assert_eq!(dry.notifier().unwrap().name(), "log");
    }

    #[test]
    fn test_cutoff_must_be_rfc3339() {
        assert!(Cli::try_parse_from(["sip-watch", "--dry-run", "--cutoff", "yesterday"]).is_err());
        let cli = Cli::try_parse_from(["sip-watch", "--dry-run", "--cutoff", "2025-11-01T12:00:00+01:00"]).unwrap();
        assert_eq!(cli.cutoff, parse_cutoff("2025-11-01T11:00:00Z").unwrap());
    }
}
