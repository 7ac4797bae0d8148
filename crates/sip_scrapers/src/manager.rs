use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sip_core::{Article, DateInterpreter, Delivery, Error, Notifier, Result, SeenLedger};
use sip_notify::Chunker;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::logging::Logger;
use crate::scrapers::{ArticleLink, Scraper};

/// Articles dated before this are old news.
pub const DEFAULT_CUTOFF: &str = "2025-12-01T00:00:00Z";
const DEFAULT_CUTOFF_TIMESTAMP: i64 = 1_764_547_200;

#[derive(Debug, Clone)]
pub struct RunSettings {
    pub cutoff: DateTime<Utc>,
    /// Pause between article fetches.
    pub fetch_delay: Duration,
    /// Pause between delivered articles.
    pub send_delay: Duration,
    /// Pause between the units of one article.
    pub unit_delay: Duration,
    /// Deliver as usual but leave the ledger untouched.
    pub dry_run: bool,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            cutoff: DateTime::from_timestamp(DEFAULT_CUTOFF_TIMESTAMP, 0).unwrap_or_default(),
            fetch_delay: Duration::from_millis(500),
            send_delay: Duration::from_secs(2),
            unit_delay: Duration::from_millis(500),
            dry_run: false,
        }
    }
}

/// What one run did with the URLs it found.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunReport {
    pub discovered: usize,
    pub new: usize,
    pub failed: usize,
    pub stale: usize,
    pub duplicates: usize,
    pub delivered: usize,
    pub delivery_failures: usize,
}

pub struct ScraperManager {
    scrapers: Vec<Box<dyn Scraper>>,
    ledger: Arc<dyn SeenLedger>,
    notifier: Arc<dyn Notifier>,
    chunker: Chunker,
    dates: DateInterpreter,
    settings: RunSettings,
    logger: Logger,
}

impl ScraperManager {
    pub fn new(
        ledger: Arc<dyn SeenLedger>,
        notifier: Arc<dyn Notifier>,
        settings: RunSettings,
    ) -> Self {
        Self {
            scrapers: Vec::new(),
            ledger,
            notifier,
            chunker: Chunker::default(),
            dates: DateInterpreter::default(),
            settings,
            logger: Logger::new(),
        }
    }

    pub fn with_scrapers(mut self, scrapers: Vec<Box<dyn Scraper>>) -> Self {
        self.scrapers.extend(scrapers);
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = logger;
        self
    }

    pub fn scrapers(&self) -> &[Box<dyn Scraper>] {
        &self.scrapers
    }

    pub fn get_scraper_for_url(&self, url: &str) -> Result<&dyn Scraper> {
        self.scrapers
            .iter()
            .find(|scraper| scraper.can_handle(url))
            .map(|scraper| scraper.as_ref())
            .ok_or_else(|| Error::Scraping(format!("No scraper found for URL: {}", url)))
    }

    pub async fn scrape_url(&self, url: &str) -> Result<Article> {
        self.get_scraper_for_url(url)?.scrape_article(url, "").await
    }

    /// One full pass: discover, filter, send, remember.
    pub async fn run(&self) -> Result<RunReport> {
        let mut report = RunReport::default();
        let mut seen = self.ledger.load().await?;
        self.logger
            .info(&format!("📋 Loaded state: {} URLs already seen", seen.len()));

        let links = self.collect_links().await;
        report.discovered = links.len();
        self.logger
            .info(&format!("📊 Total unique article URLs: {}", links.len()));

        let fresh: Vec<(&dyn Scraper, ArticleLink)> = links
            .into_iter()
            .filter(|(_, link)| !seen.contains(&link.url))
            .collect();
        report.new = fresh.len();
        if fresh.is_empty() {
            self.logger.info("✨ No new articles");
            return Ok(report);
        }
        self.logger
            .info(&format!("🆕 Total new articles to process: {}", fresh.len()));

        let mut articles = Vec::new();
        for (i, (scraper, link)) in fresh.iter().enumerate() {
            let logger = self
                .logger
                .clone()
                .with_prefix(format!("[{}/{}]", i + 1, fresh.len()));
            logger.info(&format!("🔍 Parsing: {}", link.url));

            match scraper.scrape_article(&link.url, &link.category).await {
                Ok(article) => {
                    let date = article.date.as_deref().unwrap_or("без датума");
                    if self.dates.is_recent(article.date.as_deref(), self.settings.cutoff) {
                        logger.info(&format!("✅ {} ({})", article.title, date));
                        articles.push(article);
                    } else {
                        logger.info(&format!("⏭️ Too old: {} ({})", article.title, date));
                        report.stale += 1;
                        seen.insert(link.url.clone());
                    }
                }
                Err(e) => {
                    logger.warn(&format!("❌ Could not parse {}: {}", link.url, e));
                    report.failed += 1;
                    seen.insert(link.url.clone());
                }
            }

            if i + 1 < fresh.len() {
                sleep(self.settings.fetch_delay).await;
            }
        }

        let mut keys = HashSet::new();
        let mut to_send = Vec::new();
        for article in articles {
            if keys.insert(article.content_key()) {
                to_send.push(article);
            } else {
                self.logger
                    .info(&format!("⏭️ Skipping duplicate: {}", article.title));
                report.duplicates += 1;
                seen.insert(article.url);
            }
        }

        // Oldest first; undated articles go out before everything else.
        to_send.sort_by_key(|article| {
            article
                .date
                .as_deref()
                .and_then(|raw| self.dates.parse(raw))
                .map(|parsed| parsed.at)
        });

        self.logger
            .info(&format!("✉️ Sending {} articles via {}", to_send.len(), self.notifier.name()));
        for (i, article) in to_send.iter().enumerate() {
            let logger = self
                .logger
                .clone()
                .with_prefix(format!("[{}/{}]", i + 1, to_send.len()));
            logger.info(&format!("📤 Sending: {}", article.title));

            match self.deliver(article).await {
                Ok(units) => {
                    logger.info(&format!("✅ Sent in {} message(s)", units));
                    report.delivered += 1;
                }
                Err(e) => {
                    logger.error(&format!("❌ Failed to send {}: {}", article.url, e));
                    report.delivery_failures += 1;
                }
            }
            seen.insert(article.url.clone());

            if i + 1 < to_send.len() {
                sleep(self.settings.send_delay).await;
            }
        }

        if self.settings.dry_run {
            self.logger.info("🧪 Dry run, state left untouched");
        } else {
            self.ledger.save(&seen).await?;
        }

        info!(
            discovered = report.discovered,
            new = report.new,
            failed = report.failed,
            stale = report.stale,
            duplicates = report.duplicates,
            delivered = report.delivered,
            delivery_failures = report.delivery_failures,
            "run.finished"
        );
        Ok(report)
    }

    /// Chunks `article` and delivers its units in order. Stops at the first
    /// unit that cannot be delivered.
    pub async fn deliver(&self, article: &Article) -> Result<usize> {
        let units = self.chunker.chunk(article);

        for (k, unit) in units.iter().enumerate() {
            if let Delivery::SentAfterRateLimit { waited } = self.notifier.deliver(unit).await? {
                debug!(waited_ms = waited.as_millis() as u64, "delivery.rate_limited");
            }
            if k + 1 < units.len() {
                sleep(self.settings.unit_delay).await;
            }
        }

        Ok(units.len())
    }

    /// Every scraper's links, de-duplicated by URL across scrapers.
    async fn collect_links(&self) -> Vec<(&dyn Scraper, ArticleLink)> {
        let mut known = HashSet::new();
        let mut links = Vec::new();

        for scraper in &self.scrapers {
            match scraper.get_article_urls().await {
                Ok(found) => {
                    for link in found {
                        if known.insert(link.url.clone()) {
                            links.push((scraper.as_ref(), link));
                        }
                    }
                }
                Err(e) => warn!("⚠️ Listing {} failed: {}", scraper.source(), e),
            }
        }

        links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sip_core::MessageUnit;
    use sip_storage::MemoryLedger;
    use std::collections::HashMap;
    use std::sync::Mutex;

    const SITE: &str = "https://sip.test";

    struct MockScraper {
        links: Vec<ArticleLink>,
        articles: HashMap<String, Article>,
        listing_fails: bool,
    }

    impl MockScraper {
        fn new(articles: Vec<Article>) -> Self {
            Self {
                links: articles
                    .iter()
                    .map(|a| ArticleLink {
                        url: a.url.clone(),
                        category: a.category.clone(),
                    })
                    .collect(),
                articles: articles.into_iter().map(|a| (a.url.clone(), a)).collect(),
                listing_fails: false,
            }
        }

        fn with_broken_link(mut self, url: &str) -> Self {
            self.links.push(ArticleLink {
                url: url.to_string(),
                category: "Остало".to_string(),
            });
            self
        }
    }

    #[async_trait]
    impl Scraper for MockScraper {
        fn source(&self) -> &str {
            "Mock"
        }

        fn can_handle(&self, url: &str) -> bool {
            url.starts_with(SITE)
        }

        async fn scrape_article(&self, url: &str, category: &str) -> Result<Article> {
            let mut article = self
                .articles
                .get(url)
                .cloned()
                .ok_or_else(|| Error::Unparseable(url.to_string()))?;
            article.category = category.to_string();
            Ok(article)
        }

        async fn get_article_urls(&self) -> Result<Vec<ArticleLink>> {
            if self.listing_fails {
                return Err(Error::Scraping("list page down".to_string()));
            }
            Ok(self.links.clone())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        units: Mutex<Vec<MessageUnit>>,
        failing_urls: HashSet<String>,
    }

    impl RecordingNotifier {
        fn primary_urls(&self) -> Vec<String> {
            self.units
                .lock()
                .unwrap()
                .iter()
                .filter_map(|unit| match unit {
                    MessageUnit::Primary(primary) => Some(primary.url.clone()),
                    MessageUnit::Continuation(_) => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn deliver(&self, unit: &MessageUnit) -> Result<Delivery> {
            if let MessageUnit::Primary(primary) = unit {
                if self.failing_urls.contains(&primary.url) {
                    return Err(Error::Delivery("webhook returned 500".to_string()));
                }
            }
            self.units.lock().unwrap().push(unit.clone());
            Ok(Delivery::Sent)
        }
    }

    fn article(id: u32, title: &str, date: Option<&str>, content: &str) -> Article {
        Article {
            url: format!("{}/article/{}", SITE, id),
            title: title.to_string(),
            date: date.map(str::to_string),
            content: content.to_string(),
            image_url: None,
            category: "Настава".to_string(),
        }
    }

    fn quick_settings() -> RunSettings {
        RunSettings {
            fetch_delay: Duration::ZERO,
            send_delay: Duration::ZERO,
            unit_delay: Duration::ZERO,
            ..RunSettings::default()
        }
    }

    fn manager(
        scraper: MockScraper,
        ledger: &MemoryLedger,
        notifier: &Arc<RecordingNotifier>,
        settings: RunSettings,
    ) -> ScraperManager {
        ScraperManager::new(Arc::new(ledger.clone()), notifier.clone(), settings)
            .with_scrapers(vec![Box::new(scraper)])
    }

    #[test]
    fn test_default_cutoff() {
        let parsed = DateTime::parse_from_rfc3339(DEFAULT_CUTOFF)
            .unwrap()
            .with_timezone(&Utc);
        assert_eq!(RunSettings::default().cutoff, parsed);
    }

    #[tokio::test]
    async fn test_full_run() {
        let recent = article(1, "Распоред испита", Some("05. Дец, 2025. у 10:00"), "Испити почињу у понедељак.");
        let old = article(2, "Стара вест", Some("10. Нов, 2025."), "Ово је стара вест.");
        let duplicate = article(4, "  распоред ИСПИТА ", Some("06. Дец, 2025."), "испити почињу у понедељак.");
        let undated = article(5, "Обавештење", None, "Без датума.");
        let known = article(6, "Већ послато", None, "Ово је већ послато.");

        let scraper = MockScraper::new(vec![recent, old, duplicate, undated, known])
            .with_broken_link(&format!("{}/article/3", SITE));
        let ledger = MemoryLedger::with_seen([format!("{}/article/6", SITE)]);
        let notifier = Arc::new(RecordingNotifier::default());

        let report = manager(scraper, &ledger, &notifier, quick_settings())
            .run()
            .await
            .unwrap();

        assert_eq!(
            report,
            RunReport {
                discovered: 6,
                new: 5,
                failed: 1,
                stale: 1,
                duplicates: 1,
                delivered: 2,
                delivery_failures: 0,
            }
        );
        assert_eq!(
            notifier.primary_urls(),
            vec![format!("{}/article/5", SITE), format!("{}/article/1", SITE)]
        );
        assert_eq!(ledger.len().await, 6);
        for id in 1..=6 {
            assert!(ledger.contains(&format!("{}/article/{}", SITE, id)).await);
        }
    }

    #[tokio::test]
    async fn test_sends_oldest_first() {
        let later = article(1, "Касније", Some("20. Дец, 2025."), "Друга вест по реду.");
        let earlier = article(2, "Раније", Some("03. Дец, 2025. у 09:15"), "Прва вест по реду.");
        let notifier = Arc::new(RecordingNotifier::default());

        manager(MockScraper::new(vec![later, earlier]), &MemoryLedger::new(), &notifier, quick_settings())
            .run()
            .await
            .unwrap();

        assert_eq!(
            notifier.primary_urls(),
            vec![format!("{}/article/2", SITE), format!("{}/article/1", SITE)]
        );
    }

    #[tokio::test]
    async fn test_nothing_new() {
        let known = article(1, "Већ послато", None, "Ово је већ послато.");
        let ledger = MemoryLedger::with_seen([known.url.clone()]);
        let notifier = Arc::new(RecordingNotifier::default());

        let report = manager(MockScraper::new(vec![known]), &ledger, &notifier, quick_settings())
            .run()
            .await
            .unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(report.new, 0);
        assert!(notifier.primary_urls().is_empty());
    }

    #[tokio::test]
    async fn test_failed_delivery_is_still_marked_seen() {
        let broken = article(1, "Не стиже", None, "Ова порука неће проћи.");
        let fine = article(2, "Стиже", None, "Ова порука пролази.");
        let ledger = MemoryLedger::new();
        let notifier = Arc::new(RecordingNotifier {
            failing_urls: [broken.url.clone()].into(),
            ..RecordingNotifier::default()
        });

        let report = manager(MockScraper::new(vec![broken, fine]), &ledger, &notifier, quick_settings())
            .run()
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(report.delivery_failures, 1);
        assert_eq!(ledger.len().await, 2);
    }

    #[tokio::test]
    async fn test_dry_run_leaves_ledger_alone() {
        let fresh = article(1, "Нова вест", None, "Садржај нове вести.");
        let ledger = MemoryLedger::new();
        let notifier = Arc::new(RecordingNotifier::default());
        let settings = RunSettings {
            dry_run: true,
            ..quick_settings()
        };

        let report = manager(MockScraper::new(vec![fresh]), &ledger, &notifier, settings)
            .run()
            .await
            .unwrap();

        assert_eq!(report.delivered, 1);
        assert_eq!(ledger.len().await, 0);
    }

    #[tokio::test]
    async fn test_listing_failure_is_not_fatal() {
        let mut down = MockScraper::new(vec![]);
        down.listing_fails = true;
        let up = MockScraper::new(vec![article(1, "Вест", None, "Садржај вести.")]);
        let ledger = MemoryLedger::new();
        let notifier = Arc::new(RecordingNotifier::default());

        let report = ScraperManager::new(Arc::new(ledger.clone()), notifier.clone(), quick_settings())
            .with_scrapers(vec![Box::new(down), Box::new(up)])
            .run()
            .await
            .unwrap();

        assert_eq!(report.discovered, 1);
        assert_eq!(report.delivered, 1);
    }

    #[tokio::test]
    async fn test_long_article_is_sent_as_several_units() {
        let content = (0..10)
            .map(|i| format!("{} {}", i, "x".repeat(598)))
            .collect::<Vec<_>>()
            .join("\n\n");
        let long = article(1, "Дугачак чланак", None, &content);
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = manager(MockScraper::new(vec![]), &MemoryLedger::new(), &notifier, quick_settings());

        assert_eq!(manager.deliver(&long).await.unwrap(), 2);
        let units = notifier.units.lock().unwrap();
        assert_eq!(units.len(), 2);
        assert_eq!(units[1].footer(), "SIP Elfak Bot • 2/2");
    }

    #[tokio::test]
    async fn test_scraper_lookup() {
        let known = article(1, "Вест", None, "Садржај вести.");
        let notifier = Arc::new(RecordingNotifier::default());
        let manager = manager(MockScraper::new(vec![known]), &MemoryLedger::new(), &notifier, quick_settings());

        assert!(manager.get_scraper_for_url("https://elsewhere.test/x").is_err());
        let article = manager
            .scrape_url(&format!("{}/article/1", SITE))
            .await
            .unwrap();
        assert_eq!(article.title, "Вест");
    }
}
