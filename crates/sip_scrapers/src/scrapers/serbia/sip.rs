use std::collections::HashSet;

use async_trait::async_trait;
use scraper::{Html, Selector};
use sip_core::{Article, Error, Result};
use tracing::{debug, info, warn};
use url::Url;

use crate::config::SiteConfig;
use crate::fetch::Fetcher;
use crate::locator::Locator;
use crate::normalize::{InlineFormatter, Linearizer};
use crate::scrapers::utils::{parse_url, selector};
use crate::scrapers::{ArticleLink, Scraper};

/// Student information portal of the Faculty of Electronic Engineering, Niš.
#[derive(Debug, Clone)]
pub struct SipScraper {
    config: SiteConfig,
    base: Url,
    fetcher: Fetcher,
    locator: Locator,
    linearizer: Linearizer,
    article_link: Selector,
}

impl SipScraper {
    pub fn new(config: SiteConfig, fetcher: Fetcher) -> Result<Self> {
        let base = parse_url(&config.base_url)?;
        let locator = Locator::new(&config.layout, base.clone())?;
        let linearizer =
            Linearizer::new(InlineFormatter::new(config.inline.clone(), base.clone()));
        let article_link = selector(&config.article_link)?;
        Ok(Self {
            config,
            base,
            fetcher,
            locator,
            linearizer,
            article_link,
        })
    }

    /// Builds an [`Article`] from an already fetched page.
    pub fn extract_article(&self, html: &str, url: &str, category: &str) -> Result<Article> {
        if html.trim().is_empty() {
            return Err(Error::Unparseable(format!("empty page: {}", url)));
        }
        let document = Html::parse_document(html);

        let title = self.locator.title(&document);
        let date = self.locator.date(&document);
        let image_url = self.locator.image(&document);
        let mut content = self.locator.content(&document, &self.linearizer)?;

        if content.chars().count() < self.locator.min_content_chars() {
            content = if image_url.is_some() {
                self.config.image_placeholder.clone()
            } else {
                warn!(url, "⚠️ No content or image extracted");
                self.config.empty_placeholder.clone()
            };
        }

        debug!(
            url,
            title = %title,
            date = ?date,
            image = ?image_url,
            chars = content.chars().count(),
            "article.extracted"
        );

        Ok(Article {
            url: url.to_string(),
            title,
            date,
            content,
            image_url,
            category: category.to_string(),
        })
    }

    /// Absolute article URLs linked from a list page, in page order.
    pub fn extract_article_urls(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let marker = self.config.article_path_marker.as_str();
        let mut seen = HashSet::new();

        document
            .select(&self.article_link)
            .filter_map(|link| link.value().attr("href"))
            .map(str::trim)
            .filter(|href| href.contains(marker))
            .filter_map(|href| self.base.join(href).ok())
            .filter(|url| url.path().contains(marker))
            .map(|url| url.to_string())
            .filter(|url| seen.insert(url.clone()))
            .collect()
    }
}

#[async_trait]
impl Scraper for SipScraper {
    fn source(&self) -> &str {
        &self.config.name
    }

    fn can_handle(&self, url: &str) -> bool {
        Url::parse(url)
            .map(|url| url.host_str().is_some() && url.host_str() == self.base.host_str())
            .unwrap_or(false)
    }

    fn cli_names(&self) -> Vec<&str> {
        vec!["sip", "elfak"]
    }

    async fn scrape_article(&self, url: &str, category: &str) -> Result<Article> {
        let html = self.fetcher.fetch(url).await?;
        self.extract_article(&html, url, category)
    }

    async fn get_article_urls(&self) -> Result<Vec<ArticleLink>> {
        let mut known = HashSet::new();
        let mut links = Vec::new();

        for page in &self.config.list_pages {
            info!("🔍 Scanning: {} ({})", page.url, page.category);
            let html = match self.fetcher.fetch(&page.url).await {
                Ok(html) => html,
                Err(e) => {
                    warn!("⚠️ Skipping list page {}: {}", page.url, e);
                    continue;
                }
            };

            let urls = self.extract_article_urls(&html);
            info!("   Found {} article URLs", urls.len());
            for url in urls {
                if known.insert(url.clone()) {
                    links.push(ArticleLink {
                        url,
                        category: page.category.clone(),
                    });
                }
            }
        }

        Ok(links)
    }
}
