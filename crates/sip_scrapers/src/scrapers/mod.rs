use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sip_core::{Article, Result};

pub mod serbia;

pub use serbia::SipScraper;

/// An article link found on a list page, tagged with that page's category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleLink {
    pub url: String,
    pub category: String,
}

#[async_trait]
pub trait Scraper: Send + Sync {
    /// Returns the name of the news source
    fn source(&self) -> &str;

    /// Returns true if this scraper can handle the given URL
    fn can_handle(&self, url: &str) -> bool;

    /// Fetches and extracts an article from the given URL
    async fn scrape_article(&self, url: &str, category: &str) -> Result<Article>;

    /// Returns the article links of every list page, first category wins
    async fn get_article_urls(&self) -> Result<Vec<ArticleLink>>;

    /// Returns a list of CLI shorthand names for this scraper
    fn cli_names(&self) -> Vec<&str> {
        vec![]
    }
}

/// Common utilities for scrapers
pub(crate) mod utils {
    use scraper::{ElementRef, Selector};
    use sip_core::{Error, Result};
    use url::Url;

    pub fn parse_url(url: &str) -> Result<Url> {
        Url::parse(url).map_err(|e| Error::InvalidUrl(format!("{}: {}", url, e)))
    }

    pub fn selector(css: &str) -> Result<Selector> {
        Selector::parse(css).map_err(|e| Error::Selector(format!("{}: {:?}", css, e)))
    }

    pub fn selectors<S: AsRef<str>>(css: &[S]) -> Result<Vec<Selector>> {
        css.iter().map(|s| selector(s.as_ref())).collect()
    }

    /// Absolute references pass through; anything else is joined against
    /// `base`. Unjoinable references are returned untouched.
    pub fn resolve_url(base: &Url, href: &str) -> String {
        if href.starts_with("http") {
            return href.to_string();
        }
        base.join(href)
            .map(|url| url.to_string())
            .unwrap_or_else(|_| href.to_string())
    }

    /// Whitespace-collapsed text of an element.
    pub fn element_text(element: ElementRef) -> String {
        collapse_whitespace(&element.text().collect::<String>())
    }

    pub fn collapse_whitespace(text: &str) -> String {
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}
