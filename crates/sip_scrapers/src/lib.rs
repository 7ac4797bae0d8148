pub mod cli;
pub mod config;
pub mod fetch;
pub mod locator;
pub mod logging;
pub mod manager;
pub mod normalize;
pub mod scrapers;

pub use cli::{handle_command, ScraperCommands};
pub use config::{ListPage, SiteConfig, BASE_URL};
pub use fetch::{FetchConfig, Fetcher};
pub use logging::{init_logging, Logger};
pub use manager::{RunReport, RunSettings, ScraperManager, DEFAULT_CUTOFF};
pub use scrapers::{ArticleLink, Scraper, SipScraper};

pub mod prelude {
    pub use super::scrapers::Scraper;
    pub use super::{RunSettings, ScraperManager};
    pub use sip_core::{Article, Error, Result};
}
