use crate::config::SiteConfig;
use crate::fetch::Fetcher;
use crate::scrapers::Scraper;
use sip_core::Result;

pub mod sip;

pub use sip::SipScraper;

/// Returns all available Serbian faculty scrapers
pub fn get_scrapers(fetcher: Fetcher) -> Result<Vec<Box<dyn Scraper>>> {
    Ok(vec![Box::new(SipScraper::new(SiteConfig::default(), fetcher)?)])
}
