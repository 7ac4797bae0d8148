//! Finds title, date, lead image and content root in an article page.
//!
//! Each role has an ordered fallback chain: SIP's own markup first, then
//! generic article markup. Only the content root can be missing, and only
//! for a document without a body.

use ego_tree::NodeId;
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use sip_core::{Error, Result};
use url::Url;

use crate::normalize::Linearizer;
use crate::scrapers::utils::{element_text, resolve_url, selector, selectors};

lazy_static! {
    static ref NUMERIC_DATE: Regex =
        Regex::new(r"\b(\d{1,2}\.\s?\d{1,2}\.\s?\d{4}\.?)\b").unwrap();
}

const BODY_DATE_WINDOW: usize = 500;

/// Selectors for every role, as CSS strings.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub title: Vec<String>,
    pub title_meta: String,
    pub untitled: String,
    pub site_date: String,
    pub date_meta: String,
    pub date_time: String,
    pub date_hints: Vec<String>,
    pub image_scope: String,
    pub site_content: Vec<String>,
    pub generic_content: Vec<String>,
    /// Pruned from site content roots only.
    pub banner: String,
    /// Pruned from every content root.
    pub clutter: String,
    /// Site content must be longer than this to be accepted.
    pub min_content_chars: usize,
}

impl Default for SiteLayout {
    fn default() -> Self {
        Self {
            title: vec![
                ".section-heading h3, .section-heading h2, .section-heading h1".to_string(),
                "h1".to_string(),
                "h2".to_string(),
            ],
            title_meta: "meta[property='og:title'], meta[name='title']".to_string(),
            untitled: "Без наслова".to_string(),
            site_date: ".col-lg-4.text-right, [class*='text-right']".to_string(),
            date_meta: "meta[property='article:published_time'], meta[name='date'], meta[itemprop='datePublished']".to_string(),
            date_time: "time".to_string(),
            date_hints: vec![
                "[class*='date']".to_string(),
                "[class*='Date']".to_string(),
                "[class*='datum']".to_string(),
                "[class*='published']".to_string(),
            ],
            image_scope: ".col-md-9 .col-lg-12, .col-lg-12, .col-md-9".to_string(),
            site_content: vec![
                ".col-md-9 .col-lg-12".to_string(),
                ".col-lg-12".to_string(),
                ".col-md-9".to_string(),
            ],
            generic_content: vec![
                "article".to_string(),
                "[class*='content']".to_string(),
                "[class*='article']".to_string(),
                "[class*='post']".to_string(),
                "main".to_string(),
                ".entry-content".to_string(),
            ],
            banner: ".heading-about, .section-heading".to_string(),
            clutter: "nav, footer, aside, [class*='sidebar'], [class*='nav'], .comments, script, style".to_string(),
            min_content_chars: 50,
        }
    }
}

/// [`SiteLayout`] with its selectors compiled, bound to a base URL.
#[derive(Debug, Clone)]
pub struct Locator {
    title: Vec<Selector>,
    title_meta: Selector,
    untitled: String,
    site_date: Selector,
    date_meta: Selector,
    date_time: Selector,
    date_hints: Vec<Selector>,
    image_scope: Selector,
    image: Selector,
    site_content: Vec<Selector>,
    generic_content: Vec<Selector>,
    body: Selector,
    banner: Selector,
    clutter: Selector,
    min_content_chars: usize,
    base: Url,
}

impl Locator {
    pub fn new(layout: &SiteLayout, base: Url) -> Result<Self> {
        Ok(Self {
            title: selectors(&layout.title)?,
            title_meta: selector(&layout.title_meta)?,
            untitled: layout.untitled.clone(),
            site_date: selector(&layout.site_date)?,
            date_meta: selector(&layout.date_meta)?,
            date_time: selector(&layout.date_time)?,
            date_hints: selectors(&layout.date_hints)?,
            image_scope: selector(&layout.image_scope)?,
            image: selector("img")?,
            site_content: selectors(&layout.site_content)?,
            generic_content: selectors(&layout.generic_content)?,
            body: selector("body")?,
            banner: selector(&layout.banner)?,
            clutter: selector(&layout.clutter)?,
            min_content_chars: layout.min_content_chars,
            base,
        })
    }

    pub fn title(&self, document: &Html) -> String {
        self.title
            .iter()
            .filter_map(|sel| document.select(sel).next())
            .map(element_text)
            .find(|text| !text.is_empty())
            .or_else(|| {
                document
                    .select(&self.title_meta)
                    .next()
                    .and_then(|meta| meta.value().attr("content"))
                    .map(|content| content.trim().to_string())
                    .filter(|content| !content.is_empty())
            })
            .unwrap_or_else(|| self.untitled.clone())
    }

    /// Raw date text, left for [`sip_core::DateInterpreter`] to read.
    pub fn date(&self, document: &Html) -> Option<String> {
        if let Some(text) = document
            .select(&self.site_date)
            .next()
            .map(element_text)
            .filter(|text| text.chars().any(|c| c.is_ascii_digit()))
        {
            return Some(text);
        }

        if let Some(content) = document
            .select(&self.date_meta)
            .filter_map(|meta| meta.value().attr("content"))
            .map(str::trim)
            .find(|content| !content.is_empty())
        {
            return Some(content.to_string());
        }

        if let Some(time) = document.select(&self.date_time).next() {
            let machine = time.value().attr("datetime").map(str::trim).unwrap_or("");
            if !machine.is_empty() {
                return Some(machine.to_string());
            }
            let text = element_text(time);
            if !text.is_empty() {
                return Some(text);
            }
        }

        for hint in &self.date_hints {
            if let Some(found) = document
                .select(hint)
                .next()
                .and_then(|element| numeric_date(&element_text(element)))
            {
                return Some(found);
            }
        }

        let body = document.select(&self.body).next()?;
        let head: String = body.text().collect::<String>().chars().take(BODY_DATE_WINDOW).collect();
        numeric_date(&head)
    }

    pub fn image(&self, document: &Html) -> Option<String> {
        let scope = document.select(&self.image_scope).next()?;
        let src = scope.select(&self.image).next()?.value().attr("src")?.trim();
        if src.is_empty() {
            return None;
        }
        Some(resolve_url(&self.base, src))
    }

    /// Linearized content of the best content root. Site containers are
    /// tried in order until one is long enough; otherwise the first generic
    /// container (or the body) is used, even if short. Pruning happens on a
    /// private copy of `document`.
    pub fn content(&self, document: &Html, linearizer: &Linearizer) -> Result<String> {
        let mut work = document.clone();

        for candidate in &self.site_content {
            let Some(root) = work.select(candidate).next().map(|e| e.id()) else {
                continue;
            };
            prune_within(&mut work, root, &[&self.banner, &self.clutter]);
            let text = render_root(&work, root, linearizer);
            if text.chars().count() > self.min_content_chars {
                return Ok(text);
            }
            tracing::debug!(chars = text.chars().count(), "locator.site_content_too_short");
        }

        let root = self
            .generic_content
            .iter()
            .find_map(|candidate| work.select(candidate).next())
            .or_else(|| work.select(&self.body).next())
            .map(|e| e.id())
            .ok_or_else(|| Error::Unparseable("document has no body".to_string()))?;
        prune_within(&mut work, root, &[&self.clutter]);
        Ok(render_root(&work, root, linearizer))
    }

    pub fn min_content_chars(&self) -> usize {
        self.min_content_chars
    }
}

fn numeric_date(text: &str) -> Option<String> {
    NUMERIC_DATE.captures(text).map(|caps| caps[1].to_string())
}

/// Detaches every descendant of `root` matching one of `selectors`.
fn prune_within(document: &mut Html, root: NodeId, selectors: &[&Selector]) {
    let doomed: Vec<NodeId> = match document.tree.get(root).and_then(ElementRef::wrap) {
        Some(root_element) => selectors
            .iter()
            .flat_map(|sel| root_element.select(sel))
            .map(|element| element.id())
            .filter(|id| *id != root)
            .collect(),
        None => return,
    };
    for id in doomed {
        if let Some(mut node) = document.tree.get_mut(id) {
            node.detach();
        }
    }
}

fn render_root(document: &Html, root: NodeId, linearizer: &Linearizer) -> String {
    document
        .tree
        .get(root)
        .and_then(ElementRef::wrap)
        .map(|element| linearizer.linearize(element))
        .unwrap_or_default()
}
