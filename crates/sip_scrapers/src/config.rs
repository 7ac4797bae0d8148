use crate::locator::SiteLayout;
use crate::normalize::InlineRules;

pub const BASE_URL: &str = "https://sip.elfak.ni.ac.rs";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPage {
    pub url: String,
    pub category: String,
}

impl ListPage {
    pub fn new(url: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            category: category.into(),
        }
    }
}

/// Everything site specific: where to look for articles and how to read them.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub name: String,
    pub base_url: String,
    pub list_pages: Vec<ListPage>,
    /// Anchors on list pages that may point at articles.
    pub article_link: String,
    /// Path fragment every article URL contains.
    pub article_path_marker: String,
    pub layout: SiteLayout,
    pub inline: InlineRules,
    pub empty_placeholder: String,
    pub image_placeholder: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        let categories = [
            ("", "Насловна"),
            ("category/nastava", "Настава"),
            ("category/kalendar", "Календар"),
            ("category/polaganje-ispita", "Полагање испита"),
            ("category/kolokvijumi", "Колоквијуми"),
            ("category/upis-naredne-godine-oas", "Упис наредне године (ОАС)"),
            ("category/mas", "МАС"),
            ("category/das", "ДАС"),
            ("category/obrasci", "Обрасци"),
            ("category/literatura", "Литература"),
            ("category/rezultati", "Резултати"),
            ("category/konkursi", "Конкурси"),
            ("category/ostalo", "Остало"),
            ("category/pomoc", "Помоћ"),
            ("category/kursevi", "Курсеви"),
        ];

        Self {
            name: "SIP Elfak".to_string(),
            base_url: BASE_URL.to_string(),
            list_pages: categories
                .iter()
                .map(|(path, category)| ListPage::new(format!("{}/{}", BASE_URL, path), *category))
                .collect(),
            article_link: "a[href*='/article/']".to_string(),
            article_path_marker: "/article/".to_string(),
            layout: SiteLayout::default(),
            inline: InlineRules::default(),
            empty_placeholder: "(Садржај није доступан)".to_string(),
            image_placeholder: "(Погледајте слику испод)".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_list_pages() {
        let config = SiteConfig::default();
        assert_eq!(config.list_pages.len(), 15);
        assert_eq!(config.list_pages[0].url, "https://sip.elfak.ni.ac.rs/");
        assert_eq!(
            config.list_pages[1],
            ListPage::new("https://sip.elfak.ni.ac.rs/category/nastava", "Настава")
        );
        assert!(config
            .list_pages
            .iter()
            .all(|page| page.url.starts_with(BASE_URL)));
    }
}
