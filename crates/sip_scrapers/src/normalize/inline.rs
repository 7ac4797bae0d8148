use lazy_static::lazy_static;
use scraper::{ElementRef, Node, Selector};
use url::Url;

use crate::scrapers::utils::{collapse_whitespace, resolve_url};

lazy_static! {
    static ref BOLD: Selector = Selector::parse("strong, b").unwrap();
    static ref LINK: Selector = Selector::parse("a").unwrap();
}

#[derive(Debug, Clone)]
pub struct InlineRules {
    /// "Read more" link texts, compared case-insensitively after trimming.
    pub boilerplate: Vec<String>,
    /// Links whose href contains this marker are rendered as plain text.
    pub internal_link_marker: String,
}

impl Default for InlineRules {
    fn default() -> Self {
        Self {
            boilerplate: [
                "opširnije",
                "više",
                "detaljnije",
                "pročitaj više",
                "опширније",
                "више",
                "детаљније",
                "прочитај више",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            internal_link_marker: "/article/".to_string(),
        }
    }
}

impl InlineRules {
    pub fn is_boilerplate(&self, text: &str) -> bool {
        let text = text.trim().to_lowercase();
        self.boilerplate.iter().any(|phrase| *phrase == text)
    }
}

/// Renders one paragraph or list item as a single line with `**bold**`,
/// `[text](url)` and `[**text**](url)` markup. Every inline node is
/// rendered where it stands, so repeated phrases never get confused.
#[derive(Debug, Clone)]
pub struct InlineFormatter {
    rules: InlineRules,
    base: Url,
}

impl InlineFormatter {
    pub fn new(rules: InlineRules, base: Url) -> Self {
        Self { rules, base }
    }

    pub fn rules(&self) -> &InlineRules {
        &self.rules
    }

    pub fn format(&self, element: ElementRef) -> String {
        let mut out = String::new();
        self.render_children(element, false, &mut out);
        collapse_whitespace(&out)
    }

    fn render_children(&self, element: ElementRef, in_bold: bool, out: &mut String) {
        for child in element.children() {
            match child.value() {
                Node::Text(text) => out.push_str(text),
                Node::Element(_) => {
                    if let Some(child) = ElementRef::wrap(child) {
                        self.render_element(child, in_bold, out);
                    }
                }
                _ => {}
            }
        }
    }

    fn render_element(&self, element: ElementRef, in_bold: bool, out: &mut String) {
        match element.value().name() {
            // nested lists become bullets of their own
            "script" | "style" | "ul" | "ol" => {}
            "br" => out.push(' '),
            "a" => self.render_link(element, in_bold, out),
            "strong" | "b" => self.render_bold(element, out),
            _ => self.render_children(element, in_bold, out),
        }
    }

    fn render_link(&self, link: ElementRef, in_bold: bool, out: &mut String) {
        let raw: String = link.text().collect();
        let text = collapse_whitespace(&raw);
        if self.rules.is_boilerplate(&text) {
            return;
        }

        let href = link.value().attr("href").unwrap_or("").trim();
        if text.is_empty() || href.is_empty() || href.contains(&self.rules.internal_link_marker) {
            self.render_children(link, in_bold, out);
            return;
        }

        let url = resolve_url(&self.base, href);
        let markup = if in_bold || link.select(&BOLD).next().is_some() {
            format!("[**{}**]({})", text, url)
        } else {
            format!("[{}]({})", text, url)
        };
        push_keeping_edges(out, &raw, &markup);
    }

    fn render_bold(&self, bold: ElementRef, out: &mut String) {
        if bold.select(&LINK).next().is_some() {
            self.render_children(bold, true, out);
            return;
        }

        let raw: String = bold.text().collect();
        let text = collapse_whitespace(&raw);
        if text.is_empty() {
            out.push_str(&raw);
            return;
        }
        push_keeping_edges(out, &raw, &format!("**{}**", text));
    }
}

/// Pushes `markup`, keeping a separating space where `raw` had whitespace at
/// either edge.
fn push_keeping_edges(out: &mut String, raw: &str, markup: &str) {
    if raw.starts_with(char::is_whitespace) {
        out.push(' ');
    }
    out.push_str(markup);
    if raw.ends_with(char::is_whitespace) {
        out.push(' ');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn render(html: &str) -> String {
        let document = Html::parse_fragment(html);
        let selector = Selector::parse("p, li").unwrap();
        let element = document.select(&selector).next().unwrap();
        let formatter = InlineFormatter::new(
            InlineRules::default(),
            Url::parse("https://sip.elfak.ni.ac.rs").unwrap(),
        );
        formatter.format(element)
    }

    #[test]
    fn test_plain_text_is_collapsed() {
        assert_eq!(render("<p>  Испит   из\n математике </p>"), "Испит из математике");
    }

    #[test]
    fn test_bold() {
        assert_eq!(
            render("<p>Рок је <strong>петак</strong>, у подне.</p>"),
            "Рок је **петак**, у подне."
        );
        assert_eq!(render("<p><b> важно </b>обавештење</p>"), "**важно** обавештење");
    }

    #[test]
    fn test_link_is_resolved() {
        assert_eq!(
            render(r#"<p>Погледајте <a href="/uploads/raspored.pdf">распоред</a>.</p>"#),
            "Погледајте [распоред](https://sip.elfak.ni.ac.rs/uploads/raspored.pdf)."
        );
    }

    #[test]
    fn test_bold_link_either_way() {
        assert_eq!(
            render(r#"<p><strong><a href="https://ex.com/x">Пријава</a></strong> је отворена</p>"#),
            "[**Пријава**](https://ex.com/x) је отворена"
        );
        assert_eq!(
            render(r#"<p><a href="https://ex.com/x"><b>Пријава</b></a> је отворена</p>"#),
            "[**Пријава**](https://ex.com/x) је отворена"
        );
    }

    #[test]
    fn test_bold_around_link_and_text() {
        assert_eq!(
            render(r#"<p><strong>Рок: <a href="/f">формулар</a></strong></p>"#),
            "Рок: [**формулар**](https://sip.elfak.ni.ac.rs/f)"
        );
    }

    #[test]
    fn test_boilerplate_link_is_dropped() {
        assert_eq!(
            render(r#"<p>Нови распоред. <a href="/article/12">Opširnije</a></p>"#),
            "Нови распоред."
        );
        assert_eq!(
            render(r#"<p>Вести <a href="/x">ПРОЧИТАЈ ВИШЕ</a></p>"#),
            "Вести"
        );
    }

    #[test]
    fn test_internal_article_link_is_plain_text() {
        assert_eq!(
            render(r#"<p>Види <a href="/article/55">претходно обавештење</a>.</p>"#),
            "Види претходно обавештење."
        );
    }

    #[test]
    fn test_repeated_phrase_is_rendered_in_place() {
        assert_eq!(
            render(r#"<p>испит и <a href="/ispit">испит</a></p>"#),
            "испит и [испит](https://sip.elfak.ni.ac.rs/ispit)"
        );
    }

    #[test]
    fn test_nested_list_is_skipped_in_item() {
        assert_eq!(
            render("<ul><li>Прво<ul><li>Угњеждено</li></ul></li></ul>"),
            "Прво"
        );
    }

    #[test]
    fn test_line_break_becomes_space() {
        assert_eq!(render("<p>Први<br>Други</p>"), "Први Други");
    }
}
