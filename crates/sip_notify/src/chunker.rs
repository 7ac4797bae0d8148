//! Splits an [`Article`] into Discord-sized [`MessageUnit`]s.
//!
//! Short content goes out as a single primary unit. Longer content is cut
//! along its `**heading**` lines when it has any, otherwise along paragraph
//! breaks. Every unit stays within [`EmbedLimits`] and nothing is dropped
//! except the tail of a section that is explicitly marked as truncated.

use std::mem;

use sip_core::{
    Article, Author, ContinuationUnit, DateInterpreter, Field, ImagePlacement, MessageUnit,
    PrimaryUnit,
};

/// Discord rejects fields with an empty value.
pub const EMPTY_FIELD: &str = "\u{200b}";

const HEADING_BREAK: &str = "\n**";
const PARAGRAPH_BREAK: &str = "\n\n";

/// Room kept for `SIP Elfak Bot • k/N` when filling a unit up to its total.
const FOOTER_RESERVE: usize = 32;

/// Slack left between a truncated value and its marker.
const TRUNCATION_SLACK: usize = 5;

/// Hard sizes enforced by Discord, counted in characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmbedLimits {
    pub description: usize,
    pub field_value: usize,
    pub field_name: usize,
    pub title: usize,
    pub fields_per_unit: usize,
    /// Combined size of all text in one embed.
    pub unit_total: usize,
}

impl Default for EmbedLimits {
    fn default() -> Self {
        Self {
            description: 4096,
            field_value: 1024,
            field_name: 256,
            title: 256,
            fields_per_unit: 25,
            unit_total: 6000,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Branding {
    pub author_name: String,
    pub author_url: String,
    pub footer: String,
    pub date_field: String,
    pub category_field: String,
    /// Description used when the text before the first heading is empty.
    pub intro_placeholder: String,
    /// Prefix for sections without a heading line, numbered from 1.
    pub section_name: String,
    /// Prefix for paragraph overflow fields, numbered from 1.
    pub continuation_name: String,
    pub truncation_marker: String,
    /// Content shorter than this shows the image full size.
    pub large_image_below: usize,
}

impl Default for Branding {
    fn default() -> Self {
        Self {
            author_name: "SIP Elfak".to_string(),
            author_url: "https://sip.elfak.ni.ac.rs".to_string(),
            footer: "SIP Elfak Bot".to_string(),
            date_field: "📅 Објављено".to_string(),
            category_field: "📂 Категорија".to_string(),
            intro_placeholder: "Опширан чланак испод:".to_string(),
            section_name: "Део".to_string(),
            continuation_name: "Наставак".to_string(),
            truncation_marker: "\n\n*(скраћено)*".to_string(),
            large_image_below: 100,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Chunker {
    limits: EmbedLimits,
    branding: Branding,
    dates: DateInterpreter,
}

impl Chunker {
    pub fn new(limits: EmbedLimits, branding: Branding, dates: DateInterpreter) -> Self {
        Self {
            limits,
            branding,
            dates,
        }
    }

    pub fn limits(&self) -> &EmbedLimits {
        &self.limits
    }

    /// One primary unit followed by zero or more continuation units, in
    /// reading order, with footers already stamped.
    pub fn chunk(&self, article: &Article) -> Vec<MessageUnit> {
        let content = article.content.trim();

        let mut units = if content.chars().count() <= self.limits.description {
            let image = article.image_url.clone().map(|url| {
                if content.chars().count() < self.branding.large_image_below {
                    ImagePlacement::Large(url)
                } else {
                    ImagePlacement::Thumbnail(url)
                }
            });
            vec![MessageUnit::Primary(self.primary(article, content, image))]
        } else {
            let sections: Vec<&str> = content.split(HEADING_BREAK).collect();
            let (description, fields) = if sections.len() > 1 {
                self.split_by_headings(&sections)
            } else {
                let (description, rest) = self.split_description(content);
                (description, self.pack_paragraphs(&rest))
            };
            let image = article.image_url.clone().map(ImagePlacement::Thumbnail);

            let mut units = vec![MessageUnit::Primary(self.primary(article, &description, image))];
            units.extend(self.continuation_units(fields));
            units
        };

        self.stamp_footers(&mut units);
        units
    }

    fn primary(&self, article: &Article, description: &str, image: Option<ImagePlacement>) -> PrimaryUnit {
        let description = if description.is_empty() {
            self.branding.intro_placeholder.clone()
        } else {
            description.to_string()
        };

        PrimaryUnit {
            author: Author {
                name: self.branding.author_name.clone(),
                url: self.branding.author_url.clone(),
            },
            title: prefix(article.title.trim(), self.limits.title).to_string(),
            url: article.url.clone(),
            timestamp: article
                .date
                .as_deref()
                .and_then(|raw| self.dates.parse(raw))
                .map(|parsed| parsed.at),
            description,
            fields: self.metadata_fields(article),
            image,
            footer: String::new(),
        }
    }

    fn metadata_fields(&self, article: &Article) -> Vec<Field> {
        let date = article.date.as_deref().map(str::trim).unwrap_or("");
        let category = article.category.trim();

        [
            (&self.branding.date_field, date),
            (&self.branding.category_field, category),
        ]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(name, value)| Field::new(name.as_str(), prefix(value, self.limits.field_value), true))
        .collect()
    }

    fn split_by_headings(&self, sections: &[&str]) -> (String, Vec<Field>) {
        let mut fields = Vec::new();

        let (description, overflow) = self.split_description(sections[0].trim());
        fields.extend(self.pack_paragraphs(&overflow));

        for (i, section) in sections.iter().enumerate().skip(1) {
            fields.push(self.section_field(i, section));
        }

        (description, fields)
    }

    /// `part` is a section as left by splitting on `\n**`, so its first line
    /// has lost the leading marker. Only a line that is bold from end to end
    /// and fits a field name becomes the name. Anything else, such as a
    /// paragraph that merely opens in bold, stays in the value under a
    /// numbered name.
    fn section_field(&self, index: usize, part: &str) -> Field {
        let section = format!("**{}", part);
        if let Some((line, body)) = section.split_once('\n') {
            if let Some(name) = heading_name(line) {
                if name.chars().count() <= self.limits.field_name {
                    return Field::new(name, self.fit_value(body.trim()), false);
                }
            }
        }

        Field::new(
            format!("{} {}", self.branding.section_name, index),
            self.fit_value(section.trim()),
            false,
        )
    }

    fn fit_value(&self, value: &str) -> String {
        if value.is_empty() {
            return EMPTY_FIELD.to_string();
        }
        if value.chars().count() <= self.limits.field_value {
            return value.to_string();
        }
        let keep = self
            .limits
            .field_value
            .saturating_sub(self.branding.truncation_marker.chars().count() + TRUNCATION_SLACK);
        format!("{}{}", prefix(value, keep).trim_end(), self.branding.truncation_marker)
    }

    /// Longest prefix that fits the description, pulled back to the last
    /// paragraph break when that break lies past the halfway point.
    fn split_description(&self, text: &str) -> (String, String) {
        let limit = self.limits.description;
        if text.chars().count() <= limit {
            return (text.to_string(), String::new());
        }

        let window = prefix(text, limit);
        match window.rfind(PARAGRAPH_BREAK) {
            Some(cut) if window[..cut].chars().count() > limit / 2 => (
                text[..cut].trim_end().to_string(),
                text[cut..].trim().to_string(),
            ),
            _ => (
                window.to_string(),
                text[window.len()..].trim().to_string(),
            ),
        }
    }

    /// Greedy packing of paragraphs into numbered overflow fields.
    fn pack_paragraphs(&self, text: &str) -> Vec<Field> {
        let limit = self.limits.field_value;
        let mut fields = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        let pieces = text
            .split(PARAGRAPH_BREAK)
            .map(str::trim)
            .filter(|paragraph| !paragraph.is_empty())
            .flat_map(|paragraph| hard_split(paragraph, limit));

        for piece in pieces {
            let piece_len = piece.chars().count();
            if !current.is_empty() && current_len + piece_len + PARAGRAPH_BREAK.len() > limit {
                fields.push(self.overflow_field(fields.len() + 1, &current));
                current.clear();
                current_len = 0;
            }
            current.push_str(piece);
            current.push_str(PARAGRAPH_BREAK);
            current_len += piece_len + PARAGRAPH_BREAK.len();
        }
        if !current.trim().is_empty() {
            fields.push(self.overflow_field(fields.len() + 1, &current));
        }

        fields
    }

    fn overflow_field(&self, number: usize, value: &str) -> Field {
        Field::new(
            format!("{} {}", self.branding.continuation_name, number),
            value.trim(),
            false,
        )
    }

    fn continuation_units(&self, fields: Vec<Field>) -> Vec<MessageUnit> {
        let budget = self.limits.unit_total.saturating_sub(FOOTER_RESERVE);
        let mut units = Vec::new();
        let mut current: Vec<Field> = Vec::new();
        let mut used = 0;

        for field in fields {
            let size = field.name.chars().count() + field.value.chars().count();
            let full = current.len() >= self.limits.fields_per_unit || used + size > budget;
            if !current.is_empty() && full {
                units.push(continuation(mem::take(&mut current)));
                used = 0;
            }
            used += size;
            current.push(field);
        }
        if !current.is_empty() {
            units.push(continuation(current));
        }

        units
    }

    fn stamp_footers(&self, units: &mut [MessageUnit]) {
        let total = units.len();
        for (k, unit) in units.iter_mut().enumerate() {
            let footer = if total == 1 {
                self.branding.footer.clone()
            } else {
                format!("{} • {}/{}", self.branding.footer, k + 1, total)
            };
            unit.set_footer(footer);
        }
    }
}

fn continuation(fields: Vec<Field>) -> MessageUnit {
    MessageUnit::Continuation(ContinuationUnit {
        fields,
        footer: String::new(),
    })
}

/// `Title` for a `**Title**` line, `None` for any other line.
fn heading_name(line: &str) -> Option<&str> {
    let inner = line.trim().strip_prefix("**")?.strip_suffix("**")?.trim();
    if inner.is_empty() || inner.contains("**") {
        None
    } else {
        Some(inner)
    }
}

/// The first `max` characters of `text`.
fn prefix(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}

/// Pieces of at most `limit` characters, broken at whitespace where possible.
fn hard_split(text: &str, limit: usize) -> Vec<&str> {
    let mut pieces = Vec::new();
    let mut rest = text.trim();

    while rest.chars().count() > limit {
        // One extra character so a break right after the limit still counts.
        let cut = prefix(rest, limit + 1)
            .rfind(char::is_whitespace)
            .filter(|&at| at > 0)
            .unwrap_or_else(|| prefix(rest, limit).len());
        pieces.push(rest[..cut].trim_end());
        rest = rest[cut..].trim_start();
    }
    if !rest.is_empty() {
        pieces.push(rest);
    }

    pieces
}
