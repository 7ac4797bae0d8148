use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An article as extracted from a single SIP page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    /// Date text exactly as the site renders it, e.g. `24. Нов, 2025. у 13:52`.
    pub date: Option<String>,
    pub content: String,
    pub image_url: Option<String>,
    pub category: String,
}

impl Article {
    /// Key used to drop the same announcement posted under several URLs.
    pub fn content_key(&self) -> (String, String) {
        let head: String = self.content.chars().take(500).collect();
        (
            self.title.trim().to_lowercase(),
            head.trim().to_lowercase(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: String,
    pub inline: bool,
}

impl Field {
    pub fn new(name: impl Into<String>, value: impl Into<String>, inline: bool) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            inline,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImagePlacement {
    Large(String),
    Thumbnail(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimaryUnit {
    pub author: Author,
    pub title: String,
    pub url: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub description: String,
    pub fields: Vec<Field>,
    pub image: Option<ImagePlacement>,
    pub footer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuationUnit {
    pub fields: Vec<Field>,
    pub footer: String,
}

/// One independently deliverable message. An article always yields exactly
/// one `Primary` followed by zero or more `Continuation`s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum MessageUnit {
    Primary(PrimaryUnit),
    Continuation(ContinuationUnit),
}

impl MessageUnit {
    pub fn fields(&self) -> &[Field] {
        match self {
            MessageUnit::Primary(unit) => &unit.fields,
            MessageUnit::Continuation(unit) => &unit.fields,
        }
    }

    pub fn footer(&self) -> &str {
        match self {
            MessageUnit::Primary(unit) => &unit.footer,
            MessageUnit::Continuation(unit) => &unit.footer,
        }
    }

    pub fn set_footer(&mut self, footer: String) {
        match self {
            MessageUnit::Primary(unit) => unit.footer = footer,
            MessageUnit::Continuation(unit) => unit.footer = footer,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            MessageUnit::Primary(unit) => Some(&unit.description),
            MessageUnit::Continuation(_) => None,
        }
    }
}
