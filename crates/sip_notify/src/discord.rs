use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::RETRY_AFTER;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use sip_core::{Delivery, Error, ImagePlacement, MessageUnit, Notifier, Result};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub username: String,
    pub avatar_url: String,
    pub color: u32,
    pub timeout: Duration,
    /// Wait used when a 429 response does not say how long to back off.
    pub default_retry_after: Duration,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            username: "Elfak SIP".to_string(),
            avatar_url: "https://yt3.googleusercontent.com/ytc/AIdro_n4cTULTyyibS74QLgtHRRfo6p35NRl1xOp_jlxtqgjYQ=s900-c-k-c0x00ffffff-no-rj".to_string(),
            color: 0x0099FF,
            timeout: Duration::from_secs(10),
            default_retry_after: Duration::from_secs(5),
        }
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    username: &'a str,
    avatar_url: &'a str,
    embeds: Vec<Embed<'a>>,
}

#[derive(Serialize)]
struct Embed<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    author: Option<EmbedAuthor<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    url: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    color: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    timestamp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    image: Option<EmbedImage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thumbnail: Option<EmbedImage<'a>>,
    footer: EmbedFooter<'a>,
}

#[derive(Serialize)]
struct EmbedAuthor<'a> {
    name: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct EmbedField<'a> {
    name: &'a str,
    value: &'a str,
    inline: bool,
}

#[derive(Serialize)]
struct EmbedImage<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct EmbedFooter<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct RateLimited {
    retry_after: Option<f64>,
}

/// Posts one embed per [`MessageUnit`] to a Discord webhook.
pub struct DiscordNotifier {
    client: Client,
    webhook: String,
    settings: WebhookSettings,
}

impl fmt::Debug for DiscordNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiscordNotifier")
            .field("webhook", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl DiscordNotifier {
    pub fn new(webhook: impl Into<String>, settings: WebhookSettings) -> Result<Self> {
        let webhook = webhook.into();
        if webhook.trim().is_empty() {
            return Err(Error::Delivery("Discord webhook URL is required".to_string()));
        }
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(Self {
            client,
            webhook,
            settings,
        })
    }

    fn payload<'a>(&'a self, unit: &'a MessageUnit) -> WebhookPayload<'a> {
        let fields = unit
            .fields()
            .iter()
            .map(|field| EmbedField {
                name: &field.name,
                value: &field.value,
                inline: field.inline,
            })
            .collect();
        let footer = EmbedFooter {
            text: unit.footer(),
        };

        let embed = match unit {
            MessageUnit::Primary(primary) => {
                let (image, thumbnail) = match &primary.image {
                    Some(ImagePlacement::Large(url)) => (Some(EmbedImage { url: url.as_str() }), None),
                    Some(ImagePlacement::Thumbnail(url)) => (None, Some(EmbedImage { url: url.as_str() })),
                    None => (None, None),
                };
                Embed {
                    author: Some(EmbedAuthor {
                        name: &primary.author.name,
                        url: &primary.author.url,
                    }),
                    title: Some(primary.title.as_str()),
                    url: Some(primary.url.as_str()),
                    description: Some(primary.description.as_str()),
                    color: self.settings.color,
                    timestamp: Some(primary.timestamp.unwrap_or_else(Utc::now).to_rfc3339()),
                    fields,
                    image,
                    thumbnail,
                    footer,
                }
            }
            MessageUnit::Continuation(_) => Embed {
                author: None,
                title: None,
                url: None,
                description: None,
                color: self.settings.color,
                timestamp: None,
                fields,
                image: None,
                thumbnail: None,
                footer,
            },
        };

        WebhookPayload {
            username: &self.settings.username,
            avatar_url: &self.settings.avatar_url,
            embeds: vec![embed],
        }
    }

    async fn post(&self, payload: &WebhookPayload<'_>) -> Result<Response> {
        Ok(self.client.post(&self.webhook).json(payload).send().await?)
    }

    /// How long a 429 asks us to wait: the JSON `retry_after`, then the
    /// `Retry-After` header, then the configured default.
    async fn retry_after(&self, response: Response) -> Duration {
        let header = response
            .headers()
            .get(RETRY_AFTER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<f64>().ok());
        let body = response
            .json::<RateLimited>()
            .await
            .ok()
            .and_then(|limited| limited.retry_after);

        body.or(header)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
            .unwrap_or(self.settings.default_retry_after)
    }
}

async fn ensure_success(response: Response) -> Result<()> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::Delivery(format!(
        "webhook returned {}: {}",
        status,
        body.trim()
    )))
}

#[async_trait]
impl Notifier for DiscordNotifier {
    fn name(&self) -> &str {
        "discord"
    }

    async fn deliver(&self, unit: &MessageUnit) -> Result<Delivery> {
        let payload = self.payload(unit);
        let response = self.post(&payload).await?;

        if response.status() == StatusCode::TOO_MANY_REQUESTS {
            let waited = self.retry_after(response).await;
            warn!("⚠️ Discord rate limit hit! Waiting {:.1}s...", waited.as_secs_f64());
            tokio::time::sleep(waited).await;

            let retry = self.post(&payload).await?;
            ensure_success(retry).await?;
            return Ok(Delivery::SentAfterRateLimit { waited });
        }

        ensure_success(response).await?;
        debug!(footer = unit.footer(), "discord.delivered");
        Ok(Delivery::Sent)
    }
}
