//! Turning articles into Discord messages and getting them delivered.

pub mod chunker;
pub mod discord;
pub mod log;

pub use chunker::{Branding, Chunker, EmbedLimits};
pub use discord::{DiscordNotifier, WebhookSettings};
pub use log::LogNotifier;
