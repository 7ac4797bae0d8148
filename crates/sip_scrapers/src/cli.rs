use clap::Subcommand;
use sip_core::Result;

use crate::manager::{RunReport, ScraperManager};

#[derive(Subcommand, Debug, Clone, Default, PartialEq, Eq)]
pub enum ScraperCommands {
    /// Check every list page and send new articles
    #[default]
    Run,
    /// Extract a single article and print it
    Url {
        /// Article URL, e.g. https://sip.elfak.ni.ac.rs/article/1000
        url: String,
        /// Also send it through the configured notifier
        #[arg(long)]
        send: bool,
        /// Print the extracted article as JSON
        #[arg(long)]
        json: bool,
    },
    /// List available scrapers
    List,
}

pub async fn handle_command(command: &ScraperCommands, manager: &ScraperManager) -> Result<()> {
    match command {
        ScraperCommands::Run => {
            let report = manager.run().await?;
            print_report(&report);
        }
        ScraperCommands::Url { url, send, json } => {
            let article = manager.scrape_url(url).await?;
            if *json {
                println!("{}", serde_json::to_string_pretty(&article)?);
            } else {
                println!("📰 {}", article.title);
                println!("🔗 {}", article.url);
                if let Some(date) = &article.date {
                    println!("📅 {}", date);
                }
                if let Some(image) = &article.image_url {
                    println!("🖼️ {}", image);
                }
                println!();
                println!("{}", article.content);
            }

            if *send {
                let units = manager.deliver(&article).await?;
                println!();
                println!("✅ Sent in {} message(s)", units);
            }
        }
        ScraperCommands::List => {
            println!("Available scrapers:");
            for scraper in manager.scrapers() {
                println!("  {} ({})", scraper.source(), scraper.cli_names().join(", "));
            }
        }
    }
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("📊 Run summary:");
    println!("   discovered:  {}", report.discovered);
    println!("   new:         {}", report.new);
    println!("   sent:        {}", report.delivered);
    println!("   too old:     {}", report.stale);
    println!("   duplicates:  {}", report.duplicates);
    println!("   unparseable: {}", report.failed);
    if report.delivery_failures > 0 {
        println!("   ❌ failed to send: {}", report.delivery_failures);
    }
}
