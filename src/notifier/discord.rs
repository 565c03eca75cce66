// Discord webhook notifications for new and expired deals.
use chrono::Local;
use serde_json::{json, Value};
use tracing::info;

use crate::model::{ComboDeal, NotifyError, RamDeal};
use crate::normalizer::shorten_ram;

// Discord caps embeds at 10 per message.
const MAX_EMBEDS_PER_MESSAGE: usize = 10;

const COLOR_GREEN: u32 = 0x57F287;
const COLOR_MAGENTA: u32 = 0xE040FB;
const COLOR_RED: u32 = 0xED4245;

fn footer(prefix: &str) -> Value {
    json!({ "text": format!("{prefix} {}", Local::now().format("%Y-%m-%d %H:%M")) })
}

fn retailer_from_url(url: &str) -> &'static str {
    if url.contains("newegg.com") {
        "Newegg"
    } else if url.contains("amazon.com") {
        "Amazon"
    } else if url.contains("microcenter.com") {
        "MicroCenter"
    } else if url.contains("bhphotovideo.com") {
        "BHPhoto"
    } else {
        "Unknown"
    }
}

pub fn combo_embed(deal: &ComboDeal) -> Value {
    let mut parts = Vec::new();
    if !deal.cpu_name.is_empty() {
        parts.push(format!("**CPU:** {} ({})", deal.cpu_name, deal.cpu_cores));
    }
    if !deal.motherboard_name.is_empty() {
        parts.push(format!("**MB:** {}", deal.motherboard_name));
    }
    if !deal.ram_name.is_empty() {
        let mut ram_info = deal.ram_name.clone();
        if deal.ram_capacity_gb > 0 {
            ram_info.push_str(&format!(" ({}GB", deal.ram_capacity_gb));
            if deal.ram_speed_mhz > 0 {
                ram_info.push_str(&format!(" @ {}MHz", deal.ram_speed_mhz));
            }
            ram_info.push(')');
        }
        parts.push(format!("**RAM:** {ram_info}"));
    }
    let mut description = parts.join("\n");

    let mut price_line = format!("**Combo Price:** ${:.2}", deal.combo_price);
    if deal.savings > 0.0 {
        price_line.push_str(&format!(
            "  |  **Save ${:.2}** ({:.0}%)",
            deal.savings,
            deal.savings_percent()
        ));
    }
    description.push_str(&format!("\n\n{price_line}"));

    if deal.cpu_sc_score > 0 {
        description.push_str(&format!(
            "\n**Benchmark:** SC {} / MC {}",
            deal.cpu_sc_score, deal.cpu_mc_score
        ));
    }

    json!({
        "title": format!("[{}] {} — ${:.0}", deal.retailer, deal.combo_type, deal.combo_price),
        "description": description,
        "url": deal.url,
        "color": COLOR_GREEN,
        "footer": footer("Found"),
    })
}

pub fn ram_embed(deal: &RamDeal) -> Value {
    let mut description = format!("**RAM:** {}", shorten_ram(&deal.name));
    description.push_str(&format!("\n**Capacity:** {}GB", deal.capacity_gb));
    if deal.speed_mhz > 0 {
        description.push_str(&format!(" @ {}MHz", deal.speed_mhz));
    }
    description.push_str(&format!("\n\n**Price:** ${:.2}", deal.price));
    if deal.amazon_price > 0.0 {
        description.push_str(&format!("  |  **Amazon:** ${:.2}", deal.amazon_price));
    }
    if deal.savings > 0.0 {
        description.push_str(&format!("  |  **Save ${:.2}**", deal.savings));
    }

    json!({
        "title": format!(
            "[{}] {}GB DDR5 RAM — ${:.0}",
            deal.retailer, deal.capacity_gb, deal.price
        ),
        "description": description,
        "url": deal.url,
        "color": COLOR_MAGENTA,
        "footer": footer("Found"),
    })
}

pub fn out_of_stock_embed(deal: &ComboDeal) -> Value {
    let mut parts = Vec::new();
    if !deal.cpu_name.is_empty() {
        parts.push(format!("**CPU:** {}", deal.cpu_name));
    }
    if !deal.motherboard_name.is_empty() {
        parts.push(format!("**MB:** {}", deal.motherboard_name));
    }
    if !deal.ram_name.is_empty() {
        parts.push(format!("**RAM:** {}", deal.ram_name));
    }
    let mut description =
        if parts.is_empty() { deal.url.clone() } else { parts.join("\n") };
    description.push_str(&format!("\n\n**Last price:** ${:.2}", deal.combo_price));

    json!({
        "title": format!("[{}] {} — OUT OF STOCK", deal.retailer, deal.combo_type),
        "description": description,
        "url": deal.url,
        "color": COLOR_RED,
        "footer": footer("Detected"),
    })
}

pub fn disappeared_embed(url: &str) -> Value {
    json!({
        "title": format!("[{}] Deal no longer listed", retailer_from_url(url)),
        "description": url,
        "url": url,
        "color": COLOR_RED,
        "footer": footer("Detected"),
    })
}

pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self { client: reqwest::Client::new(), webhook_url: webhook_url.into() }
    }

    pub fn is_configured(&self) -> bool {
        !self.webhook_url.is_empty()
    }

    async fn dispatch(&self, payload: &Value) -> Result<(), NotifyError> {
        let response = self.client.post(&self.webhook_url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::BadStatus(status.as_u16()));
        }
        Ok(())
    }

    /// Send batched embeds with a headline on the first message. Any failed
    /// dispatch propagates so the caller leaves the seen-set untouched and
    /// the deals re-notify next run.
    async fn send_batched(&self, headline: &str, embeds: Vec<Value>) -> Result<usize, NotifyError> {
        if !self.is_configured() || embeds.is_empty() {
            return Ok(0);
        }
        let total = embeds.len();
        for (i, batch) in embeds.chunks(MAX_EMBEDS_PER_MESSAGE).enumerate() {
            let content = if i == 0 { Value::String(headline.to_string()) } else { Value::Null };
            let payload = json!({ "content": content, "embeds": batch });
            self.dispatch(&payload).await?;
            info!(batch = i + 1, count = batch.len(), "discord batch sent");
        }
        Ok(total)
    }

    pub async fn notify_combo_deals(&self, deals: &[&ComboDeal]) -> Result<usize, NotifyError> {
        self.send_batched(
            &format!("**🔔 {} New Combo Deal(s) Found!**", deals.len()),
            deals.iter().map(|d| combo_embed(d)).collect(),
        )
        .await
    }

    pub async fn notify_ram_deals(&self, deals: &[&RamDeal]) -> Result<usize, NotifyError> {
        self.send_batched(
            &format!("**🧠 {} New DDR5 RAM Deal(s) Found!**", deals.len()),
            deals.iter().map(|d| ram_embed(d)).collect(),
        )
        .await
    }

    pub async fn notify_expired(
        &self,
        oos_deals: &[&ComboDeal],
        disappeared: &[String],
    ) -> Result<usize, NotifyError> {
        let mut embeds: Vec<Value> = oos_deals.iter().map(|d| out_of_stock_embed(d)).collect();
        embeds.extend(disappeared.iter().map(|url| disappeared_embed(url)));
        let total = embeds.len();
        self.send_batched(&format!("**❌ {total} Deal(s) Expired**"), embeds).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Category, Component, Retailer};

    fn deal() -> ComboDeal {
        let mut deal = ComboDeal::new(
            Retailer::Newegg,
            vec![
                Component {
                    individual_price: 449.0,
                    ..Component::new("AMD Ryzen 7 9800X3D", Category::Cpu)
                },
                Component {
                    individual_price: 129.0,
                    ..Component::new("G.SKILL 32GB DDR5-6000", Category::Ram)
                },
            ],
            500.0,
            "https://www.newegg.com/combo/1".into(),
        );
        crate::assembler::project_display_fields(&mut deal);
        deal.ram_capacity_gb = 32;
        deal.ram_speed_mhz = 6000;
        deal.cpu_cores = "8C/16T".into();
        deal.cpu_sc_score = 4700;
        deal.cpu_mc_score = 36000;
        deal.calculate_savings();
        deal
    }

    #[test]
    fn combo_embed_carries_components_and_savings() {
        let embed = combo_embed(&deal());
        let description = embed["description"].as_str().unwrap();
        assert!(description.contains("**CPU:** AMD Ryzen 7 9800X3D (8C/16T)"));
        assert!(description.contains("**RAM:** G.SKILL 32GB DDR5-6000 (32GB @ 6000MHz)"));
        assert!(description.contains("**Save $78.00**"));
        assert!(description.contains("**Benchmark:** SC 4700 / MC 36000"));
        assert_eq!(embed["title"], "[Newegg] CPU+RAM — $500");
        assert_eq!(embed["color"], COLOR_GREEN);
    }

    #[test]
    fn ram_embed_includes_reference_price() {
        let mut ram = RamDeal::new(Retailer::MicroCenter, "Kit 64GB DDR5-6000", "https://m/1");
        ram.capacity_gb = 64;
        ram.speed_mhz = 6000;
        ram.price = 180.0;
        ram.amazon_price = 210.0;
        ram.savings = 30.0;
        let embed = ram_embed(&ram);
        let description = embed["description"].as_str().unwrap();
        assert!(description.contains("**Amazon:** $210.00"));
        assert!(description.contains("**Save $30.00**"));
        assert_eq!(embed["title"], "[MicroCenter] 64GB DDR5 RAM — $180");
    }

    #[test]
    fn disappeared_embed_names_the_retailer() {
        let embed = disappeared_embed("https://www.microcenter.com/product/1/bundle");
        assert_eq!(embed["title"], "[MicroCenter] Deal no longer listed");
        assert_eq!(embed["color"], COLOR_RED);
    }

    #[tokio::test]
    async fn unconfigured_webhook_short_circuits() {
        let notifier = DiscordNotifier::new("");
        let d = deal();
        assert_eq!(notifier.notify_combo_deals(&[&d]).await.unwrap(), 0);
        assert_eq!(notifier.notify_expired(&[], &[]).await.unwrap(), 0);
    }
}
