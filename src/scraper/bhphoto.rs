// B&H Photo search. One extraction path serves both the bundle searches and
// the standalone RAM searches; items are data-selenium tagged cards.
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::assembler::{assemble, AssembleContext};
use crate::model::{ComboDeal, ComboType, RawComponent, RawItem, RawListing, Retailer, ScrapeError};
use crate::scraper::Fetch;

const BUNDLE_QUERIES: [&str; 3] = [
    "cpu motherboard ram bundle",
    "motherboard memory bundle",
    "cpu memory bundle",
];

lazy_static! {
    static ref TITLE_SPLIT_RE: Regex = Regex::new(r"\s*[+,]\s*|\s+(?i:with)\s+").unwrap();
}

pub fn search_url(query: &str) -> String {
    format!(
        "https://www.bhphotovideo.com/c/search?q={}",
        query.replace(' ', "%20")
    )
}

/// Extract raw items from a search results page.
pub fn extract_items(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    let item_sel = Selector::parse("[data-selenium='miniProductPage'], .product-item").unwrap();
    let title_sel = Selector::parse(
        "[data-selenium='miniProductPageProductName'], .product-title a",
    )
    .unwrap();
    let price_sel =
        Selector::parse("[data-selenium='uppedDecimalPriceFirst'], .price").unwrap();
    let link_sel = Selector::parse(
        "[data-selenium='miniProductPageProductName'] a, a[data-selenium='miniProductPageProductNameLink'], .product-title a",
    )
    .unwrap();

    let mut items = Vec::new();
    for card in doc.select(&item_sel) {
        let Some(title_el) = card.select(&title_sel).next() else {
            continue;
        };
        let Some(price_el) = card.select(&price_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        let price_text = price_el.text().collect::<String>().trim().to_string();
        let url = card
            .select(&link_sel)
            .next()
            .or_else(|| {
                // The name node itself may be the anchor.
                Some(title_el).filter(|el| el.value().name() == "a")
            })
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                if href.starts_with('/') {
                    format!("https://www.bhphotovideo.com{href}")
                } else {
                    href.to_string()
                }
            })
            .unwrap_or_default();
        if title.is_empty() {
            continue;
        }
        items.push(RawItem { title, price_text, url, in_stock: true });
    }
    items
}

fn item_to_listing(item: &RawItem) -> Option<RawListing> {
    let components: Vec<RawComponent> = TITLE_SPLIT_RE
        .split(&item.title)
        .map(str::trim)
        .filter(|n| n.len() > 3)
        .map(|n| RawComponent { name: n.to_string(), category: None })
        .collect();
    if components.is_empty() {
        return None;
    }
    Some(RawListing {
        title: item.title.clone(),
        price_text: item.price_text.clone(),
        url: item.url.clone(),
        in_stock: item.in_stock,
        components,
    })
}

/// Run the bundle searches, deduplicating by URL.
pub async fn scrape_combos(fetcher: &dyn Fetch) -> Result<Vec<ComboDeal>, ScrapeError> {
    let ctx = AssembleContext { retailer: Retailer::BHPhoto, assume_ddr5: false };
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();

    for query in BUNDLE_QUERIES {
        let url = search_url(query);
        info!(source = "bhphoto", url, "searching");
        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = "bhphoto", query, "query failed: {e}");
                continue;
            }
        };
        for item in extract_items(&html) {
            if item.url.is_empty() || !seen_urls.insert(item.url.clone()) {
                continue;
            }
            let Some(listing) = item_to_listing(&item) else {
                continue;
            };
            let deal = assemble(&listing, ctx);
            if deal.combo_type == ComboType::Other {
                debug!(source = "bhphoto", title = %listing.title, "skipped OTHER");
                continue;
            }
            deals.push(deal);
        }
    }

    info!(source = "bhphoto", count = deals.len(), "total deals");
    Ok(deals)
}
