// Amazon combo/bundle search. Prices arrive split into whole and fraction
// nodes; titles are one long string with components joined by "+" or commas.
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::assembler::{assemble, AssembleContext};
use crate::model::{ComboDeal, ComboType, RawComponent, RawListing, Retailer, ScrapeError};
use crate::scraper::Fetch;

const SEARCH_QUERIES: [&str; 8] = [
    "CPU motherboard RAM combo",
    "processor motherboard memory bundle",
    "AMD Ryzen motherboard RAM combo",
    "Intel Core motherboard RAM combo",
    "motherboard RAM combo",
    "motherboard memory bundle",
    "CPU RAM combo",
    "processor memory bundle",
];

lazy_static! {
    static ref TITLE_SPLIT_RE: Regex = Regex::new(r"\s*[+,]\s*").unwrap();
}

pub fn search_url(query: &str) -> String {
    format!("https://www.amazon.com/s?k={}", query.replace(' ', "+"))
}

/// Extract combo listings from an Amazon search results page.
pub fn extract_listings(html: &str) -> Vec<RawListing> {
    let doc = Html::parse_document(html);
    let result_sel = Selector::parse("[data-component-type='s-search-result']").unwrap();
    let title_sel = Selector::parse("h2 a span, .a-text-normal").unwrap();
    let whole_sel = Selector::parse(".a-price-whole").unwrap();
    let frac_sel = Selector::parse(".a-price-fraction").unwrap();
    let link_sel = Selector::parse("h2 a").unwrap();

    let mut listings = Vec::new();
    for item in doc.select(&result_sel) {
        let Some(title_el) = item.select(&title_sel).next() else {
            continue;
        };
        let Some(whole_el) = item.select(&whole_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }

        let whole = whole_el.text().collect::<String>();
        let whole = whole.trim().trim_end_matches('.').to_string();
        let frac = item
            .select(&frac_sel)
            .next()
            .map(|f| f.text().collect::<String>().trim().to_string())
            .unwrap_or_else(|| "00".to_string());
        let price_text = format!("${whole}.{frac}");

        let url = item
            .select(&link_sel)
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(|href| {
                if href.starts_with('/') {
                    format!("https://www.amazon.com{href}")
                } else {
                    href.to_string()
                }
            })
            .unwrap_or_default();

        let components: Vec<RawComponent> = TITLE_SPLIT_RE
            .split(&title)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| RawComponent { name: n.to_string(), category: None })
            .collect();
        if components.is_empty() {
            continue;
        }

        listings.push(RawListing { title, price_text, url, in_stock: true, components });
    }
    listings
}

/// Run all combo searches, deduplicating by URL. A single failed query is
/// logged and skipped; the source only errors if the fetcher does.
pub async fn scrape_combos(fetcher: &dyn Fetch) -> Result<Vec<ComboDeal>, ScrapeError> {
    let ctx = AssembleContext { retailer: Retailer::Amazon, assume_ddr5: false };
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();

    for query in SEARCH_QUERIES {
        let url = search_url(query);
        info!(source = "amazon", url, "searching");
        let html = match fetcher.fetch(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(source = "amazon", query, "query failed: {e}");
                continue;
            }
        };
        for listing in extract_listings(&html) {
            if listing.url.is_empty() || !seen_urls.insert(listing.url.clone()) {
                continue;
            }
            let deal = assemble(&listing, ctx);
            if deal.combo_type == ComboType::Other {
                debug!(source = "amazon", title = %listing.title, "skipped OTHER");
                continue;
            }
            deals.push(deal);
        }
    }

    info!(source = "amazon", count = deals.len(), "total deals");
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <div data-component-type="s-search-result">
            <h2><a href="/Gaming-Bundle/dp/B0TESTASIN1/ref=sr_1_1?qid=1700000000">
                <span>AMD Ryzen 7 9800X3D + ASUS TUF GAMING X870-PLUS WIFI +
                G.SKILL Trident Z5 32GB (2x16GB) DDR5 6000</span>
            </a></h2>
            <span class="a-price-whole">1,099.</span>
            <span class="a-price-fraction">99</span>
        </div>
        <div data-component-type="s-search-result">
            <h2><a href="/dp/B0TESTASIN2"><span>Random USB Hub, 4-Port</span></a></h2>
            <span class="a-price-whole">19.</span>
            <span class="a-price-fraction">99</span>
        </div>
    "#;

    #[test]
    fn listings_carry_assembled_price() {
        let listings = extract_listings(SEARCH_PAGE);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].price_text, "$1,099.99");
        assert!(listings[0].url.starts_with("https://www.amazon.com/Gaming-Bundle/dp/"));
        assert_eq!(listings[0].components.len(), 3);
    }

    #[tokio::test]
    async fn scrape_keeps_combos_drops_noise() {
        struct Fixture;
        #[async_trait::async_trait]
        impl Fetch for Fixture {
            async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
                // Only the first query returns results; the rest would
                // re-yield the same URLs anyway.
                if url.ends_with("CPU+motherboard+RAM+combo") {
                    Ok(SEARCH_PAGE.to_string())
                } else {
                    Ok(String::new())
                }
            }
        }
        let deals = scrape_combos(&Fixture).await.unwrap();
        // The USB hub splits into unknown components and falls out as OTHER.
        assert_eq!(deals.len(), 1);
        assert_eq!(deals[0].combo_type, ComboType::CpuMbRam);
        assert_eq!(deals[0].combo_price, 1099.99);
    }
}
