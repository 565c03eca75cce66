// Standalone DDR5 RAM kit collection for all four retailers, reusing each
// retailer's search-page extraction.
use std::collections::HashSet;
use tracing::{debug, info};

use crate::assembler::resolve_url;
use crate::classifier::is_likely_ram;
use crate::model::{RamDeal, RawItem, Retailer, ScrapeError};
use crate::normalizer::parse_price;
use crate::ram_specs;
use crate::scraper::{amazon, bhphoto, microcenter, newegg, Fetch};

pub const TARGET_CAPACITIES: [u32; 4] = [48, 64, 96, 128];

/// Parse a search result into a RamDeal, or None when it is not a usable
/// desktop DDR5 kit. Generation-ambiguous kits are rejected rather than
/// assumed DDR5.
pub fn parse_ram_deal(name: &str, price: f64, url: &str, retailer: Retailer) -> Option<RamDeal> {
    if !is_likely_ram(name) {
        return None;
    }

    let specs = ram_specs::extract(name);
    let ddr = match specs.ddr {
        Some(5) => 5,
        Some(_) => return None,
        None if name.to_lowercase().contains("ddr5") => 5,
        None => return None,
    };

    let capacity = specs.capacity_gb.unwrap_or(0);
    if capacity == 0 || price <= 0.0 {
        return None;
    }

    let mut deal = RamDeal::new(retailer, name, url);
    deal.capacity_gb = capacity;
    deal.speed_mhz = specs.speed_mhz.unwrap_or(0);
    deal.ddr_version = ddr;
    deal.price = price;
    Some(deal)
}

fn collect(
    items: Vec<RawItem>,
    retailer: Retailer,
    seen_urls: &mut HashSet<String>,
    deals: &mut Vec<RamDeal>,
) {
    for item in items {
        if item.url.is_empty() {
            continue;
        }
        let url = resolve_url(&item.url, retailer.base_url());
        if !seen_urls.insert(url.clone()) {
            continue;
        }
        let price = parse_price(&item.price_text);
        match parse_ram_deal(&item.title, price, &url, retailer) {
            Some(deal) => deals.push(deal),
            None => debug!(retailer = %retailer, title = %item.title, "not a usable kit"),
        }
    }
}

pub async fn scrape_newegg(fetcher: &dyn Fetch) -> Result<Vec<RamDeal>, ScrapeError> {
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();
    for capacity in TARGET_CAPACITIES {
        let url = format!("https://www.newegg.com/p/pl?d=ddr5+{capacity}gb+desktop+memory");
        info!(source = "newegg-ram", capacity, "searching");
        let html = fetcher.fetch(&url).await?;
        collect(newegg::extract_items(&html), Retailer::Newegg, &mut seen_urls, &mut deals);
    }
    info!(source = "newegg-ram", count = deals.len(), "RAM deals");
    Ok(deals)
}

pub async fn scrape_amazon(fetcher: &dyn Fetch) -> Result<Vec<RamDeal>, ScrapeError> {
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();
    for capacity in TARGET_CAPACITIES {
        let url = format!("https://www.amazon.com/s?k=ddr5+{capacity}gb+desktop+memory");
        info!(source = "amazon-ram", capacity, "searching");
        let html = fetcher.fetch(&url).await?;
        let items: Vec<RawItem> = amazon::extract_listings(&html)
            .into_iter()
            .map(|l| RawItem {
                title: l.title,
                price_text: l.price_text,
                url: l.url,
                in_stock: l.in_stock,
            })
            .collect();
        collect(items, Retailer::Amazon, &mut seen_urls, &mut deals);
    }
    info!(source = "amazon-ram", count = deals.len(), "RAM deals");
    Ok(deals)
}

pub async fn scrape_microcenter(fetcher: &dyn Fetch) -> Result<Vec<RamDeal>, ScrapeError> {
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();
    // Broad "ddr5" search plus per-capacity searches for coverage.
    let mut queries = vec!["ddr5".to_string()];
    queries.extend(TARGET_CAPACITIES.iter().map(|cap| format!("ddr5+{cap}gb")));
    for query in queries {
        let url =
            format!("https://www.microcenter.com/search/search_results.aspx?Ntt={query}");
        info!(source = "microcenter-ram", query, "searching");
        let html = fetcher.fetch(&url).await?;
        collect(
            microcenter::extract_search_items(&html),
            Retailer::MicroCenter,
            &mut seen_urls,
            &mut deals,
        );
    }
    info!(source = "microcenter-ram", count = deals.len(), "RAM deals");
    Ok(deals)
}

pub async fn scrape_bhphoto(fetcher: &dyn Fetch) -> Result<Vec<RamDeal>, ScrapeError> {
    let mut seen_urls = HashSet::new();
    let mut deals = Vec::new();
    for capacity in TARGET_CAPACITIES {
        let url = bhphoto::search_url(&format!("ddr5 {capacity}gb desktop memory"));
        info!(source = "bhphoto-ram", capacity, "searching");
        let html = fetcher.fetch(&url).await?;
        collect(bhphoto::extract_items(&html), Retailer::BHPhoto, &mut seen_urls, &mut deals);
    }
    info!(source = "bhphoto-ram", count = deals.len(), "RAM deals");
    Ok(deals)
}
