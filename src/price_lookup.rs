// Amazon reference-price lookup used for savings calculation.
//
// Resolution order per component name: in-memory per-run cache, persistent
// TTL cache, live Amazon search. Lookups are write-once per run so repeated
// component names across deals cost one fetch.
use scraper::{Html, Selector};
use std::collections::HashMap;
use tracing::{info, warn};

use crate::model::{Category, ComboDeal, RamDeal, Retailer};
use crate::normalizer::parse_price;
use crate::scraper::Fetch;
use crate::storage::SqliteStorage;

/// First search result's price from an Amazon results page, or 0.0.
pub fn first_result_price(html: &str) -> f64 {
    let doc = Html::parse_document(html);
    let sel =
        Selector::parse("[data-component-type='s-search-result'] .a-price .a-offscreen").unwrap();
    doc.select(&sel)
        .next()
        .map(|el| parse_price(&el.text().collect::<String>()))
        .unwrap_or(0.0)
}

pub struct PriceLookup<'a> {
    fetcher: &'a dyn Fetch,
    storage: &'a SqliteStorage,
    ttl_secs: i64,
    memory: HashMap<String, f64>,
}

impl<'a> PriceLookup<'a> {
    pub fn new(fetcher: &'a dyn Fetch, storage: &'a SqliteStorage, ttl_secs: i64) -> Self {
        Self { fetcher, storage, ttl_secs, memory: HashMap::new() }
    }

    async fn search_price(&self, name: &str) -> f64 {
        let url = format!("https://www.amazon.com/s?k={}", name.replace(' ', "+"));
        match self.fetcher.fetch(&url).await {
            Ok(html) => first_result_price(&html),
            Err(e) => {
                warn!(name, "price lookup failed: {e}");
                0.0
            }
        }
    }

    /// Reference price for a component name. Failed lookups resolve to 0.0
    /// and are cached like any other result so they are not retried within
    /// the TTL window.
    pub async fn component_price(&mut self, name: &str) -> f64 {
        if let Some(&price) = self.memory.get(name) {
            return price;
        }
        match self.storage.cached_price(name, self.ttl_secs) {
            Ok(Some(price)) => {
                self.memory.insert(name.to_string(), price);
                return price;
            }
            Ok(None) => {}
            Err(e) => warn!(name, "price cache read failed: {e}"),
        }

        let price = self.search_price(name).await;
        self.memory.insert(name.to_string(), price);
        if let Err(e) = self.storage.put_cached_price(name, price) {
            warn!(name, "price cache write failed: {e}");
        }
        price
    }

    /// Fill missing component prices, then recompute each deal's
    /// individual total and savings.
    pub async fn price_deals(&mut self, deals: &mut [ComboDeal]) {
        let mut looked_up = 0usize;
        for deal in deals.iter_mut() {
            for i in 0..deal.components.len() {
                if deal.components[i].individual_price > 0.0
                    || deal.components[i].category == Category::Unknown
                {
                    continue;
                }
                let name = deal.components[i].name.clone();
                deal.components[i].individual_price = self.component_price(&name).await;
                looked_up += 1;
            }
            deal.calculate_savings();
        }
        info!(components = looked_up, "priced combo components");
    }

    /// Attach Amazon reference prices to standalone RAM deals. Amazon's own
    /// listings keep zero savings; comparing Amazon to itself says nothing.
    pub async fn price_ram_deals(&mut self, deals: &mut [RamDeal]) {
        for deal in deals.iter_mut() {
            if deal.retailer == Retailer::Amazon {
                continue;
            }
            let reference = self.component_price(&deal.name.clone()).await;
            deal.amazon_price = reference;
            deal.savings = if reference > 0.0 { reference - deal.price } else { 0.0 };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Component, ScrapeError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    const RESULT_PAGE: &str = r#"
        <div data-component-type="s-search-result">
            <span class="a-price"><span class="a-offscreen">$449.99</span></span>
        </div>
        <div data-component-type="s-search-result">
            <span class="a-price"><span class="a-offscreen">$999.99</span></span>
        </div>
    "#;

    struct CountingFetcher {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl Fetch for CountingFetcher {
        async fn fetch(&self, _url: &str) -> Result<String, ScrapeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(RESULT_PAGE.to_string())
        }
    }

    #[test]
    fn first_result_price_takes_first_only() {
        assert_eq!(first_result_price(RESULT_PAGE), 449.99);
        assert_eq!(first_result_price("<html></html>"), 0.0);
    }

    #[tokio::test]
    async fn repeated_names_cost_one_fetch() {
        let fetcher = CountingFetcher { calls: AtomicUsize::new(0) };
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut lookup = PriceLookup::new(&fetcher, &storage, 3600);

        assert_eq!(lookup.component_price("AMD Ryzen 7 9800X3D").await, 449.99);
        assert_eq!(lookup.component_price("AMD Ryzen 7 9800X3D").await, 449.99);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);

        // A fresh lookup instance hits the persistent cache, not the network.
        let mut lookup2 = PriceLookup::new(&fetcher, &storage, 3600);
        assert_eq!(lookup2.component_price("AMD Ryzen 7 9800X3D").await, 449.99);
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deals_get_savings_recomputed() {
        let fetcher = CountingFetcher { calls: AtomicUsize::new(0) };
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut lookup = PriceLookup::new(&fetcher, &storage, 3600);

        let mut deal = ComboDeal::new(
            Retailer::Newegg,
            vec![
                Component::new("AMD Ryzen 7 9800X3D", Category::Cpu),
                Component::new("G.SKILL 32GB DDR5-6000", Category::Ram),
            ],
            800.0,
            "https://www.newegg.com/combo/1".into(),
        );
        let mut deals = vec![deal.clone()];
        lookup.price_deals(&mut deals).await;
        deal = deals.pop().unwrap();

        // Both components resolve to the fixture's first-result price.
        assert_eq!(deal.individual_total, 899.98);
        assert!((deal.savings - 99.98).abs() < 1e-9);
    }

    #[tokio::test]
    async fn amazon_ram_deals_keep_zero_savings() {
        let fetcher = CountingFetcher { calls: AtomicUsize::new(0) };
        let storage = SqliteStorage::open_in_memory().unwrap();
        let mut lookup = PriceLookup::new(&fetcher, &storage, 3600);

        let mut deals = vec![
            RamDeal {
                price: 400.0,
                ..RamDeal::new(Retailer::Amazon, "Kit A 64GB DDR5", "https://www.amazon.com/dp/X")
            },
            RamDeal {
                price: 400.0,
                ..RamDeal::new(Retailer::Newegg, "Kit A 64GB DDR5", "https://www.newegg.com/p/1")
            },
        ];
        lookup.price_ram_deals(&mut deals).await;

        assert_eq!(deals[0].savings, 0.0);
        assert_eq!(deals[0].amazon_price, 0.0);
        assert_eq!(deals[1].amazon_price, 449.99);
        assert!((deals[1].savings - 49.99).abs() < 1e-9);
    }
}
