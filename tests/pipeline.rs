// End-to-end pipeline over canned retailer pages: scrape, enrich, price,
// filter, rank, reconcile.
use std::collections::{HashMap, HashSet};

use combo_sniper::benchmarks::{enrich_deals, BenchmarkCatalog};
use combo_sniper::config::AppConfig;
use combo_sniper::filters::{filter_combo_deals, filter_ram_deals};
use combo_sniper::identity::{normalize_identity, reconcile};
use combo_sniper::model::{ComboType, Retailer, ScrapeError, SourceStatus};
use combo_sniper::price_lookup::PriceLookup;
use combo_sniper::scraper::{self, Fetch};
use combo_sniper::storage::SqliteStorage;

const NEWEGG_PAGE: &str = r#"
    <div class="item-cell">
        <a class="item-title" href="/Product/ComboDealDetails?ItemList=Combo.100">
            CPU Motherboard Memory Combo - AMD Ryzen 9 9900X Bundle with
            ASUS TUF GAMING X870-PLUS WIFI and Corsair Vengeance 32GB (2x16GB) DDR5-6000
        </a>
        <div class="price-current">$699.99</div>
    </div>
    <div class="item-cell">
        <a class="item-title" href="/Product/ComboDealDetails?ItemList=Combo.200">
            CPU Memory Combo - AMD Ryzen 5 9600X + Crucial 16GB DDR5-5600
        </a>
        <div class="price-current">$399.99</div>
    </div>
"#;

const MICROCENTER_PAGE: &str = r#"
    <div id="Base">
        <a href="https://www.microcenter.com/product/5007231/amd-ryzen-7-9800x3d,-asus-x870-p-prime-wifi-am5,-gskill-flare-x5-series-32gb-ddr5-6000-kit,-computer-build-bundle">Bundle</a>
        <span class="price">$679.99</span>
    </div>
"#;

const BHPHOTO_PAGE: &str = r#"
    <div data-selenium="miniProductPage">
        <div data-selenium="miniProductPageProductName">
            <a href="/c/product/19001-REG/bundle.html">
                AMD Ryzen 7 9700X + MSI MAG B650 TOMAHAWK WIFI, TEAMGROUP T-Force Delta RGB 32GB (2x16GB) DDR5 6000
            </a>
        </div>
        <span data-selenium="uppedDecimalPriceFirst">$549.99</span>
    </div>
"#;

const NEWEGG_RAM_PAGE: &str = r#"
    <div class="item-cell">
        <a class="item-title" href="/p/N82E16820374563">
            G.SKILL Ripjaws S5 64GB (2x32GB) DDR5-6000 Desktop Memory
        </a>
        <div class="price-current">$179.99</div>
    </div>
"#;

fn amazon_result(price: &str) -> String {
    format!(
        r#"<div data-component-type="s-search-result">
            <span class="a-price"><span class="a-offscreen">{price}</span></span>
        </div>"#
    )
}

struct FixtureFetch;

#[async_trait::async_trait]
impl Fetch for FixtureFetch {
    async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
        let lower = url.to_lowercase();

        if lower.contains("amazon.com/s?k=") {
            // Reference prices keyed on the component being searched. The
            // 64GB check precedes 32GB because "2x32GB" contains both.
            let price = if lower.contains("9900x") {
                "$429.99"
            } else if lower.contains("9800x3d") {
                "$479.99"
            } else if lower.contains("9700x") {
                "$299.99"
            } else if lower.contains("9600x") {
                "$199.99"
            } else if lower.contains("x870") {
                "$259.99"
            } else if lower.contains("b650") {
                "$199.99"
            } else if lower.contains("64gb") {
                "$209.99"
            } else if lower.contains("32gb") {
                "$129.99"
            } else if lower.contains("16gb") {
                "$89.99"
            } else {
                return Ok("<html></html>".to_string());
            };
            return Ok(amazon_result(price));
        }

        if url.ends_with("d=cpu+motherboard+ram+combo") {
            return Ok(NEWEGG_PAGE.to_string());
        }
        if lower.contains("bundle-and-save") && !lower.contains("intel") {
            return Ok(MICROCENTER_PAGE.to_string());
        }
        if lower.contains("bhphotovideo.com")
            && lower.contains("cpu%20motherboard%20ram%20bundle")
        {
            return Ok(BHPHOTO_PAGE.to_string());
        }
        if lower.contains("ddr5+64gb+desktop+memory") && lower.contains("newegg") {
            return Ok(NEWEGG_RAM_PAGE.to_string());
        }
        Ok("<html></html>".to_string())
    }
}

#[tokio::test]
async fn combo_pipeline_ranks_and_reconciles() {
    let fetcher = FixtureFetch;
    let storage = SqliteStorage::open_in_memory().unwrap();
    let cfg = AppConfig::default();

    let mut deals = scraper::newegg::scrape_combos(&fetcher, &storage).await.unwrap();
    deals.extend(scraper::microcenter::scrape_combos(&fetcher).await.unwrap());
    deals.extend(scraper::bhphoto::scrape_combos(&fetcher).await.unwrap());
    assert_eq!(deals.len(), 4);

    let catalog = BenchmarkCatalog::new();
    enrich_deals(&mut deals, &catalog);

    let mut lookup = PriceLookup::new(&fetcher, &storage, cfg.price_cache_ttl_secs);
    lookup.price_deals(&mut deals).await;

    let filtered = filter_combo_deals(deals.clone(), &cfg);

    // The 16GB combo fails the RAM floor; the three survivors rank by
    // savings across retailers: MicroCenter ($869.97 - $679.99), then
    // Newegg ($819.97 - $699.99), then B&H ($629.97 - $549.99).
    assert_eq!(filtered.len(), 3);
    assert_eq!(filtered[0].retailer, Retailer::MicroCenter);
    assert_eq!(filtered[0].combo_type, ComboType::CpuMbRam);
    assert!((filtered[0].savings - 189.98).abs() < 0.01);
    assert_eq!(filtered[1].retailer, Retailer::Newegg);
    assert!((filtered[1].savings - 119.98).abs() < 0.01);
    assert_eq!(filtered[2].retailer, Retailer::BHPhoto);
    assert!((filtered[2].savings - 79.98).abs() < 0.01);

    // Benchmark enrichment resolved every CPU.
    assert_eq!(filtered[0].cpu_sc_score, 4700);
    assert_eq!(filtered[0].cpu_cores, "8C/16T");
    assert_eq!(filtered[1].cpu_sc_score, 4500);
    assert_eq!(filtered[2].cpu_sc_score, 4200);

    // First run: everything is newly seen.
    let statuses: HashMap<String, SourceStatus> = HashMap::from([
        ("newegg".to_string(), SourceStatus::Ok(2)),
        ("microcenter".to_string(), SourceStatus::Ok(1)),
        ("bhphoto".to_string(), SourceStatus::Ok(1)),
    ]);
    let current: HashSet<String> =
        deals.iter().map(|d| normalize_identity(&d.url)).collect();
    let rec = reconcile(&current, &HashSet::new(), &statuses);
    assert_eq!(rec.newly_seen.len(), 4);
    assert!(rec.disappeared.is_empty());

    // Next run the MicroCenter bundle is gone; its source is ok so the
    // absence is a real delisting.
    let seen = current.clone();
    let mut next: HashSet<String> = seen.clone();
    let mc_url = normalize_identity(&filtered[0].url);
    next.remove(&mc_url);
    let rec = reconcile(&next, &seen, &statuses);
    assert!(rec.newly_seen.is_empty());
    assert_eq!(rec.disappeared, HashSet::from([mc_url]));
}

#[tokio::test]
async fn ram_pipeline_attaches_reference_price() {
    let fetcher = FixtureFetch;
    let storage = SqliteStorage::open_in_memory().unwrap();
    let cfg = AppConfig::default();

    let mut deals = scraper::ram::scrape_newegg(&fetcher).await.unwrap();
    assert_eq!(deals.len(), 1);

    let mut lookup = PriceLookup::new(&fetcher, &storage, cfg.price_cache_ttl_secs);
    lookup.price_ram_deals(&mut deals).await;

    let filtered = filter_ram_deals(deals);
    assert_eq!(filtered.len(), 1);
    let deal = &filtered[0];
    assert_eq!(deal.capacity_gb, 64);
    assert_eq!(deal.speed_mhz, 6000);
    assert_eq!(deal.price, 179.99);
    assert_eq!(deal.amazon_price, 209.99);
    assert!((deal.savings - 30.0).abs() < 0.01);
    assert!(deal.url.starts_with("https://www.newegg.com/"));
}
