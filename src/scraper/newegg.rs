// Newegg combo search: multi-query paged search plus combo detail-page
// escalation (cached) for listings whose truncated titles lose component
// names or RAM specs.
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::assembler::{
    assemble, assemble_from_names, clean_combo_item_text, detail_improves,
    extract_prefix_categories, needs_detail_enrichment, AssembleContext,
};
use crate::classifier;
use crate::model::{
    Category, ComboDeal, ComboType, RawComponent, RawItem, RawListing, Retailer, ScrapeError,
};
use crate::scraper::Fetch;
use crate::storage::sqlite::{CachedComponent, CachedDetail, SqliteStorage};

const SEARCH_URLS: [&str; 6] = [
    "https://www.newegg.com/p/pl?d=cpu+motherboard+ram+combo",
    "https://www.newegg.com/p/pl?d=cpu+motherboard+ram+bundle",
    "https://www.newegg.com/p/pl?d=motherboard+ram+combo",
    "https://www.newegg.com/p/pl?d=motherboard+memory+bundle",
    "https://www.newegg.com/p/pl?d=cpu+ram+combo",
    "https://www.newegg.com/p/pl?d=cpu+memory+bundle",
];
const MAX_PAGES: u32 = 10; // safety limit

lazy_static! {
    static ref PREFIX_STRIP_RE: Regex = Regex::new(
        r"(?i)^(?:CPU|Motherboard|Memory|Combo|Bundle)(?:\s+(?:CPU|Motherboard|Memory|Combo|Bundle))*\s*[-–—]\s*",
    )
    .unwrap();
    static ref COMPONENT_SPLIT_RE: Regex =
        Regex::new(r"\s+(?i:Bundle\s+with)\s+|\s+(?:\+|and|with)\s+|,\s*").unwrap();
    static ref TRAILING_BUNDLE_RE: Regex = Regex::new(r"(?i)\s+Bundle$").unwrap();
}

/// Pull raw search-result items out of a results page.
pub fn extract_items(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    let cell_sel = Selector::parse(".item-cell").unwrap();
    let title_sel = Selector::parse(".item-title").unwrap();
    let price_sel = Selector::parse(".price-current").unwrap();
    let promo_sel = Selector::parse(".item-promo").unwrap();

    let mut items = Vec::new();
    for cell in doc.select(&cell_sel) {
        let Some(title_el) = cell.select(&title_sel).next() else {
            continue;
        };
        let Some(price_el) = cell.select(&price_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        let url = title_el.value().attr("href").unwrap_or("").to_string();
        let price_text = price_el.text().collect::<String>().trim().to_string();
        let in_stock = !cell
            .select(&promo_sel)
            .any(|p| p.text().collect::<String>().to_uppercase().contains("OUT OF STOCK"));
        if title.is_empty() {
            continue;
        }
        items.push(RawItem { title, price_text, url, in_stock });
    }
    items
}

/// Split a combo title into component names, recovering categories from the
/// "CPU Motherboard Memory Combo -" prefix for names too truncated for
/// keyword classification.
pub fn item_to_listing(item: &RawItem) -> Option<RawListing> {
    let prefix_categories = extract_prefix_categories(&item.title);
    let clean_title = PREFIX_STRIP_RE.replace(&item.title, "");

    let mut components = Vec::new();
    for (i, piece) in COMPONENT_SPLIT_RE.split(&clean_title).enumerate() {
        let name = TRAILING_BUNDLE_RE.replace(piece.trim(), "").to_string();
        if name.len() <= 3 {
            continue;
        }
        let mut category = None;
        if classifier::classify(&name) == Category::Unknown {
            category = prefix_categories.get(i).copied();
        }
        components.push(RawComponent { name, category });
    }
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

/// Extract component names from a combo detail page.
///
/// Preferred source is the "This Combo Includes" swiper, which is scoped to
/// the current combo; generic product links are noisy fallbacks.
pub fn extract_detail_names(html: &str) -> Vec<String> {
    let doc = Html::parse_document(html);
    let mut names: Vec<String> = Vec::new();

    let swiper_sel = Selector::parse("#include_item_swiper a.item-cell").unwrap();
    for el in doc.select(&swiper_sel) {
        let name = clean_combo_item_text(&el.text().collect::<String>());
        if !name.is_empty() && classifier::classify(&name) != Category::Unknown {
            names.push(name);
        }
    }

    if names.is_empty() {
        let sel = Selector::parse(".combo-item-info a, .product-title, .item-info a").unwrap();
        for el in doc.select(&sel) {
            let name = clean_combo_item_text(&el.text().collect::<String>());
            if name.len() > 10 && classifier::classify(&name) != Category::Unknown {
                names.push(name);
            }
        }
    }

    if names.is_empty() {
        let sel = Selector::parse("a[href*='/p/N82E']").unwrap();
        for el in doc.select(&sel) {
            let name = clean_combo_item_text(&el.text().collect::<String>());
            if name.len() > 10 && classifier::classify(&name) != Category::Unknown {
                names.push(name);
            }
        }
    }

    // Dedup while preserving order; titles repeat across page sections.
    let mut seen = HashSet::new();
    names.retain(|n| {
        let key: String = n.to_lowercase().chars().take(40).collect();
        seen.insert(key)
    });
    names
}

fn rebuild_from_cached(
    cached: &CachedDetail,
    original: &ComboDeal,
    ctx: AssembleContext,
) -> ComboDeal {
    let raw = RawListing {
        title: original.cpu_name.clone(),
        price_text: String::new(),
        url: original.url.clone(),
        in_stock: original.in_stock,
        components: cached
            .components
            .iter()
            .map(|c| RawComponent { name: c.name.clone(), category: Some(c.category) })
            .collect(),
    };
    let mut deal = assemble(&raw, ctx);
    deal.combo_price = original.combo_price;
    deal
}

async fn enrich_from_detail_page(
    fetcher: &dyn Fetch,
    original: &ComboDeal,
    ctx: AssembleContext,
) -> Result<Option<ComboDeal>, ScrapeError> {
    let html = fetcher.fetch(&original.url).await?;
    let names = extract_detail_names(&html);
    if names.is_empty() {
        warn!(url = %original.url, "no components recoverable from detail page");
        return Ok(None);
    }
    Ok(Some(assemble_from_names(&names, original, ctx)))
}

/// Scrape all Newegg combo searches. Detail pages are only visited for
/// under-specified combos, with results cached across runs.
pub async fn scrape_combos(
    fetcher: &dyn Fetch,
    storage: &SqliteStorage,
) -> Result<Vec<ComboDeal>, ScrapeError> {
    let ctx = AssembleContext { retailer: Retailer::Newegg, assume_ddr5: true };

    // Phase 1: collect raw listings from every search, deduplicated by URL.
    let mut seen_urls = HashSet::new();
    let mut raw_listings = Vec::new();
    for search_url in SEARCH_URLS {
        info!(source = "newegg", search_url, "starting search");
        for page in 1..=MAX_PAGES {
            let page_url = if page == 1 {
                search_url.to_string()
            } else {
                format!("{search_url}&page={page}")
            };
            let html = fetcher.fetch(&page_url).await?;
            let items = extract_items(&html);
            debug!(source = "newegg", page, count = items.len(), "raw items");
            if items.is_empty() {
                break;
            }
            let mut page_new = 0;
            for item in items {
                if !seen_urls.insert(item.url.clone()) {
                    continue;
                }
                if let Some(listing) = item_to_listing(&item) {
                    raw_listings.push(listing);
                    page_new += 1;
                }
            }
            if page_new == 0 {
                break;
            }
        }
    }
    info!(source = "newegg", count = raw_listings.len(), "collected raw listings");

    // Phase 2: assemble, escalating to the detail page where needed.
    let mut deals = Vec::new();
    let mut cache_hits = 0usize;
    for raw in &raw_listings {
        let mut deal = assemble(raw, ctx);
        if deal.combo_type == ComboType::Other {
            debug!(source = "newegg", title = %raw.title, "skipped OTHER");
            continue;
        }

        if needs_detail_enrichment(&deal) {
            match storage.deal_detail(&deal.url) {
                Ok(Some(cached)) => {
                    cache_hits += 1;
                    let detail = rebuild_from_cached(&cached, &deal, ctx);
                    if detail_improves(&detail) {
                        deal = detail;
                    }
                }
                Ok(None) => match enrich_from_detail_page(fetcher, &deal, ctx).await {
                    Ok(Some(detail)) if detail_improves(&detail) => {
                        let cached = CachedDetail {
                            components: detail
                                .components
                                .iter()
                                .map(|c| CachedComponent {
                                    name: c.name.clone(),
                                    category: c.category,
                                })
                                .collect(),
                        };
                        if let Err(e) = storage.put_deal_detail(&deal.url, &cached) {
                            warn!(url = %deal.url, "failed to cache detail: {e}");
                        }
                        deal = detail;
                    }
                    Ok(_) => {}
                    Err(e) => warn!(url = %deal.url, "detail page fetch failed: {e}"),
                },
                Err(e) => warn!(url = %deal.url, "detail cache read failed: {e}"),
            }
        }

        if deal.combo_type != ComboType::Other {
            deals.push(deal);
        }
    }

    if cache_hits > 0 {
        info!(source = "newegg", cache_hits, "detail cache hits");
    }
    info!(source = "newegg", count = deals.len(), "total deals");
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <div class="item-cell">
            <a class="item-title" href="/Product/ComboDealDetails?ItemList=Combo.4853134">
                CPU Motherboard Memory Combo - AMD Ryzen 7 9800X3D Bundle with
                MSI MAG X870 TOMAHAWK WIFI and G.SKILL Trident Z5 32GB (2x16GB) DDR5-6000
            </a>
            <div class="price-current">$879.99</div>
        </div>
        <div class="item-cell">
            <a class="item-title" href="/Product/ComboDealDetails?ItemList=Combo.999">
                CPU Memory Combo - Intel Core i7-14700K + Corsair Vengeance 32GB DDR5-6400
            </a>
            <div class="price-current">$529.99</div>
            <div class="item-promo">OUT OF STOCK</div>
        </div>
    "#;

    #[test]
    fn extracts_items_with_stock_state() {
        let items = extract_items(SEARCH_PAGE);
        assert_eq!(items.len(), 2);
        assert!(items[0].in_stock);
        assert_eq!(items[0].price_text, "$879.99");
        assert!(!items[1].in_stock);
    }

    #[test]
    fn listing_splits_title_into_components() {
        let items = extract_items(SEARCH_PAGE);
        let listing = item_to_listing(&items[0]).unwrap();
        let names: Vec<&str> = listing.components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names.len(), 3);
        assert!(names[0].contains("9800X3D"));
        assert!(names[1].contains("X870 TOMAHAWK"));
        assert!(names[2].contains("Trident Z5"));
    }

    #[test]
    fn assembled_deal_from_listing() {
        let items = extract_items(SEARCH_PAGE);
        let listing = item_to_listing(&items[0]).unwrap();
        let ctx = AssembleContext { retailer: Retailer::Newegg, assume_ddr5: true };
        let deal = assemble(&listing, ctx);
        assert_eq!(deal.combo_type, ComboType::CpuMbRam);
        assert_eq!(deal.combo_price, 879.99);
        assert_eq!(deal.ram_capacity_gb, 32);
        assert!(!needs_detail_enrichment(&deal));
    }

    #[test]
    fn prefix_category_rescues_truncated_names() {
        let item = RawItem {
            title: "CPU Motherboard Memory Combo - AMD 100-100001973WOF Bundle with \
                    GIGABYTE X870E AORUS and VEB516G6030W"
                .into(),
            price_text: "$999.99".into(),
            url: "/Product/ComboDealDetails?ItemList=Combo.1".into(),
            in_stock: true,
        };
        let listing = item_to_listing(&item).unwrap();
        assert_eq!(listing.components.len(), 3);
        // The SKU-only RAM name carries no keyword; position 2 maps to Memory.
        assert_eq!(listing.components[2].category, Some(Category::Ram));
    }

    #[test]
    fn detail_names_prefer_swiper_items() {
        let html = r#"
            <div id="include_item_swiper">
                <a class="item-cell" href="/p/N82E1">(1) AMD Ryzen 7 9800X3D 8-Core $449.99 –</a>
                <a class="item-cell" href="/p/N82E2">(2) MSI MAG X870 TOMAHAWK WIFI $249.99</a>
                <a class="item-cell" href="/p/N82E3">(3) V-color TMXSAL1664832KWK DDR5 $119.99</a>
            </div>
            <a href="/p/N82E9">Some unrelated GIGABYTE motherboard elsewhere on page</a>
        "#;
        let names = extract_detail_names(html);
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "AMD Ryzen 7 9800X3D 8-Core");
        assert_eq!(names[1], "MSI MAG X870 TOMAHAWK WIFI");
    }

    #[test]
    fn detail_names_fall_back_to_product_links() {
        let html = r#"
            <a href="/p/N82E16819113843">AMD Ryzen 9 9900X 12-Core Processor</a>
            <a href="/p/N82E16813145498">ASUS TUF GAMING X870-PLUS WIFI</a>
            <a href="/faq">Help</a>
        "#;
        let names = extract_detail_names(html);
        assert_eq!(names.len(), 2);
    }

    #[tokio::test]
    async fn scrape_skips_other_and_assembles_deals() {
        struct Fixture;
        #[async_trait::async_trait]
        impl Fetch for Fixture {
            async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
                // First page of the first search yields results; everything
                // else is empty so pagination stops immediately.
                if url.ends_with("d=cpu+motherboard+ram+combo") {
                    Ok(SEARCH_PAGE.to_string())
                } else {
                    Ok("<html></html>".to_string())
                }
            }
        }
        let storage = SqliteStorage::open_in_memory().unwrap();
        let deals = scrape_combos(&Fixture, &storage).await.unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].combo_type, ComboType::CpuMbRam);
        assert_eq!(deals[1].combo_type, ComboType::CpuRam);
        assert!(!deals[1].in_stock);
    }
}
