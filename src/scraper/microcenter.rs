// Micro Center bundle-and-save pages. Bundle titles are not rendered as
// text; component names are recovered from the hyphenated product path in
// the bundle URL, and the price comes from the nearest enclosing container.
use lazy_static::lazy_static;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashSet;
use tracing::{debug, info};

use crate::assembler::{assemble, AssembleContext};
use crate::model::{
    ComboDeal, ComboType, RawComponent, RawItem, RawListing, Retailer, ScrapeError,
};
use crate::normalizer::parse_price;
use crate::scraper::Fetch;

const BUNDLE_URLS: [&str; 2] = [
    "https://www.microcenter.com/site/content/bundle-and-save.aspx",
    "https://www.microcenter.com/site/content/intel-bundle-and-save.aspx",
];

lazy_static! {
    static ref PRODUCT_PATH_RE: Regex = Regex::new(r"/product/\d+/(.+)").unwrap();
}

/// Walk up from a bundle link to the nearest container that carries a
/// `.price` node.
fn price_near(link: ElementRef) -> String {
    let price_sel = Selector::parse(".price").unwrap();
    for ancestor in link.ancestors().filter_map(ElementRef::wrap) {
        if let Some(price_el) = ancestor.select(&price_sel).next() {
            return price_el.text().collect::<String>().trim().to_string();
        }
    }
    String::new()
}

/// Split the URL product path into component names.
///
/// e.g. "amd-ryzen-7-9850x3d,-asus-x870-p-prime-wifi-am5,-gskill-flare-x5-series-32gb-ddr5-6000-kit,-computer-build-bundle"
pub fn components_from_path(product_path: &str) -> Vec<RawComponent> {
    product_path
        .replace("-computer-build-bundle", "")
        .split(",-")
        .map(|part| {
            part.replace('-', " ")
                .trim_matches(|c: char| c == ',' || c.is_whitespace())
                .to_string()
        })
        .filter(|name| name.len() >= 3)
        .map(|name| RawComponent { name, category: None })
        .collect()
}

/// Extract bundle listings from a bundle-and-save page.
pub fn extract_listings(html: &str) -> Vec<RawListing> {
    let doc = Html::parse_document(html);
    let link_sel = Selector::parse("a[href*='/product/']").unwrap();

    let mut seen = HashSet::new();
    let mut listings = Vec::new();
    for link in doc.select(&link_sel) {
        let Some(href) = link.value().attr("href") else {
            continue;
        };
        if !href.contains("bundle") {
            continue;
        }
        if !seen.insert(href.to_string()) {
            continue;
        }

        let price_text = price_near(link);
        if parse_price(&price_text) <= 0.0 {
            continue;
        }

        let Some(caps) = PRODUCT_PATH_RE.captures(href) else {
            continue;
        };
        let components = components_from_path(&caps[1]);
        if components.is_empty() {
            continue;
        }

        listings.push(RawListing {
            title: caps[1].replace('-', " "),
            price_text,
            url: href.to_string(),
            in_stock: true,
            components,
        });
    }
    listings
}

/// Extract raw items from a search_results.aspx page; used by the
/// standalone RAM path. The price lives in a `data-price` attribute.
pub fn extract_search_items(html: &str) -> Vec<RawItem> {
    let doc = Html::parse_document(html);
    let wrapper_sel = Selector::parse(".product_wrapper").unwrap();
    let title_sel = Selector::parse(".pDescription a").unwrap();
    let price_sel = Selector::parse("[data-price]").unwrap();

    let mut items = Vec::new();
    for wrapper in doc.select(&wrapper_sel) {
        let Some(title_el) = wrapper.select(&title_sel).next() else {
            continue;
        };
        let title = title_el.text().collect::<String>().trim().to_string();
        let href = title_el.value().attr("href").unwrap_or("");
        let url = if href.starts_with('/') {
            format!("https://www.microcenter.com{href}")
        } else {
            href.to_string()
        };
        let price_text = wrapper
            .select(&price_sel)
            .next()
            .and_then(|el| el.value().attr("data-price"))
            .unwrap_or("")
            .to_string();
        if title.is_empty() {
            continue;
        }
        items.push(RawItem { title, price_text, url, in_stock: true });
    }
    items
}

/// Scrape both AMD and Intel bundle pages.
pub async fn scrape_combos(fetcher: &dyn Fetch) -> Result<Vec<ComboDeal>, ScrapeError> {
    let ctx = AssembleContext { retailer: Retailer::MicroCenter, assume_ddr5: false };
    let mut deals = Vec::new();

    for url in BUNDLE_URLS {
        info!(source = "microcenter", url, "scraping bundle page");
        let html = fetcher.fetch(url).await?;
        for listing in extract_listings(&html) {
            let deal = assemble(&listing, ctx);
            if deal.combo_type == ComboType::Other {
                debug!(source = "microcenter", title = %listing.title, "skipped OTHER");
                continue;
            }
            deals.push(deal);
        }
    }

    info!(source = "microcenter", count = deals.len(), "total deals");
    Ok(deals)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;

    const BUNDLE_PAGE: &str = r#"
        <div id="Base">
            <a href="https://www.microcenter.com/product/5007231/amd-ryzen-7-9850x3d,-asus-x870-p-prime-wifi-am5,-gskill-flare-x5-series-32gb-ddr5-6000-kit,-computer-build-bundle">Bundle</a>
            <span class="price">$849.99</span>
        </div>
        <div id="Upgrade">
            <a href="https://www.microcenter.com/product/5007232/intel-core-ultra-7-265k,-msi-z890-a-pro-wifi,-crucial-32gb-ddr5-6000-kit,-computer-build-bundle">Bundle</a>
            <span class="price">$599.99</span>
        </div>
        <a href="https://www.microcenter.com/product/999/some-standalone-gpu">Not a bundle</a>
    "#;

    #[test]
    fn components_recovered_from_product_path() {
        let components = components_from_path(
            "amd-ryzen-7-9850x3d,-asus-x870-p-prime-wifi-am5,-gskill-flare-x5-series-32gb-ddr5-6000-kit,-computer-build-bundle",
        );
        let names: Vec<&str> = components.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "amd ryzen 7 9850x3d",
                "asus x870 p prime wifi am5",
                "gskill flare x5 series 32gb ddr5 6000 kit",
            ]
        );
    }

    #[test]
    fn bundle_page_yields_priced_listings() {
        let listings = extract_listings(BUNDLE_PAGE);
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[0].price_text, "$849.99");
        assert_eq!(listings[0].components.len(), 3);
    }

    #[tokio::test]
    async fn scrape_assembles_full_bundles() {
        struct Fixture;
        #[async_trait::async_trait]
        impl Fetch for Fixture {
            async fn fetch(&self, url: &str) -> Result<String, ScrapeError> {
                if url.contains("intel-bundle") {
                    Ok(String::new())
                } else {
                    Ok(BUNDLE_PAGE.to_string())
                }
            }
        }
        let deals = scrape_combos(&Fixture).await.unwrap();
        assert_eq!(deals.len(), 2);
        assert_eq!(deals[0].combo_type, ComboType::CpuMbRam);
        assert_eq!(deals[0].combo_price, 849.99);
        let ram = deals[0].component(Category::Ram).unwrap();
        assert_eq!(ram.specs.capacity_gb, Some(32));
        assert_eq!(ram.specs.speed_mhz, Some(6000));
    }

    #[test]
    fn search_items_read_data_price() {
        let html = r#"
            <div class="product_wrapper">
                <div class="pDescription">
                    <a href="/product/123/gskill-ripjaws-64gb-ddr5-6000">G.Skill Ripjaws 64GB DDR5-6000 Kit</a>
                </div>
                <span data-price="189.99"></span>
            </div>
        "#;
        let items = extract_search_items(html);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].price_text, "189.99");
        assert!(items[0].url.starts_with("https://www.microcenter.com/product/"));
    }
}
