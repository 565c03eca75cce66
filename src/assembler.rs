// Combo assembly: raw listing text -> canonical ComboDeal.
use lazy_static::lazy_static;
use regex::Regex;

use crate::classifier::{self, looks_like_cpu_sku};
use crate::model::{Category, ComboDeal, ComboType, Component, RawListing, Retailer};
use crate::normalizer::parse_price;
use crate::ram_specs;

lazy_static! {
    static ref PREFIX_RE: Regex = Regex::new(
        r"(?i)^((?:CPU|Motherboard|Memory|Combo|Bundle)(?:\s+(?:CPU|Motherboard|Memory|Combo|Bundle))*)\s*[-–—]",
    )
    .unwrap();
    static ref ORDINAL_RE: Regex = Regex::new(r"^\(\d+\)\s*").unwrap();
    static ref TRAILING_PRICE_RE: Regex =
        Regex::new(r"\s+\$[\d,]+(?:\.\d+)?\s*[–-]?\s*$").unwrap();
}

/// Per-source assembly context. `assume_ddr5` is scoped to collection paths
/// whose search itself guarantees DDR5 results; it is never applied
/// universally.
#[derive(Debug, Clone, Copy)]
pub struct AssembleContext {
    pub retailer: Retailer,
    pub assume_ddr5: bool,
}

/// Resolve a possibly-relative listing URL against the source base URL.
/// Absolute URLs pass through unchanged.
pub fn resolve_url(url: &str, base: &str) -> String {
    if url.starts_with('/') {
        format!("{base}{url}")
    } else {
        url.to_string()
    }
}

/// Extract component category order from a combo title prefix.
///
/// "CPU Motherboard Memory Combo - ..." → [Cpu, Motherboard, Ram]
/// "Motherboard CPU Memory Combo - ..." → [Motherboard, Cpu, Ram]
pub fn extract_prefix_categories(title: &str) -> Vec<Category> {
    let Some(c) = PREFIX_RE.captures(title) else {
        return Vec::new();
    };
    c[1].split_whitespace()
        .filter_map(|w| match w.to_lowercase().as_str() {
            "cpu" => Some(Category::Cpu),
            "motherboard" => Some(Category::Motherboard),
            "memory" => Some(Category::Ram),
            _ => None,
        })
        .collect()
}

/// Normalize combo component text pulled from detail-page cards: collapse
/// whitespace, strip "(1)" ordinals and trailing price fragments.
pub fn clean_combo_item_text(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = ORDINAL_RE.replace(&collapsed, "");
    let cleaned = TRAILING_PRICE_RE.replace(&cleaned, "");
    cleaned.trim_matches(&[' ', '-', '–'][..]).to_string()
}

/// Build a canonical ComboDeal from raw listing text.
///
/// Untagged components are classified; ram components get spec extraction;
/// combo type is derived from the category set; relative URLs are resolved.
pub fn assemble(raw: &RawListing, ctx: AssembleContext) -> ComboDeal {
    let mut components = Vec::with_capacity(raw.components.len());
    for rc in &raw.components {
        let category = rc.category.unwrap_or_else(|| classifier::classify(&rc.name));
        let mut component = Component::new(rc.name.clone(), category);
        if category == Category::Ram {
            component.specs = ram_specs::extract(&rc.name);
            if component.specs.ddr.is_none() && ctx.assume_ddr5 {
                component.specs.ddr = Some(5);
            }
        }
        components.push(component);
    }

    let combo_price = parse_price(&raw.price_text);
    let url = resolve_url(&raw.url, ctx.retailer.base_url());
    let mut deal = ComboDeal::new(ctx.retailer, components, combo_price, url);
    deal.in_stock = raw.in_stock;
    project_display_fields(&mut deal);
    deal
}

/// Project enriched display fields straight off the matched components.
/// Benchmark scores are attached later by the enrichment pass.
pub fn project_display_fields(deal: &mut ComboDeal) {
    if let Some(cpu) = deal.component(Category::Cpu) {
        deal.cpu_name = cpu.name.clone();
    }
    if let Some(mb) = deal.component(Category::Motherboard) {
        deal.motherboard_name = mb.name.clone();
    }
    if let Some(ram) = deal.component(Category::Ram) {
        let (name, specs) = (ram.name.clone(), ram.specs);
        deal.ram_name = name;
        deal.ram_speed_mhz = specs.speed_mhz.unwrap_or(0);
        deal.ram_capacity_gb = specs.capacity_gb.unwrap_or(0);
    }
}

/// Escalation predicate: should this combo's detail page be fetched to
/// recover component names and specs?
///
/// Triggers on under-classified combos, missing RAM, opaque CPU SKU names,
/// category drift (a motherboard title that ended up tagged cpu) and RAM
/// with unknown capacity or speed.
pub fn needs_detail_enrichment(deal: &ComboDeal) -> bool {
    if !deal.url.contains("ComboDealDetails") {
        return false;
    }

    let known = deal
        .components
        .iter()
        .map(|c| c.category)
        .filter(|c| *c != Category::Unknown)
        .collect::<std::collections::HashSet<_>>();
    if known.len() < 3 {
        return true;
    }

    let Some(ram) = deal.component(Category::Ram) else {
        return true;
    };

    if let Some(cpu) = deal.component(Category::Cpu) {
        if looks_like_cpu_sku(&cpu.name) {
            return true;
        }
        if classifier::classify(&cpu.name) == Category::Motherboard {
            return true;
        }
    }

    // Main regression case: RAM SKU detected but specs unrecovered.
    ram.specs.capacity_gb.unwrap_or(0) == 0 || ram.specs.speed_mhz.unwrap_or(0) == 0
}

/// Rebuild a deal from detail-page component names, keeping the original
/// listing's price, URL and stock state.
pub fn assemble_from_names(
    names: &[String],
    original: &ComboDeal,
    ctx: AssembleContext,
) -> ComboDeal {
    let raw = RawListing {
        title: names.join(" + "),
        price_text: String::new(),
        url: original.url.clone(),
        in_stock: original.in_stock,
        components: names
            .iter()
            .map(|n| crate::model::RawComponent { name: n.clone(), category: None })
            .collect(),
    };
    let mut deal = assemble(&raw, ctx);
    deal.combo_price = original.combo_price;
    deal
}

/// True when the rebuilt detail-page deal should replace the search-result
/// one: re-parsing must have produced a recognizable combo.
pub fn detail_improves(detail: &ComboDeal) -> bool {
    detail.combo_type != ComboType::Other
}
