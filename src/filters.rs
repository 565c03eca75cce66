// Acceptance predicates and ranking for combo and standalone RAM deals.
use std::cmp::Ordering;
use tracing::debug;

use crate::config::AppConfig;
use crate::model::{Category, ComboDeal, RamDeal};

/// Price limits by capacity tier for standalone RAM kits. Capacities outside
/// this table are always rejected, 32GB included.
pub const RAM_PRICE_LIMITS: [(u32, f64); 4] =
    [(48, 450.0), (64, 650.0), (96, 800.0), (128, 800.0)];

pub fn tier_price_limit(capacity_gb: u32) -> Option<f64> {
    RAM_PRICE_LIMITS
        .iter()
        .find(|(cap, _)| *cap == capacity_gb)
        .map(|(_, limit)| *limit)
}

fn check_ddr5(deal: &ComboDeal) -> bool {
    deal.component(Category::Ram)
        .map(|ram| ram.specs.ddr == Some(5))
        .unwrap_or(false)
}

fn check_ram_capacity(deal: &ComboDeal, min_gb: u32) -> bool {
    deal.component(Category::Ram)
        .map(|ram| ram.specs.capacity_gb.unwrap_or(0) >= min_gb)
        .unwrap_or(false)
}

fn check_budget(deal: &ComboDeal, min_price: f64, max_price: f64) -> bool {
    min_price <= deal.combo_price && deal.combo_price <= max_price
}

fn combo_rejection_reason(deal: &ComboDeal, cfg: &AppConfig) -> Option<String> {
    if !deal.in_stock {
        return Some("out of stock".into());
    }
    if !check_ddr5(deal) {
        return Some("not DDR5".into());
    }
    if !check_ram_capacity(deal, cfg.min_ram_gb) {
        return Some(format!(
            "RAM {}GB below {}GB minimum",
            deal.ram_capacity_gb, cfg.min_ram_gb
        ));
    }
    if !check_budget(deal, cfg.min_budget, cfg.max_budget) {
        return Some(format!(
            "price ${:.0} outside ${:.0}-${:.0} budget",
            deal.combo_price, cfg.min_budget, cfg.max_budget
        ));
    }
    None
}

/// Filter combo deals, then order by savings descending with single-core
/// benchmark score as the tie-break; unscored deals sort after scored ones
/// at equal savings.
pub fn filter_combo_deals(deals: Vec<ComboDeal>, cfg: &AppConfig) -> Vec<ComboDeal> {
    let mut filtered: Vec<ComboDeal> = deals
        .into_iter()
        .filter(|deal| match combo_rejection_reason(deal, cfg) {
            Some(reason) => {
                debug!(
                    retailer = %deal.retailer,
                    url = %deal.url,
                    "combo filtered out: {reason}"
                );
                false
            }
            None => true,
        })
        .collect();
    filtered.sort_by(|a, b| {
        b.savings
            .partial_cmp(&a.savings)
            .unwrap_or(Ordering::Equal)
            .then(b.cpu_sc_score.cmp(&a.cpu_sc_score))
    });
    filtered
}

fn ram_rejection_reason(deal: &RamDeal) -> Option<String> {
    if deal.ddr_version != 5 {
        return Some("not DDR5".into());
    }
    let Some(limit) = tier_price_limit(deal.capacity_gb) else {
        return Some(format!("capacity {}GB not in target set", deal.capacity_gb));
    };
    if !(deal.price > 0.0 && deal.price <= limit) {
        return Some(format!(
            "price ${:.0} exceeds ${:.0} limit for {}GB",
            deal.price, limit, deal.capacity_gb
        ));
    }
    None
}

/// Filter standalone RAM deals, then order by savings descending with speed
/// as the tie-break.
pub fn filter_ram_deals(deals: Vec<RamDeal>) -> Vec<RamDeal> {
    let mut filtered: Vec<RamDeal> = deals
        .into_iter()
        .filter(|deal| match ram_rejection_reason(deal) {
            Some(reason) => {
                debug!(
                    retailer = %deal.retailer,
                    name = %deal.name,
                    "RAM filtered out: {reason}"
                );
                false
            }
            None => true,
        })
        .collect();
    filtered.sort_by(|a, b| {
        b.savings
            .partial_cmp(&a.savings)
            .unwrap_or(Ordering::Equal)
            .then(b.speed_mhz.cmp(&a.speed_mhz))
    });
    filtered
}
