// Plain fixed-width terminal tables for the run summary.
use chrono::Local;

use crate::model::{ComboDeal, RamDeal};
use crate::normalizer::{shorten_cpu, shorten_motherboard, shorten_ram};

fn clip(text: &str, width: usize) -> String {
    let mut s: String = text.chars().take(width).collect();
    while s.chars().count() < width {
        s.push(' ');
    }
    s
}

fn dash_if_empty(text: String) -> String {
    if text.is_empty() { "—".to_string() } else { text }
}

fn dash_if_zero(value: u32) -> String {
    if value == 0 { "—".to_string() } else { value.to_string() }
}

/// Render ranked combo deals as a fixed-width table with a best-deal and
/// average-savings footer.
pub fn render_combo_table(deals: &[ComboDeal]) -> String {
    if deals.is_empty() {
        return "No deals found matching your criteria.\n".to_string();
    }

    let now = Local::now().format("%Y-%m-%d %H:%M");
    let mut out = format!("\nCombo Deal Checker — {now}    Found: {}\n\n", deals.len());

    out.push_str(&format!(
        "{} {} {} {} {} {} {} {} {} {} {} {} {} URL\n",
        clip("#", 3),
        clip("Retailer", 11),
        clip("Type", 10),
        clip("CPU", 24),
        clip("Cores", 7),
        clip("SC", 5),
        clip("MC", 6),
        clip("Motherboard", 28),
        clip("RAM", 30),
        clip("Speed", 8),
        clip("Combo$", 8),
        clip("Indiv$", 8),
        clip("Save$", 8),
    ));

    for (i, deal) in deals.iter().enumerate() {
        let speed = if deal.ram_speed_mhz > 0 {
            format!("{}MHz", deal.ram_speed_mhz)
        } else {
            "—".to_string()
        };
        let indiv = if deal.individual_total > 0.0 {
            format!("${:.0}", deal.individual_total)
        } else {
            "—".to_string()
        };
        out.push_str(&format!(
            "{} {} {} {} {} {} {} {} {} {} {} {} {} {}\n",
            clip(&(i + 1).to_string(), 3),
            clip(deal.retailer.name(), 11),
            clip(deal.combo_type.label(), 10),
            clip(&dash_if_empty(shorten_cpu(&deal.cpu_name)), 24),
            clip(&dash_if_empty(deal.cpu_cores.clone()), 7),
            clip(&dash_if_zero(deal.cpu_sc_score), 5),
            clip(&dash_if_zero(deal.cpu_mc_score), 6),
            clip(&dash_if_empty(shorten_motherboard(&deal.motherboard_name)), 28),
            clip(&dash_if_empty(shorten_ram(&deal.ram_name)), 30),
            clip(&speed, 8),
            clip(&format!("${:.0}", deal.combo_price), 8),
            clip(&indiv, 8),
            clip(&format!("${:.0}", deal.savings), 8),
            deal.url,
        ));
    }

    // Filtered output is already ranked by savings.
    let best = &deals[0];
    let avg_savings = deals.iter().map(|d| d.savings).sum::<f64>() / deals.len() as f64;
    let best_name = {
        let short = shorten_cpu(&best.cpu_name);
        if short.is_empty() { best.combo_type.label().to_string() } else { short }
    };
    out.push_str(&format!(
        "\nBest deal: {} — {} combo — saves ${:.0}\n",
        best.retailer, best_name, best.savings
    ));
    out.push_str(&format!("Average savings: ${avg_savings:.0}\n"));
    out
}

/// Render ranked standalone RAM deals.
pub fn render_ram_table(deals: &[RamDeal]) -> String {
    if deals.is_empty() {
        return "No standalone RAM deals matching your criteria.\n".to_string();
    }

    let mut out = format!("\nDDR5 RAM Deals    Found: {}\n\n", deals.len());
    out.push_str(&format!(
        "{} {} {} {} {} {} {} {} URL\n",
        clip("#", 3),
        clip("Retailer", 11),
        clip("RAM", 40),
        clip("Cap", 6),
        clip("Speed", 8),
        clip("Price$", 8),
        clip("Amazon$", 8),
        clip("Save$", 8),
    ));

    for (i, deal) in deals.iter().enumerate() {
        let speed = if deal.speed_mhz > 0 {
            format!("{}MHz", deal.speed_mhz)
        } else {
            "—".to_string()
        };
        let amazon = if deal.amazon_price > 0.0 {
            format!("${:.0}", deal.amazon_price)
        } else {
            "—".to_string()
        };
        out.push_str(&format!(
            "{} {} {} {} {} {} {} {} {}\n",
            clip(&(i + 1).to_string(), 3),
            clip(deal.retailer.name(), 11),
            clip(&dash_if_empty(shorten_ram(&deal.name)), 40),
            clip(&format!("{}GB", deal.capacity_gb), 6),
            clip(&speed, 8),
            clip(&format!("${:.0}", deal.price), 8),
            clip(&amazon, 8),
            clip(&format!("${:.0}", deal.savings), 8),
            deal.url,
        ));
    }
    out
}
