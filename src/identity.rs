// Deal identity: canonical URL keys and cross-run reconciliation.
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::{HashMap, HashSet};

use crate::model::{ComboDeal, Retailer, SourceStatus};

lazy_static! {
    static ref AMAZON_ASIN_RE: Regex = Regex::new(r"/dp/([A-Z0-9]{10})").unwrap();
}

/// Normalize a deal URL to a stable canonical identity.
///
/// Amazon search-result URLs carry volatile query params (qid, dib, sr) that
/// change every request; collapse them to `/dp/{ASIN}` so the same product is
/// recognized across runs. All other sources use the URL unchanged.
pub fn normalize_identity(url: &str) -> String {
    if url.contains("amazon.com") {
        if let Some(c) = AMAZON_ASIN_RE.captures(url) {
            return format!("https://www.amazon.com/dp/{}", &c[1]);
        }
    }
    url.to_string()
}

/// Map an identity back to the source names whose fetch status governs it.
///
/// This leans on literal domain substrings; intentionally kept as a small
/// fixed table because the only hard requirement is that a failed fetch
/// never produces a false "disappeared" signal.
fn sources_for_identity(url: &str) -> Option<[&'static str; 2]> {
    for retailer in [
        Retailer::Newegg,
        Retailer::Amazon,
        Retailer::MicroCenter,
        Retailer::BHPhoto,
    ] {
        if url.contains(retailer.domain()) {
            return Some(match retailer {
                Retailer::Newegg => ["newegg", "newegg-ram"],
                Retailer::Amazon => ["amazon", "amazon-ram"],
                Retailer::MicroCenter => ["microcenter", "microcenter-ram"],
                Retailer::BHPhoto => ["bhphoto", "bhphoto-ram"],
            });
        }
    }
    None
}

#[derive(Debug, Default)]
pub struct Reconciliation {
    /// Current identities not previously seen.
    pub newly_seen: HashSet<String>,
    /// Previously seen identities gone from the current run, restricted to
    /// sources whose fetch succeeded.
    pub disappeared: HashSet<String>,
}

/// Pure reconciliation of the current run against the persisted seen-set.
///
/// An identity only counts as disappeared when at least one of its owning
/// source's fetches reported ok this run; absence due to a failed fetch is
/// not absence due to delisting.
pub fn reconcile(
    current: &HashSet<String>,
    seen: &HashSet<String>,
    statuses: &HashMap<String, SourceStatus>,
) -> Reconciliation {
    let newly_seen = current.difference(seen).cloned().collect();

    let mut disappeared = HashSet::new();
    for url in seen {
        if current.contains(url) {
            continue;
        }
        let Some(sources) = sources_for_identity(url) else {
            continue;
        };
        let owner_ok = sources
            .iter()
            .any(|s| statuses.get(*s).map(|st| st.is_ok()).unwrap_or(false));
        if owner_ok {
            disappeared.insert(url.clone());
        }
    }

    Reconciliation { newly_seen, disappeared }
}

/// Previously-seen deals that are still listed but now out of stock.
/// Distinct from "disappeared": these still have full deal data to report.
pub fn newly_out_of_stock<'a>(
    deals: &'a [ComboDeal],
    seen: &HashSet<String>,
) -> Vec<&'a ComboDeal> {
    deals
        .iter()
        .filter(|d| !d.in_stock && seen.contains(&normalize_identity(&d.url)))
        .collect()
}
