use std::collections::{HashMap, HashSet};
use std::future::Future;
use tracing::{error, info, warn};

use combo_sniper::benchmarks::{enrich_deals, BenchmarkCatalog};
use combo_sniper::config::load_config;
use combo_sniper::filters::{filter_combo_deals, filter_ram_deals};
use combo_sniper::identity::{newly_out_of_stock, normalize_identity, reconcile};
use combo_sniper::model::{ComboDeal, RamDeal, ScrapeError, SourceStatus};
use combo_sniper::notifier::DiscordNotifier;
use combo_sniper::price_lookup::PriceLookup;
use combo_sniper::report::{render_combo_table, render_ram_table};
use combo_sniper::scraper::{
    self, with_retries, HttpFetcher, SRC_AMAZON, SRC_AMAZON_RAM, SRC_BHPHOTO, SRC_BHPHOTO_RAM,
    SRC_MICROCENTER, SRC_MICROCENTER_RAM, SRC_NEWEGG, SRC_NEWEGG_RAM,
};
use combo_sniper::storage::SqliteStorage;

const SOURCE_ORDER: [&str; 8] = [
    SRC_NEWEGG,
    SRC_AMAZON,
    SRC_MICROCENTER,
    SRC_BHPHOTO,
    SRC_NEWEGG_RAM,
    SRC_AMAZON_RAM,
    SRC_MICROCENTER_RAM,
    SRC_BHPHOTO_RAM,
];

/// Run one source scrape with retries and record its status. A failed source
/// never aborts the run; its error lands in the status map so reconciliation
/// knows not to trust its absence.
async fn run_source<T, F, Fut>(
    name: &'static str,
    max_retries: u32,
    backoff: f64,
    statuses: &mut HashMap<String, SourceStatus>,
    out: &mut Vec<T>,
    op: F,
) where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ScrapeError>>,
{
    match with_retries(name, max_retries, backoff, op).await {
        Ok(items) => {
            info!(source = name, count = items.len(), "source complete");
            statuses.insert(name.to_string(), SourceStatus::Ok(items.len()));
            out.extend(items);
        }
        Err(e) => {
            error!(source = name, "source failed: {e}");
            statuses.insert(name.to_string(), SourceStatus::Error(e.to_string()));
        }
    }
}

#[tokio::main]
async fn main() {
    let args: Vec<String> = std::env::args().collect();
    let debug = args.iter().any(|a| a == "--debug");
    let fresh = args.iter().any(|a| a == "--fresh");

    tracing_subscriber::fmt()
        .with_max_level(if debug { tracing::Level::DEBUG } else { tracing::Level::INFO })
        .init();

    let cfg = match load_config("config.json") {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("config load error: {e}");
            return;
        }
    };

    let mut storage = match SqliteStorage::new(&cfg.db_path) {
        Ok(s) => s,
        Err(e) => {
            error!("storage init failed: {e}");
            return;
        }
    };
    if fresh {
        match storage.clear() {
            Ok(()) => info!("persisted state cleared"),
            Err(e) => {
                error!("failed to clear persisted state: {e}");
                return;
            }
        }
    }

    let fetcher = match HttpFetcher::new(&cfg) {
        Ok(f) => f,
        Err(e) => {
            error!("http client init failed: {e}");
            return;
        }
    };
    let mut statuses: HashMap<String, SourceStatus> = HashMap::new();
    let mut combo_deals: Vec<ComboDeal> = Vec::new();
    let mut ram_deals: Vec<RamDeal> = Vec::new();

    // Sources run sequentially; each retailer gets paced, jittered requests.
    run_source(SRC_NEWEGG, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut combo_deals, || {
        scraper::newegg::scrape_combos(&fetcher, &storage)
    })
    .await;
    run_source(SRC_AMAZON, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut combo_deals, || {
        scraper::amazon::scrape_combos(&fetcher)
    })
    .await;
    run_source(
        SRC_MICROCENTER,
        cfg.max_retries,
        cfg.retry_backoff,
        &mut statuses,
        &mut combo_deals,
        || scraper::microcenter::scrape_combos(&fetcher),
    )
    .await;
    run_source(SRC_BHPHOTO, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut combo_deals, || {
        scraper::bhphoto::scrape_combos(&fetcher)
    })
    .await;

    run_source(SRC_NEWEGG_RAM, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut ram_deals, || {
        scraper::ram::scrape_newegg(&fetcher)
    })
    .await;
    run_source(SRC_AMAZON_RAM, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut ram_deals, || {
        scraper::ram::scrape_amazon(&fetcher)
    })
    .await;
    run_source(
        SRC_MICROCENTER_RAM,
        cfg.max_retries,
        cfg.retry_backoff,
        &mut statuses,
        &mut ram_deals,
        || scraper::ram::scrape_microcenter(&fetcher),
    )
    .await;
    run_source(SRC_BHPHOTO_RAM, cfg.max_retries, cfg.retry_backoff, &mut statuses, &mut ram_deals, || {
        scraper::ram::scrape_bhphoto(&fetcher)
    })
    .await;

    let catalog = BenchmarkCatalog::new();
    enrich_deals(&mut combo_deals, &catalog);

    {
        let mut lookup = PriceLookup::new(&fetcher, &storage, cfg.price_cache_ttl_secs);
        lookup.price_deals(&mut combo_deals).await;
        lookup.price_ram_deals(&mut ram_deals).await;
    }

    let filtered_combos = filter_combo_deals(combo_deals.clone(), &cfg);
    let filtered_ram = filter_ram_deals(ram_deals.clone());

    println!("{}", render_combo_table(&filtered_combos));
    println!("{}", render_ram_table(&filtered_ram));

    // Reconcile against the persisted seen-set. The current set covers every
    // scraped identity, filtered or not, so a deal that merely fails the
    // filters is never reported as disappeared.
    let seen = storage.load_seen().unwrap_or_else(|e| {
        warn!("seen-set load failed, starting empty: {e}");
        HashSet::new()
    });
    let mut current: HashSet<String> =
        combo_deals.iter().map(|d| normalize_identity(&d.url)).collect();
    current.extend(ram_deals.iter().map(|d| normalize_identity(&d.url)));

    let rec = reconcile(&current, &seen, &statuses);
    let oos = newly_out_of_stock(&combo_deals, &seen);

    let new_combos: Vec<&ComboDeal> = filtered_combos
        .iter()
        .filter(|d| rec.newly_seen.contains(&normalize_identity(&d.url)))
        .collect();
    let new_ram: Vec<&RamDeal> = filtered_ram
        .iter()
        .filter(|d| rec.newly_seen.contains(&normalize_identity(&d.url)))
        .collect();
    let mut disappeared: Vec<String> = rec.disappeared.iter().cloned().collect();
    disappeared.sort();

    let notifier = DiscordNotifier::new(cfg.discord_webhook_url.clone());
    let mut all_sent = true;
    match notifier.notify_combo_deals(&new_combos).await {
        Ok(n) => info!(sent = n, "combo notifications"),
        Err(e) => {
            warn!("combo notification failed: {e}");
            all_sent = false;
        }
    }
    match notifier.notify_ram_deals(&new_ram).await {
        Ok(n) => info!(sent = n, "RAM notifications"),
        Err(e) => {
            warn!("RAM notification failed: {e}");
            all_sent = false;
        }
    }
    match notifier.notify_expired(&oos, &disappeared).await {
        Ok(n) => info!(sent = n, "expired notifications"),
        Err(e) => {
            warn!("expired notification failed: {e}");
            all_sent = false;
        }
    }

    // Only commit the seen-set once every dispatch succeeded, so failed
    // notifications re-fire next run. Out-of-stock deals leave the set and
    // re-notify if they restock.
    if all_sent {
        let mut updated = seen;
        updated.extend(new_combos.iter().map(|d| normalize_identity(&d.url)));
        updated.extend(new_ram.iter().map(|d| normalize_identity(&d.url)));
        for url in &rec.disappeared {
            updated.remove(url);
        }
        for deal in &oos {
            updated.remove(&normalize_identity(&deal.url));
        }
        if let Err(e) = storage.replace_seen(&updated) {
            warn!("seen-set save failed: {e}");
        }
    } else {
        warn!("a notification failed; seen-set left unchanged");
    }

    println!("Source status:");
    for name in SOURCE_ORDER {
        if let Some(status) = statuses.get(name) {
            println!("  {name}: {status}");
        }
    }
}
