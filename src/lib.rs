pub mod assembler;
pub mod benchmarks;
pub mod classifier;
pub mod config;
pub mod filters;
pub mod identity;
pub mod model;
pub mod normalizer;
pub mod notifier;
pub mod price_lookup;
pub mod ram_specs;
pub mod report;
pub mod scraper;
pub mod storage;
