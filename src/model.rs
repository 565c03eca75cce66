// Core structs: Component, ComboDeal, RamDeal, CpuBenchmark
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Cpu,
    Motherboard,
    Ram,
    Unknown,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Category::Cpu => "cpu",
            Category::Motherboard => "motherboard",
            Category::Ram => "ram",
            Category::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Retailer {
    Newegg,
    Amazon,
    MicroCenter,
    BHPhoto,
}

impl Retailer {
    pub fn name(&self) -> &'static str {
        match self {
            Retailer::Newegg => "Newegg",
            Retailer::Amazon => "Amazon",
            Retailer::MicroCenter => "MicroCenter",
            Retailer::BHPhoto => "BHPhoto",
        }
    }

    pub fn base_url(&self) -> &'static str {
        match self {
            Retailer::Newegg => "https://www.newegg.com",
            Retailer::Amazon => "https://www.amazon.com",
            Retailer::MicroCenter => "https://www.microcenter.com",
            Retailer::BHPhoto => "https://www.bhphotovideo.com",
        }
    }

    /// Domain substring used to map a deal URL back to its retailer.
    pub fn domain(&self) -> &'static str {
        match self {
            Retailer::Newegg => "newegg.com",
            Retailer::Amazon => "amazon.com",
            Retailer::MicroCenter => "microcenter.com",
            Retailer::BHPhoto => "bhphotovideo.com",
        }
    }
}

impl fmt::Display for Retailer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComboType {
    CpuMbRam,
    CpuRam,
    MbRam,
    CpuMb,
    Other,
}

impl ComboType {
    /// Combo type is a pure function of the set of categories present,
    /// independent of component order.
    pub fn from_components(components: &[Component]) -> Self {
        let categories: HashSet<Category> = components.iter().map(|c| c.category).collect();
        let cpu = categories.contains(&Category::Cpu);
        let mb = categories.contains(&Category::Motherboard);
        let ram = categories.contains(&Category::Ram);
        match (cpu, mb, ram) {
            (true, true, true) => ComboType::CpuMbRam,
            (true, false, true) => ComboType::CpuRam,
            (false, true, true) => ComboType::MbRam,
            (true, true, false) => ComboType::CpuMb,
            _ => ComboType::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ComboType::CpuMbRam => "CPU+MB+RAM",
            ComboType::CpuRam => "CPU+RAM",
            ComboType::MbRam => "MB+RAM",
            ComboType::CpuMb => "CPU+MB",
            ComboType::Other => "OTHER",
        }
    }
}

impl fmt::Display for ComboType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// RAM attributes recovered from free text or vendor SKU codes.
///
/// `None` means "could not be determined" and is distinct from a known
/// zero; downstream enrichment only fills missing fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RamSpecs {
    pub ddr: Option<u32>,
    pub capacity_gb: Option<u32>,
    pub speed_mhz: Option<u32>,
}

impl RamSpecs {
    pub fn is_empty(&self) -> bool {
        self.ddr.is_none() && self.capacity_gb.is_none() && self.speed_mhz.is_none()
    }

    /// Fill any missing fields from `other` without overwriting known ones.
    pub fn fill_missing(&mut self, other: &RamSpecs) {
        if self.ddr.is_none() {
            self.ddr = other.ddr;
        }
        if self.capacity_gb.is_none() {
            self.capacity_gb = other.capacity_gb;
        }
        if self.speed_mhz.is_none() {
            self.speed_mhz = other.speed_mhz;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Component {
    pub name: String,
    pub category: Category,
    #[serde(default)]
    pub specs: RamSpecs,
    #[serde(default)]
    pub individual_price: f64,
}

impl Component {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
            specs: RamSpecs::default(),
            individual_price: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ComboDeal {
    pub retailer: Retailer,
    pub combo_type: ComboType,
    pub components: Vec<Component>,
    pub combo_price: f64,
    pub individual_total: f64,
    pub savings: f64,
    pub url: String,
    pub in_stock: bool,

    // Enriched fields, projected from components and the benchmark catalog.
    pub cpu_name: String,
    pub cpu_cores: String, // "16C/32T"
    pub cpu_sc_score: u32,
    pub cpu_mc_score: u32,
    pub motherboard_name: String,
    pub ram_name: String,
    pub ram_speed_mhz: u32,
    pub ram_capacity_gb: u32,
}

impl ComboDeal {
    pub fn new(
        retailer: Retailer,
        components: Vec<Component>,
        combo_price: f64,
        url: String,
    ) -> Self {
        let combo_type = ComboType::from_components(&components);
        Self {
            retailer,
            combo_type,
            components,
            combo_price,
            individual_total: 0.0,
            savings: 0.0,
            url,
            in_stock: true,
            cpu_name: String::new(),
            cpu_cores: String::new(),
            cpu_sc_score: 0,
            cpu_mc_score: 0,
            motherboard_name: String::new(),
            ram_name: String::new(),
            ram_speed_mhz: 0,
            ram_capacity_gb: 0,
        }
    }

    pub fn component(&self, category: Category) -> Option<&Component> {
        self.components.iter().find(|c| c.category == category)
    }

    pub fn component_mut(&mut self, category: Category) -> Option<&mut Component> {
        self.components.iter_mut().find(|c| c.category == category)
    }

    /// Recompute `individual_total` and `savings` from component prices.
    /// Savings is always derived, never set directly.
    pub fn calculate_savings(&mut self) {
        self.individual_total = self.components.iter().map(|c| c.individual_price).sum();
        self.savings = self.individual_total - self.combo_price;
    }

    pub fn savings_percent(&self) -> f64 {
        if self.individual_total <= 0.0 {
            return 0.0;
        }
        (self.savings / self.individual_total) * 100.0
    }
}

/// A standalone DDR5 RAM kit deal from a single retailer.
#[derive(Debug, Clone)]
pub struct RamDeal {
    pub retailer: Retailer,
    pub name: String,
    pub capacity_gb: u32,
    pub speed_mhz: u32,
    pub ddr_version: u32,
    pub price: f64,
    /// Amazon reference price; 0.0 when unknown.
    pub amazon_price: f64,
    /// amazon_price - price; positive means the retailer is cheaper.
    /// Stays 0.0 for Amazon's own listings.
    pub savings: f64,
    pub url: String,
}

impl RamDeal {
    pub fn new(retailer: Retailer, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            retailer,
            name: name.into(),
            capacity_gb: 0,
            speed_mhz: 0,
            ddr_version: 5,
            price: 0.0,
            amazon_price: 0.0,
            savings: 0.0,
            url: url.into(),
        }
    }
}

/// Static benchmark reference entry; loaded once, never mutated.
#[derive(Debug, Clone)]
pub struct CpuBenchmark {
    pub cpu_name: &'static str,
    pub cores: u32,
    pub threads: u32,
    pub single_core_score: u32,
    pub multi_core_score: u32,
}

/// Raw item text extracted from a search-results page: one listing blob.
#[derive(Debug, Clone)]
pub struct RawItem {
    pub title: String,
    pub price_text: String,
    pub url: String,
    pub in_stock: bool,
}

/// A raw component name, optionally pre-tagged by the source extractor.
#[derive(Debug, Clone)]
pub struct RawComponent {
    pub name: String,
    pub category: Option<Category>,
}

/// A raw combo listing ready for assembly into a `ComboDeal`.
#[derive(Debug, Clone)]
pub struct RawListing {
    pub title: String,
    pub price_text: String,
    pub url: String,
    pub in_stock: bool,
    pub components: Vec<RawComponent>,
}

/// Per-source fetch outcome for the run summary and reconciliation.
#[derive(Debug, Clone)]
pub enum SourceStatus {
    Ok(usize),
    Error(String),
}

impl SourceStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, SourceStatus::Ok(_))
    }
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Ok(n) => write!(f, "ok ({n} items)"),
            SourceStatus::Error(e) => write!(f, "failed: {e}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid response from {url}: status {status}")]
    InvalidResponse { url: String, status: u16 },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("webhook error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("webhook responded with status {0}")]
    BadStatus(u16),
}
