// Component category classification over free-text product names.
//
// Retailer titles are truncated and reordered unpredictably, so this is an
// ordered rule list, not a scoring model. Motherboard keywords run first:
// board titles routinely advertise CPU-family support ("Supports AMD Ryzen
// 9000 Series") and would otherwise land in the cpu bucket.
use lazy_static::lazy_static;
use regex::Regex;

use crate::model::Category;

const MB_KEYWORDS: &[&str] = &[
    "x870", "x670", "b850", "b650", "b550", "x570",
    "z790", "z690", "b760", "b660", "z890",
    "motherboard", "mainboard",
    "rog strix", "tuf gaming", "mag ", "aorus", "prime",
];

const CPU_KEYWORDS: &[&str] = &[
    "ryzen", "core i", "core ultra", "threadripper",
    "9850x3d", "9800x3d", "9700x", "9600x", "9950x", "9900x",
    "7800x3d", "7700x", "7600x", "7950x", "7900x",
    "14900k", "14700k", "14600k", "13900k", "13700k", "13600k",
    "285k", "265k", "245k",
];

// Brand SKU prefixes cover truncated titles like "Corsair CMH32GX5M2B6400C36".
const RAM_KEYWORDS: &[&str] = &[
    "ddr5", "ddr4", "ram", "memory", "trident", "vengeance", "fury",
    "corsair cmh", "corsair cmk", "v-color", "v color", "tmxs",
    "team group", "ff3d", "kingston fury", "gskill", "g.skill",
];

// Product names that show up in RAM searches but are not desktop kits.
const NON_RAM_KEYWORDS: &[&str] = &[
    "laptop", "notebook", "monitor", "ssd", "nvme", "hard drive",
    "printer", "router", "keyboard", "mouse", "headset", "webcam",
    "case", "chassis", "power supply", "psu", "cooler", "fan",
    "gpu", "graphics card", "motherboard", "mainboard",
    "cpu", "processor", "intel core", "amd ryzen",
    "sodimm", "so-dimm",
];

const RAM_BRAND_KEYWORDS: &[&str] = &[
    "corsair", "g.skill", "gskill", "kingston", "crucial", "patriot",
    "v-color", "v color", "team", "mushkin", "pny", "silicon power",
    "oloy", "xpg", "adata",
];

lazy_static! {
    // Vendor part-number pattern, e.g. AMD 100-100001973WOF.
    static ref CPU_SKU_RE: Regex = Regex::new(r"\d{3}-\d{9,}[a-z]{0,4}").unwrap();
    static ref NON_COMPACT_RE: Regex = Regex::new(r"[^a-z0-9-]").unwrap();
}

fn compact(name_lower: &str) -> String {
    NON_COMPACT_RE.replace_all(name_lower, "").into_owned()
}

/// Classify a free-text product name. Never fails: anything that matches no
/// rule is `Unknown`.
pub fn classify(name: &str) -> Category {
    let lower = name.to_lowercase();
    if lower.is_empty() {
        return Category::Unknown;
    }
    if MB_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Category::Motherboard;
    }
    if CPU_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Category::Cpu;
    }
    if CPU_SKU_RE.is_match(&compact(&lower)) {
        return Category::Cpu;
    }
    if RAM_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
        return Category::Ram;
    }
    Category::Unknown
}

/// Detect opaque CPU model-code names (e.g. "AMD 100-100001973WOF") that
/// won't resolve against the benchmark catalog without detail enrichment.
pub fn looks_like_cpu_sku(name: &str) -> bool {
    CPU_SKU_RE.is_match(&compact(&name.to_lowercase()))
}

/// Gate for standalone RAM search results: requires a RAM indicator or known
/// memory brand, and none of the non-RAM noise keywords.
pub fn is_likely_ram(name: &str) -> bool {
    let lower = name.to_lowercase();
    let mut has_indicator = [
        "ddr5", "memory", "ram", "dimm",
        "trident", "vengeance", "fury", "flare",
        "ripjaws", "dominator",
    ]
    .iter()
    .any(|kw| lower.contains(kw));
    if !has_indicator {
        has_indicator = RAM_BRAND_KEYWORDS.iter().any(|kw| lower.contains(kw));
    }
    let has_non_ram = NON_RAM_KEYWORDS.iter().any(|kw| lower.contains(kw));
    has_indicator && !has_non_ram
}
