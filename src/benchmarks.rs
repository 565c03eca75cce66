// CPU benchmark lookup against a static catalog of known scores.
use crate::model::{Category, ComboDeal, CpuBenchmark};

// PassMark-style scores for common CPUs (approximate, for comparison only).
// (name, cores, threads, single-core, multi-core)
const CPU_CATALOG: &[(&str, u32, u32, u32, u32)] = &[
    // AMD Ryzen 9000 series (AM5)
    ("Ryzen 9 9950X", 16, 32, 4600, 65000),
    ("Ryzen 9 9900X", 12, 24, 4500, 52000),
    ("Ryzen 7 9850X3D", 8, 16, 4700, 37000),
    ("Ryzen 7 9850X", 8, 16, 4500, 34000),
    ("Ryzen 7 9800X3D", 8, 16, 4700, 36000),
    ("Ryzen 7 9700X", 8, 16, 4200, 32000),
    ("Ryzen 5 9600X", 6, 12, 4100, 25000),
    ("Ryzen 5 9600", 6, 12, 3900, 23000),
    // AMD Ryzen 7000 series (AM5)
    ("Ryzen 9 7950X", 16, 32, 4300, 63000),
    ("Ryzen 9 7900X", 12, 24, 4200, 50000),
    ("Ryzen 7 7800X3D", 8, 16, 4400, 33000),
    ("Ryzen 7 7700X", 8, 16, 4000, 30000),
    ("Ryzen 5 7600X", 6, 12, 3900, 23000),
    ("Ryzen 5 7600", 6, 12, 3700, 22000),
    // Intel 15th Gen Arrow Lake (LGA 1851)
    ("Core Ultra 9 285K", 24, 24, 4700, 55000),
    ("Core Ultra 7 265K", 20, 20, 4500, 45000),
    ("Core Ultra 7 265KF", 20, 20, 4500, 45000),
    ("Core Ultra 5 245K", 14, 14, 4300, 33000),
    ("Core Ultra 5 245KF", 14, 14, 4300, 33000),
    // Intel 14th Gen Raptor Lake Refresh (LGA 1700)
    ("Core i9-14900K", 24, 32, 4500, 59000),
    ("Core i9-14900KF", 24, 32, 4500, 59000),
    ("Core i7-14700K", 20, 28, 4300, 47000),
    ("Core i7-14700KF", 20, 28, 4300, 47000),
    ("Core i5-14600K", 14, 20, 4100, 33000),
    ("Core i5-14600KF", 14, 20, 4100, 33000),
    // Intel 13th Gen Raptor Lake (LGA 1700)
    ("Core i9-13900K", 24, 32, 4300, 56000),
    ("Core i9-13900KF", 24, 32, 4300, 56000),
    ("Core i7-13700K", 16, 24, 4100, 40000),
    ("Core i7-13700KF", 16, 24, 4100, 40000),
    ("Core i5-13600K", 14, 20, 3900, 30000),
    ("Core i5-13600KF", 14, 20, 3900, 30000),
    // Intel 12th Gen Alder Lake (LGA 1700)
    ("Core i9-12900K", 16, 24, 3900, 45000),
    ("Core i9-12900KF", 16, 24, 3900, 45000),
    ("Core i7-12700K", 12, 20, 3800, 35000),
    ("Core i7-12700KF", 12, 20, 3800, 35000),
    ("Core i5-12600K", 10, 16, 3700, 27000),
    ("Core i5-12600KF", 10, 16, 3700, 27000),
];

/// Static, read-only benchmark catalog; build once at startup and pass by
/// reference into the enrichment pass.
pub struct BenchmarkCatalog {
    entries: Vec<CpuBenchmark>,
}

fn normalize(name: &str) -> String {
    name.to_lowercase().replace('-', " ")
}

impl BenchmarkCatalog {
    pub fn new() -> Self {
        let entries = CPU_CATALOG
            .iter()
            .map(|&(cpu_name, cores, threads, sc, mc)| CpuBenchmark {
                cpu_name,
                cores,
                threads,
                single_core_score: sc,
                multi_core_score: mc,
            })
            .collect();
        Self { entries }
    }

    /// Fuzzy lookup by CPU name.
    ///
    /// Dashes normalize to spaces so "i7-14700K" matches "i7 14700k";
    /// substring containment is tried in both directions, then the entry's
    /// bare model number as a fallback ("Core i7-14700K" falls back to
    /// "14700k", matching titles that drop the family prefix).
    pub fn lookup(&self, cpu_name: &str) -> Option<&CpuBenchmark> {
        let query = normalize(cpu_name);
        if query.trim().is_empty() {
            return None;
        }
        for entry in &self.entries {
            let entry_norm = normalize(entry.cpu_name);
            if entry_norm.contains(&query) || query.contains(&entry_norm) {
                return Some(entry);
            }
        }
        for entry in &self.entries {
            let model = entry
                .cpu_name
                .split_whitespace()
                .last()
                .and_then(|token| token.rsplit('-').next())
                .unwrap_or("");
            if !model.is_empty() && query.contains(&normalize(model)) {
                return Some(entry);
            }
        }
        None
    }
}

impl Default for BenchmarkCatalog {
    fn default() -> Self {
        Self::new()
    }
}

/// Attach benchmark scores and the cores string to every deal with a
/// resolvable CPU. Deals with no catalog match keep zero scores.
pub fn enrich_deals(deals: &mut [ComboDeal], catalog: &BenchmarkCatalog) {
    for deal in deals.iter_mut() {
        crate::assembler::project_display_fields(deal);
        let Some(cpu) = deal.component(Category::Cpu) else {
            continue;
        };
        if let Some(bench) = catalog.lookup(&cpu.name) {
            deal.cpu_sc_score = bench.single_core_score;
            deal.cpu_mc_score = bench.multi_core_score;
            deal.cpu_cores = format!("{}C/{}T", bench.cores, bench.threads);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_known_cpu() {
        let catalog = BenchmarkCatalog::new();
        let result = catalog.lookup("AMD Ryzen 9 9900X").unwrap();
        assert!(result.cores > 0);
        assert!(result.single_core_score > 0);
        assert!(result.multi_core_score > 0);
    }

    #[test]
    fn lookup_is_dash_and_space_insensitive() {
        let catalog = BenchmarkCatalog::new();
        let a = catalog.lookup("intel core i7 14700k").unwrap();
        let b = catalog.lookup("Core i7-14700K").unwrap();
        assert_eq!(a.cpu_name, b.cpu_name);
    }

    #[test]
    fn lookup_model_number_fallback() {
        let catalog = BenchmarkCatalog::new();
        let result = catalog.lookup("Intel 14th Gen 14700K Processor").unwrap();
        assert_eq!(result.cpu_name, "Core i7-14700K");
    }

    #[test]
    fn lookup_unknown_returns_none() {
        let catalog = BenchmarkCatalog::new();
        assert!(catalog.lookup("Unknown CPU XYZ 9999").is_none());
        assert!(catalog.lookup("").is_none());
    }

    #[test]
    fn threads_at_least_cores() {
        let catalog = BenchmarkCatalog::new();
        let result = catalog.lookup("AMD Ryzen 7 9800X3D").unwrap();
        assert!(result.threads >= result.cores);
    }
}
