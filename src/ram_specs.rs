// RAM spec extraction: DDR generation, total capacity (GB) and speed (MT/s)
// from free text and vendor SKU encodings.
//
// Rules run in a fixed order and each field is set at most once: explicit
// in-name data always wins over SKU inference. The vendor SKU grammars are
// reverse-engineered from specific product lines (Corsair CMH/CMK, V-Color
// TMXS, Patriot VEB5) and are best-effort tables, not a general decoder.
use lazy_static::lazy_static;
use regex::Regex;

use crate::model::RamSpecs;

lazy_static! {
    static ref DDR_RE: Regex = Regex::new(r"ddr(\d)").unwrap();
    // Kit notation must run before the plain-GB pattern, otherwise
    // "2x16GB" would yield capacity 2.
    static ref KIT_RE: Regex = Regex::new(r"(\d+)\s*x\s*(\d+)\s*gb").unwrap();
    static ref CAP_RE: Regex = Regex::new(r"(\d+)\s*gb").unwrap();
    static ref SPEED_RE: Regex = Regex::new(r"ddr\d[- ]?(\d{4,5})").unwrap();
    // CMH32GX5M2N6400C36W -> 32GB, DDR5, 6400
    static ref CORSAIR_RE: Regex =
        Regex::new(r"(?:cmh|cmk)(\d+)gx(\d)m\d+n?(\d{4,5})").unwrap();
    // TMXSAL1664832KWK -> 2x16GB, DDR5-6400 CL32
    static ref VCOLOR_RE: Regex =
        Regex::new(r"tmxs[a-z0-9]*?(\d{2})(\d{3})(\d{2})").unwrap();
    // VEB516G6030W -> 16GB, DDR5, 6000
    static ref PATRIOT_RE: Regex = Regex::new(r"veb5(\d{2})g(\d{2})(\d{2})").unwrap();
    static ref NON_ALNUM_RE: Regex = Regex::new(r"[^a-z0-9]").unwrap();
}

fn parse_u32(s: &str) -> Option<u32> {
    s.parse().ok()
}

/// Extract RAM attributes from a product name. Fields stay `None` (not zero)
/// when unrecoverable; callers treat absence as "needs further enrichment".
pub fn extract(name: &str) -> RamSpecs {
    let lower = name.to_lowercase();
    let compact = NON_ALNUM_RE.replace_all(&lower, "");
    let mut specs = RamSpecs::default();

    // 1. Explicit DDR generation token.
    if let Some(c) = DDR_RE.captures(&lower) {
        specs.ddr = parse_u32(&c[1]);
    }

    // 2/3. Capacity: kit notation first, then plain <N>GB.
    if let Some(c) = KIT_RE.captures(&lower) {
        if let (Some(sticks), Some(per)) = (parse_u32(&c[1]), parse_u32(&c[2])) {
            // checked_mul: an absurd stick count reads as "capacity unknown".
            specs.capacity_gb = sticks.checked_mul(per);
        }
    } else if let Some(c) = CAP_RE.captures(&lower) {
        specs.capacity_gb = parse_u32(&c[1]);
    }

    // 4. Explicit DDR<n>-<speed> token.
    if let Some(c) = SPEED_RE.captures(&lower) {
        specs.speed_mhz = parse_u32(&c[1]);
    }

    // 5. Vendor SKU decoding; fills only fields still missing.
    decode_vendor_sku(&compact, &mut specs);

    // SKU-only names often imply the generation in the model code.
    if specs.ddr.is_none()
        && ["gx5", "ddr5", "tmxs", "veb5"].iter().any(|t| compact.contains(t))
    {
        specs.ddr = Some(5);
    }

    specs
}

fn decode_vendor_sku(compact: &str, specs: &mut RamSpecs) {
    let mut sku = RamSpecs::default();

    if let Some(c) = CORSAIR_RE.captures(compact) {
        sku.capacity_gb = parse_u32(&c[1]);
        sku.ddr = parse_u32(&c[2]);
        sku.speed_mhz = parse_u32(&c[3]);
    } else if let Some(c) = VCOLOR_RE.captures(compact) {
        let per_stick = parse_u32(&c[1]).unwrap_or(0);
        // Speed segment looks like 648/603 etc; first two digits map to MT/s.
        let speed_guess = parse_u32(&c[2][..2]).unwrap_or(0) * 100;
        if matches!(per_stick, 8 | 16 | 24 | 32 | 48 | 64) {
            sku.capacity_gb = Some(per_stick * 2);
        }
        if (4800..=9000).contains(&speed_guess) {
            sku.speed_mhz = Some(speed_guess);
        }
        sku.ddr = Some(5);
    } else if let Some(c) = PATRIOT_RE.captures(compact) {
        sku.capacity_gb = parse_u32(&c[1]);
        sku.speed_mhz = parse_u32(&c[2]).map(|s| s * 100);
        sku.ddr = Some(5);
    }

    specs.fill_missing(&sku);
}
