// Free-text normalization: price strings and display names.
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PRICE_RE: Regex = Regex::new(r"(\d+(?:\.\d+)?)").unwrap();
    static ref CPU_SKU_TAIL_RE: Regex = Regex::new(r"\s+\d{3}-\d{9,}\w*$").unwrap();
    static ref RAM_DESKTOP_CUT_RE: Regex =
        Regex::new(r"(?i)\s+Desktop\s+(?:Memory|Upgrade)\b").unwrap();
    static ref RAM_GAMING_CUT_RE: Regex = Regex::new(r"(?i)\s+Gaming\s+Desktop\b").unwrap();
    static ref RAM_PIN_RE: Regex = Regex::new(r"\s*288-Pin\s+PC\s*(?:RAM)?\s*").unwrap();
    static ref RAM_PC_BANDWIDTH_RE: Regex = Regex::new(r"\s*\(PC\d\s+\d+\)").unwrap();
    static ref RAM_MODEL_TAIL_RE: Regex =
        Regex::new(r"\s+(?:Model\s+)?[A-Z0-9]{10,}\w*$").unwrap();
    static ref RAM_CL_TAIL_RE: Regex = Regex::new(r"(?i)(\d{4,5}\s*MHz)\s+CL\d.*$").unwrap();
    static ref RAM_PLATFORM_TAIL_RE: Regex =
        Regex::new(r"(?i),?\s+for\s+(?:AMD|Intel)\b.*$").unwrap();
    static ref RAM_SERIES_TAIL_RE: Regex = Regex::new(r"\s+Series\s*$").unwrap();
    static ref MB_WITH_FEATURES_RE: Regex = Regex::new(r"\s+with\s+\d").unwrap();
    static ref MB_GENERIC_TAIL_RE: Regex = Regex::new(
        r"\s+(?:(?:Micro[- ]?|Extended\s+|E-)?ATX\s+)?(?:[Mm]otherboard|[Mm]ainboard)\s*$",
    )
    .unwrap();
    static ref MB_SOCKET_TAIL_RE: Regex =
        Regex::new(r"(?i)\s+(?:AMD\s+)?(?:AM\d|LGA\s*\d{4})\s*$").unwrap();
    static ref MB_CHIPSET_TAIL_RE: Regex =
        Regex::new(r"(?i)\s+AMD\s+(?:X\d{3}\w?|B\d{3}\w?)\s*$").unwrap();
    static ref MB_FORM_TAIL_RE: Regex =
        Regex::new(r"(?i)\s+(?:E-|Extended\s*|Micro[- ]?)?ATX\s*$").unwrap();
    static ref MB_ULTRA_CORE_TAIL_RE: Regex =
        Regex::new(r"(?i)\s+Ultra\s+Core\s*(?:\(Series\s*\d\))?\s*$").unwrap();
    static ref MB_SERIES_PAREN_TAIL_RE: Regex =
        Regex::new(r"(?i)\s*\(Series\s*\d\)\s*$").unwrap();
    static ref MB_RYZEN_FAMILY_TAIL_RE: Regex =
        Regex::new(r"(?i)\s+AMD\s+RYZEN\s+\d{4}\s*$").unwrap();
}

/// Extract a numeric price from text like "$449.99" or "$1,249.99".
///
/// Returns 0.0 on empty or unparseable input; never panics.
pub fn parse_price(text: &str) -> f64 {
    if text.is_empty() {
        return 0.0;
    }
    let cleaned = text.replace(',', "");
    PRICE_RE
        .find(&cleaned)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .unwrap_or(0.0)
}

/// Shorten a CPU name to its model identifier.
///
/// "AMD Ryzen 7 9850X3D - Ryzen 7 9000 Series 8-Core ..." → "AMD Ryzen 7 9850X3D"
pub fn shorten_cpu(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    // Newegg full titles delimit the model from marketing text with " - "
    let short = name.split(" - ").next().unwrap_or(name).trim();
    CPU_SKU_TAIL_RE.replace(short, "").trim().to_string()
}

/// Shorten a RAM name to brand + capacity + DDR speed, dropping pin counts,
/// bandwidth notation, SKU tails and platform suffixes.
pub fn shorten_ram(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let mut short = match RAM_DESKTOP_CUT_RE.find(name) {
        Some(m) => name[..m.start()].to_string(),
        None => name.to_string(),
    };
    if let Some(m) = RAM_GAMING_CUT_RE.find(&short) {
        short.truncate(m.start());
    }
    short = RAM_PIN_RE.replace_all(&short, " ").to_string();
    short = RAM_PC_BANDWIDTH_RE.replace_all(&short, "").to_string();
    short = RAM_MODEL_TAIL_RE.replace(&short, "").to_string();
    short = RAM_CL_TAIL_RE.replace(&short, "$1").to_string();
    short = RAM_PLATFORM_TAIL_RE.replace(&short, "").to_string();
    short = RAM_SERIES_TAIL_RE.replace(&short, "").to_string();
    short.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Shorten a motherboard name to brand + model, stripping feature lists,
/// socket/platform/form-factor suffixes and retailer branding.
pub fn shorten_motherboard(name: &str) -> String {
    if name.is_empty() {
        return String::new();
    }
    let mut short = name.split(',').next().unwrap_or(name).trim().to_string();
    if let Some(m) = MB_WITH_FEATURES_RE.find(&short) {
        short.truncate(m.start());
    }
    short = MB_GENERIC_TAIL_RE.replace(&short, "").to_string();
    // Suffix noise stacks ("... AMD AM5 LGA 1718 ATX"); a few passes peel it off.
    for _ in 0..4 {
        short = MB_SOCKET_TAIL_RE.replace(&short, "").to_string();
        short = MB_CHIPSET_TAIL_RE.replace(&short, "").to_string();
        short = MB_FORM_TAIL_RE.replace(&short, "").to_string();
        short = MB_ULTRA_CORE_TAIL_RE.replace(&short, "").to_string();
        short = MB_SERIES_PAREN_TAIL_RE.replace(&short, "").to_string();
        short = MB_RYZEN_FAMILY_TAIL_RE.replace(&short, "").to_string();
    }
    short.trim().to_string()
}
