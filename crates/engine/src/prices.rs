//! Static region → fuel price table.
//!
//! Prices are per litre in INR. Regions that are not listed (including the
//! empty region) resolve to [`DEFAULT_PRICE`].

/// Price used for every region missing from [`REGION_PRICES`].
pub const DEFAULT_PRICE: f64 = 100.0;

/// Built-in regional prices.
pub const REGION_PRICES: &[(&str, f64)] = &[
    ("Andhra Pradesh", 109.46),
    ("Assam", 97.14),
    ("Bihar", 105.58),
    ("Chhattisgarh", 100.39),
    ("Delhi", 94.72),
    ("Goa", 96.52),
    ("Gujarat", 94.59),
    ("Haryana", 95.19),
    ("Himachal Pradesh", 95.42),
    ("Jharkhand", 97.81),
    ("Karnataka", 102.86),
    ("Kerala", 107.56),
    ("Madhya Pradesh", 106.47),
    ("Maharashtra", 104.21),
    ("Odisha", 101.06),
    ("Punjab", 96.65),
    ("Rajasthan", 104.88),
    ("Tamil Nadu", 100.75),
    ("Telangana", 107.41),
    ("Uttar Pradesh", 94.56),
    ("Uttarakhand", 93.45),
    ("West Bengal", 104.95),
];

/// Read-only price table with a default fallback.
#[derive(Clone, Copy, Debug)]
pub struct PriceTable {
    entries: &'static [(&'static str, f64)],
    default: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        Self::new(REGION_PRICES, DEFAULT_PRICE)
    }
}

impl PriceTable {
    pub const fn new(entries: &'static [(&'static str, f64)], default: f64) -> Self {
        Self { entries, default }
    }

    /// Price for `region`, or the default price when it is not listed.
    pub fn lookup(&self, region: &str) -> f64 {
        self.entries
            .iter()
            .find_map(|(name, price)| (*name == region).then_some(*price))
            .unwrap_or(self.default)
    }

    /// Returns `true` if `region` has its own entry.
    pub fn contains(&self, region: &str) -> bool {
        self.entries.iter().any(|(name, _)| *name == region)
    }

    pub fn regions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }

    pub fn default_price(&self) -> f64 {
        self.default
    }
}
