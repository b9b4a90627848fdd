//! Symbol normalisation and reference base prices.

use std::collections::HashMap;

use crate::error::CoreError;

/// Maximum accepted symbol length after trimming.
pub const MAX_SYMBOL_LEN: usize = 32;

/// Normalise a client supplied symbol.
///
/// Symbols are trimmed and upper-cased; the result must be 1 to
/// [`MAX_SYMBOL_LEN`] characters drawn from `A-Z 0-9 space & . _ -`.
///
/// # Examples
/// ```
/// use feed_core::normalize_symbol;
///
/// assert_eq!(normalize_symbol("  nifty 50 ").unwrap(), "NIFTY 50");
/// assert!(normalize_symbol("").is_err());
/// assert!(normalize_symbol("<script>").is_err());
/// ```
pub fn normalize_symbol(raw: &str) -> Result<String, CoreError> {
    let symbol = raw.trim().to_ascii_uppercase();
    let valid = !symbol.is_empty()
        && symbol.len() <= MAX_SYMBOL_LEN
        && symbol
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ' ' | '&' | '.' | '_' | '-'));

    if valid {
        Ok(symbol)
    } else {
        Err(CoreError::InvalidSymbol(raw.to_string()))
    }
}

/// Base (reference) prices for known symbols.
///
/// Unknown but well-formed symbols receive a stable pseudo-random base
/// in `[100, 5000)` so that every process agrees on it.
#[derive(Debug, Clone)]
pub struct SymbolDirectory {
    bases: HashMap<String, f64>,
}

impl SymbolDirectory {
    /// Create an empty directory
    pub fn empty() -> Self {
        Self {
            bases: HashMap::new(),
        }
    }

    /// Add or replace a base price
    pub fn with_base(mut self, symbol: &str, base: f64) -> Self {
        if let Ok(symbol) = normalize_symbol(symbol) {
            if base.is_finite() && base > 0.0 {
                self.bases.insert(symbol, base);
            }
        }
        self
    }

    /// Base price for a normalised symbol.
    pub fn base_price(&self, symbol: &str) -> f64 {
        self.bases
            .get(symbol)
            .copied()
            .unwrap_or_else(|| derived_base(symbol))
    }

    /// Whether the symbol has an explicit base price
    pub fn is_known(&self, symbol: &str) -> bool {
        self.bases.contains_key(symbol)
    }

    /// Known symbols, sorted
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = self.bases.keys().cloned().collect();
        symbols.sort();
        symbols
    }
}

impl Default for SymbolDirectory {
    fn default() -> Self {
        Self::empty()
            .with_base("NIFTY 50", 22_000.0)
            .with_base("SENSEX", 73_000.0)
            .with_base("BANKNIFTY", 47_000.0)
            .with_base("RELIANCE", 2_900.0)
            .with_base("TCS", 3_900.0)
            .with_base("HDFCBANK", 1_500.0)
            .with_base("INFY", 1_600.0)
            .with_base("ICICIBANK", 1_100.0)
            .with_base("SBIN", 780.0)
            .with_base("ITC", 430.0)
    }
}

/// FNV-1a hash of `symbol`, stable across builds and platforms.
pub fn symbol_hash(symbol: &str) -> u64 {
    symbol.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(0x0100_0000_01b3)
    })
}

fn derived_base(symbol: &str) -> f64 {
    100.0 + (symbol_hash(symbol) % 490_000) as f64 / 100.0
}
