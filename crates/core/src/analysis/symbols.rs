//! Symbol-table statistics from `nm`/`readelf` listings.

use crate::analysis::entropy::EntropyStrategy;
use crate::model::SymbolAnalysisMetrics;

/// A binary is considered to ship symbols when it has more than this many.
pub const SYMBOLS_PRESENT_THRESHOLD: u64 = 10;
const DEBUG_SECTION_MARKER: &str = ".debug";

/// Raw listings consumed by [`analyze`]. Missing tools yield empty strings.
#[derive(Debug, Clone, Copy, Default)]
pub struct SymbolListings<'a> {
    /// `nm -C` output.
    pub symbols: &'a str,
    /// `nm -D` output.
    pub dynamic_symbols: &'a str,
    /// `readelf -S` output.
    pub section_headers: &'a str,
}

pub fn analyze(listings: &SymbolListings<'_>, strategy: EntropyStrategy) -> SymbolAnalysisMetrics {
    let symbols: Vec<&str> = non_blank_lines(listings.symbols).collect();
    let num_symbols = symbols.len() as u64;
    let num_dynamic = non_blank_lines(listings.dynamic_symbols).count() as u64;
    let num_debug = listings.section_headers.matches(DEBUG_SECTION_MARKER).count() as u64;

    // `nm` lines are `addr type name`; undefined symbols lack the address and are skipped.
    let names: String = symbols
        .iter()
        .filter_map(|line| {
            let parts: Vec<&str> = line.split_whitespace().collect();
            (parts.len() >= 3).then(|| parts[parts.len() - 1])
        })
        .collect();

    SymbolAnalysisMetrics {
        symbols_present: num_symbols > SYMBOLS_PRESENT_THRESHOLD,
        num_symbols,
        num_debug_symbols: num_debug,
        num_dynamic_symbols: num_dynamic,
        symbol_name_entropy: strategy.entropy(&names),
    }
}

fn non_blank_lines(text: &str) -> impl Iterator<Item = &str> {
    text.split('\n').filter(|l| !l.trim().is_empty())
}
