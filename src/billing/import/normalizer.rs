/// Strip invisible characters spreadsheets smuggle in and collapse runs of
/// whitespace. Case is preserved; assignment matching is case-sensitive.
pub(crate) fn clean_name(value: &str) -> String {
    let cleaned = value.replace(['\u{feff}', '\u{200b}'], "");
    cleaned.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Lowercased variant used for alias-table lookups. Unicode-aware so
/// accented Spanish tags fold correctly.
pub(crate) fn fold_key(value: &str) -> String {
    clean_name(value).to_lowercase()
}

/// "Parse, else 0" money parsing: currency symbols, thousands separators and
/// stray whitespace are tolerated, and anything unparseable degrades to 0 so
/// a single malformed cell cannot block an import batch.
pub(crate) fn parse_amount(value: Option<&str>) -> f64 {
    let Some(raw) = value else {
        return 0.0;
    };

    let cleaned: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == '.' || *ch == '-')
        .collect();

    cleaned.parse::<f64>().unwrap_or(0.0)
}
