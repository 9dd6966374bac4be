use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static PARENTHESIZED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\([^)]*\)").expect("parenthesized-text regex is valid"));

/// Reduce a country name to its lookup key.
///
/// Lowercases, drops `(...)` asides, spells `&` as `and`, removes `.` and
/// apostrophes, treats `,` `-` `/` `_` as word breaks, collapses whitespace
/// and drops a leading "the".
pub fn normalize_name(raw: &str) -> String {
    let lower = raw.to_lowercase();
    let bare = PARENTHESIZED.replace_all(&lower, " ");

    let mut spaced = String::with_capacity(bare.len());
    for ch in bare.chars() {
        match ch {
            '&' => spaced.push_str(" and "),
            '.' | '\'' | '\u{2019}' => {}
            ',' | '-' | '/' | '_' => spaced.push(' '),
            c => spaced.push(c),
        }
    }

    let key = spaced.split_whitespace().collect::<Vec<_>>().join(" ");
    match key.strip_prefix("the ") {
        Some(rest) => rest.to_string(),
        None => key,
    }
}

/// Words of an already-normalized key.
pub fn tokens(key: &str) -> HashSet<String> {
    key.split(' ')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Shared tokens over the larger token count, in `0.0..=1.0`.
pub fn token_score(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let larger = a.len().max(b.len());
    if larger == 0 {
        return 0.0;
    }
    let hit = a.intersection(b).count();
    hit as f64 / larger as f64
}
