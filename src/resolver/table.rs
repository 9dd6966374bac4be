// src/resolver/table.rs
use super::{
    normalize::{normalize_name, token_score, tokens},
    CountryResolver,
};
use anyhow::{bail, Context, Result};
use csv::ReaderBuilder;
use std::{
    collections::{HashMap, HashSet},
    fs::File,
    io::Read,
    path::Path,
};
use tracing::{debug, trace};

/// Reference table compiled into the binary: ISO short names plus common aliases.
static BUILTIN_TABLE: &str = include_str!("../../data/countries.csv");

pub const DEFAULT_MIN_SCORE: f64 = 0.8;

#[derive(Debug, Clone)]
struct Entry {
    key: String,
    tokens: HashSet<String>,
    iso2: String,
}

/// Resolves country names against a `name,iso2` reference table.
///
/// Lookups try, in order: an exact match on the normalized name, the name
/// itself as a known two-letter code, then the entry sharing the most words
/// with the name (only if the overlap reaches `min_score`).
#[derive(Debug, Clone)]
pub struct TableResolver {
    /// In load order; the fuzzy pass keeps the first best match.
    entries: Vec<Entry>,
    index: HashMap<String, usize>,
    min_score: f64,
}

impl Default for TableResolver {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl TableResolver {
    /// The table shipped in `data/countries.csv`.
    pub fn builtin() -> Result<Self> {
        Self::from_reader(BUILTIN_TABLE.as_bytes()).context("built-in country table is invalid")
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut table = Self::default();
        table.extend_from_reader(reader)?;
        Ok(table)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .with_context(|| format!("Failed to open reference table: {:?}", path.as_ref()))?;
        Self::from_reader(file)
            .with_context(|| format!("Failed to load reference table: {:?}", path.as_ref()))
    }

    /// Layer the `name,iso2` rows of `reader` over this table. Later rows win.
    pub fn extend_from_reader<R: Read>(&mut self, reader: R) -> Result<()> {
        let mut rdr = ReaderBuilder::new().has_headers(true).from_reader(reader);
        let before = self.entries.len();

        for result in rdr.records() {
            let record = result.context("reference table parse error")?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();
            let name = record.get(0).unwrap_or_default();
            let code = record.get(1).unwrap_or_default();
            self.insert(name, code)
                .with_context(|| format!("invalid reference entry on line {}", line))?;
        }

        debug!(
            added = self.entries.len() - before,
            total = self.entries.len(),
            "loaded reference table"
        );
        Ok(())
    }

    pub fn with_alias(mut self, name: &str, code: &str) -> Result<Self> {
        self.insert(name, code)
            .with_context(|| format!("invalid alias {:?}", name))?;
        Ok(self)
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, name: &str, code: &str) -> Result<()> {
        let iso2 = code.trim().to_ascii_uppercase();
        if iso2.len() != 2 || !iso2.bytes().all(|b| b.is_ascii_alphabetic()) {
            bail!("{:?} is not a two-letter country code", code);
        }
        let key = normalize_name(name);
        if key.is_empty() {
            bail!("country name {:?} is empty after normalization", name);
        }

        match self.index.get(&key) {
            Some(&i) => self.entries[i].iso2 = iso2,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(Entry {
                    tokens: tokens(&key),
                    key,
                    iso2,
                });
            }
        }
        Ok(())
    }

    fn known_code(&self, name: &str) -> Option<String> {
        // only already-uppercase codes, so words like "No" or "In" stay names
        let code = name.trim();
        if code.len() != 2 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
            return None;
        }
        self.entries
            .iter()
            .any(|e| e.iso2 == code)
            .then(|| code.to_string())
    }

    fn closest(&self, key: &str) -> Option<&Entry> {
        if self.min_score > 1.0 {
            return None;
        }
        let query = tokens(key);
        let mut best: Option<(&Entry, f64)> = None;
        for entry in &self.entries {
            let score = token_score(&query, &entry.tokens);
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((entry, score));
            }
        }
        let (entry, score) = best.filter(|&(_, s)| s >= self.min_score)?;
        trace!(query = key, matched = %entry.key, score, "fuzzy match");
        Some(entry)
    }
}

impl CountryResolver for TableResolver {
    fn resolve(&self, name: &str) -> Result<Option<String>> {
        let key = normalize_name(name);
        if key.is_empty() {
            return Ok(None);
        }
        if let Some(&i) = self.index.get(&key) {
            return Ok(Some(self.entries[i].iso2.clone()));
        }
        if let Some(code) = self.known_code(name) {
            return Ok(Some(code));
        }
        Ok(self.closest(&key).map(|e| e.iso2.clone()))
    }
}
