// src/augment/mod.rs
pub mod rows;

use crate::resolver::CountryResolver;
use anyhow::{bail, Context, Result};
use csv::{ReaderBuilder, WriterBuilder};
use std::{
    fs::File,
    io::{BufWriter, Read, Write},
    path::Path,
    time::Instant,
};
use tracing::{debug, info, warn};

/// Label of the column appended to every table.
pub const ISO2_COLUMN: &str = "country_iso2";

/// What happened during one augmentation run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AugmentReport {
    /// Data rows written (header excluded).
    pub rows: usize,
    pub resolved: usize,
    /// Rows whose country field was empty, so no lookup was made.
    pub skipped_empty: usize,
    /// Cleaned country names the resolver had no code for, in input order.
    pub unresolved: Vec<String>,
}

/// Trim whitespace, then every leading and trailing `"`.
pub fn clean_country(raw: &str) -> &str {
    raw.trim().trim_matches('"')
}

/// Copy `input` to `output` with a trailing `country_iso2` column.
///
/// The first record is the header and gets the column label. Every following
/// record keeps its fields verbatim and gains the code `resolver` returns for
/// its first field, or an empty string when the field is empty or unresolved.
/// Rows are written one at a time in input order.
///
/// Resolver errors and malformed input abort the run.
pub fn augment<R, W, C>(mut input: R, output: W, resolver: &C) -> Result<AugmentReport>
where
    R: Read,
    W: Write,
    C: CountryResolver + ?Sized,
{
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .context("Failed to read CSV input")?;
    let data = rows::preserve_blank_rows(&raw)?;

    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(&data[..]);
    let mut wtr = WriterBuilder::new().flexible(true).from_writer(output);

    let mut records = rdr.records();
    let mut header = match records.next() {
        Some(result) => result.context("CSV parse error in header row")?,
        None => bail!("CSV input is empty: a header row is required"),
    };
    header.push_field(ISO2_COLUMN);
    wtr.write_record(&header)
        .context("Failed to write header row")?;

    let mut report = AugmentReport::default();
    for (idx, result) in records.enumerate() {
        // record 0 is the header
        let mut record =
            result.with_context(|| format!("CSV parse error at record {}", idx + 1))?;

        let country = clean_country(record.get(0).unwrap_or(""));
        let iso2 = if country.is_empty() {
            report.skipped_empty += 1;
            String::new()
        } else {
            let found = resolver
                .resolve(country)
                .with_context(|| format!("Country lookup failed for {:?}", country))?;
            match found {
                Some(code) if !code.is_empty() => {
                    debug!(country, iso2 = %code, "resolved");
                    report.resolved += 1;
                    code
                }
                _ => {
                    warn!(country, "LookupError: {}", country);
                    report.unresolved.push(country.to_string());
                    String::new()
                }
            }
        };

        record.push_field(&iso2);
        wtr.write_record(&record)
            .with_context(|| format!("Failed to write record {}", idx + 1))?;
        report.rows += 1;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(report)
}

/// Augment the CSV file at `input` into a new file at `output`.
///
/// Both files are closed when this returns, on success or failure. Rows
/// written before a failure stay in `output`.
#[tracing::instrument(
    level = "info",
    skip(input, output, resolver),
    fields(input = %input.as_ref().display(), output = %output.as_ref().display())
)]
pub fn augment_files<P, Q, C>(input: P, output: Q, resolver: &C) -> Result<AugmentReport>
where
    P: AsRef<Path>,
    Q: AsRef<Path>,
    C: CountryResolver + ?Sized,
{
    let start = Instant::now();

    let src = File::open(&input)
        .with_context(|| format!("Failed to open input file: {:?}", input.as_ref()))?;
    let dst = File::create(&output)
        .with_context(|| format!("Failed to create output file: {:?}", output.as_ref()))?;

    let report = augment(src, BufWriter::new(dst), resolver)?;

    info!(
        rows = report.rows,
        resolved = report.resolved,
        unresolved = report.unresolved.len(),
        skipped_empty = report.skipped_empty,
        elapsed = ?start.elapsed(),
        "augmented"
    );
    Ok(report)
}
