use anyhow::Result;
use iso2ify::{augment_files, Config};
use std::env;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    info!("startup");

    // ─── 2) load config ──────────────────────────────────────────────
    let config = Config::load(env::args().skip(1))?;
    info!(
        input = %config.input.display(),
        output = %config.output.display(),
        "configured"
    );

    // ─── 3) build resolver ───────────────────────────────────────────
    let resolver = config.build_resolver()?;
    info!(entries = resolver.len(), "reference table ready");

    // ─── 4) augment ──────────────────────────────────────────────────
    let report = augment_files(&config.input, &config.output, &resolver)?;
    if !report.unresolved.is_empty() {
        warn!(
            count = report.unresolved.len(),
            "rows written without a country code"
        );
    }

    info!("all done");
    Ok(())
}
