// src/config.rs
use crate::resolver::{table::DEFAULT_MIN_SCORE, TableResolver};
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::{collections::BTreeMap, env, fs, path::Path, path::PathBuf};
use tracing::info;

/// Names a YAML config file to start from.
pub const CONFIG_ENV: &str = "ISO2IFY_CONFIG";
pub const INPUT_ENV: &str = "ISO2IFY_INPUT";
pub const OUTPUT_ENV: &str = "ISO2IFY_OUTPUT";

/// Everything a run needs to know.
///
/// ```yaml
/// input: businesses.csv
/// output: businesses_with_iso2.csv
/// reference: extra_countries.csv   # name,iso2 rows layered over the built-in table
/// aliases:
///   Blighty: GB
/// min_score: 0.8
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub input: PathBuf,
    pub output: PathBuf,
    pub reference: Option<PathBuf>,
    pub aliases: BTreeMap<String, String>,
    pub min_score: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: PathBuf::from("businesses.csv"),
            output: PathBuf::from("businesses_with_iso2.csv"),
            reference: None,
            aliases: BTreeMap::new(),
            min_score: DEFAULT_MIN_SCORE,
        }
    }
}

impl Config {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("invalid config YAML")
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        Self::from_yaml_str(&text)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))
    }

    /// Defaults, or the file named by `ISO2IFY_CONFIG`, then env overrides,
    /// then positional `[INPUT] [OUTPUT]` arguments (program name excluded).
    pub fn load<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => {
                info!(path = %path, "loading config file");
                Self::from_file(path)?
            }
            Err(_) => Self::default(),
        };
        config.apply_env(|key| env::var(key).ok());
        config.apply_args(args)?;
        Ok(config)
    }

    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(input) = lookup(INPUT_ENV).filter(|v| !v.is_empty()) {
            self.input = PathBuf::from(input);
        }
        if let Some(output) = lookup(OUTPUT_ENV).filter(|v| !v.is_empty()) {
            self.output = PathBuf::from(output);
        }
    }

    pub fn apply_args<I>(&mut self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();
        if args.len() > 2 {
            bail!("usage: iso2ify [INPUT] [OUTPUT] (got {} arguments)", args.len());
        }
        let mut args = args.into_iter();
        if let Some(input) = args.next() {
            self.input = PathBuf::from(input);
        }
        if let Some(output) = args.next() {
            self.output = PathBuf::from(output);
        }
        Ok(())
    }

    /// Built-in table, then `reference`, then `aliases`.
    pub fn build_resolver(&self) -> Result<TableResolver> {
        let mut resolver = TableResolver::builtin()?;
        if let Some(path) = &self.reference {
            let file = fs::File::open(path)
                .with_context(|| format!("Failed to open reference table: {:?}", path))?;
            resolver
                .extend_from_reader(file)
                .with_context(|| format!("Failed to load reference table: {:?}", path))?;
        }
        for (name, code) in &self.aliases {
            resolver = resolver.with_alias(name, code)?;
        }
        Ok(resolver.with_min_score(self.min_score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::CountryResolver;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.input, PathBuf::from("businesses.csv"));
        assert_eq!(config.output, PathBuf::from("businesses_with_iso2.csv"));
        assert_eq!(config.reference, None);
        assert!(config.aliases.is_empty());
        assert_eq!(config.min_score, DEFAULT_MIN_SCORE);
    }

    #[test]
    fn test_from_yaml_str() -> Result<()> {
        let config = Config::from_yaml_str(
            "input: in.csv\nreference: extra.csv\naliases:\n  Blighty: GB\nmin_score: 0.9\n",
        )?;
        assert_eq!(config.input, PathBuf::from("in.csv"));
        assert_eq!(config.output, PathBuf::from("businesses_with_iso2.csv"));
        assert_eq!(config.reference, Some(PathBuf::from("extra.csv")));
        assert_eq!(config.aliases.get("Blighty").map(String::as_str), Some("GB"));
        assert_eq!(config.min_score, 0.9);
        Ok(())
    }

    #[test]
    fn test_unknown_key_is_rejected() {
        assert!(Config::from_yaml_str("inputs: in.csv\n").is_err());
    }

    #[test]
    fn test_from_file() -> Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "output: out.csv")?;
        let config = Config::from_file(file.path())?;
        assert_eq!(config.output, PathBuf::from("out.csv"));

        assert!(Config::from_file("/nonexistent/iso2ify.yaml").is_err());
        Ok(())
    }

    #[test]
    fn test_env_then_args_precedence() -> Result<()> {
        let vars: HashMap<&str, &str> = [(INPUT_ENV, "env_in.csv"), (OUTPUT_ENV, "env_out.csv")]
            .into_iter()
            .collect();
        let mut config = Config::default();
        config.apply_env(|key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(config.input, PathBuf::from("env_in.csv"));
        assert_eq!(config.output, PathBuf::from("env_out.csv"));

        config.apply_args(vec!["arg_in.csv".to_string()])?;
        assert_eq!(config.input, PathBuf::from("arg_in.csv"));
        assert_eq!(config.output, PathBuf::from("env_out.csv"));

        config.apply_env(|_| Some(String::new()));
        assert_eq!(config.input, PathBuf::from("arg_in.csv"));

        let too_many = ["a", "b", "c"].iter().map(|s| s.to_string());
        assert!(config.apply_args(too_many).is_err());
        Ok(())
    }

    #[test]
    fn test_build_resolver() -> Result<()> {
        let mut reference = NamedTempFile::new()?;
        writeln!(reference, "name,iso2\nHyrule,HY")?;

        let mut config = Config::default();
        config.reference = Some(reference.path().to_path_buf());
        config.aliases.insert("Blighty".into(), "gb".into());
        config.min_score = 1.5;

        let resolver = config.build_resolver()?;
        assert_eq!(resolver.resolve("Hyrule")?.as_deref(), Some("HY"));
        assert_eq!(resolver.resolve("Blighty")?.as_deref(), Some("GB"));
        assert_eq!(resolver.resolve("France")?.as_deref(), Some("FR"));
        assert_eq!(resolver.resolve("Korea South")?, None);
        Ok(())
    }

    #[test]
    fn test_build_resolver_bad_alias() {
        let mut config = Config::default();
        config.aliases.insert("Nowhere".into(), "N0".into());
        assert!(config.build_resolver().is_err());
    }
}
