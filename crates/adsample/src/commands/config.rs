use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use toml::{Table, Value};

use crate::prelude::*;

const KEYS: &[&str] = &[
    "runtime.num_jobs",
    "sample.name",
    "sample.lang",
    "sample.min_year",
    "sample.min_len",
    "sample.max_len",
    "sample.ledger",
    "keywords.terms",
    "keywords.ignore_case",
    "keywords.mode",
    "topics.assignments",
    "topics.share",
];

/// Get and set config options.
#[derive(Debug, Parser)]
pub(crate) struct Config {
    /// Get the value for the given key.
    #[arg(long, conflicts_with_all = ["value", "unset", "set"])]
    get: bool,

    /// Remove the key from the config.
    #[arg(long, conflicts_with_all = ["value", "get", "set"])]
    unset: bool,

    /// Set the value for the given key.
    #[arg(long, requires = "value", conflicts_with_all = ["get", "unset"])]
    set: bool,

    /// The name of the config option.
    name: String,

    /// The (new) value of the config option.
    #[arg(conflicts_with_all = ["get", "unset"])]
    value: Option<String>,
}

/// Parses a raw value as TOML; anything that isn't a valid TOML value
/// (e.g. `de` or `terms.txt`) is taken as a string.
fn parse_value(raw: &str) -> Value {
    format!("value = {raw}")
        .parse::<Table>()
        .ok()
        .and_then(|mut table| table.remove("value"))
        .unwrap_or_else(|| Value::String(raw.into()))
}

fn locate(path: Option<&Path>) -> AdsampleResult<PathBuf> {
    if let Some(path) = path {
        return Ok(path.into());
    }

    match crate::config::Config::discover()? {
        Some(config) => Ok(config.path().into()),
        None => bail!(
            "no {} found in the current directory or any parent \
                directory (run `adsample init` first)",
            crate::config::Config::FILENAME
        ),
    }
}

impl Config {
    pub(crate) fn execute(self, path: Option<&Path>) -> AdsampleResult<()> {
        let path = locate(path)?;
        let mut table: Table = fs::read_to_string(&path)?.parse()?;

        let name = self.name.as_str();
        if !KEYS.contains(&name) {
            bail!("unknown config option `{name}`");
        }

        let (section, key) = name.split_once('.').unwrap_or(("", name));

        if let Some(value) = self.value {
            let value = parse_value(&value);
            let entry = table
                .entry(section)
                .or_insert_with(|| Value::Table(Table::new()));

            match entry.as_table_mut() {
                Some(section) => {
                    section.insert(key.into(), value.clone());
                }
                None => bail!("invalid config: `{section}` is not a table"),
            }

            if Value::Table(table.clone())
                .try_into::<crate::config::Config>()
                .is_err()
            {
                bail!("invalid value `{value}` for `{name}`");
            }

            fs::write(&path, toml::to_string(&table)?)?;
        } else if self.unset {
            if let Some(section) =
                table.get_mut(section).and_then(Value::as_table_mut)
            {
                section.remove(key);
                fs::write(&path, toml::to_string(&table)?)?;
            }
        } else {
            let value = table
                .get(section)
                .and_then(|section| section.get(key))
                .map(ToString::to_string)
                .unwrap_or("None".into());

            println!("{name} = {value}");
        }

        Ok(())
    }
}
