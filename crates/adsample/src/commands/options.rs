use std::io::Write;
use std::path::PathBuf;

use crate::io::create;
use crate::ledger::{IdList, Ledger};
use crate::prelude::*;
use crate::sampler::{Filters, Quota, Sampler, Selector, Summary};

/// Default name of a sample, if neither the command line nor the
/// config provide one.
const DEFAULT_SAMPLE_NAME: &str = "sample";

/// Options shared by all sampling commands.
///
/// Unless stated otherwise, options which aren't set on the command
/// line fall back to the `[sample]` section of the config.
#[derive(Debug, Default, clap::Args)]
pub(crate) struct SampleArgs {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    pub(crate) verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    pub(crate) quiet: bool,

    /// Ignore ads which are *not* explicitly listed in the given
    /// allow-list.
    #[arg(long = "allow-list", short = 'A', value_name = "filename")]
    pub(crate) allow_list: Option<PathBuf>,

    /// Ignore ads which are explicitly listed in the given deny-lists
    /// (e.g. the ledger of previous samples).
    #[arg(long = "deny-list", short = 'D', value_name = "filename")]
    pub(crate) deny_lists: Vec<PathBuf>,

    /// Keep only ads written in the given language (`meta.lang`).
    #[arg(long, value_name = "lang")]
    pub(crate) lang: Option<String>,

    /// Keep only ads published in or after the given year
    /// (`meta.year`).
    #[arg(long, value_name = "year")]
    pub(crate) min_year: Option<u16>,

    /// Ignore ads whose text is shorter than `n` characters.
    #[arg(long, value_name = "n")]
    pub(crate) min_len: Option<usize>,

    /// Ignore ads whose text is longer than `n` characters.
    #[arg(long, value_name = "n")]
    pub(crate) max_len: Option<usize>,

    /// Stop sampling after `n` ads.
    #[arg(long, value_name = "n")]
    pub(crate) max_total: Option<usize>,

    /// Sample at most `n` ads per year.
    #[arg(long, value_name = "n")]
    pub(crate) max_per_year: Option<usize>,

    /// Sample at most `n` ads per input file.
    #[arg(long, value_name = "n")]
    pub(crate) max_per_file: Option<usize>,

    /// Sample an ad id at most once.
    #[arg(long)]
    pub(crate) unique_ids: bool,

    /// The name of the sample, written to the ledger.
    #[arg(long, value_name = "name")]
    pub(crate) name: Option<String>,

    /// Append the ids of the sampled ads to `filename`.
    #[arg(long, value_name = "filename")]
    pub(crate) ledger: Option<PathBuf>,

    /// Append to the output file instead of truncating it.
    #[arg(long, short = 'a', requires = "output")]
    pub(crate) append: bool,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    pub(crate) output: Option<PathBuf>,

    /// Read job ads from these files (JSON-lines, optionally gzip or
    /// bzip2 compressed). Use `-` to read from `stdin`.
    #[arg(default_value = "-")]
    pub(crate) inputs: Vec<PathBuf>,
}

impl SampleArgs {
    pub(crate) fn filters(&self, config: &Config) -> AdsampleResult<Filters> {
        let sample = &config.sample;

        let allow = match self.allow_list {
            Some(ref path) => Some(IdList::from_path(path)?),
            None => None,
        };

        let deny = if self.deny_lists.is_empty() {
            None
        } else {
            let mut ids = Vec::new();
            for path in self.deny_lists.iter() {
                ids.push(IdList::from_path(path)?);
            }

            Some(ids.into_iter().flat_map(IdList::into_iter).collect())
        };

        Ok(Filters {
            allow,
            deny,
            lang: self.lang.clone().or(sample.lang.clone()),
            min_year: self.min_year.or(sample.min_year),
            min_len: self.min_len.or(sample.min_len),
            max_len: self.max_len.or(sample.max_len),
        })
    }

    pub(crate) fn quota(&self) -> Quota {
        Quota {
            max_total: self.max_total,
            max_per_year: self.max_per_year,
            max_per_file: self.max_per_file,
        }
    }

    pub(crate) fn ledger(
        &self,
        config: &Config,
    ) -> AdsampleResult<Option<Ledger>> {
        let path = match self.ledger {
            Some(ref path) => path.clone(),
            None => match config.sample.ledger {
                Some(ref path) => config.resolve(path),
                None => return Ok(None),
            },
        };

        Ok(Some(Ledger::open(path, &self.sample_name(config))?))
    }

    pub(crate) fn sample_name(&self, config: &Config) -> String {
        self.name
            .clone()
            .or(config.sample.name.clone())
            .unwrap_or(DEFAULT_SAMPLE_NAME.into())
    }

    /// Builds a [Sampler] for `selector` and runs it over all inputs.
    pub(crate) fn sample<S: Selector>(
        &self,
        selector: S,
        config: &Config,
    ) -> AdsampleResult<Summary> {
        let filters = self.filters(config)?;

        if self.verbose {
            if let Some(ref deny) = filters.deny {
                eprintln!("Ignoring {} denied ad id(s).", deny.len());
            }
        }

        let mut sampler = Sampler::new(selector)
            .filters(filters)
            .quota(self.quota())
            .unique_ids(self.unique_ids)
            .ledger(self.ledger(config)?)
            .quiet(self.quiet);

        let mut out: Box<dyn Write> =
            create(self.output.as_deref(), self.append)?;
        let summary = sampler.run(&self.inputs, &mut out)?;

        if self.verbose {
            eprintln!("{summary}");
        }

        Ok(summary)
    }
}
