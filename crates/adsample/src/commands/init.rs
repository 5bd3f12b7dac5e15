use std::path::PathBuf;
use std::{env, fs};

use clap::Parser;

use crate::prelude::*;
use crate::termlist::MatchMode;
use crate::topics::DEFAULT_SHARE;

/// Initialize a new or re-initialize an existing sampling project.
///
/// The created config enables the constraints used for the ICT
/// samples: German ads published since 2001 with a text length between
/// 200 and 2500 characters.
#[derive(Debug, Parser)]
pub(crate) struct Init {
    /// The name of the sample.
    #[arg(short, long, default_value = "sample-0")]
    name: String,

    /// The ICT term list used by the `keywords` command.
    #[arg(long, value_name = "filename")]
    terms: Option<PathBuf>,

    /// The topic assignments used by the `topics` command.
    #[arg(long, value_name = "filename")]
    assignments: Option<PathBuf>,

    /// Whether to overwrite config with default values or not.
    #[arg(short, long)]
    force: bool,

    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// The location of the project.
    #[arg(default_value = ".")]
    path: PathBuf,
}

impl Init {
    pub(crate) fn execute(self) -> AdsampleResult<()> {
        let root_dir = env::current_dir()?.join(&self.path);
        let path = root_dir.join(Config::FILENAME);

        if !root_dir.exists() {
            fs::create_dir_all(&root_dir)?;
        }

        if path.exists() && !self.force {
            if !self.quiet {
                eprintln!(
                    "Config {} already exists (use `--force` to \
                        overwrite it).",
                    path.display()
                );
            }

            return Ok(());
        }

        let mut config = Config::create(&path);
        config.sample.name = Some(self.name);
        config.sample.lang = Some("de".into());
        config.sample.min_year = Some(2001);
        config.sample.min_len = Some(200);
        config.sample.max_len = Some(2500);
        config.sample.ledger = Some("ids_sampled_ads.txt".into());
        config.keywords.terms = self.terms;
        config.keywords.ignore_case = Some(false);
        config.keywords.mode = Some(MatchMode::Word);
        config.topics.assignments = self.assignments;
        config.topics.share = Some(DEFAULT_SHARE);
        config.save()?;

        if self.verbose {
            eprintln!("Initialized sampling project in {}", root_dir.display());
        }

        Ok(())
    }
}
