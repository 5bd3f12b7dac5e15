use std::io::Write;
use std::path::PathBuf;

use clap::Parser;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::de::IgnoredAny;

use crate::io::{create, open, LineBatches, BATCH_SIZE};
use crate::prelude::*;

const PBAR_WRITE: &str = "Writing records: {human_pos} ({percent}%) | \
        elapsed: {elapsed_precise}{msg}";

/// Shuffle the records of a JSON-lines file.
#[derive(Debug, Parser)]
pub(crate) struct Shuffle {
    /// Run verbosely. Print additional progress information to the
    /// standard error stream. This option conflicts with the
    /// `--quiet` option.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Operate quietly; do not show progress. This option conflicts
    /// with the `--verbose` option.
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Seed of the random number generator. Runs with the same seed
    /// and input produce the same order.
    #[arg(long, value_name = "n")]
    seed: Option<u64>,

    /// Write output to `filename` instead of `stdout`.
    #[arg(short, long, value_name = "filename")]
    output: Option<PathBuf>,

    /// The file to shuffle. Use `-` to read from `stdin`.
    #[arg(default_value = "-")]
    input: PathBuf,
}

/// Shuffles `lines` in place.
fn shuffle(lines: &mut [Vec<u8>], seed: Option<u64>) {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    };

    lines.shuffle(&mut rng);
}

impl Shuffle {
    pub(crate) fn execute(self) -> AdsampleResult<()> {
        let mut lines = vec![];
        let mut skipped = 0;

        for batch in LineBatches::new(open(&self.input)?, BATCH_SIZE) {
            for line in batch? {
                if serde_json::from_slice::<IgnoredAny>(&line).is_ok() {
                    lines.push(line);
                } else {
                    skipped += 1;
                }
            }
        }

        if skipped > 0 {
            log::warn!("skipped {skipped} malformed record(s)");
        }

        shuffle(&mut lines, self.seed);

        let pbar = ProgressBarBuilder::new(PBAR_WRITE, self.quiet)
            .len(lines.len() as u64)
            .build();

        let mut out = create(self.output.as_deref(), false)?;
        for line in lines.iter() {
            out.write_all(line)?;
            out.write_all(b"\n")?;
            pbar.inc(1);
        }

        out.flush()?;
        pbar.finish_and_clear();

        if self.verbose {
            eprintln!("Shuffled {} record(s).", lines.len());
        }

        Ok(())
    }
}
