use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::*;

#[derive(Debug, Parser)]
#[command(version, about, long_about = None, max_term_width = 72)]
pub(crate) struct Args {
    /// Number of threads to use. If this options isn't set or a value
    /// of "0" is chosen, the maximum number of available threads
    /// is used.
    #[clap(
        short = 'j',
        long,
        env = "ADSAMPLE_NUM_JOBS",
        hide_env_values = true
    )]
    pub(crate) num_jobs: Option<usize>,

    /// Use the given config instead of searching `adsample.toml` in
    /// the current directory and its parents.
    #[arg(long, global = true, value_name = "filename")]
    pub(crate) config: Option<PathBuf>,

    #[command(subcommand)]
    pub(crate) cmd: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    Completions(Completions),
    Config(Config),
    Init(Init),
    #[clap(alias = "ict")]
    Keywords(Keywords),
    Shuffle(Shuffle),
    Topics(Topics),
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify_cli() {
        Args::command().debug_assert();
    }

    #[test]
    fn parse_keywords() {
        let args = Args::try_parse_from([
            "adsample",
            "-j",
            "2",
            "ict",
            "--terms",
            "terms.txt",
            "--max-total",
            "35",
            "ads.jsonl",
        ])
        .unwrap();

        assert_eq!(args.num_jobs, Some(2));
        assert!(matches!(args.cmd, Command::Keywords(_)));
    }

    #[test]
    fn parse_topics() {
        let args = Args::try_parse_from([
            "adsample",
            "topics",
            "--topic",
            "4,21",
            "--topic",
            "24",
            "ads.jsonl",
            "--config",
            "adsample.toml",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("adsample.toml")));
        assert!(matches!(args.cmd, Command::Topics(_)));
    }

    #[test]
    fn append_requires_output() {
        let result = Args::try_parse_from([
            "adsample", "keywords", "--append", "ads.jsonl",
        ]);
        assert!(result.is_err());
    }
}
