use std::process;

use clap::Parser;
use cli::{Args, Command};
use env_logger::Env;
use error::AdsampleResult;
use jemallocator::Jemalloc;
use prelude::Config;
use rayon::ThreadPoolBuilder;

mod cli;
mod commands;
mod config;
mod error;
mod io;
mod ledger;
mod prelude;
mod progress;
mod record;
mod sampler;
mod termlist;
mod topics;

#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

fn num_threads(args: &Args) -> usize {
    if let Some(num_threads) = args.num_jobs {
        return num_threads;
    }

    if let Ok(config) = Config::load(args.config.as_deref()) {
        if let Some(runtime) = config.runtime {
            if let Some(num_threads) = runtime.num_jobs {
                return num_threads;
            }
        }
    }

    0
}

fn run(args: Args) -> AdsampleResult<()> {
    let config = || Config::load(args.config.as_deref());

    match args.cmd {
        Command::Completions(cmd) => cmd.execute(),
        Command::Config(cmd) => cmd.execute(args.config.as_deref()),
        Command::Init(cmd) => cmd.execute(),
        Command::Keywords(cmd) => cmd.execute(config()?),
        Command::Shuffle(cmd) => cmd.execute(),
        Command::Topics(cmd) => cmd.execute(config()?),
    }
}

fn main() {
    let args = Args::parse();

    env_logger::Builder::from_env(
        Env::default().filter_or("ADSAMPLE_LOG", "warn"),
    )
    .format_timestamp(None)
    .init();

    if let Err(e) = ThreadPoolBuilder::new()
        .num_threads(num_threads(&args))
        .build_global()
    {
        log::warn!("unable to configure thread pool: {e}");
    }

    match run(args) {
        Ok(()) => process::exit(0),
        Err(e) if e.is_broken_pipe() => process::exit(0),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(1);
        }
    }
}
