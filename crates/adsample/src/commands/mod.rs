pub(crate) use completions::Completions;
pub(crate) use config::Config;
pub(crate) use init::Init;
pub(crate) use keywords::Keywords;
pub(crate) use shuffle::Shuffle;
pub(crate) use topics::Topics;

mod completions;
mod config;
mod init;
mod keywords;
mod options;
mod shuffle;
mod topics;
