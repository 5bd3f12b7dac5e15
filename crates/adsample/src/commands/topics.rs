use std::path::{Path, PathBuf};

use clap::Parser;
use hashbrown::HashMap;

use super::options::SampleArgs;
use crate::prelude::*;
use crate::record::JobAd;
use crate::sampler::{Selector, Summary};
use crate::topics::{TopicId, TopicMap, TopicSet, DEFAULT_SHARE};

/// Sample job ads by the topic assigned by a topic model.
#[derive(Debug, Parser)]
pub(crate) struct Topics {
    /// The topic assignments (JSON-lines, optionally compressed).
    /// Falls back to `topics.assignments` of the config.
    #[arg(long, value_name = "filename")]
    assignments: Option<PathBuf>,

    /// Topics to sample from. The option can be repeated or given a
    /// comma-separated list.
    #[arg(
        long = "topic",
        short = 't',
        value_delimiter = ',',
        value_name = "id",
        required_unless_present = "all_topics"
    )]
    topics: Vec<TopicId>,

    /// Sample from all topics `0..n`.
    #[arg(long, value_name = "n", conflicts_with = "topics")]
    all_topics: Option<TopicId>,

    /// A topic is assigned to an ad, if its share is greater than
    /// this value [default: 0.4].
    #[arg(long, value_name = "share")]
    share: Option<f64>,

    /// Sample at most `n` ads per topic.
    #[arg(long, value_name = "n")]
    per_topic: Option<usize>,

    #[command(flatten)]
    sample: SampleArgs,
}

struct TopicSelector {
    map: TopicMap,
    set: TopicSet,
    per_topic: Option<usize>,
    counts: HashMap<TopicId, usize>,
}

impl Selector for TopicSelector {
    type Hit = TopicId;

    fn evaluate(&self, ad: &JobAd) -> Option<Self::Hit> {
        self.map
            .topic(&ad.id)
            .filter(|topic| self.set.contains(*topic))
    }

    fn accept(
        &mut self,
        _ad: &JobAd,
        topic: Self::Hit,
        input: &Path,
    ) -> Option<Vec<String>> {
        let count = self.counts.entry(topic).or_default();
        if self.per_topic.is_some_and(|max| *count >= max) {
            return None;
        }

        *count += 1;
        Some(vec![topic.to_string(), input.display().to_string()])
    }

    fn is_exhausted(&self) -> bool {
        let Some(max) = self.per_topic else {
            return false;
        };

        self.counts.len() == self.set.len()
            && self.counts.values().all(|count| *count >= max)
    }
}

impl Topics {
    pub(crate) fn execute(self, config: Config) -> AdsampleResult<()> {
        self.run(&config).map(|_| ())
    }

    fn run(&self, config: &Config) -> AdsampleResult<Summary> {
        let path = match self.assignments {
            Some(ref path) => path.clone(),
            None => match config.topics.assignments {
                Some(ref path) => config.resolve(path),
                None => bail!(
                    "no topic assignments given (use `--assignments` \
                        or set `topics.assignments` in the config)"
                ),
            },
        };

        let set = match self.all_topics {
            Some(n) => TopicSet::range(n),
            None => TopicSet::from_iter(self.topics.iter().copied()),
        };

        if set.is_empty() {
            bail!("no topics to sample from");
        }

        let share = self.share.or(config.topics.share).unwrap_or(DEFAULT_SHARE);
        let map = TopicMap::from_path(&path, share)?;

        if self.sample.verbose {
            eprintln!(
                "Loaded topic assignments of {} ad(s) from {} \
                    (share > {share}, {} skipped).",
                map.len(),
                path.display(),
                map.skipped(),
            );
        }

        let selector = TopicSelector {
            map,
            set,
            per_topic: self.per_topic,
            counts: HashMap::new(),
        };

        self.sample.sample(selector, config)
    }
}
