use std::io::BufRead;
use std::path::Path;

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;
use serde::Deserialize;

use crate::io::{open, LineBatches, BATCH_SIZE};
use crate::prelude::*;

pub(crate) type TopicId = u32;

/// Default share a topic must exceed to be assigned to an ad.
pub(crate) const DEFAULT_SHARE: f64 = 0.4;

#[derive(Debug, Deserialize)]
struct TopicShare {
    t: TopicId,
    p: f64,
}

/// A record of the topic model's assignment file.
#[derive(Debug, Deserialize)]
struct Assignment {
    id: String,
    topics: Vec<TopicShare>,
}

impl Assignment {
    /// Returns the first topic with a share strictly greater than
    /// `share`.
    fn assigned(&self, share: f64) -> Option<TopicId> {
        self.topics.iter().find(|topic| topic.p > share).map(|t| t.t)
    }
}

/// Maps ad ids to their assigned topic.
#[derive(Debug, Default)]
pub(crate) struct TopicMap {
    topics: HashMap<String, TopicId>,
    skipped: u64,
}

impl TopicMap {
    /// Reads topic assignments from a (compressed) JSON-lines file.
    pub(crate) fn from_path<P: AsRef<Path>>(
        path: P,
        share: f64,
    ) -> AdsampleResult<Self> {
        let path = path.as_ref();
        let map = Self::from_reader(open(path)?, share)?;
        if map.skipped > 0 {
            log::warn!(
                "skipped {} malformed topic assignment(s) in {}",
                map.skipped,
                path.display()
            );
        }

        Ok(map)
    }

    pub(crate) fn from_reader<R: BufRead>(
        reader: R,
        share: f64,
    ) -> AdsampleResult<Self> {
        if !(0.0..1.0).contains(&share) {
            bail!("invalid topic share {share} (expected 0 <= share < 1)");
        }

        let mut map = Self::default();

        for batch in LineBatches::new(reader, BATCH_SIZE) {
            let parsed: Vec<Option<Assignment>> = batch?
                .par_iter()
                .map(|line| serde_json::from_slice(line).ok())
                .collect();

            for assignment in parsed {
                let Some(assignment) = assignment else {
                    map.skipped += 1;
                    continue;
                };

                match assignment.assigned(share) {
                    Some(topic) => {
                        map.topics.insert(assignment.id, topic);
                    }
                    None => {
                        map.topics.remove(&assignment.id);
                    }
                }
            }
        }

        Ok(map)
    }

    /// Returns the topic assigned to the ad `id`.
    #[inline]
    pub(crate) fn topic(&self, id: &str) -> Option<TopicId> {
        self.topics.get(id).copied()
    }

    /// Returns the number of ads with an assigned topic.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.topics.len()
    }

    /// Returns the number of malformed lines of the assignment file.
    #[inline]
    pub(crate) fn skipped(&self) -> u64 {
        self.skipped
    }
}

/// The set of topics to sample from.
#[derive(Debug, Default, Clone)]
pub(crate) struct TopicSet(HashSet<TopicId>);

impl TopicSet {
    /// Returns the topics `0..n`.
    pub(crate) fn range(n: TopicId) -> Self {
        Self((0..n).collect())
    }

    #[inline]
    pub(crate) fn contains(&self, topic: TopicId) -> bool {
        self.0.contains(&topic)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<TopicId> for TopicSet {
    fn from_iter<T: IntoIterator<Item = TopicId>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use std::fs::File;
    use std::io::{Cursor, Write};

    use super::*;

    type TestResult = anyhow::Result<()>;

    const ASSIGNMENTS: &str = r#"{"id": "sjmm-1", "topics": [{"t": 4, "p": 0.62}, {"t": 21, "p": 0.2}]}
{"id": "sjmm-2", "topics": [{"t": 7, "p": 0.3}, {"t": 21, "p": 0.45}]}
{"id": "sjmm-3", "topics": [{"t": 9, "p": 0.4}, {"t": 12, "p": 0.35}]}
not json
{"id": "sjmm-4"}
{"id": "x28-1", "topics": []}
"#;

    #[test]
    fn assigned_topic() -> TestResult {
        let map = TopicMap::from_reader(Cursor::new(ASSIGNMENTS), 0.4)?;

        assert_eq!(map.topic("sjmm-1"), Some(4));
        assert_eq!(map.topic("sjmm-2"), Some(21));
        assert_eq!(map.topic("sjmm-3"), None);
        assert_eq!(map.topic("sjmm-4"), None);
        assert_eq!(map.topic("x28-1"), None);
        assert_eq!(map.topic("adecco-1"), None);
        assert_eq!(map.len(), 2);
        assert_eq!(map.skipped(), 2);
        Ok(())
    }

    #[test]
    fn share_threshold() -> TestResult {
        let map = TopicMap::from_reader(Cursor::new(ASSIGNMENTS), 0.25)?;

        assert_eq!(map.topic("sjmm-1"), Some(4));
        assert_eq!(map.topic("sjmm-2"), Some(7));
        assert_eq!(map.topic("sjmm-3"), Some(9));
        Ok(())
    }

    #[test]
    fn last_record_wins() -> TestResult {
        let input = "{\"id\": \"a\", \"topics\": [{\"t\": 1, \"p\": 0.9}]}\n\
                     {\"id\": \"a\", \"topics\": [{\"t\": 2, \"p\": 0.9}]}\n\
                     {\"id\": \"b\", \"topics\": [{\"t\": 1, \"p\": 0.9}]}\n\
                     {\"id\": \"b\", \"topics\": [{\"t\": 2, \"p\": 0.1}]}\n";
        let map = TopicMap::from_reader(Cursor::new(input), 0.4)?;

        assert_eq!(map.topic("a"), Some(2));
        assert_eq!(map.topic("b"), None);
        Ok(())
    }

    #[test]
    fn invalid_share() {
        assert!(TopicMap::from_reader(Cursor::new(""), 1.0).is_err());
        assert!(TopicMap::from_reader(Cursor::new(""), -0.1).is_err());
    }

    #[test]
    fn from_bzip2_file() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("topic_assignments.jsonl.bz2");

        let mut encoder = bzip2::write::BzEncoder::new(
            File::create(&path)?,
            bzip2::Compression::default(),
        );
        encoder.write_all(ASSIGNMENTS.as_bytes())?;
        encoder.finish()?;

        let map = TopicMap::from_path(&path, DEFAULT_SHARE)?;
        assert_eq!(map.topic("sjmm-1"), Some(4));
        assert_eq!(map.len(), 2);
        Ok(())
    }

    #[test]
    fn topic_set() {
        let set = TopicSet::from_iter([4, 21, 24, 25]);
        assert!(set.contains(4));
        assert!(!set.contains(5));
        assert_eq!(set.len(), 4);
        assert!(TopicSet::default().is_empty());

        let set = TopicSet::range(100);
        assert_eq!(set.len(), 100);
        assert!(set.contains(0));
        assert!(set.contains(99));
        assert!(!set.contains(100));
    }
}
