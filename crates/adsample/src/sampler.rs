use std::fmt::{self, Display};
use std::io::Write;
use std::path::{Path, PathBuf};

use hashbrown::{HashMap, HashSet};
use rayon::prelude::*;

use crate::io::{open, LineBatches, BATCH_SIZE};
use crate::ledger::{IdList, Ledger};
use crate::prelude::*;
use crate::record::JobAd;

const PBAR_SAMPLE: &str = "Sampling ads: {human_pos} | \
        elapsed: {elapsed_precise}{msg}";

/// Decides whether an ad belongs to the sample.
///
/// [Selector::evaluate] is called concurrently for all ads of a batch;
/// [Selector::accept] is called afterwards for every hit in input
/// order and may keep state (e.g. consumed terms).
pub(crate) trait Selector: Sync {
    type Hit: Send;

    fn evaluate(&self, ad: &JobAd) -> Option<Self::Hit>;

    /// Returns the ledger label of the ad, or `None` if the ad is
    /// rejected.
    fn accept(
        &mut self,
        ad: &JobAd,
        hit: Self::Hit,
        input: &Path,
    ) -> Option<Vec<String>>;

    /// Returns true, if no further ad can be accepted.
    fn is_exhausted(&self) -> bool {
        false
    }
}

/// Constraints an ad must satisfy before it's evaluated by a selector.
/// All constraints are disabled by default.
#[derive(Debug, Default)]
pub(crate) struct Filters {
    pub(crate) allow: Option<IdList>,
    pub(crate) deny: Option<IdList>,
    pub(crate) lang: Option<String>,
    pub(crate) min_year: Option<u16>,
    pub(crate) min_len: Option<usize>,
    pub(crate) max_len: Option<usize>,
}

impl Filters {
    pub(crate) fn is_eligible(&self, ad: &JobAd) -> bool {
        if let Some(ref allow) = self.allow {
            if !allow.contains(&ad.id) {
                return false;
            }
        }

        if let Some(ref deny) = self.deny {
            if deny.contains(&ad.id) {
                return false;
            }
        }

        if let Some(ref lang) = self.lang {
            if ad.lang() != Some(lang.as_str()) {
                return false;
            }
        }

        if let Some(min_year) = self.min_year {
            if !ad.year().is_some_and(|year| year >= min_year) {
                return false;
            }
        }

        if self.min_len.is_some() || self.max_len.is_some() {
            let len = ad.char_len();
            if self.min_len.is_some_and(|min| len < min)
                || self.max_len.is_some_and(|max| len > max)
            {
                return false;
            }
        }

        true
    }
}

/// Upper bounds on the number of sampled ads.
#[derive(Debug, Default, Clone)]
pub(crate) struct Quota {
    pub(crate) max_total: Option<usize>,
    pub(crate) max_per_year: Option<usize>,
    pub(crate) max_per_file: Option<usize>,
}

/// Counters of a sampling run.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Summary {
    pub(crate) read: u64,
    pub(crate) malformed: u64,
    pub(crate) ineligible: u64,
    pub(crate) matched: u64,
    pub(crate) emitted: u64,
}

impl Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "read {} record(s): {} malformed, {} ineligible, \
                {} matched, {} sampled",
            self.read,
            self.malformed,
            self.ineligible,
            self.matched,
            self.emitted
        )
    }
}

enum Eval<H> {
    Malformed,
    Ineligible,
    Miss,
    Hit(JobAd, H),
}

fn evaluate<S: Selector>(
    filters: &Filters,
    selector: &S,
    line: &[u8],
) -> Eval<S::Hit> {
    let Some(ad) = JobAd::from_line(line) else {
        return Eval::Malformed;
    };

    if !filters.is_eligible(&ad) {
        return Eval::Ineligible;
    }

    match selector.evaluate(&ad) {
        Some(hit) => Eval::Hit(ad, hit),
        None => Eval::Miss,
    }
}

#[derive(Debug, PartialEq)]
enum Flow {
    Continue,
    NextFile,
    Stop,
}

pub(crate) struct Sampler<S> {
    selector: S,
    filters: Filters,
    quota: Quota,
    unique_ids: bool,
    ledger: Option<Ledger>,
    quiet: bool,

    summary: Summary,
    per_year: HashMap<Option<u16>, usize>,
    seen: HashSet<String>,
}

impl<S: Selector> Sampler<S> {
    pub(crate) fn new(selector: S) -> Self {
        Self {
            selector,
            filters: Filters::default(),
            quota: Quota::default(),
            unique_ids: false,
            ledger: None,
            quiet: true,
            summary: Summary::default(),
            per_year: HashMap::new(),
            seen: HashSet::new(),
        }
    }

    pub(crate) fn filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub(crate) fn quota(mut self, quota: Quota) -> Self {
        self.quota = quota;
        self
    }

    /// Emit every ad id at most once.
    pub(crate) fn unique_ids(mut self, yes: bool) -> Self {
        self.unique_ids = yes;
        self
    }

    pub(crate) fn ledger(mut self, ledger: Option<Ledger>) -> Self {
        self.ledger = ledger;
        self
    }

    pub(crate) fn quiet(mut self, yes: bool) -> Self {
        self.quiet = yes;
        self
    }

    #[cfg(test)]
    pub(crate) fn selector(&self) -> &S {
        &self.selector
    }

    /// Samples the ads of all `inputs` and writes the selected records
    /// to `out`. Records are written unchanged and in input order.
    pub(crate) fn run<W: Write>(
        &mut self,
        inputs: &[PathBuf],
        out: &mut W,
    ) -> AdsampleResult<Summary> {
        let pbar = ProgressBarBuilder::new(PBAR_SAMPLE, self.quiet).build();

        for input in inputs {
            let mut per_file = 0;
            let mut lineno = 0;

            log::info!("sampling ads from {}", input.display());

            'batches: for batch in
                LineBatches::new(open(input)?, BATCH_SIZE)
            {
                let batch = batch?;
                let (filters, selector) = (&self.filters, &self.selector);
                let evals: Vec<Eval<S::Hit>> = batch
                    .par_iter()
                    .map(|line| evaluate(filters, selector, line))
                    .collect();

                for (line, eval) in batch.iter().zip(evals.into_iter()) {
                    lineno += 1;
                    self.summary.read += 1;

                    let (ad, hit) = match eval {
                        Eval::Malformed => {
                            log::debug!(
                                "{}:{lineno}: skip malformed record",
                                input.display()
                            );
                            self.summary.malformed += 1;
                            continue;
                        }
                        Eval::Ineligible => {
                            self.summary.ineligible += 1;
                            continue;
                        }
                        Eval::Miss => continue,
                        Eval::Hit(ad, hit) => (ad, hit),
                    };

                    self.summary.matched += 1;

                    if !self.has_capacity(&ad) {
                        continue;
                    }

                    let Some(label) =
                        self.selector.accept(&ad, hit, input)
                    else {
                        continue;
                    };

                    out.write_all(line)?;
                    out.write_all(b"\n")?;

                    if let Some(ref mut ledger) = self.ledger {
                        let label: Vec<&str> =
                            label.iter().map(String::as_str).collect();
                        ledger.record(&ad, &label)?;
                    }

                    per_file += 1;
                    self.summary.emitted += 1;
                    *self.per_year.entry(ad.year()).or_default() += 1;
                    if self.unique_ids {
                        self.seen.insert(ad.id);
                    }

                    match self.flow(per_file) {
                        Flow::Continue => (),
                        Flow::NextFile => break 'batches,
                        Flow::Stop => {
                            pbar.inc(batch.len() as u64);
                            return self.finish(out, pbar);
                        }
                    }
                }

                pbar.inc(batch.len() as u64);
            }
        }

        self.finish(out, pbar)
    }

    fn has_capacity(&self, ad: &JobAd) -> bool {
        if self
            .quota
            .max_total
            .is_some_and(|max| self.summary.emitted as usize >= max)
        {
            return false;
        }

        if self.unique_ids && self.seen.contains(&ad.id) {
            return false;
        }

        if let Some(max) = self.quota.max_per_year {
            let count = self.per_year.get(&ad.year()).copied();
            if count.unwrap_or_default() >= max {
                return false;
            }
        }

        true
    }

    fn flow(&self, per_file: usize) -> Flow {
        if self
            .quota
            .max_total
            .is_some_and(|max| self.summary.emitted as usize >= max)
            || self.selector.is_exhausted()
        {
            return Flow::Stop;
        }

        if self.quota.max_per_file.is_some_and(|max| per_file >= max) {
            return Flow::NextFile;
        }

        Flow::Continue
    }

    fn finish<W: Write>(
        &mut self,
        out: &mut W,
        pbar: indicatif::ProgressBar,
    ) -> AdsampleResult<Summary> {
        pbar.finish_and_clear();
        out.flush()?;

        if let Some(ref mut ledger) = self.ledger {
            ledger.flush()?;
        }

        if self.summary.malformed > 0 {
            log::warn!(
                "skipped {} malformed record(s)",
                self.summary.malformed
            );
        }

        Ok(self.summary.clone())
    }
}
