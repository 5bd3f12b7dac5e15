use std::path::{Path, PathBuf};

use clap::Parser;

use super::options::SampleArgs;
use crate::prelude::*;
use crate::record::JobAd;
use crate::sampler::{Selector, Summary};
use crate::termlist::{MatchMode, TermList, TermMatcher};

const LABEL: &str = "ICT-term-based";

/// Sample job ads containing a term of the ICT term list.
#[derive(Debug, Parser)]
pub(crate) struct Keywords {
    /// The ICT term list (one term per line). Falls back to
    /// `keywords.terms` of the config.
    #[arg(short, long, value_name = "filename")]
    terms: Option<PathBuf>,

    /// If set, terms are matched case insensitive.
    #[arg(long = "ignore-case", short = 'i')]
    ignore_case: bool,

    /// How terms are located in the text of an ad: `word` requires the
    /// term to be surrounded by whitespace, `substring` matches
    /// anywhere.
    #[arg(long, value_name = "mode")]
    mode: Option<MatchMode>,

    /// Each term selects at most one ad. Once a term has selected an
    /// ad, it's removed from the term list.
    #[arg(long)]
    unique_terms: bool,

    #[command(flatten)]
    sample: SampleArgs,
}

struct KeywordSelector {
    matcher: TermMatcher,
    consumed: Option<Vec<bool>>,
}

impl KeywordSelector {
    fn new(matcher: TermMatcher, terms: usize, unique: bool) -> Self {
        Self {
            matcher,
            consumed: unique.then(|| vec![false; terms]),
        }
    }
}

impl Selector for KeywordSelector {
    type Hit = Vec<usize>;

    fn evaluate(&self, ad: &JobAd) -> Option<Self::Hit> {
        let hits = self.matcher.matches(&ad.text);
        (!hits.is_empty()).then_some(hits)
    }

    fn accept(
        &mut self,
        _ad: &JobAd,
        hits: Self::Hit,
        _input: &Path,
    ) -> Option<Vec<String>> {
        if let Some(ref mut consumed) = self.consumed {
            let idx = hits.into_iter().find(|idx| !consumed[*idx])?;
            consumed[idx] = true;
        }

        Some(vec![LABEL.into()])
    }

    fn is_exhausted(&self) -> bool {
        self.consumed
            .as_ref()
            .is_some_and(|consumed| consumed.iter().all(|c| *c))
    }
}

impl Keywords {
    pub(crate) fn execute(self, config: Config) -> AdsampleResult<()> {
        self.run(&config).map(|_| ())
    }

    fn run(&self, config: &Config) -> AdsampleResult<Summary> {
        let path = match self.terms {
            Some(ref path) => path.clone(),
            None => match config.keywords.terms {
                Some(ref path) => config.resolve(path),
                None => bail!(
                    "no term list given (use `--terms` or set \
                        `keywords.terms` in the config)"
                ),
            },
        };

        let terms = TermList::from_path(&path)?;
        if terms.is_empty() {
            bail!("term list {} is empty", path.display());
        }

        let mode = self.mode.or(config.keywords.mode).unwrap_or_default();
        let ignore_case =
            self.ignore_case || config.keywords.ignore_case.unwrap_or(false);

        if self.sample.verbose {
            eprintln!(
                "Loaded {} term(s) from {} (mode = {mode}, \
                    ignore-case = {ignore_case}).",
                terms.len(),
                path.display()
            );
        }

        let matcher = TermMatcher::new(&terms, mode, ignore_case)?;
        let selector =
            KeywordSelector::new(matcher, terms.len(), self.unique_terms);

        self.sample.sample(selector, config)
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    type TestResult = anyhow::Result<()>;

    const ADS: &str = r#"{"id": "sjmm-1", "text": "Wir suchen einen SAP Berater", "meta": {"year": 2001, "source": "sjmm", "lang": "de"}}
{"id": "sjmm-2", "text": "Verkäufer/in für unsere Filiale", "meta": {"year": 2002, "source": "sjmm", "lang": "de"}}
{"id": "sjmm-3", "text": "Java und SAP Entwickler", "meta": {"year": 2003, "source": "sjmm", "lang": "de"}}
{"id": "sjmm-4"
{"id": "sjmm-5", "text": "Informatiker/in mit Java", "meta": {"year": 2004, "source": "sjmm", "lang": "de"}}
{"id": "sjmm-6", "text": "Kenntnisse in SAP", "meta": {"year": 2005, "source": "sjmm", "lang": "de"}}
"#;

    struct Fixture {
        dir: tempfile::TempDir,
        input: PathBuf,
        terms: PathBuf,
        output: PathBuf,
    }

    fn fixture() -> anyhow::Result<Fixture> {
        let dir = tempfile::tempdir()?;
        let input = dir.path().join("ads.jsonl");
        let terms = dir.path().join("terms.txt");
        let output = dir.path().join("sample.jsonl");

        fs::write(&input, ADS)?;
        fs::write(&terms, "SAP\nJava\n")?;

        Ok(Fixture {
            dir,
            input,
            terms,
            output,
        })
    }

    fn keywords(f: &Fixture, args: &[&str]) -> Keywords {
        let mut argv = vec!["keywords", "-q", "-o"];
        argv.push(f.output.to_str().unwrap());
        argv.extend_from_slice(args);
        argv.push(f.input.to_str().unwrap());
        Keywords::try_parse_from(argv).unwrap()
    }

    fn ids(path: &Path) -> anyhow::Result<Vec<String>> {
        Ok(fs::read_to_string(path)?
            .lines()
            .map(|line| JobAd::from_line(line.as_bytes()).unwrap().id)
            .collect())
    }

    #[test]
    fn keyword_filter() -> TestResult {
        let f = fixture()?;
        let cmd = keywords(&f, &["--terms", f.terms.to_str().unwrap()]);
        let summary = cmd.run(&Config::default())?;

        assert_eq!(ids(&f.output)?, vec!["sjmm-1", "sjmm-3", "sjmm-5", "sjmm-6"]);
        assert_eq!(summary.read, 6);
        assert_eq!(summary.malformed, 1);
        assert_eq!(summary.emitted, 4);

        let input: Vec<&str> = ADS.lines().collect();
        let output = fs::read_to_string(&f.output)?;
        let output: Vec<&str> = output.lines().collect();
        assert_eq!(output, vec![input[0], input[2], input[4], input[5]]);
        Ok(())
    }

    #[test]
    fn unique_terms() -> TestResult {
        let f = fixture()?;
        let cmd = keywords(
            &f,
            &["--unique-terms", "--terms", f.terms.to_str().unwrap()],
        );
        cmd.run(&Config::default())?;

        // sjmm-1 consumes "SAP", sjmm-3 consumes "Java"; afterwards
        // the term list is exhausted.
        assert_eq!(ids(&f.output)?, vec!["sjmm-1", "sjmm-3"]);
        Ok(())
    }

    #[test]
    fn terms_from_config() -> TestResult {
        let f = fixture()?;
        let path = f.dir.path().join(Config::FILENAME);
        fs::write(
            &path,
            "[keywords]\nterms = \"terms.txt\"\nmode = \"substring\"\n\
             ignore_case = true\n\n[sample]\nmin_year = 2003\n",
        )?;
        fs::write(&f.terms, "informatik\n")?;

        let config = Config::from_path(&path)?;
        keywords(&f, &[]).run(&config)?;

        assert_eq!(ids(&f.output)?, vec!["sjmm-5"]);
        Ok(())
    }

    #[test]
    fn missing_term_list() -> TestResult {
        let f = fixture()?;
        let result = keywords(&f, &[]).run(&Config::default());
        assert!(result.is_err());

        let result = keywords(&f, &["--terms", "/does/not/exist"])
            .run(&Config::default());
        assert!(result.is_err());
        Ok(())
    }

    #[test]
    fn empty_term_list() -> TestResult {
        let f = fixture()?;
        fs::write(&f.terms, "\n  \n")?;
        let cmd = keywords(&f, &["--terms", f.terms.to_str().unwrap()]);
        assert!(cmd.run(&Config::default()).is_err());
        Ok(())
    }

    #[test]
    fn ledger_and_deny_list() -> TestResult {
        let f = fixture()?;
        let ledger = f.dir.path().join("ids_sampled_ads.txt");
        let terms = f.terms.to_str().unwrap();

        let cmd = keywords(
            &f,
            &[
                "--terms",
                terms,
                "--max-total",
                "2",
                "--name",
                "sample-0",
                "--ledger",
                ledger.to_str().unwrap(),
            ],
        );
        cmd.run(&Config::default())?;
        assert_eq!(ids(&f.output)?, vec!["sjmm-1", "sjmm-3"]);
        assert_eq!(
            fs::read_to_string(&ledger)?,
            "sample-0\tsjmm-1\tsjmm\t2001\tICT-term-based\n\
             sample-0\tsjmm-3\tsjmm\t2003\tICT-term-based\n"
        );

        let cmd = keywords(
            &f,
            &["--terms", terms, "-D", ledger.to_str().unwrap()],
        );
        cmd.run(&Config::default())?;
        assert_eq!(ids(&f.output)?, vec!["sjmm-5", "sjmm-6"]);
        Ok(())
    }

    #[test]
    fn selector_exhaustion() -> TestResult {
        let terms = TermList::from_iter(["SAP"]);
        let matcher = TermMatcher::new(&terms, MatchMode::Word, false)?;
        let mut selector = KeywordSelector::new(matcher, 1, true);
        let ad = JobAd::from_line(br#"{"id": "1", "text": "SAP"}"#).unwrap();

        assert!(!selector.is_exhausted());
        let hits = selector.evaluate(&ad).unwrap();
        assert!(selector.accept(&ad, hits, Path::new("-")).is_some());
        assert!(selector.is_exhausted());

        let hits = selector.evaluate(&ad).unwrap();
        assert!(selector.accept(&ad, hits, Path::new("-")).is_none());
        Ok(())
    }
}
