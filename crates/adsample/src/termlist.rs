use std::fmt::{self, Display};
use std::fs::read_to_string;
use std::path::Path;

use clap::ValueEnum;
use regex::{escape, RegexSet, RegexSetBuilder};
use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// How a term is located in the text of an ad.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub(crate) enum MatchMode {
    /// The term must be delimited by whitespace or the beginning/end
    /// of the text.
    #[default]
    Word,

    /// The term may occur anywhere, even inside another word.
    Substring,
}

impl Display for MatchMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word => write!(f, "word"),
            Self::Substring => write!(f, "substring"),
        }
    }
}

/// An ordered list of ICT terms.
#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct TermList(Vec<String>);

impl TermList {
    /// Reads a term list (one term per line). Trailing whitespace is
    /// removed and blank lines are ignored.
    pub(crate) fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> AdsampleResult<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            AdsampleError::other(format!(
                "unable to read term list {}: {e}",
                path.display()
            ))
        })?;

        Ok(Self::from_iter(content.lines()))
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

impl<S: AsRef<str>> FromIterator<S> for TermList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|term| term.as_ref().trim_end().to_string())
                .filter(|term| !term.trim_start().is_empty())
                .collect(),
        )
    }
}

/// Finds the terms of a [TermList] in a text.
#[derive(Debug)]
pub(crate) struct TermMatcher {
    set: RegexSet,
}

impl TermMatcher {
    pub(crate) fn new(
        terms: &TermList,
        mode: MatchMode,
        ignore_case: bool,
    ) -> AdsampleResult<Self> {
        let patterns = terms.0.iter().map(|term| match mode {
            MatchMode::Word => format!(r"(?:^|\s){}(?:\s|$)", escape(term)),
            MatchMode::Substring => escape(term),
        });

        let set = RegexSetBuilder::new(patterns)
            .case_insensitive(ignore_case)
            .size_limit(1 << 26)
            .dfa_size_limit(1 << 26)
            .build()?;

        Ok(Self { set })
    }

    /// Returns the indices of all terms occurring in `text`, in
    /// ascending order (the order of the term list).
    pub(crate) fn matches(&self, text: &str) -> Vec<usize> {
        self.set.matches(text).into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    type TestResult = anyhow::Result<()>;

    fn matcher(terms: &[&str], mode: MatchMode, ic: bool) -> TermMatcher {
        let terms = TermList::from_iter(terms);
        TermMatcher::new(&terms, mode, ic).unwrap()
    }

    #[test]
    fn term_list_from_path() -> TestResult {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("terms.txt");
        fs::write(&path, "Informatik\r\nSAP \n\n   \nC++\n")?;

        let terms = TermList::from_path(&path)?;
        assert_eq!(terms.len(), 3);
        assert_eq!(terms, TermList::from_iter(["Informatik", "SAP", "C++"]));
        Ok(())
    }

    #[test]
    fn term_list_missing_file() {
        assert!(TermList::from_path("/does/not/exist.txt").is_err());
    }

    #[test]
    fn word_mode() {
        let m = matcher(&["SAP", "Java"], MatchMode::Word, false);

        assert_eq!(m.matches("Kenntnisse in SAP und Java"), vec![0, 1]);
        assert_eq!(m.matches("SAP-Berater"), Vec::<usize>::new());
        assert_eq!(m.matches("JavaScript Entwickler"), Vec::<usize>::new());
        assert_eq!(m.matches("Java"), vec![1]);
        assert_eq!(m.matches("Sie kennen\nSAP\nbestens"), vec![0]);
        assert_eq!(m.matches("sap und java"), Vec::<usize>::new());
    }

    #[test]
    fn substring_mode() {
        let m = matcher(&["SAP", "Java"], MatchMode::Substring, false);

        assert_eq!(m.matches("SAP-Berater"), vec![0]);
        assert_eq!(m.matches("JavaScript Entwickler"), vec![1]);
        assert!(m.matches("Verkäufer/in").is_empty());
    }

    #[test]
    fn ignore_case() {
        let m = matcher(&["Informatik"], MatchMode::Word, true);
        assert_eq!(m.matches("Studium der INFORMATIK oder"), vec![0]);
    }

    #[test]
    fn metacharacters_are_literal() {
        let m = matcher(&["C++", "C#", ".NET"], MatchMode::Word, false);

        assert_eq!(m.matches("Erfahrung mit C++ und .NET"), vec![0, 2]);
        assert!(m.matches("Erfahrung mit Cxx und xNET").is_empty());
        assert_eq!(m.matches("C# Entwickler"), vec![1]);
    }

    #[test]
    fn multi_word_terms() {
        let m = matcher(&["Business Intelligence"], MatchMode::Word, false);
        assert_eq!(m.matches("Leiter Business Intelligence (m/w)"), vec![0]);
    }

    #[test]
    fn match_mode() {
        assert_eq!(
            MatchMode::from_str("substring", false),
            Ok(MatchMode::Substring)
        );
        assert!(MatchMode::from_str("fuzzy", false).is_err());
        assert_eq!(MatchMode::Substring.to_string(), "substring");
        assert_eq!(MatchMode::default(), MatchMode::Word);
    }
}
