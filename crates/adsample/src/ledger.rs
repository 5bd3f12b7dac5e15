use std::fs::{File, OpenOptions};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, Writer, WriterBuilder};
use hashbrown::HashSet;

use crate::prelude::*;
use crate::record::JobAd;

/// A set of ad ids read from an allow- or deny-list.
///
/// Lists are tab-separated without a header. If a row consists of more
/// than one column, the id is taken from the second column (ledger
/// format), otherwise from the first one.
#[derive(Debug, Default)]
pub(crate) struct IdList(HashSet<String>);

impl IdList {
    pub(crate) fn from_path<P: AsRef<Path>>(
        path: P,
    ) -> AdsampleResult<Self> {
        let path = path.as_ref();
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(path)
            .map_err(|e| {
                AdsampleError::other(format!(
                    "unable to read id list {}: {e}",
                    path.display()
                ))
            })?;

        let mut ids = HashSet::new();
        for result in reader.records() {
            let record = result?;
            let id = match record.len() {
                0 => continue,
                1 => &record[0],
                _ => &record[1],
            };

            let id = id.trim();
            if !id.is_empty() {
                ids.insert(id.to_string());
            }
        }

        Ok(Self(ids))
    }

    #[inline]
    pub(crate) fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }
}

impl IntoIterator for IdList {
    type Item = String;
    type IntoIter = hashbrown::hash_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<S: Into<String>> FromIterator<S> for IdList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Records the sampled ads.
///
/// Each row has the form `sample, id, source, year, label...`.
pub(crate) struct Ledger {
    writer: Writer<File>,
    name: String,
}

impl Ledger {
    /// Opens the ledger for appending; the file is created if it
    /// doesn't exist.
    pub(crate) fn open<P: AsRef<Path>>(
        path: P,
        name: &str,
    ) -> AdsampleResult<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;

        let writer = WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .flexible(true)
            .quote_style(QuoteStyle::Never)
            .from_writer(file);

        Ok(Self {
            writer,
            name: name.into(),
        })
    }

    pub(crate) fn record(
        &mut self,
        ad: &JobAd,
        label: &[&str],
    ) -> AdsampleResult<()> {
        let year = ad.year().map(|y| y.to_string()).unwrap_or_default();
        let mut row = vec![
            self.name.as_str(),
            ad.id.as_str(),
            ad.source().unwrap_or_default(),
            year.as_str(),
        ];

        row.extend_from_slice(label);
        self.writer.write_record(&row)?;
        Ok(())
    }

    pub(crate) fn flush(&mut self) -> AdsampleResult<()> {
        self.writer.flush()?;
        Ok(())
    }
}
