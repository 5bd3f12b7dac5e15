use bstr::ByteSlice;
use serde::Deserialize;

/// A job advertisement.
///
/// Only the fields needed to select an ad are deserialized; the line
/// is written to the output unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct JobAd {
    pub(crate) id: String,
    pub(crate) text: String,
    #[serde(default)]
    pub(crate) meta: Meta,
}

#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub(crate) struct Meta {
    #[serde(default)]
    pub(crate) year: Option<u16>,
    #[serde(default)]
    pub(crate) source: Option<String>,
    #[serde(default)]
    pub(crate) lang: Option<String>,
}

impl JobAd {
    /// Parses a single JSON-lines record. Returns `None` if the line
    /// isn't valid UTF-8, isn't a JSON object or lacks the `id` or
    /// `text` field.
    pub(crate) fn from_line(line: &[u8]) -> Option<Self> {
        let line = line.trim_end_with(|c| c == '\n' || c == '\r');
        let line = line.to_str().ok()?;
        serde_json::from_str(line).ok()
    }

    #[inline]
    pub(crate) fn year(&self) -> Option<u16> {
        self.meta.year
    }

    #[inline]
    pub(crate) fn source(&self) -> Option<&str> {
        self.meta.source.as_deref()
    }

    #[inline]
    pub(crate) fn lang(&self) -> Option<&str> {
        self.meta.lang.as_deref()
    }

    /// Returns the number of characters of the ad's text.
    #[inline]
    pub(crate) fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}
