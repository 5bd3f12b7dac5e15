pub(crate) type AdsampleResult<T> = Result<T, AdsampleError>;

macro_rules! bail {
    ($($arg:tt)*) => {{
        return Err(AdsampleError::Other(format!($($arg)*)));
    }};
}

pub(crate) use bail;

#[derive(Debug, thiserror::Error)]
pub(crate) enum AdsampleError {
    #[error(transparent)]
    IO(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    TomlDe(#[from] toml::de::Error),

    #[error(transparent)]
    TomlSer(#[from] toml::ser::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("{0}")]
    Other(String),
}

impl AdsampleError {
    #[inline]
    pub(crate) fn other<T: ToString>(s: T) -> Self {
        Self::Other(s.to_string())
    }

    /// Returns true, if the error was caused by a closed pipe (e.g.
    /// `adsample keywords ... | head`).
    pub(crate) fn is_broken_pipe(&self) -> bool {
        use std::io::ErrorKind;

        match self {
            Self::IO(e) => e.kind() == ErrorKind::BrokenPipe,
            Self::Csv(e) => match e.kind() {
                csv::ErrorKind::Io(e) => {
                    e.kind() == ErrorKind::BrokenPipe
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use super::*;

    #[test]
    fn broken_pipe() {
        let err = AdsampleError::from(io::Error::from(
            io::ErrorKind::BrokenPipe,
        ));
        assert!(err.is_broken_pipe());

        let err = AdsampleError::from(io::Error::from(
            io::ErrorKind::NotFound,
        ));
        assert!(!err.is_broken_pipe());
        assert!(!AdsampleError::other("foo").is_broken_pipe());
    }

    #[test]
    fn bail_formats_message() {
        fn f(name: &str) -> AdsampleResult<()> {
            bail!("unknown option `{name}`");
        }

        let err = f("foo").unwrap_err();
        assert_eq!(err.to_string(), "unknown option `foo`");
    }
}
