pub(crate) use crate::config::Config;
pub(crate) use crate::error::{bail, AdsampleError, AdsampleResult};
pub(crate) use crate::progress::ProgressBarBuilder;
