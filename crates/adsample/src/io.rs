use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io::{self, stdin, stdout, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use bzip2::read::MultiBzDecoder;
use flate2::read::MultiGzDecoder;

use crate::prelude::*;

/// Number of lines processed at once.
pub(crate) const BATCH_SIZE: usize = 8192;

/// Opens an input for reading. The path `-` denotes the standard input.
/// Files ending with `.gz` or `.bz2` are decompressed on the fly.
pub(crate) fn open<P: AsRef<Path>>(
    path: P,
) -> AdsampleResult<Box<dyn BufRead>> {
    let path = path.as_ref();
    if path == Path::new("-") {
        return Ok(Box::new(stdin().lock()));
    }

    let file = File::open(path).map_err(|e| {
        AdsampleError::other(format!(
            "unable to open {}: {e}",
            path.display()
        ))
    })?;

    Ok(match path.extension().and_then(OsStr::to_str) {
        Some("gz") => Box::new(BufReader::new(MultiGzDecoder::new(file))),
        Some("bz2") => Box::new(BufReader::new(MultiBzDecoder::new(file))),
        _ => Box::new(BufReader::new(file)),
    })
}

/// Creates the output writer. Without a path, output is written to
/// the standard output.
pub(crate) fn create(
    path: Option<&Path>,
    append: bool,
) -> AdsampleResult<Box<dyn Write>> {
    Ok(match path {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .append(append)
                .truncate(!append)
                .open(path)?;
            Box::new(BufWriter::new(file))
        }
        None => Box::new(BufWriter::new(stdout().lock())),
    })
}

/// Splits a reader into batches of raw lines. The line terminator is
/// not part of the line.
pub(crate) struct LineBatches<R> {
    reader: R,
    size: usize,
    done: bool,
}

impl<R: BufRead> LineBatches<R> {
    pub(crate) fn new(reader: R, size: usize) -> Self {
        Self {
            reader,
            size: size.max(1),
            done: false,
        }
    }
}

impl<R: BufRead> Iterator for LineBatches<R> {
    type Item = io::Result<Vec<Vec<u8>>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut batch = Vec::with_capacity(self.size);
        while batch.len() < self.size {
            let mut line = Vec::new();
            match self.reader.read_until(b'\n', &mut line) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(_) => {
                    if line.last() == Some(&b'\n') {
                        line.pop();
                        if line.last() == Some(&b'\r') {
                            line.pop();
                        }
                    }

                    batch.push(line);
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }

        if batch.is_empty() {
            None
        } else {
            Some(Ok(batch))
        }
    }
}
