use std::error::Error as StdError;
use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::iter::FusedIterator;
use std::path::Path;

use thiserror::Error;

use crate::cookie_record::CookieRecord;
use crate::field_parser::{FIELDS_COUNT, HTTP_ONLY_PREFIX, LineError, ParseOptions, parse_line_with};

/// How a single line of a cookies.txt stream is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// Blank, or too short to hold a cookie.
    Blank,
    /// A `#` comment that is not an HttpOnly cookie.
    Comment,
    /// A candidate cookie line.
    Data,
}

/// Errors that stop a pass over a cookies.txt stream.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A data line could not be parsed. `line` is 1-based.
    #[error("cookies.txt line {line}: {source}")]
    Line {
        line: usize,
        #[source]
        source: LineError,
    },
    /// The underlying stream failed.
    #[error("failed to read cookies.txt stream: {0}")]
    Io(#[from] io::Error),
}

/// Returned by the batch parsers: the error that stopped the pass, along with
/// every record parsed before it.
#[derive(Debug)]
pub struct ParseFailure {
    /// Records from the lines preceding the failure, in input order.
    pub records: Vec<CookieRecord>,
    /// What stopped the pass.
    pub error: ParseError,
}

impl ParseFailure {
    /// Splits the failure into the partial records and the error.
    pub fn into_parts(self) -> (Vec<CookieRecord>, ParseError) {
        (self.records, self.error)
    }
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.error, f)
    }
}

impl StdError for ParseFailure {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.error.source()
    }
}

/// Decides whether a line is skipped or handed to the field parser.
///
/// Lines shorter than seven bytes once trimmed are blank. Lines starting with
/// `#` are comments unless they start with `#HttpOnly_`.
///
/// # Arguments
///
/// * `line` - One line of the stream, with or without surrounding whitespace.
///
/// # Returns
///
/// * `LineKind` telling the caller whether to parse or skip the line.
pub fn classify(line: &str) -> LineKind {
    let trimmed = line.trim();
    if trimmed.len() < FIELDS_COUNT {
        LineKind::Blank
    } else if trimmed.starts_with('#') && !trimmed.starts_with(HTTP_ONLY_PREFIX) {
        LineKind::Comment
    } else {
        LineKind::Data
    }
}

/// Lazy iterator over the cookies of a stream, paired with their 1-based line numbers.
///
/// Lines are read as bytes and decoded lossily, so a stray non-UTF-8 byte
/// only affects the line it sits on. Stops for good after the first error.
pub struct Records<R> {
    reader: R,
    buf: Vec<u8>,
    line: usize,
    options: ParseOptions,
    done: bool,
}

impl<R> Records<R> {
    /// Number of physical lines consumed so far.
    pub fn lines_read(&self) -> usize {
        self.line
    }
}

impl<R: BufRead> Records<R> {
    /// Reads the next physical line without its terminator.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(String))` for each line, invalid UTF-8 replaced with U+FFFD.
    /// * `Ok(None)` at end of input.
    /// * `Err(io::Error)` if the reader fails.
    fn read_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        if self.reader.read_until(b'\n', &mut self.buf)? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

impl<R: BufRead> Iterator for Records<R> {
    type Item = Result<(usize, CookieRecord), ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        loop {
            let text = match self.read_line() {
                Ok(Some(text)) => text,
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(ParseError::Io(e)));
                }
            };
            self.line += 1;

            let kind = classify(&text);
            if kind != LineKind::Data {
                tracing::trace!(line = self.line, ?kind, "skipping line");
                continue;
            }

            return Some(match parse_line_with(&text, &self.options) {
                Ok(record) => Ok((self.line, record)),
                Err(source) => {
                    self.done = true;
                    Err(ParseError::Line {
                        line: self.line,
                        source,
                    })
                }
            });
        }
    }
}

impl<R: BufRead> FusedIterator for Records<R> {}

/// Iterates lazily over the cookies in `reader` with default options.
pub fn records<R: BufRead>(reader: R) -> Records<R> {
    records_with(reader, &ParseOptions::default())
}

/// Iterates lazily over the cookies in `reader`.
///
/// # Arguments
///
/// * `reader` - Any buffered source of cookies.txt text.
/// * `options` - Field-count policy applied to each data line.
///
/// # Returns
///
/// * `Records<R>` yielding `(line, CookieRecord)` pairs until the input ends
///   or the first error.
pub fn records_with<R: BufRead>(reader: R, options: &ParseOptions) -> Records<R> {
    Records {
        reader,
        buf: Vec::new(),
        line: 0,
        options: options.clone(),
        done: false,
    }
}

/// Parses a whole cookies.txt stream.
///
/// # Arguments
///
/// * `reader` - Any buffered source of cookies.txt text.
///
/// # Returns
///
/// * `Ok(Vec<CookieRecord>)` with one record per data line, in input order.
/// * `Err(ParseFailure)` at the first malformed line or read failure. The
///   failure still holds the records parsed up to that point.
pub fn parse<R: BufRead>(reader: R) -> Result<Vec<CookieRecord>, ParseFailure> {
    parse_with(reader, &ParseOptions::default())
}

/// Same as [`parse`], honouring the given [`ParseOptions`].
pub fn parse_with<R: BufRead>(
    reader: R,
    options: &ParseOptions,
) -> Result<Vec<CookieRecord>, ParseFailure> {
    let mut iter = records_with(reader, options);
    let mut records = Vec::new();

    for item in iter.by_ref() {
        match item {
            Ok((_, record)) => records.push(record),
            Err(error) => {
                tracing::debug!(error = %error, parsed = records.len(), "cookies.txt parse stopped");
                return Err(ParseFailure { records, error });
            }
        }
    }

    tracing::debug!(
        count = records.len(),
        lines = iter.lines_read(),
        "cookies.txt parse complete"
    );
    Ok(records)
}

/// Parses cookies.txt content held in memory.
pub fn parse_str(content: &str) -> Result<Vec<CookieRecord>, ParseFailure> {
    parse(content.as_bytes())
}

/// Opens and parses a cookies.txt file.
///
/// # Arguments
///
/// * `path` - The file path to read.
///
/// # Returns
///
/// * `Ok(Vec<CookieRecord>)` if the file is read and parsed successfully.
/// * `Err(ParseFailure)` if parsing stops early. Failing to open the file is
///   reported as [`ParseError::Io`] with no records.
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Vec<CookieRecord>, ParseFailure> {
    let file = File::open(path).map_err(|e| ParseFailure {
        records: Vec::new(),
        error: e.into(),
    })?;
    parse(BufReader::new(file))
}
