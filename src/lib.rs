/// The `cookie_record` module defines [`CookieRecord`], the typed cookie read
/// from one line of a cookies.txt file, and its conversion into a
/// [`cookie::Cookie`] for use with an HTTP client's cookie jar.
pub mod cookie_record;

/// The `field_parser` module turns a single cookies.txt data line into a
/// [`CookieRecord`]. It splits the line on whitespace, checks the field count,
/// unwraps the `#HttpOnly_` domain marker and decodes the secure flag and
/// expiration timestamp.
pub mod field_parser;

/// The `line_classifier` module reads a cookies.txt stream line by line,
/// skips blanks and comments, and hands every data line to the field parser.
///
/// Typical usage is [`parse`] over any [`std::io::BufRead`], or [`parse_file`]
/// for a file on disk:
///
/// ```no_run
/// let cookies = cookiestxt::parse_file("cookies.txt")?;
/// for cookie in &cookies {
///     println!("{} {}={}", cookie.domain, cookie.name, cookie.value);
/// }
/// # Ok::<(), cookiestxt::ParseFailure>(())
/// ```
pub mod line_classifier;

pub use cookie_record::CookieRecord;
pub use field_parser::{LineError, ParseOptions, parse_line, parse_line_with};
pub use line_classifier::{
    LineKind, ParseError, ParseFailure, Records, classify, parse, parse_file, parse_str,
    parse_with, records, records_with,
};
