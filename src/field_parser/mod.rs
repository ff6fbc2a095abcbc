use std::num::ParseIntError;

use thiserror::Error;

use crate::cookie_record::CookieRecord;

/// Marker prepended to the domain field of cookies that are HttpOnly.
pub const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// Number of fields in a complete cookies.txt line.
pub const FIELDS_COUNT: usize = 7;

// Column 1 holds the include-subdomains flag, which is not read.
const DOMAIN_IDX: usize = 0;
const PATH_IDX: usize = 2;
const SECURE_IDX: usize = 3;
const EXPIRATION_IDX: usize = 4;
const NAME_IDX: usize = 5;
const VALUE_IDX: usize = 6;

/// Tokens decoded as `true` in the secure column, compared case-insensitively.
/// Everything else decodes as `false`.
const TRUE_TOKENS: &[&str] = &["TRUE"];

/// Errors produced while turning a single line into a [`CookieRecord`].
#[derive(Debug, Error)]
pub enum LineError {
    /// The line has fewer fields than a cookie needs, or more than allowed in strict mode.
    #[error("expecting fields={expected}, got={actual}")]
    FieldCount { expected: usize, actual: usize },
    /// The expiration field is not a base-10 integer.
    #[error("invalid expiration {token:?}: {source}")]
    TimestampFormat {
        token: String,
        #[source]
        source: ParseIntError,
    },
}

/// Options controlling how lenient the parser is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// If true, lines with more than seven fields are rejected instead of
    /// having the extra fields ignored.
    pub strict_field_count: bool,
}

/// Parses a single cookies.txt data line into a [`CookieRecord`].
///
/// Fields are separated by runs of whitespace and read by position: domain,
/// include-subdomains flag (ignored), path, secure, expiration, name, value.
/// A six-field line has no value and gets an empty one. Fields past the
/// seventh are ignored.
///
/// # Arguments
///
/// * `raw` - The line as read from the file, without its line terminator.
///
/// # Returns
///
/// * `Ok(CookieRecord)` if the line holds a cookie.
/// * `Err(LineError)` if the line has fewer than six fields or the expiration
///   is not an integer.
pub fn parse_line(raw: &str) -> Result<CookieRecord, LineError> {
    parse_line_with(raw, &ParseOptions::default())
}

/// Same as [`parse_line`], honouring the given [`ParseOptions`].
///
/// # Arguments
///
/// * `raw` - The line as read from the file.
/// * `options` - With `strict_field_count` set, lines with more than seven
///   fields fail with [`LineError::FieldCount`].
pub fn parse_line_with(raw: &str, options: &ParseOptions) -> Result<CookieRecord, LineError> {
    let fields = split_fields(raw, options)?;

    let expires_unix = parse_expiration(fields[EXPIRATION_IDX])?;
    let (domain, http_only) = split_http_only(fields[DOMAIN_IDX]);

    Ok(CookieRecord {
        domain: domain.to_string(),
        http_only,
        path: fields[PATH_IDX].to_string(),
        secure: parse_bool(fields[SECURE_IDX]),
        expires_unix,
        name: fields[NAME_IDX].to_string(),
        value: fields[VALUE_IDX].to_string(),
        raw: raw.to_string(),
    })
}

/// Splits a line into its whitespace-separated fields.
///
/// # Arguments
///
/// * `raw` - The line to split.
/// * `options` - Decides whether extra fields are an error.
///
/// # Returns
///
/// * `Ok(Vec<&str>)` with at least seven entries; a missing value is pushed as `""`.
/// * `Err(LineError::FieldCount)` if there are too few fields, or too many in strict mode.
fn split_fields<'a>(raw: &'a str, options: &ParseOptions) -> Result<Vec<&'a str>, LineError> {
    let mut fields: Vec<&str> = raw.split_whitespace().collect();

    if fields.len() == FIELDS_COUNT - 1 {
        fields.push("");
    } else if fields.len() < FIELDS_COUNT
        || (options.strict_field_count && fields.len() > FIELDS_COUNT)
    {
        return Err(LineError::FieldCount {
            expected: FIELDS_COUNT,
            actual: fields.len(),
        });
    }

    Ok(fields)
}

/// Strips the `#HttpOnly_` marker from a domain field.
///
/// # Arguments
///
/// * `domain` - The raw domain field.
///
/// # Returns
///
/// * `(&str, bool)` - The bare domain and whether the marker was present.
pub fn split_http_only(domain: &str) -> (&str, bool) {
    match domain.strip_prefix(HTTP_ONLY_PREFIX) {
        Some(stripped) => (stripped, true),
        None => (domain, false),
    }
}

/// Decodes the secure column. Never fails.
fn parse_bool(token: &str) -> bool {
    TRUE_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token))
}

/// Parses the expiration column as Unix epoch seconds.
///
/// # Arguments
///
/// * `token` - The expiration field.
///
/// # Returns
///
/// * `Ok(i64)` for any base-10 signed 64-bit integer.
/// * `Err(LineError::TimestampFormat)` otherwise.
fn parse_expiration(token: &str) -> Result<i64, LineError> {
    token
        .parse::<i64>()
        .map_err(|source| LineError::TimestampFormat {
            token: token.to_string(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_well_formed_line() {
        let line = "example.com\tFALSE\t/\tTRUE\t1999999999\tsession\tabc123";
        let cookie = parse_line(line).unwrap();
        assert_eq!(cookie.domain, "example.com");
        assert!(!cookie.http_only);
        assert_eq!(cookie.path, "/");
        assert!(cookie.secure);
        assert_eq!(cookie.expires_unix, 1_999_999_999);
        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");
        assert_eq!(cookie.raw, line);
    }

    #[test]
    fn parses_curl_export_line() {
        let cookie = parse_line("example.com\tFALSE\t/\tFALSE\t0\tname\tvalue").unwrap();
        assert_eq!(cookie.path, "/");
        assert!(!cookie.secure);
        assert_eq!(cookie.expires_unix, 0);
        assert_eq!(cookie.name, "name");
        assert_eq!(cookie.value, "value");
    }

    #[test]
    fn unwraps_http_only_prefix() {
        let cookie = parse_line("#HttpOnly_.example.com\tTRUE\t/\tFALSE\t0\tid\t42").unwrap();
        assert!(cookie.http_only);
        assert_eq!(cookie.domain, ".example.com");

        let plain = parse_line(".example.com\tTRUE\t/\tFALSE\t0\tid\t42").unwrap();
        assert!(!plain.http_only);
        assert_eq!(plain.domain, ".example.com");
    }

    #[test]
    fn split_http_only_leaves_other_domains_alone() {
        assert_eq!(split_http_only("#HttpOnly_a.b"), ("a.b", true));
        assert_eq!(split_http_only("a.b"), ("a.b", false));
        assert_eq!(split_http_only("#httponly_a.b"), ("#httponly_a.b", false));
        assert_eq!(split_http_only("#HttpOnly_"), ("", true));
    }

    #[test]
    fn secure_is_true_only_for_true_token() {
        for token in ["TRUE", "true", "True", "tRuE"] {
            let line = format!("a.com FALSE / {token} 0 n v");
            assert!(parse_line(&line).unwrap().secure, "{token}");
        }
        for token in ["FALSE", "false", "1", "yes", "TRUEISH", "/"] {
            let line = format!("a.com FALSE / {token} 0 n v");
            assert!(!parse_line(&line).unwrap().secure, "{token}");
        }
    }

    #[test]
    fn six_fields_yield_empty_value() {
        let cookie = parse_line("example.com\tFALSE\t/\tFALSE\t0\tname").unwrap();
        assert_eq!(cookie.name, "name");
        assert_eq!(cookie.value, "");
    }

    #[test]
    fn seventh_field_is_used_verbatim() {
        let cookie = parse_line("a.com FALSE / FALSE 0 name \"\"").unwrap();
        assert_eq!(cookie.value, "\"\"");
    }

    #[test]
    fn accepts_mixed_and_repeated_whitespace() {
        let line = "  a.com \t TRUE\t /p  FALSE\t 12   n \t v  ";
        let cookie = parse_line(line).unwrap();
        assert_eq!(cookie.domain, "a.com");
        assert_eq!(cookie.path, "/p");
        assert_eq!(cookie.expires_unix, 12);
        assert_eq!(cookie.name, "n");
        assert_eq!(cookie.value, "v");
        assert_eq!(cookie.raw, line);
    }

    #[test]
    fn rejects_too_few_fields() {
        let err = parse_line("a.com FALSE / FALSE").unwrap_err();
        match err {
            LineError::FieldCount { expected, actual } => {
                assert_eq!(expected, 7);
                assert_eq!(actual, 4);
            }
            other => panic!("expected field count error, got {other:?}"),
        }
        assert_eq!(
            parse_line("a b c d e").unwrap_err().to_string(),
            "expecting fields=7, got=5"
        );
    }

    #[test]
    fn ignores_extra_fields_by_default() {
        let cookie = parse_line("a.com FALSE / FALSE 0 n v extra tokens").unwrap();
        assert_eq!(cookie.value, "v");
    }

    #[test]
    fn strict_mode_rejects_extra_fields() {
        let options = ParseOptions {
            strict_field_count: true,
        };
        let err = parse_line_with("a.com FALSE / FALSE 0 n v x", &options).unwrap_err();
        assert!(matches!(
            err,
            LineError::FieldCount {
                expected: 7,
                actual: 8
            }
        ));
        assert_eq!(
            parse_line_with("a.com FALSE / FALSE 0 n v", &options).unwrap().value,
            "v"
        );
        assert_eq!(
            parse_line_with("a.com FALSE / FALSE 0 n", &options).unwrap().value,
            ""
        );
    }

    #[test]
    fn rejects_non_numeric_expiration() {
        let err = parse_line("a.com FALSE / FALSE notanumber n v").unwrap_err();
        match err {
            LineError::TimestampFormat { token, .. } => assert_eq!(token, "notanumber"),
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_negative_expiration() {
        let cookie = parse_line("a.com FALSE / FALSE -1 n v").unwrap();
        assert_eq!(cookie.expires_unix, -1);
    }

    #[test]
    fn accepts_every_i64_expiration() {
        let cookie = parse_line("a.com\tFALSE\t/\tFALSE\t99999999999999\tn\tv").unwrap();
        assert_eq!(cookie.expires_unix, 99_999_999_999_999);

        for seconds in [i64::MAX, i64::MIN] {
            let cookie = parse_line(&format!("a.com FALSE / FALSE {seconds} n v")).unwrap();
            assert_eq!(cookie.expires_unix, seconds);
        }
    }

    #[test]
    fn field_order_is_positional() {
        let cookie =
            parse_line(".example.com\tTRUE\t/\tFALSE\t1999999999\tsession\tabc123").unwrap();
        assert_eq!(cookie.domain, ".example.com");
        assert_eq!(cookie.path, "/");
        assert!(!cookie.secure);
        assert_eq!(cookie.expires_unix, 1_999_999_999);
        assert_eq!(cookie.name, "session");
        assert_eq!(cookie.value, "abc123");

        // Without the subdomain column every field shifts left by one.
        let err = parse_line(".example.com\t/\tFALSE\t1999999999\tsession\tabc123").unwrap_err();
        match err {
            LineError::TimestampFormat { token, .. } => assert_eq!(token, "session"),
            other => panic!("expected timestamp error, got {other:?}"),
        }
    }
}
