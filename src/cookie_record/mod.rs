use cookie::Cookie;
use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, PrimitiveDateTime};

/// A single cookie read from one data line of a cookies.txt file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CookieRecord {
    /// The host or domain pattern that set the cookie, without any `#HttpOnly_` marker.
    pub domain: String,
    /// Set when the line's domain carried the `#HttpOnly_` marker.
    pub http_only: bool,
    /// The URL path the cookie is scoped to.
    pub path: String,
    /// Whether the cookie is only sent over secure connections.
    pub secure: bool,
    /// Expiry as Unix epoch seconds, exactly as written on the line.
    pub expires_unix: i64,
    /// The cookie name.
    pub name: String,
    /// The cookie value. Empty when the line omitted it.
    pub value: String,
    /// The line exactly as it was read.
    pub raw: String,
}

impl CookieRecord {
    /// Returns the expiry as an absolute UTC point in time.
    ///
    /// Epoch seconds outside the range `time` can represent are clamped to the
    /// earliest or latest representable instant.
    ///
    /// # Returns
    ///
    /// * `OffsetDateTime` in UTC.
    pub fn expires(&self) -> OffsetDateTime {
        OffsetDateTime::from_unix_timestamp(self.expires_unix).unwrap_or(if self.expires_unix < 0 {
            PrimitiveDateTime::MIN.assume_utc()
        } else {
            PrimitiveDateTime::MAX.assume_utc()
        })
    }

    /// Builds a [`cookie::Cookie`] carrying this record's attributes, ready for a cookie jar.
    pub fn to_cookie(&self) -> Cookie<'static> {
        self.clone().into()
    }
}

impl From<CookieRecord> for Cookie<'static> {
    fn from(record: CookieRecord) -> Self {
        let expires = record.expires();
        Cookie::build((record.name, record.value))
            .domain(record.domain)
            .path(record.path)
            .secure(record.secure)
            .http_only(record.http_only)
            .expires(expires)
            .build()
    }
}
