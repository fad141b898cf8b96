//! Opaque pagination-cookie arithmetic over the SCIM
//! `startIndex`/`count` model.
//!
//! The cookie is a stringified next `startIndex`. The caller's search
//! loop echoes it back verbatim; this module holds no cross-call state.

use idbridge_connector::error::{ConnectorError, ConnectorResult};

/// First page start index (SCIM indices are 1-based).
pub const FIRST_START_INDEX: i64 = 1;

/// Compute the cookie for the page after one that returned
/// `resources_returned` results.
///
/// A short page (fewer results than requested) is the final page and
/// yields no cookie. The remaining-result count is deliberately never
/// derived from `totalResults` — the targets this connector talks to do
/// not report it reliably.
pub fn next_cookie(start_index: i64, count: i64, resources_returned: usize) -> Option<String> {
    if (resources_returned as i64) >= count {
        Some((start_index + resources_returned as i64).to_string())
    } else {
        None
    }
}

/// Parse a caller-echoed cookie back into a start index. An absent
/// cookie means the first page.
pub fn start_index_from_cookie(cookie: Option<&str>) -> ConnectorResult<i64> {
    match cookie {
        None => Ok(FIRST_START_INDEX),
        Some(raw) => raw.parse::<i64>().map_err(|_| {
            ConnectorError::invalid_configuration(format!("invalid pagination cookie: {raw:?}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_page_yields_next_index() {
        assert_eq!(next_cookie(1, 10, 10), Some("11".to_string()));
        assert_eq!(next_cookie(11, 10, 10), Some("21".to_string()));
    }

    #[test]
    fn short_page_terminates() {
        assert_eq!(next_cookie(11, 10, 4), None);
        assert_eq!(next_cookie(1, 10, 0), None);
    }

    #[test]
    fn overfull_page_still_advances() {
        // A target returning more than requested still advances by what
        // was actually returned.
        assert_eq!(next_cookie(1, 10, 12), Some("13".to_string()));
    }

    #[test]
    fn cookie_round_trip() {
        assert_eq!(start_index_from_cookie(None).unwrap(), 1);
        assert_eq!(start_index_from_cookie(Some("21")).unwrap(), 21);
        assert!(start_index_from_cookie(Some("not-a-number")).is_err());
    }
}
