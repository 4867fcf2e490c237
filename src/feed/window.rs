//! Query window arithmetic for the calendar feed.
//!
//! A cycle asks for "events happening in roughly the next day": the window
//! starts at the current local wall-clock time and ends at tomorrow's date
//! with a fixed early-morning cutoff, which bounds the query without needing
//! server-side paging.
use chrono::{Days, NaiveDateTime};
use url::Url;

/// Fixed end-of-window cutoff time on the day after the start.
const WINDOW_END_CUTOFF: &str = "03:00:00";

/// Date-time format expected by the calendar query parameters.
const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The `[start, end]` markers of one query, pre-formatted for the remote API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryWindow {
    pub start: String,
    pub end: String,
}

/// Compute the query window for a cycle starting at `now` (local time).
///
/// Start marker is `now` itself; end marker is the next day's date with the
/// fixed 03:00:00 cutoff. The caller passes `Local::now().naive_local()`.
pub fn query_window(now: NaiveDateTime) -> QueryWindow {
    let start = now.format(QUERY_TIME_FORMAT).to_string();
    let tomorrow = now
        .checked_add_days(Days::new(1))
        .unwrap_or(NaiveDateTime::MAX);
    let end = format!("{}T{}", tomorrow.format("%Y-%m-%d"), WINDOW_END_CUTOFF);
    QueryWindow { start, end }
}

/// Build the full query URL: window bounds plus ordering directives.
///
/// Values are appended as percent-encoded query pairs rather than raw string
/// concatenation, so the `T`/`:` separators survive any intermediary.
pub fn query_url(base: &Url, window: &QueryWindow) -> Url {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("start-min", &window.start)
        .append_pair("start-max", &window.end)
        .append_pair("orderby", "starttime")
        .append_pair("sortorder", "ascending");
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn test_window_start_is_now() {
        let window = query_window(at(2024, 1, 1, 9, 30, 15));
        assert_eq!(window.start, "2024-01-01T09:30:15");
    }

    #[test]
    fn test_window_end_is_tomorrow_at_cutoff() {
        let window = query_window(at(2024, 1, 1, 9, 30, 15));
        assert_eq!(window.end, "2024-01-02T03:00:00");
    }

    #[test]
    fn test_window_end_ignores_current_time_of_day() {
        // Even late at night the end marker stays at tomorrow 03:00:00,
        // which can make the window shorter than 24 hours.
        let window = query_window(at(2024, 1, 1, 23, 59, 59));
        assert_eq!(window.end, "2024-01-02T03:00:00");
    }

    #[test]
    fn test_window_rolls_over_month_and_year() {
        let window = query_window(at(2023, 12, 31, 12, 0, 0));
        assert_eq!(window.start, "2023-12-31T12:00:00");
        assert_eq!(window.end, "2024-01-01T03:00:00");
    }

    #[test]
    fn test_window_leap_day() {
        let window = query_window(at(2024, 2, 28, 8, 0, 0));
        assert_eq!(window.end, "2024-02-29T03:00:00");
    }

    #[test]
    fn test_query_url_carries_window_and_ordering() {
        let base = Url::parse("https://calendar.example.com/feeds/default/private/full").unwrap();
        let window = query_window(at(2024, 1, 1, 9, 0, 0));
        let url = query_url(&base, &window);

        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("start-min".to_string(), "2024-01-01T09:00:00".to_string()),
                ("start-max".to_string(), "2024-01-02T03:00:00".to_string()),
                ("orderby".to_string(), "starttime".to_string()),
                ("sortorder".to_string(), "ascending".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_url_preserves_base_path() {
        let base = Url::parse("https://calendar.example.com/feeds/default/private/full").unwrap();
        let url = query_url(&base, &query_window(at(2024, 1, 1, 9, 0, 0)));
        assert_eq!(url.path(), "/feeds/default/private/full");
        assert_eq!(url.host_str(), Some("calendar.example.com"));
    }

    #[test]
    fn test_query_url_does_not_mutate_base() {
        let base = Url::parse("https://calendar.example.com/feeds").unwrap();
        let _ = query_url(&base, &query_window(at(2024, 1, 1, 9, 0, 0)));
        assert!(base.query().is_none());
    }
}
