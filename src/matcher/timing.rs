/*!
 * Request Timing Matcher
 * Correlates a completed request with the resource timing entry it produced
 */

use crate::core::limits::REQUEST_MATCHING_ERROR_MARGIN_MS;
use crate::core::types::RelativeTime;
use crate::lifecycle::{RequestCompleteEvent, ResourceTiming};
use std::borrow::Cow;

/// Find the timing entry describing `request` among entries sharing its URL
///
/// Candidates must be valid and nested inside the request interval. One
/// candidate is used as is; two adjacent ones are a preflight followed by the
/// actual request, so the second wins. Anything else is ambiguous.
pub fn match_request_timing(request: &RequestCompleteEvent, entries: &[ResourceTiming]) -> Option<ResourceTiming> {
    let request_end = request.start_time + request.duration;
    let candidates: Vec<&ResourceTiming> = entries
        .iter()
        .filter(|entry| is_valid_entry(entry))
        .filter(|entry| is_between(entry, request.start_time, request_end))
        .collect();

    match candidates.as_slice() {
        [single] => Some((*single).clone()),
        [first, second] if first.end_time() <= second.start_time => Some((*second).clone()),
        _ => None,
    }
}

fn is_between(entry: &ResourceTiming, start: RelativeTime, end: RelativeTime) -> bool {
    entry.start_time.millis() >= start.millis() - REQUEST_MATCHING_ERROR_MARGIN_MS
        && entry.end_time().millis() <= end.millis() + REQUEST_MATCHING_ERROR_MARGIN_MS
}

/// Whether the entry's phase timestamps are consistent
#[inline]
pub fn is_valid_entry(entry: &ResourceTiming) -> bool {
    to_valid_entry(entry).is_some()
}

/// Validate an entry, filling redirect bounds some browsers leave out
///
/// Entries of cross-origin requests without timing permission carry zeroed
/// phases and are rejected here.
pub fn to_valid_entry(entry: &ResourceTiming) -> Option<Cow<'_, ResourceTiming>> {
    let common_in_order = are_in_order(&[
        entry.start_time,
        entry.fetch_start,
        entry.domain_lookup_start,
        entry.domain_lookup_end,
        entry.connect_start,
        entry.connect_end,
        entry.request_start,
        entry.response_start,
        entry.response_end,
    ]);
    if !common_in_order {
        return None;
    }

    if !has_redirection(entry) {
        return Some(Cow::Borrowed(entry));
    }

    let redirect_start = if entry.redirect_start < entry.start_time {
        entry.start_time
    } else {
        entry.redirect_start
    };
    let redirect_end = if entry.redirect_end < entry.start_time {
        entry.fetch_start
    } else {
        entry.redirect_end
    };

    if !are_in_order(&[entry.start_time, redirect_start, redirect_end, entry.fetch_start]) {
        return None;
    }

    if redirect_start == entry.redirect_start && redirect_end == entry.redirect_end {
        return Some(Cow::Borrowed(entry));
    }
    Some(Cow::Owned(ResourceTiming {
        redirect_start,
        redirect_end,
        ..entry.clone()
    }))
}

/// A fetch starting after the entry itself means redirects happened first
#[inline]
pub fn has_redirection(entry: &ResourceTiming) -> bool {
    entry.fetch_start != entry.start_time
}

/// Non-decreasing check
pub fn are_in_order(times: &[RelativeTime]) -> bool {
    times.windows(2).all(|pair| pair[0] <= pair[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lifecycle::RequestType;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    fn request(start: f64, duration: f64) -> RequestCompleteEvent {
        RequestCompleteEvent {
            request_index: 1,
            request_type: RequestType::Fetch,
            method: "GET".to_string(),
            url: "https://api.example/items".to_string(),
            status: 200,
            start_time: RelativeTime(start),
            duration,
        }
    }

    /// Entry with every phase collapsed on its start, the shape of a local fetch
    fn entry(start: f64, duration: f64) -> ResourceTiming {
        let at = RelativeTime(start);
        ResourceTiming {
            name: "https://api.example/items".to_string(),
            initiator_type: "fetch".to_string(),
            start_time: at,
            duration,
            fetch_start: at,
            domain_lookup_start: at,
            domain_lookup_end: at,
            connect_start: at,
            connect_end: at,
            request_start: at,
            response_start: at,
            response_end: at + duration,
            ..ResourceTiming::default()
        }
    }

    #[test]
    fn test_single_nested_candidate() {
        let matched = match_request_timing(&request(0.0, 100.0), &[entry(10.0, 50.0)]);
        assert_eq!(matched, Some(entry(10.0, 50.0)));
    }

    #[test]
    fn test_error_margin() {
        let matched = match_request_timing(&request(10.0, 50.0), &[entry(9.5, 51.0)]);
        assert!(matched.is_some());

        let matched = match_request_timing(&request(10.0, 50.0), &[entry(8.0, 50.0)]);
        assert_eq!(matched, None);
    }

    #[test]
    fn test_preflight_then_request() {
        let preflight = entry(0.0, 20.0);
        let actual = entry(20.0, 30.0);
        let matched = match_request_timing(&request(0.0, 100.0), &[preflight, actual.clone()]);
        assert_eq!(matched, Some(actual));
    }

    #[test]
    fn test_ambiguous_candidates() {
        let overlapping = [entry(0.0, 40.0), entry(20.0, 30.0)];
        assert_eq!(match_request_timing(&request(0.0, 100.0), &overlapping), None);

        let three = [entry(0.0, 10.0), entry(20.0, 10.0), entry(40.0, 10.0)];
        assert_eq!(match_request_timing(&request(0.0, 100.0), &three), None);

        assert_eq!(match_request_timing(&request(0.0, 100.0), &[]), None);
    }

    #[test]
    fn test_invalid_entries_are_not_candidates() {
        let mut cross_origin = entry(10.0, 50.0);
        cross_origin.request_start = RelativeTime::ZERO;
        cross_origin.response_start = RelativeTime::ZERO;
        assert_eq!(match_request_timing(&request(0.0, 100.0), &[cross_origin]), None);
    }

    #[test]
    fn test_redirect_defaults() {
        let mut redirected = entry(10.0, 50.0);
        redirected.fetch_start = RelativeTime(20.0);
        redirected.domain_lookup_start = RelativeTime(20.0);
        redirected.domain_lookup_end = RelativeTime(20.0);
        redirected.connect_start = RelativeTime(20.0);
        redirected.connect_end = RelativeTime(20.0);
        redirected.request_start = RelativeTime(20.0);
        redirected.response_start = RelativeTime(20.0);

        let valid = to_valid_entry(&redirected).expect("redirect defaults apply");
        assert_eq!(valid.redirect_start, RelativeTime(10.0));
        assert_eq!(valid.redirect_end, RelativeTime(20.0));
    }

    proptest! {
        #[test]
        fn prop_match_is_nested_in_request(
            request_start in 0.0f64..1_000.0,
            request_duration in 0.0f64..1_000.0,
            spans in prop::collection::vec((0.0f64..2_000.0, 0.0f64..500.0), 0..4),
        ) {
            let request = request(request_start, request_duration);
            let entries: Vec<ResourceTiming> = spans.iter().map(|(start, duration)| entry(*start, *duration)).collect();

            if let Some(matched) = match_request_timing(&request, &entries) {
                prop_assert!(matched.start_time.millis() >= request_start - REQUEST_MATCHING_ERROR_MARGIN_MS);
                prop_assert!(
                    matched.end_time().millis() <= request_start + request_duration + REQUEST_MATCHING_ERROR_MARGIN_MS
                );
            }
        }

        #[test]
        fn prop_zeroed_phases_never_match(start in 1.0f64..1_000.0, duration in 0.0f64..100.0) {
            let zeroed = ResourceTiming {
                start_time: RelativeTime(start),
                duration,
                ..ResourceTiming::default()
            };
            prop_assert_eq!(match_request_timing(&request(0.0, 2_000.0), &[zeroed]), None);
        }
    }
}
