/*!
 * Resource Utilities
 * Resource kind, duration, size and phase breakdown from timing entries
 */

use super::raw::{PhaseTiming, ResourceDetails, ResourceKind};
use crate::core::config::Configuration;
use crate::core::types::{RelativeTime, ServerDuration};
use crate::lifecycle::ResourceTiming;
use crate::matcher::{are_in_order, has_redirection, to_valid_entry};
use url::Url;

const IMAGE_EXTENSIONS: &[&str] = &["gif", "jpg", "jpeg", "tiff", "png", "svg", "ico"];
const FONT_EXTENSIONS: &[&str] = &["woff", "eot", "woff2", "ttf"];
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm"];

/// Classify a resource from its initiator and URL path
pub fn compute_resource_kind(timing: &ResourceTiming) -> ResourceKind {
    let Ok(url) = Url::parse(&timing.name) else {
        return ResourceKind::Other;
    };
    let path = url.path().to_ascii_lowercase();
    let initiator = timing.initiator_type.as_str();
    let has_extension = |extensions: &[&str]| {
        path.rsplit_once('.')
            .map(|(_, extension)| extensions.contains(&extension))
            .unwrap_or(false)
    };

    match initiator {
        "initial_document" => ResourceKind::Document,
        "xmlhttprequest" => ResourceKind::Xhr,
        "fetch" => ResourceKind::Fetch,
        "beacon" => ResourceKind::Beacon,
        _ if path.ends_with(".css") => ResourceKind::Css,
        _ if path.ends_with(".js") => ResourceKind::Js,
        "image" | "img" | "icon" => ResourceKind::Image,
        _ if has_extension(IMAGE_EXTENSIONS) => ResourceKind::Image,
        _ if has_extension(FONT_EXTENSIONS) => ResourceKind::Font,
        "audio" | "video" => ResourceKind::Media,
        _ if has_extension(MEDIA_EXTENSIONS) => ResourceKind::Media,
        _ => ResourceKind::Other,
    }
}

/// Entries produced by instrumented requests, collected through request completion instead
pub fn is_request_kind(timing: &ResourceTiming) -> bool {
    timing.initiator_type == "xmlhttprequest" || timing.initiator_type == "fetch"
}

/// Whether a URL may be collected as a resource
pub fn is_allowed_request_url(config: &Configuration, url: &str) -> bool {
    !url.is_empty() && !config.is_intake_url(url) && !url.starts_with("data:")
}

/// Entry duration, falling back to the response end for zero-duration entries
pub fn compute_duration(timing: &ResourceTiming) -> ServerDuration {
    if timing.duration == 0.0 && timing.start_time < timing.response_end {
        return ServerDuration::from_millis(timing.response_end - timing.start_time);
    }
    ServerDuration::from_millis(timing.duration)
}

/// Decoded body size, when a request actually happened
pub fn compute_size(timing: &ResourceTiming) -> Option<u64> {
    if timing.start_time < timing.response_start {
        timing.decoded_body_size
    } else {
        None
    }
}

/// Phase breakdown; `None` for entries with inconsistent or hidden phases
pub fn compute_details(timing: &ResourceTiming) -> Option<ResourceDetails> {
    let entry = to_valid_entry(timing)?;
    let origin = entry.start_time;

    let mut details = ResourceDetails {
        download: Some(format_timing(origin, entry.response_start, entry.response_end)),
        first_byte: Some(format_timing(origin, entry.request_start, entry.response_start)),
        ..ResourceDetails::default()
    };

    if entry.connect_end != entry.fetch_start {
        details.connect = Some(format_timing(origin, entry.connect_start, entry.connect_end));
        if are_in_order(&[entry.connect_start, entry.secure_connection_start, entry.connect_end]) {
            details.ssl = Some(format_timing(origin, entry.secure_connection_start, entry.connect_end));
        }
    }

    if entry.domain_lookup_end != entry.fetch_start {
        details.dns = Some(format_timing(origin, entry.domain_lookup_start, entry.domain_lookup_end));
    }

    if has_redirection(&entry) {
        details.redirect = Some(format_timing(origin, entry.redirect_start, entry.redirect_end));
    }

    Some(details)
}

fn format_timing(origin: RelativeTime, start: RelativeTime, end: RelativeTime) -> PhaseTiming {
    PhaseTiming {
        duration: ServerDuration::from_millis(end - start),
        start: ServerDuration::from_millis(start - origin),
    }
}
