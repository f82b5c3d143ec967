/*!
 * Matcher Module
 * Request to timing entry correlation
 */

mod timing;

pub use timing::{are_in_order, has_redirection, is_valid_entry, match_request_timing, to_valid_entry};
