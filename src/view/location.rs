/*!
 * View Location
 * URL snapshot and the "is this a new view" predicate
 */

use crate::core::errors::LocationError;
use crate::host::HostEnvironment;
use serde::{Deserialize, Serialize};
use url::Url;

/// Location of a view at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewLocation {
    pub href: String,
    pub pathname: String,
    /// Query string including the leading `?`, empty when absent
    pub search: String,
    /// Fragment including the leading `#`, empty when absent
    pub hash: String,
}

impl ViewLocation {
    pub fn parse(href: &str) -> Result<Self, LocationError> {
        let url = Url::parse(href).map_err(|e| LocationError::Unparsable {
            href: href.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            href: url.as_str().to_string(),
            pathname: url.path().to_string(),
            search: url.query().map(|query| format!("?{query}")).unwrap_or_default(),
            hash: url.fragment().map(|fragment| format!("#{fragment}")).unwrap_or_default(),
        })
    }
}

/// Whether moving from `current` to `other` starts a new view
///
/// A path change always does. A hash change does unless the new hash targets an
/// element of the page (anchor navigation) or only its query part changed.
pub fn are_different_location(current: &ViewLocation, other: &ViewLocation, host: &dyn HostEnvironment) -> bool {
    current.pathname != other.pathname
        || (!is_hash_an_anchor(&other.hash, host) && path_from_hash(&other.hash) != path_from_hash(&current.hash))
}

fn is_hash_an_anchor(hash: &str, host: &dyn HostEnvironment) -> bool {
    let id = hash.strip_prefix('#').unwrap_or(hash);
    host.element_exists(id)
}

fn path_from_hash(hash: &str) -> &str {
    match hash.find('?') {
        Some(index) => &hash[..index],
        None => hash,
    }
}
