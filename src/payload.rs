//! Wire types for the injection service
//!
//! `POST {endpoint}/rules` takes a JSON array of [`HostHeaders`]. Each POST is the
//! authoritative replacement of the service's whole rule table.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Header name to header value
pub type HeaderMap = BTreeMap<String, String>;

/// Headers to add to every request for one host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostHeaders {
    pub host: String,
    pub add_headers: HeaderMap,
}

/// Body of a rules POST
pub type RulesRequest = Vec<HostHeaders>;
