use std::collections::BTreeMap;

use crate::{
    HostFilter, RuleSet,
    payload::{HeaderMap, HostHeaders, RulesRequest},
};

/// Enabled headers grouped by host
///
/// Hosts without enabled rules are absent unless added with [`Projection::include_host`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Projection(BTreeMap<String, HeaderMap>);

impl Projection {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn get(&self, host: &str) -> Option<&HeaderMap> {
        self.0.get(host)
    }

    #[must_use]
    pub fn contains_host(&self, host: &str) -> bool {
        self.0.contains_key(host)
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Make sure `host` is present, with an empty header map if it has no enabled rules
    ///
    /// Sending an empty map tells the service to drop the headers it holds for that host.
    pub fn include_host(&mut self, host: &str) {
        self.0.entry(host.to_owned()).or_default();
    }

    /// Request body, one entry per host in host order
    #[must_use]
    pub fn to_request(&self) -> RulesRequest {
        self.0
            .iter()
            .map(|(host, headers)| HostHeaders {
                host: host.clone(),
                add_headers: headers.clone(),
            })
            .collect()
    }
}

/// Project the enabled, non-inert rules selected by `filter`
///
/// Rules are applied in order, so a later rule for the same `(host, key)` wins.
#[must_use]
pub fn project(rules: &RuleSet, filter: &HostFilter) -> Projection {
    let mut hosts = BTreeMap::<String, HeaderMap>::new();
    for rule in rules
        .iter()
        .filter(|rule| rule.enabled && !rule.is_inert() && rule.matches(filter))
    {
        hosts
            .entry(rule.host.clone())
            .or_default()
            .insert(rule.key.clone(), rule.value.clone());
    }
    Projection(hosts)
}
