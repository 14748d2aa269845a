use serde::{Deserialize, Serialize};

use crate::validation::{deserialize_lenient_bool, deserialize_nullable_string};

/// One header-override directive
///
/// `host` is empty for rules created in global mode, meaning the rule applies everywhere.
/// A rule whose `key` is empty is inert: it is persisted (it may be mid-edit) but never
/// projected or rendered as text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub host: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub key: String,
    #[serde(default, deserialize_with = "deserialize_nullable_string")]
    pub value: String,
    #[serde(default, deserialize_with = "deserialize_lenient_bool")]
    pub enabled: bool,
}

impl Rule {
    pub fn new(
        host: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        enabled: bool,
    ) -> Self {
        Self {
            host: host.into(),
            key: key.into(),
            value: value.into(),
            enabled,
        }
    }

    /// Rules without a header name never reach the injection service
    #[must_use]
    pub fn is_inert(&self) -> bool {
        self.key.is_empty()
    }

    #[must_use]
    pub fn matches(&self, filter: &HostFilter) -> bool {
        match filter {
            HostFilter::All => true,
            HostFilter::Only(host) => self.host == *host,
        }
    }
}

/// Which rules an operation looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum HostFilter {
    /// Every rule regardless of host (global mode, and the synchronized payload)
    #[default]
    All,
    /// Only rules targeting exactly this host
    Only(String),
}

impl HostFilter {
    pub fn only(host: impl Into<String>) -> Self {
        Self::Only(host.into())
    }
}

/// Ordered rule collection
///
/// Insertion order drives row order in the editor and is preserved through storage.
/// `(host, key)` pairs are not required to be unique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleSet(Vec<Rule>);

impl RuleSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.0.iter()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Rule> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Rule> {
        self.0.get_mut(index)
    }

    pub fn push(&mut self, rule: Rule) {
        self.0.push(rule);
    }

    /// Remove the rule at `index`, returning it when the index was valid
    pub fn remove(&mut self, index: usize) -> Option<Rule> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        for rule in &mut self.0 {
            rule.enabled = enabled;
        }
    }

    /// Replace every rule selected by `filter` with `replacement`
    ///
    /// Rules outside the filter keep their relative order; the replacement rules are
    /// appended after them in their own order.
    pub fn replace_matching(&mut self, filter: &HostFilter, replacement: RuleSet) {
        self.0.retain(|rule| !rule.matches(filter));
        self.0.extend(replacement.0);
    }

    /// Rules selected by `filter`, paired with their index in the full set
    pub fn enumerate_matching<'a>(
        &'a self,
        filter: &HostFilter,
    ) -> impl Iterator<Item = (usize, &'a Rule)> {
        self.0
            .iter()
            .enumerate()
            .filter(move |(_, rule)| rule.matches(filter))
    }
}

impl From<Vec<Rule>> for RuleSet {
    fn from(rules: Vec<Rule>) -> Self {
        Self(rules)
    }
}

impl FromIterator<Rule> for RuleSet {
    fn from_iter<I: IntoIterator<Item = Rule>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for RuleSet {
    type Item = Rule;
    type IntoIter = std::vec::IntoIter<Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
