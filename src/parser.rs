//! Free-text rule editing
//!
//! One rule per line as `key: value`. A leading `#` marks the rule disabled. The text form
//! cannot express a host: rendering is filtered to one host (or all in global mode) and
//! parsing assigns every rule to the host it is given.

use tracing::debug;

use crate::{HostFilter, Rule, RuleSet};

/// Render the rules selected by `filter`, one `key: value` line each
///
/// Disabled rules get a `#` prefix. Inert rules (empty key) are skipped.
///
/// The text form has no escaping. A key entered in the table that starts with `#` or
/// contains `:`, or a key or value containing a line break, renders to text that parses
/// back to a different rule (an enabled key `#X` comes back as a disabled `X`).
#[must_use]
pub fn to_text(rules: &RuleSet, filter: &HostFilter) -> String {
    rules
        .iter()
        .filter(|rule| !rule.is_inert() && rule.matches(filter))
        .map(|rule| {
            let prefix = if rule.enabled { "" } else { "#" };
            format!("{prefix}{}: {}", rule.key, rule.value)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse free text into rules for `host`
///
/// Blank lines and lines without a `:` are dropped.
#[must_use]
pub fn from_text(text: &str, host: &str) -> RuleSet {
    text.lines().filter_map(|line| parse_line(line, host)).collect()
}

/// Parse a single line, splitting on the first `:` only
#[must_use]
pub fn parse_line(line: &str, host: &str) -> Option<Rule> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let (enabled, body) = match line.strip_prefix('#') {
        Some(rest) => (false, rest),
        None => (true, line),
    };

    let Some((key, value)) = body.split_once(':') else {
        debug!(line, "dropping rule line without ':'");
        return None;
    };

    Some(Rule::new(host, key.trim(), value.trim(), enabled))
}
