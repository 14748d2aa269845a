// Integration tests for host projection
use headit_sync::{HostFilter, Rule, RuleSet, project};

mod common;
use common::{headers, host_headers};

/// Test the scoped projection scenario with a disabled rule on another host
#[test]
fn test_scoped_projection() {
    let rules = RuleSet::from(vec![
        Rule::new("example.com", "X-Test", "1", true),
        Rule::new("other.com", "X-Other", "2", false),
    ]);

    let projection = project(&rules, &HostFilter::only("example.com"));
    assert_eq!(projection.len(), 1);
    assert_eq!(projection.get("example.com"), Some(&headers(&[("X-Test", "1")])));
    assert!(!projection.contains_host("other.com"));
}

/// Test that disabled and inert rules never appear for any host
#[test]
fn test_disabled_rules_excluded() {
    let rules = RuleSet::from(vec![
        Rule::new("a.com", "X-Off", "1", false),
        Rule::new("a.com", "", "dangling", true),
        Rule::new("b.com", "X-On", "1", true),
    ]);

    let projection = project(&rules, &HostFilter::All);
    assert!(!projection.contains_host("a.com"));
    assert_eq!(projection.hosts().collect::<Vec<_>>(), vec!["b.com"]);
}

/// Test that the later of two rules with the same host and key wins
#[test]
fn test_later_rule_overwrites() {
    let rules = RuleSet::from(vec![
        Rule::new("a.com", "X-Dup", "first", true),
        Rule::new("a.com", "X-Dup", "second", true),
    ]);

    let projection = project(&rules, &HostFilter::All);
    assert_eq!(projection.get("a.com"), Some(&headers(&[("X-Dup", "second")])));
}

/// Test that forced inclusion adds an empty entry and the request lists every host
#[test]
fn test_include_host_and_request() {
    let rules = RuleSet::from(vec![
        Rule::new("b.com", "X-B", "2", true),
        Rule::new("a.com", "X-A", "1", true),
    ]);

    let mut projection = project(&rules, &HostFilter::All);
    projection.include_host("gone.com");
    projection.include_host("a.com");

    assert_eq!(
        projection.to_request(),
        vec![
            host_headers("a.com", &[("X-A", "1")]),
            host_headers("b.com", &[("X-B", "2")]),
            host_headers("gone.com", &[]),
        ]
    );
}
