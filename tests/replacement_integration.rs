//! Integration tests for replacement rules.
//!
//! These tests run realistic dumps through rule sets in both directions.

use dsync::migrate::{MigrationDirection, ReplacementRule, RuleSet};
use pretty_assertions::assert_eq;

fn site_rules() -> RuleSet {
    RuleSet::new([
        ReplacementRule::new("https://www.shop.example.com", "http://shop.test"),
        ReplacementRule::new("/var/www/shop", "/app"),
        ReplacementRule::new("@shop.example.com", "@shop.test"),
    ])
    .expect("valid rules")
}

/// Forward run rewrites plain and JSON-escaped URLs alike
#[test]
fn test_forward_rewrites_escaped_urls() {
    let dump = r#"INSERT INTO `options` VALUES (1,'siteurl','https://www.shop.example.com'),(2,'widget','{"url":"https:\/\/www.shop.example.com\/cart"}'),(3,'upload_path','/var/www/shop/uploads');"#;

    let rules = site_rules();
    let output = rules.for_direction(MigrationDirection::Forward).apply(dump);

    assert_eq!(
        output,
        r#"INSERT INTO `options` VALUES (1,'siteurl','http://shop.test'),(2,'widget','{"url":"http:\/\/shop.test\/cart"}'),(3,'upload_path','/app/uploads');"#
    );
}

/// Serialized PHP arrays escape slashes twice
#[test]
fn test_forward_rewrites_double_escaped_urls() {
    let dump = r#"'{\"home\":\"https:\\/\\/www.shop.example.com\"}'"#;
    let output = site_rules().apply(dump);
    assert_eq!(output, r#"'{\"home\":\"http:\\/\\/shop.test\"}'"#);
}

/// Forward then reverse restores the original text
#[test]
fn test_round_trip() {
    let dump = "INSERT INTO posts VALUES (1,'See https://www.shop.example.com and mail@shop.example.com','/var/www/shop/a.png');";

    let rules = site_rules();
    let pulled = rules.for_direction(MigrationDirection::Forward).apply(dump);
    let pushed = rules.for_direction(MigrationDirection::Reverse).apply(&pulled);

    assert_eq!(pushed, dump);
}

/// Reverse runs the inverted rules last to first
#[test]
fn test_reverse_applies_rules_last_first() {
    let rules = site_rules();
    let reversed = rules.reversed();
    let froms: Vec<_> = reversed.iter().map(|r| r.from.as_str()).collect();

    assert_eq!(froms, vec!["@shop.test", "/app", "http://shop.test"]);
}

/// An empty pattern is rejected up front
#[test]
fn test_empty_pattern_rejected() {
    let err = RuleSet::new([
        ReplacementRule::new("a", "b"),
        ReplacementRule::new("", "c"),
    ])
    .unwrap_err();

    assert!(err.to_string().contains("#2"));
}
