//! Textual rewriting of database snapshots.
//!
//! A [`RuleSet`] is an ordered list of literal `(from, to)` substitutions.
//! Each rule sees the output of the rules before it, so order is part of the
//! contract: rules are authored least-specific first, e.g.
//!
//! ```text
//! domain.example       -> domain.test
//! https://domain.test  -> http://domain.test
//! ```
//!
//! Every rule whose `from` contains a `/` is also applied to the two escaped
//! spellings that show up in dumps:
//!
//! - `\/` (slashes escaped once, JSON embedded in a column)
//! - `\\/` (slashes escaped twice, JSON inside an SQL string literal)
//!
//! Running a migration in reverse must invert the pairs *and* the order of the
//! whole list (see [`RuleSet::reversed`]). Inverting only the pairs lets the
//! less-specific inverse rule destroy the text the more-specific inverse rule
//! needs to match.
//!
//! Rules whose `to` is another rule's `from` chain into each other. That is
//! deliberate and user-controlled through ordering.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::direction::MigrationDirection;
use crate::error::{MigrateResult, MigrationError};

/// Slash escaped once, as in JSON.
const SINGLE_ESCAPED_SLASH: &str = r"\/";

/// Slash escaped twice, as in JSON stored inside an SQL string literal.
const DOUBLE_ESCAPED_SLASH: &str = r"\\/";

/// A single literal substitution.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplacementRule {
    /// Text to search for.
    pub from: String,
    /// Replacement text.
    pub to: String,
}

impl ReplacementRule {
    /// Create a new rule.
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// The same rule with `from` and `to` swapped.
    pub fn inverted(&self) -> Self {
        Self {
            from: self.to.clone(),
            to: self.from.clone(),
        }
    }

    /// Check if applying this rule can never change any text.
    pub fn is_identity(&self) -> bool {
        self.from == self.to
    }

    /// Apply this rule, plus its escaped-slash variants, to `text`.
    pub fn apply_to(&self, text: &mut String) {
        if self.is_identity() {
            return;
        }

        replace_all(text, &self.from, &self.to);

        // Without a slash the escaped variants equal the literal rule.
        if !self.from.contains('/') {
            return;
        }

        for escaped in [SINGLE_ESCAPED_SLASH, DOUBLE_ESCAPED_SLASH] {
            let from = self.from.replace('/', escaped);
            let to = self.to.replace('/', escaped);
            replace_all(text, &from, &to);
        }
    }
}

fn replace_all(text: &mut String, from: &str, to: &str) {
    if text.contains(from) {
        *text = text.replace(from, to);
    }
}

/// Apply `rules` in order to `text`.
///
/// Pure and total. `rules` are not validated here; an empty `from` is rejected
/// by [`RuleSet::new`] before a run starts.
pub fn apply_replacements(text: &str, rules: &[ReplacementRule]) -> String {
    let mut output = text.to_string();
    for rule in rules {
        if rule.from.is_empty() {
            continue;
        }
        rule.apply_to(&mut output);
    }
    output
}

/// An ordered, validated list of replacement rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<ReplacementRule>,
}

impl RuleSet {
    /// Create a rule set, rejecting rules with an empty `from` pattern.
    pub fn new(rules: impl IntoIterator<Item = ReplacementRule>) -> MigrateResult<Self> {
        let rules: Vec<_> = rules.into_iter().collect();

        if let Some(index) = rules.iter().position(|r| r.from.is_empty()) {
            return Err(MigrationError::configuration(format!(
                "replacement rule #{} has an empty 'from' pattern",
                index + 1
            )));
        }

        Ok(Self { rules })
    }

    /// A rule set that leaves text unchanged.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if there are no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The rules in application order.
    pub fn rules(&self) -> &[ReplacementRule] {
        &self.rules
    }

    /// Iterate over the rules in application order.
    pub fn iter(&self) -> std::slice::Iter<'_, ReplacementRule> {
        self.rules.iter()
    }

    /// The inverse rule set: every pair swapped and the sequence reversed.
    pub fn reversed(&self) -> Self {
        Self {
            rules: self.rules.iter().rev().map(ReplacementRule::inverted).collect(),
        }
    }

    /// The rules to apply when migrating in `direction`.
    pub fn for_direction(&self, direction: MigrationDirection) -> Cow<'_, Self> {
        match direction {
            MigrationDirection::Forward => Cow::Borrowed(self),
            MigrationDirection::Reverse => Cow::Owned(self.reversed()),
        }
    }

    /// Apply the rules in order.
    pub fn apply(&self, text: &str) -> String {
        apply_replacements(text, &self.rules)
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a ReplacementRule;
    type IntoIter = std::slice::Iter<'a, ReplacementRule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn rules(pairs: &[(&str, &str)]) -> RuleSet {
        RuleSet::new(pairs.iter().map(|(f, t)| ReplacementRule::new(*f, *t))).unwrap()
    }

    #[test]
    fn test_single_replacement() {
        let set = rules(&[("example.com", "localhost")]);
        assert_eq!(
            set.apply("INSERT INTO users VALUES ('http://example.com');"),
            "INSERT INTO users VALUES ('http://localhost');"
        );
    }

    #[test]
    fn test_multiple_replacements() {
        let set = rules(&[("example.com", "localhost"), ("/var/www/html", "/app")]);
        assert_eq!(
            set.apply("INSERT INTO users VALUES ('http://example.com', '/var/www/html');"),
            "INSERT INTO users VALUES ('http://localhost', '/app');"
        );
    }

    #[test]
    fn test_empty_rule_set_is_noop() {
        let text = "INSERT INTO users VALUES ('http://example.com');";
        assert_eq!(RuleSet::empty().apply(text), text);
        assert_eq!(RuleSet::empty().apply(""), "");
    }

    #[test]
    fn test_identity_rule_is_noop() {
        let set = rules(&[("https://a.com", "https://a.com")]);
        let text = r#"a "https://a.com" b "https:\/\/a.com" c "https:\\/\\/a.com""#;
        assert_eq!(set.apply(text), text);
    }

    #[test]
    fn test_empty_from_rejected() {
        let err = RuleSet::new([
            ReplacementRule::new("a.com", "a.test"),
            ReplacementRule::new("", "x"),
        ])
        .unwrap_err();
        assert!(matches!(err, MigrationError::Configuration(_)));
        assert!(err.to_string().contains("#2"));
    }

    #[test]
    fn test_single_escaped_variant() {
        let set = rules(&[("https://a.com", "http://a.test")]);
        assert_eq!(
            set.apply(r#"{"url":"https:\/\/a.com\/page"}"#),
            r#"{"url":"http:\/\/a.test\/page"}"#
        );
    }

    #[test]
    fn test_double_escaped_variant() {
        let set = rules(&[("https://a.com", "http://a.test")]);
        assert_eq!(
            set.apply(r#"Some content "https:\\/\\/a.com" end"#),
            r#"Some content "http:\\/\\/a.test" end"#
        );
    }

    #[test]
    fn test_all_spellings_in_one_dump() {
        let set = rules(&[("/home/host/public_html", "/home/user/www/project")]);
        let dump = r#"'/home/host/public_html' '\/home\/host\/public_html' '\\/home\\/host\\/public_html'"#;
        assert_eq!(
            set.apply(dump),
            r#"'/home/user/www/project' '\/home\/user\/www\/project' '\\/home\\/user\\/www\\/project'"#
        );
    }

    #[test]
    fn test_rule_without_slash_skips_variants() {
        // `\/` in the text must survive a slash-free rule untouched.
        let set = rules(&[("a.com", "a.test")]);
        assert_eq!(set.apply(r"https:\/\/a.com"), r"https:\/\/a.test");
    }

    #[test]
    fn test_rules_see_previous_output() {
        let set = rules(&[("a", "b"), ("b", "c")]);
        assert_eq!(set.apply("a"), "c");

        let set = rules(&[("b", "c"), ("a", "b")]);
        assert_eq!(set.apply("a"), "b");
    }

    #[test]
    fn test_non_overlapping_replacement() {
        let set = rules(&[("aa", "b")]);
        assert_eq!(set.apply("aaa"), "ba");
    }

    #[test]
    fn test_reversed_swaps_and_reverses() {
        let set = rules(&[("one", "1"), ("two", "2"), ("three", "3")]);
        let reversed = set.reversed();
        assert_eq!(
            reversed.rules(),
            &[
                ReplacementRule::new("3", "three"),
                ReplacementRule::new("2", "two"),
                ReplacementRule::new("1", "one"),
            ]
        );
        assert_eq!(reversed.reversed(), set);
    }

    #[test]
    fn test_for_direction() {
        let set = rules(&[("a.com", "a.test"), ("https://a.test", "http://a.test")]);
        assert_eq!(set.for_direction(MigrationDirection::Forward).as_ref(), &set);
        assert_eq!(
            set.for_direction(MigrationDirection::Reverse).into_owned(),
            set.reversed()
        );
    }

    #[test]
    fn test_reverse_round_trip() {
        let set = rules(&[
            ("domain.example", "domain.test"),
            ("https://domain.test", "http://domain.test"),
        ]);

        let forward = set.apply("https://domain.example");
        assert_eq!(forward, "http://domain.test");

        let back = set.reversed().apply(&forward);
        assert_eq!(back, "https://domain.example");
    }

    #[test]
    fn test_swapping_pairs_only_is_lossy() {
        let set = rules(&[
            ("domain.example", "domain.test"),
            ("https://domain.test", "http://domain.test"),
        ]);
        let swapped_only = RuleSet::new(set.iter().map(ReplacementRule::inverted)).unwrap();

        let back = swapped_only.apply("http://domain.test");
        assert_eq!(back, "http://domain.example");
    }

    #[test]
    fn test_apply_replacements_skips_empty_from() {
        let raw = [ReplacementRule::new("", "x"), ReplacementRule::new("a", "b")];
        assert_eq!(apply_replacements("aa", &raw), "bb");
    }
}
