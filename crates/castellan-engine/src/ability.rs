//! The ability: an in-memory authorization decision function
//!
//! An ability is derived, never persisted — built fresh per authentication
//! from the principal's surviving permissions and queried for the lifetime
//! of a single request.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sentinel subject for rules that are not scoped to any subject
pub const ALL_SUBJECT: &str = "all";

/// One authorization rule registered into an ability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbilityRule {
    /// Action id the rule grants
    pub action: String,
    /// Subject uid, or the `"all"` sentinel
    pub subject: String,
    /// Permitted field patterns; `None` means no field restriction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    /// Rendered `$and`/`$or` filter contributed by conditions, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<Value>,
}

/// A principal's authorization decision function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ability {
    rules: Vec<AbilityRule>,
    grant_all: bool,
}

impl Ability {
    /// Build an ability from registered rules
    pub fn new(rules: Vec<AbilityRule>) -> Self {
        Self {
            rules,
            grant_all: false,
        }
    }

    /// The super admin bypass: every query answers true, no rules
    pub fn grant_all() -> Self {
        Self {
            rules: Vec::new(),
            grant_all: true,
        }
    }

    /// Whether this ability is the super admin bypass
    pub fn is_grant_all(&self) -> bool {
        self.grant_all
    }

    /// The registered rules
    pub fn rules(&self) -> &[AbilityRule] {
        &self.rules
    }

    fn matching_rules<'a>(
        &'a self,
        action: &'a str,
        subject: &'a str,
    ) -> impl Iterator<Item = &'a AbilityRule> {
        self.rules.iter().filter(move |rule| {
            rule.action == action && (rule.subject == ALL_SUBJECT || rule.subject == subject)
        })
    }

    /// Whether the principal may perform `action` on `subject` (and
    /// optionally a specific `field`).
    ///
    /// Conditional rules answer affirmatively here; their filter applies
    /// downstream when the query is executed.
    pub fn can(&self, action: &str, subject: Option<&str>, field: Option<&str>) -> bool {
        if self.grant_all {
            return true;
        }
        let subject = subject.unwrap_or(ALL_SUBJECT);
        self.matching_rules(action, subject).any(|rule| match field {
            None => true,
            Some(field) => match &rule.fields {
                None => true,
                Some(patterns) => patterns.iter().any(|pattern| field_matches(pattern, field)),
            },
        })
    }

    /// The union of declared field patterns across every rule matching
    /// `(action, subject)`.
    ///
    /// `None` means no matching rule declares a restriction: all fields are
    /// allowed. This is deliberately asymmetric with the engine's
    /// empty-fields veto — omitting `fields` grants everything, while an
    /// explicit `fields: []` grants nothing (and never reaches the ability).
    pub fn permitted_fields(&self, action: &str, subject: Option<&str>) -> Option<Vec<String>> {
        if self.grant_all {
            return None;
        }
        let subject = subject.unwrap_or(ALL_SUBJECT);
        let mut declared = false;
        let mut union: Vec<String> = Vec::new();
        for rule in self.matching_rules(action, subject) {
            if let Some(fields) = &rule.fields {
                declared = true;
                for field in fields {
                    if !union.contains(field) {
                        union.push(field.clone());
                    }
                }
            }
        }
        declared.then_some(union)
    }
}

/// Match a dotted field path against a pattern.
///
/// `**` matches one or more segments, `*` matches exactly one, anything
/// else matches its segment literally.
pub(crate) fn field_matches(pattern: &str, field: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let field: Vec<&str> = field.split('.').collect();
    segments_match(&pattern, &field)
}

fn segments_match(pattern: &[&str], field: &[&str]) -> bool {
    let Some((head, rest)) = pattern.split_first() else {
        return field.is_empty();
    };
    match *head {
        "**" => (1..=field.len()).any(|consumed| segments_match(rest, &field[consumed..])),
        "*" => field
            .split_first()
            .is_some_and(|(_, tail)| segments_match(rest, tail)),
        literal => field
            .split_first()
            .is_some_and(|(first, tail)| *first == literal && segments_match(rest, tail)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rule(action: &str, subject: &str, fields: Option<Vec<&str>>) -> AbilityRule {
        AbilityRule {
            action: action.to_string(),
            subject: subject.to_string(),
            fields: fields.map(|fields| fields.into_iter().map(str::to_string).collect()),
            condition: None,
        }
    }

    #[test]
    fn field_patterns() {
        assert!(field_matches("title", "title"));
        assert!(!field_matches("title", "body"));
        assert!(field_matches("*", "title"));
        assert!(!field_matches("*", "seo.title"));
        assert!(field_matches("**", "title"));
        assert!(field_matches("**", "seo.meta.title"));
        assert!(field_matches("seo.*", "seo.title"));
        assert!(!field_matches("seo.*", "seo.meta.title"));
        assert!(field_matches("seo.**", "seo.meta.title"));
        assert!(!field_matches("seo.**", "seo"));
    }

    #[test]
    fn can_defaults_missing_subjects_to_the_sentinel() {
        let ability = Ability::new(vec![rule("api::read", ALL_SUBJECT, None)]);
        assert!(ability.can("api::read", None, None));
        assert!(ability.can("api::read", Some("api::article.article"), None));
        assert!(!ability.can("api::write", None, None));
    }

    #[test]
    fn can_restricts_fields_per_rule() {
        let ability = Ability::new(vec![rule(
            "api::read",
            "api::user.user",
            Some(vec!["title"]),
        )]);
        assert!(ability.can("api::read", Some("api::user.user"), Some("title")));
        assert!(!ability.can("api::read", Some("api::user.user"), Some("firstname")));
        // No field asked: the action/subject grant is enough.
        assert!(ability.can("api::read", Some("api::user.user"), None));
    }

    #[test]
    fn permitted_fields_unions_across_matching_rules() {
        let ability = Ability::new(vec![
            rule("api::read", "api::article.article", Some(vec!["title"])),
            rule("api::read", "api::article.article", Some(vec!["body", "title"])),
            rule("api::write", "api::article.article", Some(vec!["secret"])),
        ]);
        assert_eq!(
            ability.permitted_fields("api::read", Some("api::article.article")),
            Some(vec!["title".to_string(), "body".to_string()])
        );
    }

    #[test]
    fn absent_fields_restriction_allows_all_fields() {
        let ability = Ability::new(vec![rule("api::read", "api::article.article", None)]);
        assert_eq!(
            ability.permitted_fields("api::read", Some("api::article.article")),
            None
        );
        assert!(ability.can("api::read", Some("api::article.article"), Some("anything")));
    }

    #[test]
    fn grant_all_answers_every_query() {
        let ability = Ability::grant_all();
        assert!(ability.can("api::anything", Some("api::whatever"), Some("field")));
        assert!(ability.rules().is_empty());
        assert_eq!(ability.permitted_fields("api::anything", None), None);
    }

    #[test]
    fn rules_serialize_with_rendered_conditions() {
        let mut conditional = rule("api::read", ALL_SUBJECT, None);
        conditional.condition = Some(json!({ "$and": [{ "$or": [{ "created_by": 1 }] }] }));
        let ability = Ability::new(vec![conditional]);
        let serialized = serde_json::to_value(&ability).unwrap();
        assert_eq!(
            serialized["rules"][0]["condition"]["$and"][0]["$or"][0]["created_by"],
            json!(1)
        );
    }
}
