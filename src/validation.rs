//! Validation System - Rule/Policy Separation
//!
//! Rules produce structured field violations.
//! Policy: errors block copying, warnings are only reported.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::trace;

use crate::session::SessionState;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
}

/// Session fields that can fail validation, in reporting order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    User,
    Level,
    You,
    YourFirstName,
    Page,
}

impl Field {
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Level => "Level",
            Self::You => "You",
            Self::YourFirstName => "Your first name",
            Self::Page => "Page",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Fields the feature, comment and original post scripts depend on.
pub const SCRIPT_FIELDS: &[Field] =
    &[Field::User, Field::Level, Field::You, Field::YourFirstName, Field::Page];

/// Fields the new-membership script depends on.
pub const NEW_MEMBERSHIP_FIELDS: &[Field] = &[Field::User, Field::You, Field::YourFirstName];

pub const REQUIRED_VALUE: &str = "Required value";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: Field,
    pub severity: ViolationSeverity,
    pub reason: String,
}

impl FieldViolation {
    pub fn error(field: Field, reason: impl Into<String>) -> Self {
        Self { field, severity: ViolationSeverity::Error, reason: reason.into() }
    }

    pub fn warning(field: Field, reason: impl Into<String>) -> Self {
        Self { field, severity: ViolationSeverity::Warning, reason: reason.into() }
    }

    /// `"<Field>: <reason>"`
    pub fn line(&self) -> String {
        format!("{}: {}", self.field, self.reason)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationReport {
    pub violations: Vec<FieldViolation>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    /// True when none of `fields` carries an error.
    pub fn allows(&self, fields: &[Field]) -> bool {
        self.errors_for(fields).next().is_none()
    }

    pub fn errors_for<'a>(
        &'a self,
        fields: &'a [Field],
    ) -> impl Iterator<Item = &'a FieldViolation> + 'a {
        self.violations
            .iter()
            .filter(move |v| v.severity == ViolationSeverity::Error && fields.contains(&v.field))
    }

    /// Error lines for `fields`, each terminated by a newline. This is the
    /// text shown in place of a blocked script.
    pub fn error_text(&self, fields: &[Field]) -> String {
        self.errors_for(fields).map(|v| format!("{}\n", v.line())).collect()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &FieldViolation> {
        self.violations.iter().filter(|v| v.severity == ViolationSeverity::Warning)
    }
}

/// Per-hub user lists keyed by the catalog's hub key (`snap`, `click`,
/// `naturehub`, ...). Hub keys and user names match ignoring case.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ValidationLists {
    #[serde(default)]
    pub disallowed: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub cautioned: BTreeMap<String, Vec<String>>,
}

impl ValidationLists {
    pub fn is_disallowed(&self, hub_key: &str, user_name: &str) -> bool {
        Self::contains(&self.disallowed, hub_key, user_name)
    }

    pub fn is_cautioned(&self, hub_key: &str, user_name: &str) -> bool {
        Self::contains(&self.cautioned, hub_key, user_name)
    }

    fn contains(lists: &BTreeMap<String, Vec<String>>, hub_key: &str, user_name: &str) -> bool {
        let needle = user_name.to_lowercase();
        lists
            .iter()
            .filter(|(key, _)| key.eq_ignore_ascii_case(hub_key))
            .any(|(_, names)| names.iter().any(|n| n.to_lowercase() == needle))
    }
}

/// Validation rule trait - produces violations
pub trait FieldRule {
    fn name(&self) -> &'static str;
    fn validate(&self, state: &SessionState, lists: &ValidationLists) -> Vec<FieldViolation>;
}

/// Shared shape check for user aliases (the featured user and the curator).
fn alias_violation(field: Field, alias: &str) -> Option<FieldViolation> {
    if alias.is_empty() {
        Some(FieldViolation::error(field, REQUIRED_VALUE))
    } else if alias.starts_with('@') {
        Some(FieldViolation::error(field, "Don't include the '@' in user names"))
    } else if alias.chars().any(char::is_whitespace) {
        Some(FieldViolation::error(field, "User names cannot contain spaces"))
    } else {
        None
    }
}

// --- Concrete Rules ---

pub struct UserNameRule;

impl FieldRule for UserNameRule {
    fn name(&self) -> &'static str { "user_name" }

    fn validate(&self, state: &SessionState, lists: &ValidationLists) -> Vec<FieldViolation> {
        if let Some(violation) = alias_violation(Field::User, &state.user_name) {
            return vec![violation];
        }
        if lists.is_disallowed(state.hub_key(), &state.user_name) {
            return vec![FieldViolation::error(Field::User, "User is on the disallow list")];
        }
        if lists.is_cautioned(state.hub_key(), &state.user_name) {
            return vec![FieldViolation::warning(Field::User, "User is on the caution list")];
        }
        vec![]
    }
}

pub struct MembershipRule;

impl FieldRule for MembershipRule {
    fn name(&self) -> &'static str { "membership" }

    fn validate(&self, state: &SessionState, _lists: &ValidationLists) -> Vec<FieldViolation> {
        if state.membership.is_none() {
            vec![FieldViolation::error(Field::Level, REQUIRED_VALUE)]
        } else {
            vec![]
        }
    }
}

pub struct CuratorRule;

impl FieldRule for CuratorRule {
    fn name(&self) -> &'static str { "curator" }

    fn validate(&self, state: &SessionState, _lists: &ValidationLists) -> Vec<FieldViolation> {
        let mut violations: Vec<_> =
            alias_violation(Field::You, &state.your_name).into_iter().collect();
        if state.your_first_name.trim().is_empty() {
            violations.push(FieldViolation::error(Field::YourFirstName, REQUIRED_VALUE));
        }
        violations
    }
}

pub struct PageRule;

impl FieldRule for PageRule {
    fn name(&self) -> &'static str { "page" }

    fn validate(&self, state: &SessionState, _lists: &ValidationLists) -> Vec<FieldViolation> {
        match state.page_id.as_deref() {
            Some(id) if !id.is_empty() => vec![],
            _ => vec![FieldViolation::error(Field::Page, REQUIRED_VALUE)],
        }
    }
}

/// Validator runs every rule in field order and collects the report
pub struct Validator {
    rules: Vec<Box<dyn FieldRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self {
            rules: vec![
                Box::new(UserNameRule),
                Box::new(MembershipRule),
                Box::new(CuratorRule),
                Box::new(PageRule),
            ],
        }
    }

    pub fn validate(&self, state: &SessionState, lists: &ValidationLists) -> ValidationReport {
        let violations = self
            .rules
            .iter()
            .flat_map(|rule| {
                let found = rule.validate(state, lists);
                if !found.is_empty() {
                    trace!(rule = rule.name(), count = found.len(), "Rule reported violations");
                }
                found
            })
            .collect();
        ValidationReport { violations }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{Hub, Membership, SnapMembership};

    fn valid_state() -> SessionState {
        let mut state = SessionState::for_hub(Hub::Snap);
        state.page_id = Some("snap:examplepage".into());
        state.user_name = "ann".into();
        state.membership = Membership::Snap(SnapMembership::Member);
        state.your_name = "bob".into();
        state.your_first_name = "Bob".into();
        state
    }

    #[test]
    fn test_valid_state_passes() {
        let report = Validator::new().validate(&valid_state(), &ValidationLists::default());
        assert!(report.violations.is_empty());
        assert!(report.allows(SCRIPT_FIELDS));
    }

    #[test]
    fn test_required_lines_in_field_order() {
        let mut state = SessionState::for_hub(Hub::Snap);
        state.page_id = Some("snap:examplepage".into());
        let report = Validator::new().validate(&state, &ValidationLists::default());
        assert_eq!(
            report.error_text(SCRIPT_FIELDS),
            "User: Required value\nLevel: Required value\nYou: Required value\n\
             Your first name: Required value\n"
        );
        assert_eq!(
            report.error_text(NEW_MEMBERSHIP_FIELDS),
            "User: Required value\nYou: Required value\nYour first name: Required value\n"
        );
    }

    #[test]
    fn test_malformed_alias() {
        let mut state = valid_state();
        state.user_name = "@ann".into();
        state.your_name = "bob smith".into();
        let report = Validator::new().validate(&state, &ValidationLists::default());
        assert_eq!(
            report.error_text(SCRIPT_FIELDS),
            "User: Don't include the '@' in user names\nYou: User names cannot contain spaces\n"
        );
    }

    #[test]
    fn test_disallow_blocks_caution_warns() {
        let mut lists = ValidationLists::default();
        lists.disallowed.insert("snap".into(), vec!["Spammer".into()]);
        lists.cautioned.insert("snap".into(), vec!["ann".into()]);

        let report = Validator::new().validate(&valid_state(), &lists);
        assert!(!report.has_errors());
        assert_eq!(report.warnings().count(), 1);

        let mut state = valid_state();
        state.user_name = "spammer".into();
        let report = Validator::new().validate(&state, &lists);
        assert!(!report.allows(SCRIPT_FIELDS));
        assert_eq!(report.error_text(SCRIPT_FIELDS), "User: User is on the disallow list\n");
    }

    #[test]
    fn test_lists_are_per_hub() {
        let mut lists = ValidationLists::default();
        lists.disallowed.insert("click".into(), vec!["ann".into()]);
        let report = Validator::new().validate(&valid_state(), &lists);
        assert!(!report.has_errors());
    }

    #[test]
    fn test_lists_use_catalog_hub_key() {
        let mut lists = ValidationLists::default();
        lists.disallowed.insert("NatureHub".into(), vec!["spammer".into()]);

        let mut state = valid_state();
        state.page_id = Some("naturehub:birds".into());
        state.hub = Hub::Other;
        state.membership = Membership::default_for(Hub::Other);
        state.user_name = "spammer".into();
        let report = Validator::new().validate(&state, &lists);
        assert_eq!(report.errors_for(&[Field::User]).count(), 1);

        // Another hub of the same family has its own lists.
        state.page_id = Some("cityhub:streets".into());
        let report = Validator::new().validate(&state, &lists);
        assert_eq!(report.errors_for(&[Field::User]).count(), 0);
    }
}
