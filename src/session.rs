//! Session - Caller-Owned State
//!
//! Everything the engine reads per call lives here: the session fields, the
//! per-kind placeholder maps and the per-hub user lists. Setters clear the
//! placeholder maps whenever a value that shapes the generated text changes.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::catalog::PageId;
use crate::hub::{Hub, Membership, NewMembershipCase, StaffLevel};
use crate::placeholders::{PlaceholderMap, PlaceholderStore};
use crate::resolver::{ModifierFlags, ScriptKind};
use crate::tokens::ManualFamily;
use crate::validation::ValidationLists;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("Membership '{label}' is not valid for hub {hub}")]
    InvalidMembership { hub: Hub, label: String },

    #[error("Staff level '{label}' is not valid for hub {hub}")]
    InvalidStaffLevel { hub: Hub, label: String },

    #[error("New membership '{label}' is not valid for hub {hub}")]
    InvalidNewMembership { hub: Hub, label: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub page_id: Option<PageId>,
    /// Hub family of the selected page; `Other` before a page is chosen.
    pub hub: Hub,
    pub user_name: String,
    pub membership: Membership,
    pub your_name: String,
    pub your_first_name: String,
    pub staff_level: StaffLevel,
    pub flags: ModifierFlags,
    pub new_membership: NewMembershipCase,
}

impl SessionState {
    pub fn for_hub(hub: Hub) -> Self {
        Self {
            page_id: None,
            hub,
            user_name: String::new(),
            membership: Membership::default_for(hub),
            your_name: String::new(),
            your_first_name: String::new(),
            staff_level: StaffLevel::default_for(hub),
            flags: ModifierFlags::default(),
            new_membership: NewMembershipCase::default_for(hub),
        }
    }

    /// Catalog hub key of the selected page, e.g. `naturehub` for
    /// `naturehub:birds`. Falls back to the family name before a page is
    /// chosen.
    pub fn hub_key(&self) -> &str {
        self.page_id
            .as_deref()
            .and_then(|id| id.split_once(':'))
            .map_or(self.hub.name(), |(hub, _)| hub)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::for_hub(Hub::Other)
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    state: SessionState,
    placeholders: PlaceholderStore,
    lists: ValidationLists,
}

impl Session {
    pub fn new(lists: ValidationLists) -> Self {
        Self { lists, ..Self::default() }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn lists(&self) -> &ValidationLists {
        &self.lists
    }

    pub fn set_lists(&mut self, lists: ValidationLists) {
        self.lists = lists;
    }

    pub fn placeholders(&self) -> &PlaceholderStore {
        &self.placeholders
    }

    /// Mutable access for the copy flow in the engine.
    pub(crate) fn placeholders_mut(&mut self) -> &mut PlaceholderStore {
        &mut self.placeholders
    }

    fn invalidate(&mut self, reason: &str) {
        if !self.placeholders.is_empty() {
            debug!(reason, "Clearing placeholders");
        }
        self.placeholders.clear();
    }

    /// Select a page by `"<hub>:<name>"` id. Moving to another hub family
    /// resets membership, staff level and new-membership case.
    pub fn select_page(&mut self, page_id: Option<PageId>) {
        if self.state.page_id == page_id {
            return;
        }
        let hub = page_id.as_deref().map_or(self.state.hub, Hub::from_page_id);
        if hub != self.state.hub {
            debug!(from = %self.state.hub, to = %hub, "Hub changed, resetting hub vocabularies");
            self.state.hub = hub;
            self.state.membership = Membership::default_for(hub);
            self.state.staff_level = StaffLevel::default_for(hub);
            self.state.new_membership = NewMembershipCase::default_for(hub);
        }
        self.state.page_id = page_id;
        self.invalidate("page");
    }

    pub fn set_user_name(&mut self, user_name: impl Into<String>) {
        let user_name = user_name.into();
        if self.state.user_name != user_name {
            self.state.user_name = user_name;
            self.invalidate("user name");
        }
    }

    pub fn set_membership(&mut self, membership: Membership) -> Result<(), SessionError> {
        if membership.hub() != self.state.hub {
            return Err(SessionError::InvalidMembership {
                hub: self.state.hub,
                label: membership.label().to_string(),
            });
        }
        if self.state.membership != membership {
            self.state.membership = membership;
            self.invalidate("membership");
        }
        Ok(())
    }

    pub fn set_your_name(&mut self, your_name: impl Into<String>) {
        let your_name = your_name.into();
        if self.state.your_name != your_name {
            self.state.your_name = your_name;
            self.invalidate("curator name");
        }
    }

    pub fn set_your_first_name(&mut self, your_first_name: impl Into<String>) {
        let your_first_name = your_first_name.into();
        if self.state.your_first_name != your_first_name {
            self.state.your_first_name = your_first_name;
            self.invalidate("curator first name");
        }
    }

    pub fn set_staff_level(&mut self, staff_level: StaffLevel) -> Result<(), SessionError> {
        if staff_level.hub() != self.state.hub {
            return Err(SessionError::InvalidStaffLevel {
                hub: self.state.hub,
                label: staff_level.label().to_string(),
            });
        }
        if self.state.staff_level != staff_level {
            self.state.staff_level = staff_level;
            self.invalidate("staff level");
        }
        Ok(())
    }

    /// Modifier flags pick another template variant but keep placeholders.
    pub fn set_flags(&mut self, flags: ModifierFlags) {
        self.state.flags = flags;
    }

    pub fn set_new_membership(&mut self, case: NewMembershipCase) -> Result<(), SessionError> {
        if case.hub() != self.state.hub {
            return Err(SessionError::InvalidNewMembership {
                hub: self.state.hub,
                label: case.label().to_string(),
            });
        }
        self.state.new_membership = case;
        Ok(())
    }

    /// Forget the featured user: name, membership and every placeholder.
    pub fn clear_user(&mut self) {
        self.state.user_name.clear();
        self.state.membership = Membership::default_for(self.state.hub);
        self.invalidate("clear user");
    }

    /// Store editor values for one script kind. Names the kind has not
    /// seen yet are created.
    pub fn editor_save<'a, I>(&mut self, kind: ScriptKind, family: ManualFamily, values: I)
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let map: &mut PlaceholderMap = self.placeholders.map_mut(kind);
        for (name, value) in values {
            map.set(family, name, value);
        }
    }

    /// Apply a label-based input, in the order a form would: page first so
    /// the hub vocabulary is known, then the dependent fields.
    pub fn apply(&mut self, input: &SessionInput) -> Result<(), SessionError> {
        self.select_page(input.page.clone().filter(|p| !p.is_empty()));
        let hub = self.state.hub;

        let membership = Membership::from_label(hub, &input.membership).ok_or_else(|| {
            SessionError::InvalidMembership { hub, label: input.membership.clone() }
        })?;
        let staff_level = match input.staff_level.as_deref() {
            Some(label) => StaffLevel::from_label(hub, label)
                .ok_or_else(|| SessionError::InvalidStaffLevel { hub, label: label.to_string() })?,
            None => StaffLevel::default_for(hub),
        };
        let new_membership = NewMembershipCase::from_label(hub, &input.new_membership)
            .ok_or_else(|| SessionError::InvalidNewMembership {
                hub,
                label: input.new_membership.clone(),
            })?;

        self.set_user_name(input.user_name.trim());
        self.set_membership(membership)?;
        self.set_your_name(input.your_name.trim());
        self.set_your_first_name(input.your_first_name.trim());
        self.set_staff_level(staff_level)?;
        self.set_flags(input.flags);
        self.set_new_membership(new_membership)
    }

    pub fn from_input(input: &SessionInput, lists: ValidationLists) -> Result<Self, SessionError> {
        let mut session = Self::new(lists);
        session.apply(input)?;
        Ok(session)
    }
}

fn none_label() -> String {
    "None".to_string()
}

/// Label-based session description, as read from JSON.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionInput {
    #[serde(default)]
    pub page: Option<PageId>,
    #[serde(default)]
    pub user_name: String,
    #[serde(default = "none_label")]
    pub membership: String,
    #[serde(default)]
    pub your_name: String,
    #[serde(default)]
    pub your_first_name: String,
    #[serde(default)]
    pub staff_level: Option<String>,
    #[serde(flatten)]
    pub flags: ModifierFlags,
    #[serde(default = "none_label")]
    pub new_membership: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::{ClickMembership, SnapMembership, SnapStaffLevel};

    fn filled_session() -> Session {
        let mut session = Session::default();
        session.select_page(Some("snap:examplepage".into()));
        session.set_user_name("ann");
        session.set_membership(Membership::Snap(SnapMembership::Member)).unwrap();
        session.set_your_name("bob");
        session.set_your_first_name("Bob");
        session.editor_save(ScriptKind::Feature, ManualFamily::Short, [("LOCATION", "Paris")]);
        session
    }

    #[test]
    fn test_upstream_changes_clear_placeholders() {
        let changes: [fn(&mut Session); 7] = [
            |s: &mut Session| s.set_user_name("carl"),
            |s: &mut Session| {
                s.set_membership(Membership::Snap(SnapMembership::VipMember)).unwrap()
            },
            |s: &mut Session| s.set_your_name("dora"),
            |s: &mut Session| s.set_your_first_name("Dora"),
            |s: &mut Session| s.select_page(Some("snap:otherpage".into())),
            |s: &mut Session| s.set_staff_level(StaffLevel::Snap(SnapStaffLevel::Admin)).unwrap(),
            |s: &mut Session| s.clear_user(),
        ];
        for change in changes {
            let mut session = filled_session();
            assert!(!session.placeholders().is_empty());
            change(&mut session);
            assert!(session.placeholders().is_empty());
        }
    }

    #[test]
    fn test_same_value_and_flags_keep_placeholders() {
        let mut session = filled_session();
        session.set_user_name("ann");
        session.set_flags(ModifierFlags { first_for_page: true, ..Default::default() });
        assert!(!session.placeholders().is_empty());
    }

    #[test]
    fn test_hub_change_resets_vocabulary() {
        let mut session = filled_session();
        session.select_page(Some("click:landscape".into()));
        assert_eq!(session.state().hub, Hub::Click);
        assert!(session.state().membership.is_none());
        assert!(session
            .set_membership(Membership::Snap(SnapMembership::Member))
            .is_err());
        session.set_membership(Membership::Click(ClickMembership::GoldMember)).unwrap();
    }

    #[test]
    fn test_hub_key_follows_page_id() {
        let mut session = Session::default();
        assert_eq!(session.state().hub_key(), "other");
        session.select_page(Some("naturehub:birds".into()));
        assert_eq!(session.state().hub, Hub::Other);
        assert_eq!(session.state().hub_key(), "naturehub");
    }

    #[test]
    fn test_apply_input_labels() {
        let input: SessionInput = serde_json::from_str(
            r#"{ "page": "snap:examplepage", "userName": " ann ", "membership": "Snap VIP Member",
                 "yourName": "bob", "yourFirstName": "Bob", "staffLevel": "Admin",
                 "firstForPage": true, "newMembership": "Member (feature)" }"#,
        )
        .unwrap();
        let session = Session::from_input(&input, ValidationLists::default()).unwrap();
        let state = session.state();
        assert_eq!(state.user_name, "ann");
        assert_eq!(state.membership, Membership::Snap(SnapMembership::VipMember));
        assert_eq!(state.staff_level.label(), "Admin");
        assert!(state.flags.first_for_page);
        assert!(!state.new_membership.is_none());
    }

    #[test]
    fn test_apply_rejects_cross_hub_label() {
        let input = SessionInput {
            page: Some("click:landscape".into()),
            membership: "Snap VIP Member".into(),
            new_membership: "None".into(),
            ..Default::default()
        };
        let err = Session::from_input(&input, ValidationLists::default()).unwrap_err();
        assert_eq!(
            err,
            SessionError::InvalidMembership { hub: Hub::Click, label: "Snap VIP Member".into() }
        );
    }
}
