//! New-Membership Resolver
//!
//! Congratulatory scripts live in the flat special template list, named by
//! hub and case rather than by page.

use crate::catalog::Catalog;
use crate::hub::{ClickNewMembership, NewMembershipCase, SnapNewMembership};

/// Special template name for a case, or `None` when the case has no script.
pub fn special_template_name(case: NewMembershipCase) -> Option<String> {
    match case {
        NewMembershipCase::Snap(snap) => {
            let name = match snap {
                SnapNewMembership::None => return None,
                SnapNewMembership::MemberFeature => "snap:member feature",
                SnapNewMembership::MemberOriginalPost => "snap:member original post",
                SnapNewMembership::VipMemberFeature => "snap:vip member feature",
                SnapNewMembership::VipMemberOriginalPost => "snap:vip member original post",
            };
            Some(name.to_string())
        }
        NewMembershipCase::Click(ClickNewMembership::None) => None,
        NewMembershipCase::Click(click) => {
            Some(format!("click:{}", click.label().replace(' ', "_").to_lowercase()))
        }
        NewMembershipCase::Other(_) => None,
    }
}

/// Raw special template for a case; `None` when the hub has no such
/// scripts or the catalog lacks the template.
pub fn resolve_special(catalog: &Catalog, case: NewMembershipCase) -> Option<&str> {
    let name = special_template_name(case)?;
    catalog.special_template(&name)
}
