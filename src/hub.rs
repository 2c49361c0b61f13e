//! Hub Vocabularies
//!
//! Each hub family has its own membership, staff-level and new-membership
//! vocabulary. A value from one family is never valid under another, so the
//! cross-family types are tagged unions and `cases_for(hub)` returns the
//! exact enumerable subset for a hub.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hub {
    Snap,
    Click,
    Other,
}

impl Hub {
    /// Map a catalog hub key onto its family. Unknown hubs share the
    /// `other` vocabulary.
    pub fn from_name(name: &str) -> Self {
        match name {
            "snap" => Self::Snap,
            "click" => Self::Click,
            _ => Self::Other,
        }
    }

    /// Hub family of a `"<hub>:<name>"` page id.
    pub fn from_page_id(page_id: &str) -> Self {
        page_id.split_once(':').map_or(Self::Other, |(hub, _)| Self::from_name(hub))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Snap => "snap",
            Self::Click => "click",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

macro_rules! labelled_cases {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $label:expr),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn label(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }

            pub fn from_label(label: &str) -> Option<Self> {
                Self::ALL.iter().copied().find(|c| c.label() == label)
            }
        }
    };
}

labelled_cases!(SnapMembership {
    None => "None",
    Artist => "Artist",
    Member => "Snap Member",
    VipMember => "Snap VIP Member",
    VipGoldMember => "Snap VIP Gold Member",
    PlatinumMember => "Snap Platinum Member",
    EliteMember => "Snap Elite Member",
    HallOfFameMember => "Snap Hall of Fame Member",
    DiamondMember => "Snap Diamond Member",
});

labelled_cases!(ClickMembership {
    None => "None",
    Artist => "Artist",
    Member => "Click Member",
    BronzeMember => "Click Bronze Member",
    SilverMember => "Click Silver Member",
    GoldMember => "Click Gold Member",
    PlatinumMember => "Click Platinum Member",
});

labelled_cases!(OtherMembership {
    None => "None",
    Artist => "Artist",
});

labelled_cases!(SnapStaffLevel {
    Mod => "Mod",
    CoAdmin => "Co-Admin",
    Admin => "Admin",
    GuestModerator => "Guest moderator",
});

labelled_cases!(ClickStaffLevel {
    Mod => "Mod",
    CoAdmin => "Co-Admin",
    Admin => "Admin",
});

labelled_cases!(OtherStaffLevel {
    Mod => "Mod",
    CoAdmin => "Co-Admin",
    Admin => "Admin",
});

labelled_cases!(SnapNewMembership {
    None => "None",
    MemberFeature => "Member (feature)",
    MemberOriginalPost => "Member (original post)",
    VipMemberFeature => "VIP Member (feature)",
    VipMemberOriginalPost => "VIP Member (original post)",
});

labelled_cases!(ClickNewMembership {
    None => "None",
    Member => "Member",
    BronzeMember => "Bronze Member",
    SilverMember => "Silver Member",
    GoldMember => "Gold Member",
    PlatinumMember => "Platinum Member",
});

labelled_cases!(OtherNewMembership {
    None => "None",
});

/// Expands the shared cross-family surface for a tagged union whose three
/// arms wrap the per-family enums above.
macro_rules! hub_union {
    ($name:ident { $snap:ident, $click:ident, $other:ident }, default = $default:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            Snap($snap),
            Click($click),
            Other($other),
        }

        impl $name {
            pub fn cases_for(hub: Hub) -> Vec<Self> {
                match hub {
                    Hub::Snap => $snap::ALL.iter().copied().map(Self::Snap).collect(),
                    Hub::Click => $click::ALL.iter().copied().map(Self::Click).collect(),
                    Hub::Other => $other::ALL.iter().copied().map(Self::Other).collect(),
                }
            }

            pub fn from_label(hub: Hub, label: &str) -> Option<Self> {
                match hub {
                    Hub::Snap => $snap::from_label(label).map(Self::Snap),
                    Hub::Click => $click::from_label(label).map(Self::Click),
                    Hub::Other => $other::from_label(label).map(Self::Other),
                }
            }

            pub fn default_for(hub: Hub) -> Self {
                match hub {
                    Hub::Snap => Self::Snap($snap::$default),
                    Hub::Click => Self::Click($click::$default),
                    Hub::Other => Self::Other($other::$default),
                }
            }

            pub fn hub(&self) -> Hub {
                match self {
                    Self::Snap(_) => Hub::Snap,
                    Self::Click(_) => Hub::Click,
                    Self::Other(_) => Hub::Other,
                }
            }

            pub fn label(&self) -> &'static str {
                match self {
                    Self::Snap(c) => c.label(),
                    Self::Click(c) => c.label(),
                    Self::Other(c) => c.label(),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.label())
            }
        }
    };
}

hub_union!(Membership { SnapMembership, ClickMembership, OtherMembership }, default = None);
hub_union!(StaffLevel { SnapStaffLevel, ClickStaffLevel, OtherStaffLevel }, default = Mod);
hub_union!(
    NewMembershipCase { SnapNewMembership, ClickNewMembership, OtherNewMembership },
    default = None
);

impl Membership {
    pub fn is_none(&self) -> bool {
        matches!(
            self,
            Self::Snap(SnapMembership::None)
                | Self::Click(ClickMembership::None)
                | Self::Other(OtherMembership::None)
        )
    }

    /// Text inserted for `%%MEMBERLEVEL%%`. Snap labels drop their leading
    /// "Snap " so templates can read "a VIP Member"; other hubs insert the
    /// label as-is.
    pub fn template_label(&self) -> &'static str {
        let label = self.label();
        match self {
            Self::Snap(_) => label.strip_prefix("Snap ").unwrap_or(label),
            _ => label,
        }
    }
}

impl NewMembershipCase {
    pub fn is_none(&self) -> bool {
        matches!(
            self,
            Self::Snap(SnapNewMembership::None)
                | Self::Click(ClickNewMembership::None)
                | Self::Other(OtherNewMembership::None)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cases_for_is_family_specific() {
        let snap = Membership::cases_for(Hub::Snap);
        let click = Membership::cases_for(Hub::Click);
        assert_eq!(snap.len(), 9);
        assert_eq!(click.len(), 7);
        assert!(snap.iter().all(|m| m.hub() == Hub::Snap));
        assert_eq!(Membership::cases_for(Hub::Other).len(), 2);
        assert_eq!(NewMembershipCase::cases_for(Hub::Other).len(), 1);
    }

    #[test]
    fn test_from_label_rejects_other_family() {
        assert!(Membership::from_label(Hub::Click, "Snap VIP Member").is_none());
        assert_eq!(
            Membership::from_label(Hub::Snap, "Snap VIP Member"),
            Some(Membership::Snap(SnapMembership::VipMember))
        );
        assert!(StaffLevel::from_label(Hub::Click, "Guest moderator").is_none());
    }

    #[test]
    fn test_template_label_strips_snap_prefix_only() {
        assert_eq!(Membership::Snap(SnapMembership::VipMember).template_label(), "VIP Member");
        assert_eq!(Membership::Snap(SnapMembership::Artist).template_label(), "Artist");
        assert_eq!(
            Membership::Click(ClickMembership::GoldMember).template_label(),
            "Click Gold Member"
        );
    }

    #[test]
    fn test_hub_from_page_id() {
        assert_eq!(Hub::from_page_id("snap:examplepage"), Hub::Snap);
        assert_eq!(Hub::from_page_id("click:landscape"), Hub::Click);
        assert_eq!(Hub::from_page_id("naturehub:birds"), Hub::Other);
        assert_eq!(Hub::from_page_id("nohub"), Hub::Other);
    }

    #[test]
    fn test_defaults() {
        assert!(Membership::default_for(Hub::Click).is_none());
        assert_eq!(StaffLevel::default_for(Hub::Snap).label(), "Mod");
        assert!(NewMembershipCase::default_for(Hub::Snap).is_none());
    }
}
