//! Template Resolver - Fixed Priority Cascade
//!
//! Picks the most specific template variant for a page, a base name and the
//! active modifier flags. The first step whose condition holds AND whose
//! named template exists wins; a plain base-name lookup is the last resort.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::catalog::Catalog;
use crate::hub::Hub;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptKind {
    Feature,
    Comment,
    OriginalPost,
}

impl ScriptKind {
    pub const ALL: [ScriptKind; 3] = [Self::Feature, Self::Comment, Self::OriginalPost];

    /// Template base name for this kind.
    pub fn base_name(&self) -> &'static str {
        match self {
            Self::Feature => "feature",
            Self::Comment => "comment",
            Self::OriginalPost => "original post",
        }
    }

    /// The two other kinds, in fixed enumeration order.
    pub fn others(&self) -> [ScriptKind; 2] {
        match self {
            Self::Feature => [Self::Comment, Self::OriginalPost],
            Self::Comment => [Self::Feature, Self::OriginalPost],
            Self::OriginalPost => [Self::Feature, Self::Comment],
        }
    }
}

impl fmt::Display for ScriptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_name())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifierFlags {
    #[serde(default)]
    pub first_for_page: bool,
    #[serde(default)]
    pub from_raw_tag: bool,
    #[serde(default)]
    pub from_community_tag: bool,
    #[serde(default)]
    pub from_hub_tag: bool,
}

/// Template names to try, most specific first. The base name is always last.
pub fn candidate_names(hub: Hub, base_name: &str, flags: ModifierFlags) -> Vec<String> {
    let snap = hub == Hub::Snap;
    let ModifierFlags {
        first_for_page: first,
        from_raw_tag: raw,
        from_community_tag: community,
        from_hub_tag: hub_tag,
    } = flags;

    let steps = [
        (snap && first && raw && community, "first raw community "),
        (snap && first && raw, "first raw "),
        (snap && first && community, "first community "),
        (first && hub_tag, "first hub "),
        (first, "first "),
        (snap && raw && community, "raw community "),
        (snap && raw, "raw "),
        (snap && community, "community "),
        (hub_tag, "hub "),
    ];

    steps
        .into_iter()
        .filter(|(active, _)| *active)
        .map(|(_, prefix)| format!("{prefix}{base_name}"))
        .chain(std::iter::once(base_name.to_string()))
        .collect()
}

/// Resolve one template for `page_id`. An empty string means the page has
/// no script of this kind, which is not an error.
pub fn resolve<'c>(
    catalog: &'c Catalog,
    page_id: &str,
    base_name: &str,
    flags: ModifierFlags,
) -> &'c str {
    let hub = Hub::from_page_id(page_id);
    candidate_names(hub, base_name, flags)
        .iter()
        .find_map(|name| catalog.template(page_id, name))
        .unwrap_or("")
}

/// Resolve all three script kinds with identical flags.
pub fn resolve_all<'c>(
    catalog: &'c Catalog,
    page_id: &str,
    flags: ModifierFlags,
) -> [(ScriptKind, &'c str); 3] {
    ScriptKind::ALL.map(|kind| (kind, resolve(catalog, page_id, kind.base_name(), flags)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(first: bool, raw: bool, community: bool, hub_tag: bool) -> ModifierFlags {
        ModifierFlags {
            first_for_page: first,
            from_raw_tag: raw,
            from_community_tag: community,
            from_hub_tag: hub_tag,
        }
    }

    #[test]
    fn test_candidates_all_flags_on_snap() {
        let names = candidate_names(Hub::Snap, "feature", flags(true, true, true, true));
        assert_eq!(
            names,
            vec![
                "first raw community feature",
                "first raw feature",
                "first community feature",
                "first hub feature",
                "first feature",
                "raw community feature",
                "raw feature",
                "community feature",
                "hub feature",
                "feature",
            ]
        );
    }

    #[test]
    fn test_raw_and_community_ignored_off_snap() {
        let names = candidate_names(Hub::Click, "comment", flags(true, true, true, false));
        assert_eq!(names, vec!["first comment", "comment"]);
    }

    #[test]
    fn test_no_flags_is_base_only() {
        let names = candidate_names(Hub::Snap, "original post", ModifierFlags::default());
        assert_eq!(names, vec!["original post"]);
    }

    #[test]
    fn test_others_order() {
        assert_eq!(ScriptKind::Comment.others(), [ScriptKind::Feature, ScriptKind::OriginalPost]);
    }
}
