//! Manual Placeholders - Extraction, Propagation, Final Processing
//!
//! Each script kind owns a short map (`[[NAME]]`) and a long map
//! (`[{NAME}]`). Entries are created on a copy attempt, edited explicitly,
//! and copied between kinds only when a script is finally copied.

use serde::Serialize;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use crate::resolver::ScriptKind;
use crate::tokens::{manual_tokens, replace_tokens, scan, ManualFamily, TokenKind};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaceholderEntry {
    pub name: String,
    pub value: String,
}

impl PlaceholderEntry {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self { name: name.into(), value: value.into() }
    }

    pub fn has_value(&self) -> bool {
        !self.value.is_empty()
    }
}

/// Placeholders for one script kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PlaceholderMap {
    pub short: BTreeMap<String, PlaceholderEntry>,
    pub long: BTreeMap<String, PlaceholderEntry>,
}

impl PlaceholderMap {
    pub fn family(&self, family: ManualFamily) -> &BTreeMap<String, PlaceholderEntry> {
        match family {
            ManualFamily::Short => &self.short,
            ManualFamily::Long => &self.long,
        }
    }

    pub fn family_mut(&mut self, family: ManualFamily) -> &mut BTreeMap<String, PlaceholderEntry> {
        match family {
            ManualFamily::Short => &mut self.short,
            ManualFamily::Long => &mut self.long,
        }
    }

    pub fn get(&self, family: ManualFamily, name: &str) -> Option<&PlaceholderEntry> {
        self.family(family).get(name)
    }

    /// Set a value, creating the entry when it does not exist yet.
    pub fn set(&mut self, family: ManualFamily, name: &str, value: impl Into<String>) {
        let value = value.into();
        self.family_mut(family)
            .entry(name.to_string())
            .and_modify(|e| e.value.clone_from(&value))
            .or_insert_with(|| PlaceholderEntry::new(name, value));
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty() && self.long.is_empty()
    }

    pub fn clear(&mut self) {
        self.short.clear();
        self.long.clear();
    }
}

/// The three per-kind maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceholderStore {
    feature: PlaceholderMap,
    comment: PlaceholderMap,
    original_post: PlaceholderMap,
}

impl PlaceholderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map(&self, kind: ScriptKind) -> &PlaceholderMap {
        match kind {
            ScriptKind::Feature => &self.feature,
            ScriptKind::Comment => &self.comment,
            ScriptKind::OriginalPost => &self.original_post,
        }
    }

    pub fn map_mut(&mut self, kind: ScriptKind) -> &mut PlaceholderMap {
        match kind {
            ScriptKind::Feature => &mut self.feature,
            ScriptKind::Comment => &mut self.comment,
            ScriptKind::OriginalPost => &mut self.original_post,
        }
    }

    pub fn is_empty(&self) -> bool {
        ScriptKind::ALL.iter().all(|k| self.map(*k).is_empty())
    }

    pub fn clear(&mut self) {
        for kind in ScriptKind::ALL {
            self.map_mut(kind).clear();
        }
    }

    /// First non-empty value for `name` among the other kinds' maps.
    fn seed_value(&self, kind: ScriptKind, family: ManualFamily, name: &str) -> String {
        kind.others()
            .iter()
            .filter_map(|other| self.map(*other).get(family, name))
            .find(|e| e.has_value())
            .map(|e| e.value.clone())
            .unwrap_or_default()
    }
}

/// Names created by an extraction, split by family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractOutcome {
    pub new_short: Vec<String>,
    pub new_long: Vec<String>,
}

impl ExtractOutcome {
    /// True when the scan created entries the user has not seen yet.
    pub fn needs_editor(&self) -> bool {
        !self.new_short.is_empty() || !self.new_long.is_empty()
    }
}

/// Create entries for every manual placeholder in `text` that the kind's map
/// does not hold yet, seeding each from the other kinds.
pub fn extract(store: &mut PlaceholderStore, kind: ScriptKind, text: &str) -> ExtractOutcome {
    let found = scan(text);
    let mut outcome = ExtractOutcome::default();

    for (family, names, created) in [
        (ManualFamily::Short, &found.short_names, &mut outcome.new_short),
        (ManualFamily::Long, &found.long_names, &mut outcome.new_long),
    ] {
        for name in names {
            if store.map(kind).get(family, name).is_some() {
                continue;
            }
            let seed = store.seed_value(kind, family, name);
            debug!(
                %kind,
                ?family,
                name = name.as_str(),
                seeded = !seed.is_empty(),
                "New placeholder"
            );
            let entry = PlaceholderEntry::new(name.as_str(), seed);
            store.map_mut(kind).family_mut(family).insert(name.clone(), entry);
            created.push(name.clone());
        }
    }

    outcome
}

/// Copy every non-empty value of `source` over the same-named entries of
/// the other two kinds. The source always wins.
pub fn transfer(store: &mut PlaceholderStore, source: ScriptKind) {
    for family in [ManualFamily::Short, ManualFamily::Long] {
        let filled: Vec<PlaceholderEntry> = store
            .map(source)
            .family(family)
            .values()
            .filter(|e| e.has_value())
            .cloned()
            .collect();

        for other in source.others() {
            let target = store.map_mut(other).family_mut(family);
            for entry in &filled {
                if let Some(existing) = target.get_mut(&entry.name) {
                    existing.value.clone_from(&entry.value);
                }
            }
        }
    }
}

/// Replace each manual placeholder with its trimmed value. Names missing from
/// the map stay as literal bracketed text so unfilled slots remain visible.
pub fn process(text: &str, map: &PlaceholderMap) -> String {
    let tokens = manual_tokens(text);
    replace_tokens(text, &tokens, |token| match token.kind {
        TokenKind::Manual(family) => map
            .get(family, token.name)
            .map(|e| Cow::Owned(e.value.trim().to_string())),
        TokenKind::System(_) => None,
    })
}
