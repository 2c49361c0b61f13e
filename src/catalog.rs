//! Catalog Model - Read-Only Pages and Templates
//!
//! Two JSON documents make up a catalog: the scripts catalog (hubs and
//! their pages) and the template catalog (per-page templates plus the flat
//! list of special templates). Once built, a `Catalog` is never mutated;
//! refreshing means building a new one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::hub::Hub;
use crate::tokens::{lint_template, TokenIssue};

pub type PageId = String;

pub const SCRIPTS_FILE: &str = "scripts.json";
pub const TEMPLATES_FILE: &str = "templates.json";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalog file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse catalog file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    /// Filled in from the enclosing hub key when the catalog is built.
    #[serde(default)]
    pub hub: String,
    pub name: String,
    #[serde(default)]
    pub page_name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hash_tag: Option<String>,
}

impl Page {
    pub fn id(&self) -> PageId {
        format!("{}:{}", self.hub, self.name)
    }

    pub fn hub_family(&self) -> Hub {
        Hub::from_name(&self.hub)
    }

    pub fn display_name(&self) -> &str {
        self.page_name.as_deref().unwrap_or(&self.name)
    }

    pub fn full_name(&self) -> String {
        format!("{}_{}", self.hub, self.name)
    }

    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.name)
    }

    pub fn display_hash_tag(&self) -> &str {
        self.hash_tag.as_deref().unwrap_or(&self.name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubManifest {
    #[serde(default)]
    pub hub: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub ai_warning_limit: f64,
    #[serde(default)]
    pub ai_trigger_limit: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptsCatalog {
    #[serde(default)]
    pub hub_manifests: BTreeMap<String, HubManifest>,
    #[serde(default)]
    pub hubs: BTreeMap<String, Vec<Page>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub name: String,
    pub template: String,
}

impl Template {
    pub fn new(name: impl Into<String>, template: impl Into<String>) -> Self {
        Self { name: name.into(), template: template.into() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplatePage {
    /// Page id, `"<hub>:<name>"`.
    pub name: PageId,
    #[serde(default)]
    pub templates: Vec<Template>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateCatalog {
    #[serde(default)]
    pub pages: Vec<TemplatePage>,
    #[serde(default)]
    pub special_templates: Vec<Template>,
}

/// Where a linted template lives.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateLint {
    pub page: Option<PageId>,
    pub template: String,
    pub issues: Vec<TokenIssue>,
}

/// Immutable snapshot of both catalog documents.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    scripts: ScriptsCatalog,
    templates: TemplateCatalog,
}

impl Catalog {
    pub fn new(mut scripts: ScriptsCatalog, templates: TemplateCatalog) -> Self {
        for (hub, pages) in scripts.hubs.iter_mut() {
            for page in pages.iter_mut() {
                page.hub = hub.clone();
            }
        }
        for (hub, manifest) in scripts.hub_manifests.iter_mut() {
            if manifest.hub.is_empty() {
                manifest.hub = hub.clone();
            }
        }
        Self { scripts, templates }
    }

    pub fn from_json(scripts_json: &str, templates_json: &str) -> Result<Self, CatalogError> {
        let scripts: ScriptsCatalog = serde_json::from_str(scripts_json)?;
        let templates: TemplateCatalog = serde_json::from_str(templates_json)?;
        Ok(Self::new(scripts, templates))
    }

    /// Load `scripts.json` and `templates.json` from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Self, CatalogError> {
        Self::load_from_files(&dir.join(SCRIPTS_FILE), &dir.join(TEMPLATES_FILE))
    }

    pub fn load_from_files(
        scripts_path: &Path,
        templates_path: &Path,
    ) -> Result<Self, CatalogError> {
        let scripts: ScriptsCatalog = read_json(scripts_path)?;
        let templates: TemplateCatalog = read_json(templates_path)?;
        let catalog = Self::new(scripts, templates);
        info!(
            pages = catalog.pages().count(),
            template_pages = catalog.templates.pages.len(),
            special_templates = catalog.templates.special_templates.len(),
            "Loaded catalog from {}",
            scripts_path.parent().unwrap_or(scripts_path).display()
        );
        Ok(catalog)
    }

    pub fn scripts(&self) -> &ScriptsCatalog {
        &self.scripts
    }

    pub fn template_catalog(&self) -> &TemplateCatalog {
        &self.templates
    }

    /// All pages, hub by hub in key order.
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.scripts.hubs.values().flatten()
    }

    pub fn pages_for_hub<'a>(&'a self, hub: &str) -> impl Iterator<Item = &'a Page> + 'a {
        self.scripts.hubs.get(hub).into_iter().flatten()
    }

    pub fn page(&self, page_id: &str) -> Option<&Page> {
        let (hub, name) = page_id.split_once(':')?;
        self.pages_for_hub(hub).find(|p| p.name == name)
    }

    pub fn hub_manifest(&self, hub: &str) -> Option<&HubManifest> {
        self.scripts.hub_manifests.get(hub)
    }

    /// Exact-name lookup within one page's templates.
    pub fn template(&self, page_id: &str, name: &str) -> Option<&str> {
        let found = self
            .templates
            .pages
            .iter()
            .find(|p| p.name == page_id)?
            .templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.template.as_str());
        debug!(page_id, name, found = found.is_some(), "Template lookup");
        found
    }

    /// Exact-name lookup in the flat special template list.
    pub fn special_template(&self, name: &str) -> Option<&str> {
        self.templates
            .special_templates
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.template.as_str())
    }

    /// Run the token linter over every template in the catalog, returning
    /// only templates with issues.
    pub fn lint(&self) -> Vec<TemplateLint> {
        let page_templates = self
            .templates
            .pages
            .iter()
            .flat_map(|p| p.templates.iter().map(move |t| (Some(p.name.clone()), t)));
        let special = self.templates.special_templates.iter().map(|t| (None, t));

        page_templates
            .chain(special)
            .filter_map(|(page, t)| {
                let issues = lint_template(&t.template);
                (!issues.is_empty()).then(|| TemplateLint {
                    page,
                    template: t.name.clone(),
                    issues,
                })
            })
            .collect()
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, CatalogError> {
    let content = fs::read_to_string(path)
        .map_err(|source| CatalogError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCRIPTS: &str = r#"{
        "hubManifests": {
            "snap": { "title": "Snap", "aiWarningLimit": 0.5, "aiTriggerLimit": 0.75 }
        },
        "hubs": {
            "snap": [ { "name": "examplepage", "pageName": "Example", "hashTag": "example_tag" } ],
            "click": [ { "name": "landscape", "title": "Landscapes" } ]
        }
    }"#;

    const TEMPLATES: &str = r#"{
        "pages": [
            {
                "name": "snap:examplepage",
                "templates": [ { "name": "feature", "template": "F %%PAGENAME%%" } ]
            }
        ],
        "specialTemplates": [ { "name": "click:gold_member", "template": "Gold!" } ]
    }"#;

    #[test]
    fn test_from_json_fills_hub() {
        let catalog = Catalog::from_json(SCRIPTS, TEMPLATES).unwrap();
        let page = catalog.page("snap:examplepage").unwrap();
        assert_eq!(page.hub, "snap");
        assert_eq!(page.id(), "snap:examplepage");
        assert_eq!(page.display_name(), "Example");
        assert_eq!(page.display_title(), "examplepage");
        assert_eq!(page.full_name(), "snap_examplepage");
        assert_eq!(catalog.hub_manifest("snap").unwrap().hub, "snap");
        assert_eq!(catalog.pages().count(), 2);
    }

    #[test]
    fn test_template_lookup_is_exact() {
        let catalog = Catalog::from_json(SCRIPTS, TEMPLATES).unwrap();
        assert_eq!(catalog.template("snap:examplepage", "feature"), Some("F %%PAGENAME%%"));
        assert_eq!(catalog.template("snap:examplepage", "Feature"), None);
        assert_eq!(catalog.template("click:landscape", "feature"), None);
        assert_eq!(catalog.special_template("click:gold_member"), Some("Gold!"));
    }

    #[test]
    fn test_missing_page_id_separator() {
        let catalog = Catalog::from_json(SCRIPTS, TEMPLATES).unwrap();
        assert!(catalog.page("examplepage").is_none());
    }

    #[test]
    fn test_load_from_dir_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Catalog::load_from_dir(dir.path()).unwrap_err();
        assert!(matches!(err, CatalogError::Read { .. }));
    }

    #[test]
    fn test_lint_flags_unknown_tokens() {
        let templates = r#"{ "pages": [ { "name": "snap:examplepage",
            "templates": [ { "name": "comment", "template": "%%PAGENAME%% %%NOPE%%" } ] } ] }"#;
        let catalog = Catalog::from_json(SCRIPTS, templates).unwrap();
        let lint = catalog.lint();
        assert_eq!(lint.len(), 1);
        assert_eq!(lint[0].template, "comment");
        assert_eq!(lint[0].page.as_deref(), Some("snap:examplepage"));
    }
}
