//! Script Engine - Single Entry Point
//!
//! Every script the caller sees comes out of `generate`, and every copy goes
//! through validation first. Blocked fields replace the script text with
//! their error lines; substitution is never attempted while a dependent
//! field has an error.

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::catalog::{Catalog, Page};
use crate::export::{ExportRecord, OutputKind, ScriptSink, SinkError};
use crate::hashing::catalog_fingerprint;
use crate::new_membership::resolve_special;
use crate::placeholders::{
    extract, process, transfer, ExtractOutcome, PlaceholderEntry, PlaceholderMap,
};
use crate::resolver::{resolve, ScriptKind};
use crate::session::{Session, SessionState};
use crate::substitute::{substitute, SubstitutionContext};
use crate::tokens::{has_placeholders, scan, ManualFamily};
use crate::validation::{Field, ValidationReport, Validator, NEW_MEMBERSHIP_FIELDS, SCRIPT_FIELDS};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Delivery failed: {0}")]
    Delivery(#[from] SinkError),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptText {
    pub text: String,
    pub has_placeholders: bool,
}

impl ScriptText {
    fn new(text: String) -> Self {
        let has_placeholders = has_placeholders(&text);
        Self { text, has_placeholders }
    }
}

/// Everything derived from one session snapshot. Recomputed on every
/// change and never stored.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptOutput {
    pub feature: ScriptText,
    pub comment: ScriptText,
    pub original_post: ScriptText,
    pub new_membership: ScriptText,
    pub can_copy: bool,
    pub can_copy_new_membership: bool,
    pub validation: ValidationReport,
}

impl ScriptOutput {
    pub fn script(&self, kind: ScriptKind) -> &ScriptText {
        match kind {
            ScriptKind::Feature => &self.feature,
            ScriptKind::Comment => &self.comment,
            ScriptKind::OriginalPost => &self.original_post,
        }
    }

    fn script_mut(&mut self, kind: ScriptKind) -> &mut ScriptText {
        match kind {
            ScriptKind::Feature => &mut self.feature,
            ScriptKind::Comment => &mut self.comment,
            ScriptKind::OriginalPost => &mut self.original_post,
        }
    }
}

/// Placeholders the editor should show for one script, in order of
/// appearance, with their current (possibly seeded) values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorRequest {
    pub kind: ScriptKind,
    pub short: Vec<PlaceholderEntry>,
    pub long: Vec<PlaceholderEntry>,
    pub created: ExtractOutcome,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CopyOutcome {
    Copied { text: String, record: ExportRecord },
    EditorRequired(EditorRequest),
    Blocked { lines: Vec<String> },
    NothingToCopy,
}

/// The script engine - owns the catalog snapshot and the validator
pub struct ScriptEngine {
    catalog: Option<Catalog>,
    fingerprint: Option<String>,
    validator: Validator,
}

impl ScriptEngine {
    /// Engine without a catalog; every lookup is empty until one is installed.
    pub fn new() -> Self {
        Self { catalog: None, fingerprint: None, validator: Validator::new() }
    }

    pub fn with_catalog(catalog: Catalog) -> Self {
        let mut engine = Self::new();
        engine.install_catalog(catalog);
        engine
    }

    pub fn catalog(&self) -> Option<&Catalog> {
        self.catalog.as_ref()
    }

    /// Replace the catalog snapshot. Returns true when the content differs
    /// from the one it replaces.
    pub fn install_catalog(&mut self, catalog: Catalog) -> bool {
        let fingerprint = match catalog_fingerprint(&catalog) {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("Could not fingerprint catalog: {}", e);
                None
            }
        };
        let changed = fingerprint.is_none() || fingerprint != self.fingerprint;
        info!(changed, fingerprint = fingerprint.as_deref().unwrap_or("-"), "Installed catalog");
        self.catalog = Some(catalog);
        self.fingerprint = fingerprint;
        changed
    }

    pub fn validate(&self, session: &Session) -> ValidationReport {
        self.validator.validate(session.state(), session.lists())
    }

    fn selected_page(&self, state: &SessionState) -> Option<&Page> {
        let page_id = state.page_id.as_deref()?;
        self.catalog.as_ref()?.page(page_id)
    }

    fn context<'a>(
        &'a self,
        state: &'a SessionState,
        with_membership: bool,
    ) -> SubstitutionContext<'a> {
        SubstitutionContext {
            page: self.selected_page(state),
            user_name: &state.user_name,
            membership: with_membership.then_some(state.membership),
            your_name: &state.your_name,
            your_first_name: &state.your_first_name,
            staff_level: state.staff_level.label(),
        }
    }

    /// Raw template for one kind, before any substitution.
    pub fn raw_script(&self, state: &SessionState, kind: ScriptKind) -> &str {
        match (self.catalog.as_ref(), state.page_id.as_deref()) {
            (Some(catalog), Some(page_id)) => {
                resolve(catalog, page_id, kind.base_name(), state.flags)
            }
            _ => "",
        }
    }

    /// Statically substituted text for one kind. Callers check validation
    /// first.
    fn substituted_script(&self, state: &SessionState, kind: ScriptKind) -> String {
        let raw = self.raw_script(state, kind);
        if raw.is_empty() {
            return String::new();
        }
        substitute(raw, &self.context(state, true))
    }

    fn substituted_new_membership(&self, state: &SessionState) -> String {
        let raw = self
            .catalog
            .as_ref()
            .and_then(|catalog| resolve_special(catalog, state.new_membership))
            .unwrap_or("");
        if raw.is_empty() {
            return String::new();
        }
        substitute(raw, &self.context(state, false))
    }

    /// Derive all script texts for the current session.
    pub fn generate(&self, session: &Session) -> ScriptOutput {
        let state = session.state();
        let validation = self.validate(session);
        let mut output = ScriptOutput {
            can_copy: validation.allows(SCRIPT_FIELDS),
            ..Default::default()
        };

        if output.can_copy {
            for kind in ScriptKind::ALL {
                *output.script_mut(kind) = ScriptText::new(self.substituted_script(state, kind));
            }
        } else {
            let errors = validation.error_text(SCRIPT_FIELDS);
            for kind in ScriptKind::ALL {
                *output.script_mut(kind) = ScriptText::new(errors.clone());
            }
        }

        if !state.new_membership.is_none() {
            if validation.allows(NEW_MEMBERSHIP_FIELDS) {
                let text = self.substituted_new_membership(state);
                output.can_copy_new_membership = !text.is_empty();
                output.new_membership = ScriptText::new(text);
            } else {
                let errors = validation.error_text(NEW_MEMBERSHIP_FIELDS);
                output.new_membership = ScriptText::new(errors);
            }
        }

        debug!(
            can_copy = output.can_copy,
            can_copy_new_membership = output.can_copy_new_membership,
            violations = validation.violations.len(),
            "Generated scripts"
        );
        output.validation = validation;
        output
    }

    /// Copy with manual placeholders resolved. The first attempt on a script
    /// with unseen placeholders asks for the editor instead of copying.
    pub fn copy_resolved(
        &self,
        session: &mut Session,
        kind: ScriptKind,
        sink: &mut dyn ScriptSink,
    ) -> Result<CopyOutcome, EngineError> {
        let validation = self.validate(session);
        if !validation.allows(SCRIPT_FIELDS) {
            return Ok(blocked(&validation, SCRIPT_FIELDS));
        }

        let text = self.substituted_script(session.state(), kind);
        if text.is_empty() {
            return Ok(CopyOutcome::NothingToCopy);
        }

        let store = session.placeholders_mut();
        let created = extract(store, kind, &text);
        if created.needs_editor() {
            debug!(
                %kind,
                short = created.new_short.len(),
                long = created.new_long.len(),
                "Editor required"
            );
            let request = editor_request(kind, &text, store.map(kind), created);
            return Ok(CopyOutcome::EditorRequired(request));
        }

        transfer(store, kind);
        let final_text = process(&text, store.map(kind));
        let record = sink.deliver(OutputKind::Script(kind), &final_text)?;
        Ok(CopyOutcome::Copied { text: final_text, record })
    }

    /// Copy the statically substituted text with manual placeholders left
    /// in place.
    pub fn copy_raw(
        &self,
        session: &Session,
        kind: ScriptKind,
        sink: &mut dyn ScriptSink,
    ) -> Result<CopyOutcome, EngineError> {
        let validation = self.validate(session);
        if !validation.allows(SCRIPT_FIELDS) {
            return Ok(blocked(&validation, SCRIPT_FIELDS));
        }

        let text = self.substituted_script(session.state(), kind);
        if text.is_empty() {
            return Ok(CopyOutcome::NothingToCopy);
        }
        let record = sink.deliver(OutputKind::Script(kind), &text)?;
        Ok(CopyOutcome::Copied { text, record })
    }

    pub fn copy_new_membership(
        &self,
        session: &Session,
        sink: &mut dyn ScriptSink,
    ) -> Result<CopyOutcome, EngineError> {
        let validation = self.validate(session);
        if !validation.allows(NEW_MEMBERSHIP_FIELDS) {
            return Ok(blocked(&validation, NEW_MEMBERSHIP_FIELDS));
        }

        let text = self.substituted_new_membership(session.state());
        if text.is_empty() {
            return Ok(CopyOutcome::NothingToCopy);
        }
        let record = sink.deliver(OutputKind::NewMembership, &text)?;
        Ok(CopyOutcome::Copied { text, record })
    }
}

impl Default for ScriptEngine {
    fn default() -> Self {
        Self::new()
    }
}

fn blocked(validation: &ValidationReport, fields: &[Field]) -> CopyOutcome {
    CopyOutcome::Blocked { lines: validation.errors_for(fields).map(|v| v.line()).collect() }
}

fn editor_request(
    kind: ScriptKind,
    text: &str,
    map: &PlaceholderMap,
    created: ExtractOutcome,
) -> EditorRequest {
    let found = scan(text);
    let entries = |family: ManualFamily, names: &[String]| -> Vec<PlaceholderEntry> {
        names.iter().filter_map(|name| map.get(family, name).cloned()).collect()
    };
    EditorRequest {
        kind,
        short: entries(ManualFamily::Short, &found.short_names),
        long: entries(ManualFamily::Long, &found.long_names),
        created,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ScriptsCatalog, Template, TemplateCatalog, TemplatePage};
    use crate::export::MemorySink;
    use crate::hub::{Membership, SnapMembership};

    fn engine() -> ScriptEngine {
        let scripts: ScriptsCatalog =
            serde_json::from_str(r#"{ "hubs": { "snap": [ { "name": "examplepage" } ] } }"#)
                .unwrap();
        let templates = TemplateCatalog {
            pages: vec![TemplatePage {
                name: "snap:examplepage".into(),
                templates: vec![
                    Template::new("feature", "Congrats @%%USERNAME%% on %%PAGENAME%%! [[DETAIL]]"),
                    Template::new("comment", "Nice, %%USERNAME%%"),
                ],
            }],
            special_templates: vec![],
        };
        ScriptEngine::with_catalog(Catalog::new(scripts, templates))
    }

    fn session() -> Session {
        let mut session = Session::default();
        session.select_page(Some("snap:examplepage".into()));
        session.set_user_name("ann");
        session.set_membership(Membership::Snap(SnapMembership::Member)).unwrap();
        session.set_your_name("bob");
        session.set_your_first_name("Bob");
        session
    }

    #[test]
    fn test_generate_without_catalog_is_empty() {
        let output = ScriptEngine::new().generate(&session());
        assert!(output.can_copy);
        assert_eq!(output.feature.text, "");
    }

    #[test]
    fn test_generate_flags_placeholders() {
        let output = engine().generate(&session());
        assert_eq!(output.feature.text, "Congrats @ann on examplepage! [[DETAIL]]");
        assert!(output.feature.has_placeholders);
        assert!(!output.comment.has_placeholders);
        assert_eq!(output.original_post.text, "");
    }

    #[test]
    fn test_copy_flow_requests_editor_then_copies() {
        let engine = engine();
        let mut session = session();
        let mut sink = MemorySink::new();

        let first = engine.copy_resolved(&mut session, ScriptKind::Feature, &mut sink).unwrap();
        let request = match first {
            CopyOutcome::EditorRequired(request) => request,
            other => panic!("expected editor request, got {other:?}"),
        };
        assert_eq!(request.short, vec![PlaceholderEntry::new("DETAIL", "")]);
        assert!(sink.deliveries.is_empty());

        let values = [("DETAIL", " Great light ")];
        session.editor_save(ScriptKind::Feature, ManualFamily::Short, values);
        let second = engine.copy_resolved(&mut session, ScriptKind::Feature, &mut sink).unwrap();
        assert!(matches!(second, CopyOutcome::Copied { .. }));
        assert_eq!(sink.last(), Some("Congrats @ann on examplepage! Great light"));
    }

    #[test]
    fn test_copy_without_placeholders_goes_straight_through() {
        let mut sink = MemorySink::new();
        let outcome =
            engine().copy_resolved(&mut session(), ScriptKind::Comment, &mut sink).unwrap();
        assert!(matches!(outcome, CopyOutcome::Copied { .. }));
        assert_eq!(sink.last(), Some("Nice, ann"));
    }

    #[test]
    fn test_copy_missing_script_copies_nothing() {
        let mut sink = MemorySink::new();
        let outcome = engine()
            .copy_resolved(&mut session(), ScriptKind::OriginalPost, &mut sink)
            .unwrap();
        assert!(matches!(outcome, CopyOutcome::NothingToCopy));
        assert!(sink.deliveries.is_empty());
    }

    #[test]
    fn test_reinstall_same_catalog_is_unchanged() {
        let mut engine = engine();
        let same = engine.catalog().cloned().unwrap();
        assert!(!engine.install_catalog(same));
    }
}
