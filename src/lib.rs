//! ScriptGen Core - Feature Script Generator
//!
//! # Ground Rules
//! 1. The Catalog Is Read-Only
//! 2. Resolution Is a Fixed Cascade
//! 3. Substitution Touches Only Tokens
//! 4. Validation Gates Every Script
//! 5. Placeholders Belong to the Session
//! 6. Copying Is the Only Mutation

pub mod catalog;
pub mod config;
pub mod engine;
pub mod export;
pub mod hashing;
pub mod hub;
pub mod new_membership;
pub mod placeholders;
pub mod resolver;
pub mod session;
pub mod substitute;
pub mod tokens;
pub mod validation;

pub use catalog::{
    Catalog, CatalogError, HubManifest, Page, PageId, ScriptsCatalog, Template, TemplateCatalog,
    TemplatePage,
};
pub use config::{ConfigError, Settings};
pub use engine::{CopyOutcome, EditorRequest, EngineError, ScriptEngine, ScriptOutput, ScriptText};
pub use export::{ExportRecord, FileSink, MemorySink, OutputKind, ScriptSink, SinkError, StdoutSink};
pub use hashing::{canonical_json, catalog_fingerprint, sha256_hex};
pub use hub::{Hub, Membership, NewMembershipCase, StaffLevel};
pub use new_membership::{resolve_special, special_template_name};
pub use placeholders::{
    extract, process, transfer, ExtractOutcome, PlaceholderEntry, PlaceholderMap, PlaceholderStore,
};
pub use resolver::{candidate_names, resolve, resolve_all, ModifierFlags, ScriptKind};
pub use session::{Session, SessionError, SessionInput, SessionState};
pub use substitute::{substitute, SubstitutionContext};
pub use tokens::{
    has_placeholders, lint_template, manual_tokens, scan, system_tokens, ManualFamily, ScanResult,
    Token, TokenIssue, TokenKind,
};
pub use validation::{Field, FieldViolation, ValidationLists, ValidationReport, ViolationSeverity};

pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
