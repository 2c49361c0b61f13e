//! Token Grammar - System And Manual Scanners
//!
//! System tokens: `%%NAME%%` for a fixed set of names.
//! Short manual tokens: `[[NAME]]` (single-line fill-in).
//! Long manual tokens: `[{NAME}]` (free multi-line fill-in).
//!
//! The two scanners run separately: a system token is recognized anywhere,
//! including inside the brackets of a manual placeholder.

use std::borrow::Cow;
use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static SYSTEM_RE: LazyLock<Regex> = LazyLock::new(|| {
    let names: Vec<&str> = SystemToken::ALL.iter().map(SystemToken::name).collect();
    Regex::new(&format!("%%({})%%", names.join("|"))).expect("system pattern is valid")
});

static MANUAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\[\[([^\]]*)\]\]|\[\{([^\}]*)\}\]").expect("manual pattern is valid")
});

static SHORT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]*)\]\]").expect("short pattern is valid"));

static LONG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\{([^\}]*)\}\]").expect("long pattern is valid"));

static ANY_SYSTEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%%([^%\s]+)%%").expect("system pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemToken {
    PageName,
    FullPageName,
    PageTitle,
    PageHash,
    UserName,
    MemberLevel,
    YourName,
    YourFirstName,
    StaffLevel,
}

impl SystemToken {
    pub const ALL: [SystemToken; 9] = [
        Self::PageName,
        Self::FullPageName,
        Self::PageTitle,
        Self::PageHash,
        Self::UserName,
        Self::MemberLevel,
        Self::YourName,
        Self::YourFirstName,
        Self::StaffLevel,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    /// Name between the `%%` delimiters.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PageName => "PAGENAME",
            Self::FullPageName => "FULLPAGENAME",
            Self::PageTitle => "PAGETITLE",
            Self::PageHash => "PAGEHASH",
            Self::UserName => "USERNAME",
            Self::MemberLevel => "MEMBERLEVEL",
            Self::YourName => "YOURNAME",
            Self::YourFirstName => "YOURFIRSTNAME",
            Self::StaffLevel => "STAFFLEVEL",
        }
    }
}

/// Which of the two manual families a placeholder belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualFamily {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    System(SystemToken),
    Manual(ManualFamily),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub name: &'a str,
    pub span: Range<usize>,
}

/// Recognized `%%NAME%%` tokens in order. Spans never overlap.
pub fn system_tokens(text: &str) -> Vec<Token<'_>> {
    SYSTEM_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let span = caps.get(0)?.range();
            let m = caps.get(1)?;
            let system = SystemToken::from_name(m.as_str())?;
            Some(Token { kind: TokenKind::System(system), name: m.as_str(), span })
        })
        .collect()
}

/// `[[NAME]]` and `[{NAME}]` placeholders in order. Spans never overlap.
pub fn manual_tokens(text: &str) -> Vec<Token<'_>> {
    MANUAL_RE
        .captures_iter(text)
        .filter_map(|caps| {
            let span = caps.get(0)?.range();
            if let Some(m) = caps.get(1) {
                Some(Token { kind: TokenKind::Manual(ManualFamily::Short), name: m.as_str(), span })
            } else {
                caps.get(2).map(|m| Token {
                    kind: TokenKind::Manual(ManualFamily::Long),
                    name: m.as_str(),
                    span,
                })
            }
        })
        .collect()
}

/// Rebuild `text`, replacing each token for which `replace` returns a value.
/// Everything outside a replaced span is copied through untouched.
pub fn replace_tokens<'t, 'v, F>(text: &'t str, tokens: &[Token<'t>], mut replace: F) -> String
where
    F: FnMut(&Token<'t>) -> Option<Cow<'v, str>>,
{
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0;
    for token in tokens {
        if let Some(value) = replace(token) {
            out.push_str(&text[cursor..token.span.start]);
            out.push_str(&value);
            cursor = token.span.end;
        }
    }
    out.push_str(&text[cursor..]);
    out
}

/// True when the text holds at least one manual placeholder of either family.
pub fn has_placeholders(text: &str) -> bool {
    SHORT_RE.is_match(text) || LONG_RE.is_match(text)
}

/// Manual placeholder names found in `text`, split by family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub short_names: Vec<String>,
    pub long_names: Vec<String>,
}

impl ScanResult {
    pub fn is_empty(&self) -> bool {
        self.short_names.is_empty() && self.long_names.is_empty()
    }
}

/// Collect distinct manual placeholder names in order of first appearance.
pub fn scan(text: &str) -> ScanResult {
    let mut result = ScanResult::default();
    for caps in SHORT_RE.captures_iter(text) {
        let name = &caps[1];
        if !result.short_names.iter().any(|n| n == name) {
            result.short_names.push(name.to_string());
        }
    }
    for caps in LONG_RE.captures_iter(text) {
        let name = &caps[1];
        if !result.long_names.iter().any(|n| n == name) {
            result.long_names.push(name.to_string());
        }
    }
    result
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TokenIssue {
    UnknownSystemToken { name: String, offset: usize },
    UnterminatedPlaceholder { opener: String, offset: usize },
}

/// Authoring check: report `%%...%%` tokens outside the known set and
/// manual openers with no matching closer.
pub fn lint_template(text: &str) -> Vec<TokenIssue> {
    let mut issues = vec![];

    for caps in ANY_SYSTEM_RE.captures_iter(text) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if SystemToken::from_name(name.as_str()).is_none() {
            issues.push(TokenIssue::UnknownSystemToken {
                name: name.as_str().to_string(),
                offset: whole.start(),
            });
        }
    }

    for (opener, closer) in [("[[", "]]"), ("[{", "}]")] {
        let mut from = 0;
        while let Some(found) = text[from..].find(opener) {
            let start = from + found;
            let body = start + opener.len();
            match text[body..].find(closer) {
                Some(close) => from = body + close + closer.len(),
                None => {
                    issues.push(TokenIssue::UnterminatedPlaceholder {
                        opener: opener.to_string(),
                        offset: start,
                    });
                    break;
                }
            }
        }
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanners_split_families() {
        let text = "Hi %%USERNAME%% [[PLACE]] [{STORY}] %%BOGUS%%";
        let system = system_tokens(text);
        assert_eq!(system.len(), 1);
        assert_eq!(system[0].kind, TokenKind::System(SystemToken::UserName));

        let manual = manual_tokens(text);
        assert_eq!(manual.len(), 2);
        assert_eq!(manual[0].kind, TokenKind::Manual(ManualFamily::Short));
        assert_eq!(manual[0].name, "PLACE");
        assert_eq!(manual[1].kind, TokenKind::Manual(ManualFamily::Long));
        assert_eq!(&text[manual[1].span.clone()], "[{STORY}]");
    }

    #[test]
    fn test_system_token_inside_placeholder_is_found() {
        let text = "[[Where did %%USERNAME%% shoot]]";
        let system = system_tokens(text);
        assert_eq!(system.len(), 1);
        assert_eq!(&text[system[0].span.clone()], "%%USERNAME%%");
        assert_eq!(manual_tokens(text).len(), 1);
    }

    #[test]
    fn test_unknown_system_prefix_does_not_hide_known_token() {
        let tokens = system_tokens("%%FOO%%USERNAME%%");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].span, 5..17);
    }

    #[test]
    fn test_replace_tokens_keeps_untouched_text() {
        let text = "a [[X]] b [[Y]] c";
        let tokens = manual_tokens(text);
        let out = replace_tokens(text, &tokens, |t| (t.name == "X").then(|| Cow::Borrowed("1")));
        assert_eq!(out, "a 1 b [[Y]] c");
    }

    #[test]
    fn test_scan_dedupes_in_order() {
        let result = scan("[[B]] [[A]] [[B]] [{NOTE}] [{NOTE}]");
        assert_eq!(result.short_names, vec!["B", "A"]);
        assert_eq!(result.long_names, vec!["NOTE"]);
    }

    #[test]
    fn test_has_placeholders() {
        assert!(has_placeholders("x [[A]]"));
        assert!(has_placeholders("x [{A}]"));
        assert!(!has_placeholders("x %%USERNAME%% [A]"));
    }

    #[test]
    fn test_lint_reports_unknown_and_unterminated() {
        let issues = lint_template("%%USERNAME%% %%USER%% [[open");
        assert_eq!(
            issues,
            vec![
                TokenIssue::UnknownSystemToken { name: "USER".into(), offset: 13 },
                TokenIssue::UnterminatedPlaceholder { opener: "[[".into(), offset: 22 },
            ]
        );
    }
}
