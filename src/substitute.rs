//! Static Substitutor - System Tokens From Session State
//!
//! System tokens are replaced first, wherever they appear, including inside
//! manual placeholder brackets. A second pass fills the fixed
//! `[[YOUR FIRST NAME]]` placeholder. Every other byte of the template is
//! copied through.

use std::borrow::Cow;

use crate::catalog::Page;
use crate::hub::Membership;
use crate::tokens::{
    manual_tokens, replace_tokens, system_tokens, ManualFamily, SystemToken, TokenKind,
};

#[cfg(feature = "test-hooks")]
use std::cell::Cell;

// Counted per thread.
#[cfg(feature = "test-hooks")]
thread_local! {
    static SUBSTITUTION_CALL_COUNT: Cell<u32> = const { Cell::new(0) };
}

#[cfg(feature = "test-hooks")]
pub fn get_substitution_call_count() -> u32 {
    SUBSTITUTION_CALL_COUNT.with(Cell::get)
}

#[cfg(feature = "test-hooks")]
pub fn reset_substitution_call_count() {
    SUBSTITUTION_CALL_COUNT.with(|count| count.set(0));
}

/// Manual placeholder that is always filled from the curator's first name.
pub const YOUR_FIRST_NAME_PLACEHOLDER: &str = "YOUR FIRST NAME";

/// Session values visible to the substitutor. `None` leaves the matching
/// tokens in place.
#[derive(Debug, Clone, Copy)]
pub struct SubstitutionContext<'a> {
    pub page: Option<&'a Page>,
    pub user_name: &'a str,
    pub membership: Option<Membership>,
    pub your_name: &'a str,
    pub your_first_name: &'a str,
    pub staff_level: &'a str,
}

impl<'a> SubstitutionContext<'a> {
    fn value_for(&self, token: SystemToken) -> Option<Cow<'a, str>> {
        match token {
            SystemToken::PageName => self.page.map(|p| Cow::Borrowed(p.display_name())),
            SystemToken::FullPageName => self.page.map(|p| Cow::Owned(p.full_name())),
            SystemToken::PageTitle => self.page.map(|p| Cow::Borrowed(p.display_title())),
            SystemToken::PageHash => self.page.map(|p| Cow::Borrowed(p.display_hash_tag())),
            SystemToken::MemberLevel => self.membership.map(|m| Cow::Borrowed(m.template_label())),
            SystemToken::UserName => Some(Cow::Borrowed(self.user_name)),
            SystemToken::YourName => Some(Cow::Borrowed(self.your_name)),
            SystemToken::YourFirstName => Some(Cow::Borrowed(self.your_first_name)),
            SystemToken::StaffLevel => Some(Cow::Borrowed(self.staff_level)),
        }
    }
}

pub fn substitute(text: &str, ctx: &SubstitutionContext<'_>) -> String {
    #[cfg(feature = "test-hooks")]
    SUBSTITUTION_CALL_COUNT.with(|count| count.set(count.get() + 1));

    let tokens = system_tokens(text);
    let with_system = replace_tokens(text, &tokens, |token| match token.kind {
        TokenKind::System(system) => ctx.value_for(system),
        TokenKind::Manual(_) => None,
    });

    let tokens = manual_tokens(&with_system);
    replace_tokens(&with_system, &tokens, |token| match token.kind {
        TokenKind::Manual(ManualFamily::Short) if token.name == YOUR_FIRST_NAME_PLACEHOLDER => {
            Some(Cow::Borrowed(ctx.your_first_name))
        }
        _ => None,
    })
}
