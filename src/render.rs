//! Render model for check results.
//!
//! Text supplied by the checking service only ever reaches markup through
//! [`escape_text`] (or a template's auto-escaping). The one exception is the
//! replacement list, which is assembled here as a [`SafeFragment`]: fixed
//! `<code>` tags around values that have already been escaped.

use std::fmt;

use askama::Html as HtmlEscaper;
use askama::MarkupDisplay;

use crate::LOOKS_GOOD_MESSAGE;
use crate::checker::SuggestionMatch;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Error,
}

/// A single line of status text in the results area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub tone: Tone,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Info,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tone: Tone::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.tone == Tone::Error
    }
}

/// Complete contents of the results area. Showing a view replaces whatever
/// was there before.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ResultsView {
    #[default]
    Cleared,
    Notice(Notice),
    Cards(Vec<SuggestionCard>),
}

impl ResultsView {
    pub fn notice(&self) -> Option<&Notice> {
        match self {
            ResultsView::Notice(notice) => Some(notice),
            _ => None,
        }
    }

    pub fn cards(&self) -> &[SuggestionCard] {
        match self {
            ResultsView::Cards(cards) => cards,
            _ => &[],
        }
    }
}

/// Display card for one match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionCard {
    pub message: String,
    pub context: String,
    pub replacements: Vec<String>,
}

impl SuggestionCard {
    pub fn from_match(item: &SuggestionMatch) -> Self {
        Self {
            message: item.message.clone(),
            context: item.context.text.clone(),
            replacements: item.replacement_values().map(str::to_string).collect(),
        }
    }

    pub fn quoted_context(&self) -> String {
        format!("\"{}\"", self.context)
    }

    pub fn has_replacements(&self) -> bool {
        !self.replacements.is_empty()
    }

    /// `None` when the match offers no replacement, so the card omits the
    /// suggestions line entirely.
    pub fn replacements_markup(&self) -> Option<SafeFragment> {
        SafeFragment::code_list(&self.replacements)
    }
}

/// Markup built by this crate from fixed tags and escaped text.
///
/// There is no public constructor; the only way to obtain one is through the
/// builders below, which escape every value they embed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafeFragment(String);

impl SafeFragment {
    /// `<code>a</code>, <code>b</code>` for a non-empty list.
    fn code_list<S: AsRef<str>>(values: &[S]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let html = values
            .iter()
            .map(|value| format!("<code>{}</code>", escape_text(value.as_ref())))
            .collect::<Vec<_>>()
            .join(", ");
        Some(Self(html))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SafeFragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Text-only insertion primitive: escapes `value` for use in HTML content or
/// attribute values.
pub fn escape_text(value: &str) -> String {
    MarkupDisplay::new_unsafe(value, HtmlEscaper).to_string()
}

/// Builds the results view for a completed check.
pub fn render_matches(matches: &[SuggestionMatch]) -> ResultsView {
    if matches.is_empty() {
        return ResultsView::Notice(Notice::info(LOOKS_GOOD_MESSAGE));
    }
    ResultsView::Cards(matches.iter().map(SuggestionCard::from_match).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_matches_renders_looks_good_notice_only() {
        let view = render_matches(&[]);
        assert_eq!(view, ResultsView::Notice(Notice::info(LOOKS_GOOD_MESSAGE)));
        assert!(view.cards().is_empty());
    }

    #[test]
    fn match_without_replacements_has_no_suggestion_markup() {
        let matches = vec![SuggestionMatch::new(
            "Possible typo",
            "This is teh text",
            Vec::<String>::new(),
        )];
        let view = render_matches(&matches);
        let cards = view.cards();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].message, "Possible typo");
        assert_eq!(cards[0].quoted_context(), "\"This is teh text\"");
        assert!(!cards[0].has_replacements());
        assert!(cards[0].replacements_markup().is_none());
    }

    #[test]
    fn replacements_are_wrapped_in_order_and_joined() {
        let matches = vec![SuggestionMatch::new("m", "c", ["foo", "bar"])];
        let view = render_matches(&matches);
        let markup = view.cards()[0].replacements_markup().unwrap();
        assert_eq!(markup.as_str(), "<code>foo</code>, <code>bar</code>");
    }

    #[test]
    fn replacement_values_are_escaped_inside_tags() {
        let card = SuggestionCard::from_match(&SuggestionMatch::new(
            "m",
            "c",
            ["<img src=x onerror=alert(1)>", "a & b"],
        ));
        let markup = card.replacements_markup().unwrap().to_string();
        assert!(!markup.contains("<img"));
        assert!(markup.starts_with("<code>&lt;img"));
        assert!(markup.contains("<code>a &amp; b</code>"));
    }

    #[test]
    fn escape_text_neutralises_markup() {
        let escaped = escape_text(r#"<b>"bold"</b>"#);
        assert!(!escaped.contains('<'));
        assert!(!escaped.contains('"'));
        assert!(escaped.contains("&lt;b&gt;"));
    }

    #[test]
    fn one_card_per_match_in_response_order() {
        let matches = vec![
            SuggestionMatch::new("first", "a", ["x"]),
            SuggestionMatch::new("second", "b", Vec::<String>::new()),
        ];
        let view = render_matches(&matches);
        let messages: Vec<_> = view.cards().iter().map(|c| c.message.as_str()).collect();
        assert_eq!(messages, vec!["first", "second"]);
    }
}
