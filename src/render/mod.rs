//! Message rendering for the chat view.
//!
//! Agent replies are written in a small markdown dialect (headings, bold,
//! italics, inline code, bullet lists, links, emoji callouts) and come out as
//! a [`TrustedHtml`] fragment ready to be inserted as live markup. User
//! messages are escaped and never interpreted, so arbitrary user input cannot
//! reach the markup pathway.

mod blocks;
mod inline;

use std::fmt;

use serde::Serialize;

use crate::chat::message::{Message, Role};

/// CSS class names attached to the generated markup.
pub mod class {
    pub const HEADING: &str = "chat-heading";
    pub const SUBHEADING: &str = "chat-subheading";
    pub const STRONG: &str = "chat-strong";
    pub const EMPHASIS: &str = "chat-em";
    pub const CODE: &str = "chat-code";
    pub const LIST: &str = "chat-list";
    pub const LIST_ITEM: &str = "chat-list-item";
    pub const BULLET: &str = "chat-bullet";
    pub const LINK: &str = "chat-link";
    pub const PARAGRAPH: &str = "chat-paragraph";
    pub const EMOJI: &str = "chat-emoji";
    pub const CALLOUT: &str = "chat-callout";
    pub const CALLOUT_ICON: &str = "chat-callout-icon";
    pub const CALLOUT_TEXT: &str = "chat-callout-text";
    pub const USER_TEXT: &str = "chat-user-text";
}

/// Emoji that turn a line into a highlighted callout block.
pub const CALLOUT_MARKERS: &[&str] = &["🎯", "⚡", "💡", "📈", "🚀", "✅", "❌", "⚠️"];

/// Tags that count as a block-level wrapper at the top of a fragment.
const BLOCK_TAGS: &[&str] = &["<h3", "<h4", "<ul", "<div", "<p"];

/// An HTML fragment produced by this module.
///
/// Only the renderer can build one, which keeps plain strings (and therefore
/// user-authored text) from being mistaken for markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TrustedHtml(String);

impl TrustedHtml {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for TrustedHtml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for TrustedHtml {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Render a conversation message, picking the pathway from its role.
pub fn render_message(message: &Message) -> TrustedHtml {
    match message.role {
        Role::User => render_user_text(&message.content),
        Role::Assistant => render_agent_text(&message.content),
    }
}

/// Render agent-authored text through the markdown dialect.
///
/// Never fails: empty or malformed input degrades to literal text inside a
/// paragraph.
pub fn render_agent_text(text: &str) -> TrustedHtml {
    let escaped = escape_html(text);
    let parsed = blocks::parse(&escaped);
    TrustedHtml(ensure_block_wrapped(blocks::to_html(&parsed)))
}

/// Render user-authored text literally, line breaks preserved as-is.
pub fn render_user_text(text: &str) -> TrustedHtml {
    TrustedHtml(format!(
        r#"<div class="{}" style="white-space: pre-wrap">{}</div>"#,
        class::USER_TEXT,
        escape_html(text)
    ))
}

pub(crate) fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(ch),
        }
    }
    out
}

fn ensure_block_wrapped(html: String) -> String {
    let has_block = BLOCK_TAGS.iter().any(|tag| html.contains(tag));
    let starts_with_block = BLOCK_TAGS.iter().any(|tag| html.starts_with(tag));
    if has_block && starts_with_block {
        html
    } else {
        format!(r#"<p class="{}">{}</p>"#, class::PARAGRAPH, html)
    }
}

#[cfg(test)]
mod tests;
