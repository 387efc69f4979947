//! Inline rewrites applied to a single line of agent text.
//!
//! Order matters: bold runs before italics so the italic pattern never sees
//! a `**` pair, and emoji wrapping runs last, after callout detection has
//! looked at the raw line.

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::class;

fn re_bold() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*\*(.*?)\*\*").expect("re_bold: pattern is valid and should always compile")
    })
}

fn re_italic() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*([^*]+)\*").expect("re_italic: pattern is valid and should always compile")
    })
}

fn re_inline_code() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"`([^`]+)`")
            .expect("re_inline_code: pattern is valid and should always compile")
    })
}

fn re_link() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\[([^\]]+)\]\(([^)]+)\)")
            .expect("re_link: pattern is valid and should always compile")
    })
}

fn re_tag() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("re_tag: pattern is valid and should always compile"))
}

fn re_emoji() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}",
            r"\x{1F1E0}-\x{1F1FF}\x{2600}-\x{26FF}\x{2700}-\x{27BF}]"
        ))
        .expect("re_emoji: pattern is valid and should always compile")
    })
}

/// Bold, italic, inline code and links, in that order.
pub(super) fn render_spans(line: &str) -> String {
    let out = re_bold().replace_all(line, |caps: &Captures| {
        format!(r#"<strong class="{}">{}</strong>"#, class::STRONG, &caps[1])
    });
    let out = re_italic().replace_all(&out, |caps: &Captures| {
        format!(r#"<em class="{}">{}</em>"#, class::EMPHASIS, &caps[1])
    });
    let out = re_inline_code().replace_all(&out, |caps: &Captures| {
        format!(r#"<code class="{}">{}</code>"#, class::CODE, &caps[1])
    });
    let out = re_link().replace_all(&out, |caps: &Captures| {
        if !is_safe_url(&caps[2]) {
            return caps[0].to_string();
        }
        format!(
            r#"<a href="{}" target="_blank" rel="noopener noreferrer" class="{}">{}</a>"#,
            &caps[2],
            class::LINK,
            &caps[1]
        )
    });
    out.into_owned()
}

/// Only web and mail links become anchors; anything else stays literal.
fn is_safe_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    ["http://", "https://", "mailto:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Wrap each emoji code point in a size-emphasis span. Text inside tags
/// (attribute values included) is left alone.
pub(super) fn wrap_emoji(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut last = 0;
    for tag in re_tag().find_iter(html) {
        out.push_str(&wrap_text_emoji(&html[last..tag.start()]));
        out.push_str(tag.as_str());
        last = tag.end();
    }
    out.push_str(&wrap_text_emoji(&html[last..]));
    out
}

fn wrap_text_emoji(text: &str) -> std::borrow::Cow<'_, str> {
    re_emoji().replace_all(text, |caps: &Captures| {
        format!(r#"<span class="{}">{}</span>"#, class::EMOJI, &caps[0])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_pairs_with_nearest_marker() {
        let out = render_spans("**a** and **b**");
        assert_eq!(out.matches("<strong").count(), 2);
        assert!(out.contains(">a</strong> and <strong"));
    }

    #[test]
    fn test_italic_runs_after_bold() {
        let out = render_spans("**strong** *soft*");
        assert!(out.contains(r#"<strong class="chat-strong">strong</strong>"#));
        assert!(out.contains(r#"<em class="chat-em">soft</em>"#));
        assert!(!out.contains('*'));
    }

    #[test]
    fn test_inline_code() {
        assert_eq!(
            render_spans("run `cargo`"),
            r#"run <code class="chat-code">cargo</code>"#
        );
    }

    #[test]
    fn test_unmatched_markers_stay_literal() {
        assert_eq!(render_spans("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(render_spans("a ` b"), "a ` b");
    }

    #[test]
    fn test_emoji_wrapped_individually() {
        let out = wrap_emoji("hola 🚀🔥");
        assert_eq!(out.matches(r#"<span class="chat-emoji">"#).count(), 2);
        assert!(out.starts_with("hola "));
    }

    #[test]
    fn test_emoji_inside_tag_untouched() {
        let out = wrap_emoji(r#"<a href="http://x.com/☀">sol ☀</a>"#);
        assert_eq!(
            out,
            r#"<a href="http://x.com/☀">sol <span class="chat-emoji">☀</span></a>"#
        );
    }

    #[test]
    fn test_unsafe_link_schemes_stay_literal() {
        assert_eq!(render_spans("[x](javascript:alert(1))"), "[x](javascript:alert(1))");
        assert_eq!(render_spans("[x](JavaScript:void)"), "[x](JavaScript:void)");
        assert_eq!(render_spans("[x](data:text/html,hi)"), "[x](data:text/html,hi)");
        assert!(render_spans("[x](HTTPS://ok.com)").starts_with("<a "));
        assert!(render_spans("[mail](mailto:a@b.com)").contains(r#"href="mailto:a@b.com""#));
    }

    #[test]
    fn test_bullet_point_is_not_emoji() {
        assert_eq!(wrap_emoji("• item"), "• item");
    }
}
