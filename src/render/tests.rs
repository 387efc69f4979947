use super::*;
use crate::chat::message::Message;

fn agent(text: &str) -> String {
    render_agent_text(text).into_string()
}

#[test]
fn test_bold_becomes_strong() {
    let out = agent("**bold**");
    assert!(out.contains(r#"<strong class="chat-strong">bold</strong>"#));
}

#[test]
fn test_bullets_join_one_list_with_markers_stripped() {
    let out = agent("• a\n• b");
    assert_eq!(out.matches("<ul").count(), 1);
    assert_eq!(out.matches("<li").count(), 2);
    assert!(out.contains("<span>a</span>"));
    assert!(out.contains("<span>b</span>"));
    assert!(!out.contains("• a"));
}

#[test]
fn test_dash_and_star_bullets() {
    let out = agent("- uno\n* dos");
    assert_eq!(out.matches("<li").count(), 2);
    assert!(out.contains("<span>uno</span>"));
    assert!(out.contains("<span>dos</span>"));
}

#[test]
fn test_link_opens_in_new_context_without_referrer() {
    let out = agent("[go](http://x)");
    assert!(out.contains(r#"href="http://x""#));
    assert!(out.contains(r#"target="_blank""#));
    assert!(out.contains("noreferrer"));
    assert!(out.contains("noopener"));
    assert!(out.contains(">go</a>"));
}

#[test]
fn test_headings() {
    let out = agent("## Plan\n### Paso 1");
    assert!(out.starts_with(r#"<h3 class="chat-heading">Plan</h3>"#));
    assert!(out.contains(r#"<h4 class="chat-subheading">Paso 1</h4>"#));
}

#[test]
fn test_paragraphs_and_line_breaks() {
    let out = agent("uno\ndos\n\ntres");
    assert_eq!(
        out,
        r#"<p class="chat-paragraph">uno<br>dos</p><p class="chat-paragraph">tres</p>"#
    );
}

#[test]
fn test_plain_text_wrapped_exactly_once() {
    let first = agent("hola");
    assert_eq!(first, r#"<p class="chat-paragraph">hola</p>"#);
    assert_eq!(first.matches("<p").count(), 1);

    // A second pass treats the markup as text: one new wrapper, old tags escaped.
    let second = agent(&first);
    assert_eq!(second.matches("<p").count(), 1);
    assert_eq!(second.matches("&lt;p").count(), 1);
    assert!(second.starts_with(r#"<p class="chat-paragraph">"#));
}

#[test]
fn test_empty_and_whitespace_render_to_empty_paragraph() {
    assert_eq!(agent(""), r#"<p class="chat-paragraph"></p>"#);
    assert_eq!(agent("  \n \n"), r#"<p class="chat-paragraph"></p>"#);
}

#[test]
fn test_callout_line() {
    let out = agent("🎯 Objetivo claro");
    assert_eq!(
        out,
        concat!(
            r#"<div class="chat-callout"><span class="chat-callout-icon">🎯</span>"#,
            r#"<span class="chat-callout-text">Objetivo claro</span></div>"#
        )
    );
}

#[test]
fn test_warning_callout_with_variation_selector() {
    let out = agent("⚠️ Cuidado con **esto**");
    assert!(out.starts_with(r#"<div class="chat-callout">"#));
    assert!(out.contains(r#"<strong class="chat-strong">esto</strong>"#));
}

#[test]
fn test_emoji_outside_callout_gets_size_span() {
    let out = agent("Vamos 🚀 ya");
    assert!(out.contains(r#"<span class="chat-emoji">🚀</span>"#));
    assert!(out.starts_with("<p"));
}

#[test]
fn test_agent_html_is_escaped() {
    let out = agent("<script>alert(1)</script>");
    assert!(!out.contains("<script>"));
    assert!(out.contains("&lt;script&gt;"));
}

#[test]
fn test_mixed_reply() {
    let out = agent(
        "## Estrategia\n\nTe propongo:\n• **Instagram** primero\n• `WhatsApp Business`\n\n💡 Empezá hoy",
    );
    assert!(out.starts_with("<h3"));
    assert!(out.contains(r#"<p class="chat-paragraph">Te propongo:</p><ul"#));
    assert!(out.contains(r#"<span><strong class="chat-strong">Instagram</strong> primero</span>"#));
    assert!(out.contains(r#"<code class="chat-code">WhatsApp Business</code>"#));
    assert!(out.ends_with("</div>"));
}

#[test]
fn test_user_text_is_literal() {
    let out = render_user_text("**no** <b>tags</b>\nsegunda").into_string();
    assert!(out.contains("**no**"));
    assert!(out.contains("&lt;b&gt;tags&lt;/b&gt;"));
    assert!(out.contains("\nsegunda"));
    assert!(!out.contains("<strong"));
    assert!(!out.contains("<br>"));
}

#[test]
fn test_render_message_dispatches_on_role() {
    let user = Message::user("**hola**");
    let reply = Message::assistant("**hola**");
    assert!(!render_message(&user).as_str().contains("<strong"));
    assert!(render_message(&reply).as_str().contains("<strong"));
}

#[test]
fn test_emoji_in_link_url_keeps_markup_valid() {
    let out = agent("[sol](http://x.com/☀)");
    assert!(out.contains(r#"href="http://x.com/☀""#));
    assert!(!out.contains(r#"href="http://x.com/<span"#));
    assert!(out.contains(">sol</a>"));
}

#[test]
fn test_script_link_is_not_clickable() {
    let out = agent("[clic](javascript:alert(document.cookie))");
    assert!(!out.contains("<a "));
    assert!(!out.contains("href="));
    assert!(out.contains("[clic](javascript:alert(document.cookie))"));
}
