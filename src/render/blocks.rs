//! Line scanner that groups agent text into blocks.

use super::inline::{render_spans, wrap_emoji};
use super::{class, CALLOUT_MARKERS};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Block {
    Heading { level: u8, html: String },
    List(Vec<String>),
    Callout { marker: &'static str, html: String },
    Paragraph(Vec<String>),
}

#[derive(Debug)]
enum Line {
    Blank,
    Heading { level: u8, html: String },
    Callout { marker: &'static str, html: String },
    ListItem(String),
    Text(String),
}

fn classify(raw: &str) -> Line {
    let raw = raw.trim_end_matches('\r');

    // Headings are anchored at column 0, so they are checked before trimming.
    if let Some(rest) = raw.strip_prefix("### ") {
        if !rest.trim().is_empty() {
            return Line::Heading {
                level: 4,
                html: wrap_emoji(&render_spans(rest.trim())),
            };
        }
    }
    if let Some(rest) = raw.strip_prefix("## ") {
        if !rest.trim().is_empty() {
            return Line::Heading {
                level: 3,
                html: wrap_emoji(&render_spans(rest.trim())),
            };
        }
    }

    let line = raw.trim();
    if line.is_empty() {
        return Line::Blank;
    }

    for marker in CALLOUT_MARKERS {
        if let Some(rest) = line.strip_prefix(marker) {
            let rest = rest.trim_start();
            if !rest.is_empty() {
                return Line::Callout {
                    marker,
                    html: wrap_emoji(&render_spans(rest)),
                };
            }
        }
    }

    let spans = render_spans(line);
    match spans.strip_prefix(['•', '-', '*']) {
        Some(item) => Line::ListItem(wrap_emoji(item.trim_start())),
        None => Line::Text(wrap_emoji(&spans)),
    }
}

pub(super) fn parse(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut paragraph: Vec<String> = Vec::new();
    let mut list: Vec<String> = Vec::new();

    fn flush(blocks: &mut Vec<Block>, paragraph: &mut Vec<String>, list: &mut Vec<String>) {
        if !list.is_empty() {
            blocks.push(Block::List(std::mem::take(list)));
        }
        if !paragraph.is_empty() {
            blocks.push(Block::Paragraph(std::mem::take(paragraph)));
        }
    }

    for raw in text.split('\n') {
        match classify(raw) {
            Line::Blank => flush(&mut blocks, &mut paragraph, &mut list),
            Line::Heading { level, html } => {
                flush(&mut blocks, &mut paragraph, &mut list);
                blocks.push(Block::Heading { level, html });
            }
            Line::Callout { marker, html } => {
                flush(&mut blocks, &mut paragraph, &mut list);
                blocks.push(Block::Callout { marker, html });
            }
            Line::ListItem(item) => {
                if !paragraph.is_empty() {
                    blocks.push(Block::Paragraph(std::mem::take(&mut paragraph)));
                }
                list.push(item);
            }
            Line::Text(html) => {
                if !list.is_empty() {
                    blocks.push(Block::List(std::mem::take(&mut list)));
                }
                paragraph.push(html);
            }
        }
    }
    flush(&mut blocks, &mut paragraph, &mut list);
    blocks
}

pub(super) fn to_html(blocks: &[Block]) -> String {
    let mut out = String::new();
    for block in blocks {
        match block {
            Block::Heading { level, html } => {
                let css = if *level == 3 {
                    class::HEADING
                } else {
                    class::SUBHEADING
                };
                out.push_str(&format!(r#"<h{level} class="{css}">{html}</h{level}>"#));
            }
            Block::List(items) => {
                out.push_str(&format!(r#"<ul class="{}">"#, class::LIST));
                for item in items {
                    out.push_str(&format!(
                        r#"<li class="{}"><span class="{}">•</span><span>{}</span></li>"#,
                        class::LIST_ITEM,
                        class::BULLET,
                        item
                    ));
                }
                out.push_str("</ul>");
            }
            Block::Callout { marker, html } => {
                out.push_str(&format!(
                    r#"<div class="{}"><span class="{}">{}</span><span class="{}">{}</span></div>"#,
                    class::CALLOUT,
                    class::CALLOUT_ICON,
                    marker,
                    class::CALLOUT_TEXT,
                    html
                ));
            }
            Block::Paragraph(lines) => {
                out.push_str(&format!(
                    r#"<p class="{}">{}</p>"#,
                    class::PARAGRAPH,
                    lines.join("<br>")
                ));
            }
        }
    }
    out
}
