//! Markdown rendering of cleaned HTML.
//!
//! Tags are rewritten in one `lol_html` pass: structural tags leave private-use
//! markers for line breaks and preformatted blocks, inline tags leave their
//! Markdown punctuation, and every tag is then unwrapped. A second pass over
//! the text decodes entities, collapses whitespace and turns the markers into
//! newlines.

use crate::cleaning::clean_html_for_text;
use crate::entities::decode_entities;
use lol_html::html_content::ContentType;
use lol_html::{element, rewrite_str, RewriteStrSettings};

/// Hard line break.
const BREAK: char = '\u{E000}';
/// Start of a preformatted block.
const PRE_OPEN: char = '\u{E001}';
/// End of a preformatted block.
const PRE_CLOSE: char = '\u{E002}';

const BLOCK_BREAK: &str = "\u{E000}\u{E000}";
const LINE_BREAK: &str = "\u{E000}";

/// Clean a full page and render it as Markdown.
pub fn page_to_markdown(html: &str) -> String {
    html_to_markdown(&clean_html_for_text(html))
}

/// Render HTML as Markdown.
///
/// ATX headings, `- ` list items, `[text](href)` links, `![alt](src)`
/// images, `**bold**`, `*italic*`, `` `code` `` and fenced preformatted
/// blocks. Other tags are unwrapped. Runs of blank lines collapse to one.
pub fn html_to_markdown(html: &str) -> String {
    let rendered = match rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("h1, h2, h3, h4, h5, h6", |el| {
                    let level = el
                        .tag_name()
                        .get(1..)
                        .and_then(|n| n.parse::<usize>().ok())
                        .unwrap_or(1)
                        .clamp(1, 6);
                    let prefix = format!("{}{} ", BLOCK_BREAK, "#".repeat(level));
                    el.before(&prefix, ContentType::Html);
                    el.after(BLOCK_BREAK, ContentType::Html);
                    Ok(())
                }),
                element!(
                    "p, div, section, article, main, header, aside, form, figure, figcaption, \
                     blockquote, table, address, details, summary, dl, dt, dd, fieldset, ul, ol",
                    |el| {
                        el.before(BLOCK_BREAK, ContentType::Html);
                        el.after(BLOCK_BREAK, ContentType::Html);
                        Ok(())
                    }
                ),
                element!("li", |el| {
                    el.before(&format!("{}- ", LINE_BREAK), ContentType::Html);
                    Ok(())
                }),
                element!("tr", |el| {
                    el.before(LINE_BREAK, ContentType::Html);
                    el.after(LINE_BREAK, ContentType::Html);
                    Ok(())
                }),
                element!("td, th", |el| {
                    el.after(" ", ContentType::Html);
                    Ok(())
                }),
                element!("br", |el| {
                    el.replace(LINE_BREAK, ContentType::Html);
                    Ok(())
                }),
                element!("hr", |el| {
                    el.replace(&format!("{0}---{0}", BLOCK_BREAK), ContentType::Html);
                    Ok(())
                }),
                element!("strong, b", |el| {
                    el.before("**", ContentType::Html);
                    el.after("**", ContentType::Html);
                    Ok(())
                }),
                element!("em, i", |el| {
                    el.before("*", ContentType::Html);
                    el.after("*", ContentType::Html);
                    Ok(())
                }),
                element!("code", |el| {
                    el.before("`", ContentType::Html);
                    el.after("`", ContentType::Html);
                    Ok(())
                }),
                element!("pre", |el| {
                    el.before(&PRE_OPEN.to_string(), ContentType::Html);
                    el.after(&PRE_CLOSE.to_string(), ContentType::Html);
                    Ok(())
                }),
                element!("a[href]", |el| {
                    if let Some(href) = el.get_attribute("href") {
                        let href = href.trim().to_string();
                        if !href.is_empty() && !href.starts_with("javascript:") {
                            el.before("[", ContentType::Html);
                            el.after(&format!("]({})", href), ContentType::Html);
                        }
                    }
                    Ok(())
                }),
                element!("img", |el| {
                    match el.get_attribute("src") {
                        Some(src) if !src.trim().is_empty() && !src.starts_with("data:") => {
                            let alt = el.get_attribute("alt").unwrap_or_default();
                            el.replace(&format!("![{}]({})", alt.trim(), src.trim()), ContentType::Html);
                        }
                        _ => el.remove(),
                    }
                    Ok(())
                }),
                element!("*", |el| {
                    if !el.removed() {
                        el.remove_and_keep_content();
                    }
                    Ok(())
                }),
            ],
            ..RewriteStrSettings::new()
        },
    ) {
        Ok(r) => r,
        _ => html.into(),
    };

    finish(&decode_entities(&rendered))
}

/// Turn marker-annotated text into final Markdown.
fn finish(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(open) = rest.find(PRE_OPEN) {
        push_flow(&mut out, &rest[..open]);
        let after = &rest[open + PRE_OPEN.len_utf8()..];
        let (block, tail) = match after.find(PRE_CLOSE) {
            Some(close) => (&after[..close], &after[close + PRE_CLOSE.len_utf8()..]),
            None => (after, ""),
        };
        push_code_block(&mut out, block);
        rest = tail;
    }
    push_flow(&mut out, rest);

    collapse_blank_lines(out.trim())
}

/// Append flowing text: whitespace runs become one space, markers newlines.
fn push_flow(out: &mut String, text: &str) {
    let mut pending_space = false;

    for ch in text.chars() {
        if ch == BREAK {
            out.push('\n');
            pending_space = false;
        } else if ch == PRE_OPEN || ch == PRE_CLOSE {
            continue;
        } else if ch.is_whitespace() {
            pending_space = true;
        } else {
            if pending_space && !out.is_empty() && !out.ends_with('\n') && !out.ends_with(' ') {
                out.push(' ');
            }
            pending_space = false;
            out.push(ch);
        }
    }
}

/// Append a fenced code block, keeping its whitespace.
fn push_code_block(out: &mut String, block: &str) {
    let body: String = block
        .chars()
        .filter_map(|ch| match ch {
            BREAK => Some('\n'),
            PRE_OPEN | PRE_CLOSE => None,
            '\r' => None,
            other => Some(other),
        })
        .collect();

    let mut body = body.trim_matches('\n').trim_end();
    if body.len() >= 2 && body.starts_with('`') && body.ends_with('`') {
        body = &body[1..body.len() - 1];
    }

    out.push_str("\n\n```\n");
    out.push_str(body);
    out.push_str("\n```\n\n");
}

/// Collapse three or more consecutive newlines to two.
fn collapse_blank_lines(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut newlines = 0;

    for ch in text.chars() {
        if ch == '\n' {
            newlines += 1;
            if newlines <= 2 {
                out.push(ch);
            }
        } else {
            newlines = 0;
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headings_paragraphs_lists_links() {
        let html = r#"<h1>Title</h1><p>Hello <b>world</b> &amp; friends</p>
<ul>
  <li>One</li>
  <li>Two</li>
</ul>
<a href="/x">Link</a>"#;

        assert_eq!(
            html_to_markdown(html),
            "# Title\n\nHello **world** & friends\n\n- One\n- Two\n\n[Link](/x)"
        );
    }

    #[test]
    fn test_heading_levels() {
        assert_eq!(html_to_markdown("<h3>Deep</h3>"), "### Deep");
        assert_eq!(html_to_markdown("<H2>Upper</H2>"), "## Upper");
    }

    #[test]
    fn test_inline_markup_and_breaks() {
        assert_eq!(
            html_to_markdown("<p><em>a</em> <code>b()</code><br>next line</p>"),
            "*a* `b()`\nnext line"
        );
    }

    #[test]
    fn test_images() {
        assert_eq!(
            html_to_markdown(r#"<img src="/logo.png" alt="Logo">"#),
            "![Logo](/logo.png)"
        );
        assert_eq!(html_to_markdown(r#"<p>x<img src="data:image/png;base64,AAA"></p>"#), "x");
    }

    #[test]
    fn test_javascript_links_are_unwrapped() {
        assert_eq!(
            html_to_markdown(r#"<a href="javascript:void(0)">Menu</a>"#),
            "Menu"
        );
    }

    #[test]
    fn test_preformatted_keeps_whitespace() {
        let html = "<p>Run:</p><pre><code>cargo build\n  --release</code></pre>";
        assert_eq!(
            html_to_markdown(html),
            "Run:\n\n```\ncargo build\n  --release\n```"
        );
    }

    #[test]
    fn test_source_whitespace_is_collapsed() {
        let html = "<div>\n    Temperature:\n      <span>21°C</span>\n</div>\n\n\n\n<div>Wind</div>";
        assert_eq!(html_to_markdown(html), "Temperature: 21°C\n\nWind");
    }

    #[test]
    fn test_page_to_markdown_cleans_first() {
        let html = r#"<html><head><script>var x = 1;</script></head><body>
<nav><a href="/">Home</a></nav>
<h2>Weather</h2><p>Sunny, 21&#176;C</p>
<footer>Contact</footer></body></html>"#;

        assert_eq!(page_to_markdown(html), "## Weather\n\nSunny, 21°C");
    }

    #[test]
    fn test_collapse_blank_lines() {
        assert_eq!(collapse_blank_lines("a\n\n\n\nb\nc"), "a\n\nb\nc");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(page_to_markdown(""), "");
    }
}
