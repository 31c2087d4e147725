//! Noise removal ahead of Markdown rendering.

use lol_html::{doc_comments, element, rewrite_str, RewriteStrSettings};

/// Remove the parts of a page that carry no readable content.
///
/// Removes:
/// - `<script>` and `<noscript>` tags
/// - `<style>` and `<template>` tags
/// - `<nav>` tags
/// - `<footer>` tags
/// - HTML comments
///
/// Returns the input unchanged when it cannot be rewritten.
pub fn clean_html_for_text(html: &str) -> String {
    match rewrite_str(
        html,
        RewriteStrSettings {
            element_content_handlers: vec![
                element!("script, noscript", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("style, template", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("nav", |el| {
                    el.remove();
                    Ok(())
                }),
                element!("footer", |el| {
                    el.remove();
                    Ok(())
                }),
            ],
            document_content_handlers: vec![doc_comments!(|c| {
                c.remove();
                Ok(())
            })],
            ..RewriteStrSettings::new()
        },
    ) {
        Ok(r) => r,
        _ => html.into(),
    }
}
