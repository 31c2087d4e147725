//! # Scrapelite Agent HTML
//!
//! HTML processing for scrapelite_agent: strips page noise and renders what is
//! left as Markdown for the extraction model.
//!
//! Uses `lol_html` for fast, streaming HTML rewriting.
//!
//! ## Dependencies
//!
//! - `lol_html` - streaming HTML rewriter
//! - `aho-corasick` - entity decoding

mod cleaning;
mod entities;
mod markdown;

pub use cleaning::clean_html_for_text;
pub use entities::decode_entities;
pub use markdown::{html_to_markdown, page_to_markdown};
