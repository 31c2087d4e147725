//! Element indexing.
//!
//! Each pass clears the markers of the previous pass, scans the live page for
//! visible interactive elements, tags every survivor with a `data-idx`
//! marker and returns an [`IndexPass`] describing them. Handles from an older
//! pass must not be used once a new pass has run.

use super::helpers::{collapse_whitespace, truncate_chars};
use crate::page::{within, BrowserPage, ElementHandle, PageError, PageResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Removes every marker left by an earlier pass.
pub const CLEAR_MARKERS_SCRIPT: &str = r#"(() => {
  document.querySelectorAll('[data-idx]').forEach((el) => el.removeAttribute('data-idx'));
  return true;
})()"#;

/// Marks visible interactive elements in document order and returns their
/// raw attributes.
pub const SCAN_SCRIPT: &str = r#"(() => {
  const selector = [
    'a', 'button', 'input', 'select', 'textarea',
    '[role="button"]', '[role="link"]', '[role="searchbox"]', '[role="textbox"]'
  ].join(', ');
  const out = [];
  let idx = 0;
  for (const el of document.querySelectorAll(selector)) {
    const style = window.getComputedStyle(el);
    if (el.offsetParent === null && style.position !== 'fixed') continue;
    if (style.visibility === 'hidden' || style.display === 'none') continue;
    el.setAttribute('data-idx', String(idx));
    out.push({
      tag: el.tagName.toLowerCase(),
      role: el.getAttribute('role') || '',
      text: (el.innerText || '').trim(),
      aria_label: el.getAttribute('aria-label') || '',
      href: el.href || '',
      placeholder: el.placeholder || '',
      name: el.name || '',
      input_type: el.type || '',
    });
    idx++;
  }
  return out;
})()"#;

/// Characters of link text kept in a label.
pub const LINK_TEXT_MAX_CHARS: usize = 50;

/// Coarse element category shown to the planning oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementKind {
    /// Anchor or `role=link`.
    Link,
    /// Button or `role=button`.
    Button,
    /// Input, `role=searchbox` or `role=textbox`.
    Input,
    /// `<select>`.
    Dropdown,
    /// `<textarea>`.
    Textarea,
}

impl ElementKind {
    /// Classify by tag and role; link wins over button, button over inputs.
    pub fn classify(tag: &str, role: &str) -> Self {
        let tag = tag.to_ascii_lowercase();
        let role = role.trim().to_ascii_lowercase();

        if tag == "a" || role == "link" {
            Self::Link
        } else if tag == "button" || role == "button" {
            Self::Button
        } else if tag == "input" || role == "searchbox" || role == "textbox" {
            Self::Input
        } else if tag == "select" {
            Self::Dropdown
        } else if tag == "textarea" {
            Self::Textarea
        } else {
            // Only reachable for selector matches the scan never produces.
            Self::Button
        }
    }

    /// Upper-case name used in the inventory text.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Link => "LINK",
            Self::Button => "BUTTON",
            Self::Input => "INPUT",
            Self::Dropdown => "DROPDOWN",
            Self::Textarea => "TEXTAREA",
        }
    }
}

impl std::fmt::Display for ElementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw attributes of one marked element, as returned by [`SCAN_SCRIPT`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawCandidate {
    /// Lowercase tag name.
    pub tag: String,
    /// `role` attribute.
    pub role: String,
    /// Rendered text.
    pub text: String,
    /// `aria-label` attribute.
    pub aria_label: String,
    /// Resolved link target.
    pub href: String,
    /// Placeholder text.
    pub placeholder: String,
    /// Form control name.
    pub name: String,
    /// Input type.
    pub input_type: String,
}

impl RawCandidate {
    /// Category of this element.
    pub fn kind(&self) -> ElementKind {
        ElementKind::classify(&self.tag, &self.role)
    }

    /// Best-effort human-readable label for `kind`.
    pub fn label(&self, kind: ElementKind) -> String {
        let link_text = truncate_chars(self.text.trim(), LINK_TEXT_MAX_CHARS);

        let chain: [&str; 4] = match kind {
            ElementKind::Link => [link_text, self.aria_label.as_str(), self.href.as_str(), ""],
            ElementKind::Button => [self.text.as_str(), self.aria_label.as_str(), "", ""],
            ElementKind::Input => [
                self.placeholder.as_str(),
                self.aria_label.as_str(),
                self.name.as_str(),
                self.input_type.as_str(),
            ],
            ElementKind::Textarea => [self.placeholder.as_str(), self.aria_label.as_str(), "", ""],
            ElementKind::Dropdown => [self.name.as_str(), "", "", ""],
        };

        chain
            .iter()
            .map(|s| collapse_whitespace(s))
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| default_label(kind).to_string())
    }
}

fn default_label(kind: ElementKind) -> &'static str {
    match kind {
        ElementKind::Link => "link",
        ElementKind::Button => "button",
        ElementKind::Input => "input",
        ElementKind::Dropdown => "select",
        ElementKind::Textarea => "textarea",
    }
}

/// One interactive element of a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementDescriptor {
    /// Pass-scoped handle.
    pub handle: ElementHandle,
    /// Category.
    pub kind: ElementKind,
    /// Label hint.
    pub label: String,
}

impl std::fmt::Display for ElementDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: \"{}\"", self.handle, self.kind, self.label)
    }
}

/// Result of one indexing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexPass {
    /// Descriptors in visitation order; `descriptors[i].handle == i`.
    pub descriptors: Vec<ElementDescriptor>,
    /// Page URL at scan time.
    pub url: String,
    /// Page title at scan time.
    pub title: String,
}

impl IndexPass {
    /// Build a pass from scan output, assigning handles `0..n`.
    pub fn from_candidates(candidates: Vec<RawCandidate>, url: String, title: String) -> Self {
        let descriptors = candidates
            .into_iter()
            .enumerate()
            .map(|(i, raw)| {
                let kind = raw.kind();
                ElementDescriptor {
                    handle: ElementHandle(i as u32),
                    kind,
                    label: raw.label(kind),
                }
            })
            .collect();

        Self {
            descriptors,
            url,
            title,
        }
    }

    /// Number of indexed elements.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Whether the pass found nothing.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Look up a handle issued by this pass.
    pub fn get(&self, handle: ElementHandle) -> Option<&ElementDescriptor> {
        self.descriptors.get(handle.0 as usize)
    }

    /// Whether `handle` was issued by this pass.
    pub fn contains(&self, handle: ElementHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Compact inventory for the planning oracle.
    pub fn inventory_text(&self) -> String {
        let mut out = format!("URL: {}\nTitle: {}\n\nElements:", self.url, self.title);
        for d in &self.descriptors {
            out.push('\n');
            out.push_str(&d.to_string());
        }
        out
    }
}

/// Run one indexing pass over `page`, bounding each page call by `timeout`.
pub async fn index<P: BrowserPage + ?Sized>(page: &P, timeout: Duration) -> PageResult<IndexPass> {
    within(timeout, page.evaluate(CLEAR_MARKERS_SCRIPT)).await?;

    let value = within(timeout, page.evaluate(SCAN_SCRIPT)).await?;
    let candidates: Vec<RawCandidate> = serde_json::from_value(value)
        .map_err(|e| PageError::Script(format!("unexpected scan result: {}", e)))?;

    let url = within(timeout, page.url()).await.unwrap_or_else(|e| {
        log::debug!("could not read page url: {}", e);
        String::new()
    });
    let title = within(timeout, page.title()).await.unwrap_or_else(|e| {
        log::debug!("could not read page title: {}", e);
        String::new()
    });

    let pass = IndexPass::from_candidates(candidates, url, title);
    log::debug!("indexed {} interactive elements on {}", pass.len(), pass.url);
    Ok(pass)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(tag: &str) -> RawCandidate {
        RawCandidate {
            tag: tag.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_classify_precedence() {
        assert_eq!(ElementKind::classify("a", ""), ElementKind::Link);
        assert_eq!(ElementKind::classify("a", "button"), ElementKind::Link);
        assert_eq!(ElementKind::classify("div", "button"), ElementKind::Button);
        assert_eq!(ElementKind::classify("div", "link"), ElementKind::Link);
        assert_eq!(ElementKind::classify("button", "textbox"), ElementKind::Button);
        assert_eq!(ElementKind::classify("div", "searchbox"), ElementKind::Input);
        assert_eq!(ElementKind::classify("textarea", "textbox"), ElementKind::Input);
        assert_eq!(ElementKind::classify("SELECT", ""), ElementKind::Dropdown);
        assert_eq!(ElementKind::classify("textarea", ""), ElementKind::Textarea);
    }

    #[test]
    fn test_link_label_fallbacks() {
        let mut r = raw("a");
        assert_eq!(r.label(ElementKind::Link), "link");
        r.href = "https://example.com/about".into();
        assert_eq!(r.label(ElementKind::Link), "https://example.com/about");
        r.aria_label = "About us".into();
        assert_eq!(r.label(ElementKind::Link), "About us");
        r.text = "x".repeat(80);
        assert_eq!(r.label(ElementKind::Link).len(), LINK_TEXT_MAX_CHARS);
    }

    #[test]
    fn test_button_text_is_not_truncated() {
        let mut r = raw("button");
        r.text = "y".repeat(80);
        assert_eq!(r.label(ElementKind::Button).len(), 80);
        r.text = "   ".into();
        assert_eq!(r.label(ElementKind::Button), "button");
    }

    #[test]
    fn test_input_and_other_labels() {
        let mut r = raw("input");
        r.input_type = "text".into();
        assert_eq!(r.label(ElementKind::Input), "text");
        r.name = "q".into();
        assert_eq!(r.label(ElementKind::Input), "q");
        r.placeholder = "Search".into();
        assert_eq!(r.label(ElementKind::Input), "Search");

        let mut s = raw("select");
        assert_eq!(s.label(ElementKind::Dropdown), "select");
        s.name = "country".into();
        assert_eq!(s.label(ElementKind::Dropdown), "country");

        let mut t = raw("textarea");
        assert_eq!(t.label(ElementKind::Textarea), "textarea");
        t.aria_label = "Comment".into();
        assert_eq!(t.label(ElementKind::Textarea), "Comment");
    }

    #[test]
    fn test_handles_are_sequential_and_inventory_format() {
        let mut link = raw("a");
        link.text = "Home".into();
        let mut input = raw("input");
        input.placeholder = "Search".into();
        let mut button = raw("button");
        button.text = "Go\n  now".into();

        let pass = IndexPass::from_candidates(
            vec![link, input, button],
            "https://example.com/".into(),
            "Example".into(),
        );

        let handles: Vec<u32> = pass.descriptors.iter().map(|d| d.handle.0).collect();
        assert_eq!(handles, vec![0, 1, 2]);
        assert!(pass.contains(ElementHandle(2)));
        assert!(!pass.contains(ElementHandle(3)));

        assert_eq!(
            pass.inventory_text(),
            "URL: https://example.com/\nTitle: Example\n\nElements:\n\
             [0] LINK: \"Home\"\n[1] INPUT: \"Search\"\n[2] BUTTON: \"Go now\""
        );
    }

    #[test]
    fn test_raw_candidate_tolerates_missing_keys() {
        let v = serde_json::json!([{ "tag": "a", "text": "Docs" }]);
        let parsed: Vec<RawCandidate> = serde_json::from_value(v).unwrap();
        assert_eq!(parsed[0].kind(), ElementKind::Link);
        assert_eq!(parsed[0].label(ElementKind::Link), "Docs");
    }
}
