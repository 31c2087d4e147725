//! HTML entity decoding for rendered text.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use std::sync::LazyLock;

/// Named entities decoded in rendered text.
const NAMED: &[(&str, &str)] = &[
    ("&amp;", "&"),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    ("&nbsp;", " "),
    ("&ndash;", "\u{2013}"),
    ("&mdash;", "\u{2014}"),
    ("&hellip;", "\u{2026}"),
    ("&lsquo;", "\u{2018}"),
    ("&rsquo;", "\u{2019}"),
    ("&ldquo;", "\u{201C}"),
    ("&rdquo;", "\u{201D}"),
    ("&bull;", "\u{2022}"),
    ("&middot;", "\u{00B7}"),
    ("&times;", "\u{00D7}"),
    ("&deg;", "\u{00B0}"),
    ("&copy;", "\u{00A9}"),
    ("&reg;", "\u{00AE}"),
    ("&trade;", "\u{2122}"),
    ("&euro;", "\u{20AC}"),
    ("&pound;", "\u{00A3}"),
];

/// Prefix of numeric character references.
const NUMERIC_PREFIX: &str = "&#";

/// Matcher over every entity prefix; `None` if the automaton cannot be built.
static ENTITY_AC: LazyLock<Option<AhoCorasick>> = LazyLock::new(|| {
    let patterns = NAMED
        .iter()
        .map(|(name, _)| *name)
        .chain(std::iter::once(NUMERIC_PREFIX));

    AhoCorasickBuilder::new()
        .ascii_case_insensitive(true)
        .match_kind(MatchKind::LeftmostFirst)
        .build(patterns)
        .ok()
});

/// Decode named and numeric character references.
///
/// Unknown or malformed references are left as written. Decoding is a single
/// pass, so `&amp;lt;` becomes `&lt;`, not `<`.
pub fn decode_entities(s: &str) -> String {
    let Some(matcher) = ENTITY_AC.as_ref() else {
        return s.to_string();
    };
    if !s.contains('&') {
        return s.to_string();
    }

    let mut out = String::with_capacity(s.len());
    let mut last = 0;

    for m in matcher.find_iter(s) {
        if m.start() < last {
            continue;
        }
        out.push_str(&s[last..m.start()]);

        match NAMED.get(m.pattern().as_usize()) {
            Some((_, decoded)) => {
                out.push_str(decoded);
                last = m.end();
            }
            None => match parse_numeric(&s[m.end()..]) {
                Some((ch, consumed)) => {
                    out.push(ch);
                    last = m.end() + consumed;
                }
                None => {
                    out.push_str(&s[m.start()..m.end()]);
                    last = m.end();
                }
            },
        }
    }

    out.push_str(&s[last..]);
    out
}

/// Parse `123;` or `x7B;` after `&#`. Returns the char and bytes consumed.
fn parse_numeric(rest: &str) -> Option<(char, usize)> {
    let (digits_start, radix) = match rest.as_bytes().first() {
        Some(b'x') | Some(b'X') => (1, 16),
        _ => (0, 10),
    };

    let body = &rest[digits_start..];
    let digits_len = body
        .bytes()
        .take_while(|b| (*b as char).is_digit(radix))
        .count();

    if digits_len == 0 || digits_len > 8 || body.as_bytes().get(digits_len) != Some(&b';') {
        return None;
    }

    let code = u32::from_str_radix(&body[..digits_len], radix).ok()?;
    let ch = match code {
        0 => '\u{FFFD}',
        // Treat non-breaking space like a plain space.
        0xA0 => ' ',
        _ => char::from_u32(code)?,
    };

    Some((ch, digits_start + digits_len + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matcher_builds() {
        assert!(ENTITY_AC.is_some());
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(decode_entities("Tom &amp; Jerry"), "Tom & Jerry");
        assert_eq!(decode_entities("&lt;b&gt;"), "<b>");
        assert_eq!(decode_entities("a&nbsp;b"), "a b");
        assert_eq!(decode_entities("&QUOT;x&quot;"), "\"x\"");
    }

    #[test]
    fn test_numeric_entities() {
        assert_eq!(decode_entities("it&#39;s"), "it's");
        assert_eq!(decode_entities("&#x27;quoted&#X27;"), "'quoted'");
        assert_eq!(decode_entities("21&#176;C"), "21\u{00B0}C");
    }

    #[test]
    fn test_single_pass() {
        assert_eq!(decode_entities("&amp;lt;"), "&lt;");
    }

    #[test]
    fn test_malformed_left_alone() {
        assert_eq!(decode_entities("AT&T"), "AT&T");
        assert_eq!(decode_entities("&#;"), "&#;");
        assert_eq!(decode_entities("&#12"), "&#12");
        assert_eq!(decode_entities("&unknown;"), "&unknown;");
        assert_eq!(decode_entities("&#xZZ;"), "&#xZZ;");
    }
}
