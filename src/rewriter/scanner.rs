// src/rewriter/scanner.rs
// =============================================================================
// This module finds anchor open-tags (`<a ...>`) in raw HTML.
//
// It is NOT an HTML parser. There is no DOM and no tree: we walk the bytes
// once, spot `<a` followed by whitespace, and then read attributes one by
// one until the tag's closing `>`. Quote state is tracked while reading
// attribute values, so a `>` inside `title="a > b"` does not end the tag.
//
// Tolerated on purpose:
// - attributes in any order, before or after `href`
// - whitespace around `=`
// - double quotes, single quotes, or no quotes at all
// - upper-case tag and attribute names (`<A HREF=...>`)
//
// Skipped without failing the scan:
// - tags with no `href` attribute (`<a name="top">`)
//
// A tag that never closes (`<a href="x` running to the end of input)
// swallows the rest of the document, the same way a browser drops it.
//
// Rust concepts:
// - Lifetimes: every AnchorTag<'a> borrows slices of the input string
// - Iterator: the scanner is lazy and produces one tag per next() call
// - Clone: cloning a Scanner restarts from the same position
// =============================================================================

use std::borrow::Cow;
use std::ops::Range;

use crate::error::ScanError;
use crate::rewriter::rel::RelAttribute;

// One `name[=value]` pair inside an open tag.
//
// Spans are byte offsets relative to the start of the tag's raw text, so
// the rewriter can splice inside `raw_text` directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name exactly as written (case preserved)
    pub name: &'a str,
    /// Raw value without surrounding quotes, None for a bare attribute
    pub value: Option<&'a str>,
    /// The whole attribute, from the first byte of the name to the end of
    /// the value (closing quote included)
    pub span: Range<usize>,
}

impl Attribute<'_> {
    pub fn is_named(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }
}

// A matched anchor open-tag.
//
// Built during scanning, consumed right away by the classifier and the
// rewriter, then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorTag<'a> {
    /// The full original `<a ...>` text
    pub raw_text: &'a str,
    /// Where raw_text sits in the scanned document
    pub span: Range<usize>,
    /// Raw href value (undecoded, untrimmed)
    pub href: &'a str,
    /// All attributes in source order
    pub attributes: Vec<Attribute<'a>>,
    /// Offset inside raw_text of the terminator (`>` or `/>`)
    pub close_at: usize,
}

impl<'a> AnchorTag<'a> {
    // The href as a browser would read it: entities decoded, outer
    // whitespace dropped.
    pub fn href(&self) -> Cow<'a, str> {
        match html_escape::decode_html_entities(self.href) {
            Cow::Borrowed(s) => Cow::Borrowed(s.trim()),
            Cow::Owned(s) => Cow::Owned(s.trim().to_string()),
        }
    }

    // First `rel` attribute, if any. Browsers ignore duplicates, so do we.
    pub fn rel_attribute(&self) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|attr| attr.is_named("rel"))
    }

    // Parsed tokens of the existing rel attribute.
    //
    // Returns None when there is no rel attribute at all; a bare `rel` or
    // `rel=""` gives Some with an empty token set.
    pub fn existing_rel(&self) -> Option<RelAttribute> {
        self.rel_attribute()
            .map(|attr| RelAttribute::parse(attr.value.unwrap_or("")))
    }

    pub fn is_self_closing(&self) -> bool {
        self.raw_text[self.close_at..].starts_with("/>")
    }
}

// Starts a fresh scan over `html`.
//
// Scanning is a pure function of the input: calling scan() twice on the
// same string always yields the same sequence.
pub fn scan(html: &str) -> Scanner<'_> {
    Scanner::new(html)
}

// Lazy iterator over the anchor tags of a document.
//
// Items are Results because the scanner checks its own output (bounds,
// ordering, char boundaries) before handing a tag out. An Err means the
// engine itself is broken; after it the iterator is exhausted.
#[derive(Debug, Clone)]
pub struct Scanner<'a> {
    html: &'a str,
    pos: usize,
    previous_end: usize,
    // Last positions of the bytes that can terminate a tag or a quoted
    // value; nothing after them can ever close.
    last_gt: Option<usize>,
    last_double_quote: Option<usize>,
    last_single_quote: Option<usize>,
    failed: bool,
}

impl<'a> Scanner<'a> {
    pub fn new(html: &'a str) -> Self {
        Self {
            html,
            pos: 0,
            previous_end: 0,
            last_gt: html.rfind('>'),
            last_double_quote: html.rfind('"'),
            last_single_quote: html.rfind('\''),
            failed: false,
        }
    }

    // Tries to read a complete anchor tag starting at `start` (the `<`).
    //
    // Returns None when the tag has no terminator or has an unterminated
    // quoted value.
    fn read_tag(&self, start: usize) -> Option<(AnchorTagParts, usize)> {
        let bytes = self.html.as_bytes();
        let len = bytes.len();
        let mut attributes = Vec::new();
        let mut i = start + 2;

        loop {
            while i < len && bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            if i >= len {
                return None;
            }

            match bytes[i] {
                b'>' => return Some((AnchorTagParts { attributes, close_at: i }, i + 1)),
                b'/' if bytes.get(i + 1) == Some(&b'>') => {
                    return Some((AnchorTagParts { attributes, close_at: i }, i + 2));
                }
                b'/' => {
                    // stray slash between attributes
                    i += 1;
                    continue;
                }
                _ => {}
            }

            // Attribute name: the first byte always belongs to it, even if
            // it is a `=` or a quote.
            let name_start = i;
            i += 1;
            while i < len && !is_name_terminator(bytes[i]) {
                i += 1;
            }
            let name_end = i;

            let mut j = i;
            while j < len && bytes[j].is_ascii_whitespace() {
                j += 1;
            }

            if j < len && bytes[j] == b'=' {
                j += 1;
                while j < len && bytes[j].is_ascii_whitespace() {
                    j += 1;
                }
                if j >= len {
                    return None;
                }

                let (value, after) = match bytes[j] {
                    quote @ (b'"' | b'\'') => {
                        let close = self.closing_quote(quote, j + 1)?;
                        (j + 1..close, close + 1)
                    }
                    _ => {
                        let value_start = j;
                        while j < len && !bytes[j].is_ascii_whitespace() && bytes[j] != b'>' {
                            j += 1;
                        }
                        (value_start..j, j)
                    }
                };

                attributes.push(RawAttribute {
                    name: name_start..name_end,
                    value: Some(value),
                    span: name_start..after,
                });
                i = after;
            } else {
                attributes.push(RawAttribute {
                    name: name_start..name_end,
                    value: None,
                    span: name_start..name_end,
                });
            }
        }
    }

    // Position of the quote that closes a value opened just before `from`.
    fn closing_quote(&self, quote: u8, from: usize) -> Option<usize> {
        let last = if quote == b'"' {
            self.last_double_quote
        } else {
            self.last_single_quote
        };
        match last {
            Some(last) if last >= from => {}
            _ => return None,
        }
        self.html.as_bytes()[from..]
            .iter()
            .position(|&b| b == quote)
            .map(|offset| from + offset)
    }

    // Turns the raw offsets of a parsed tag into an AnchorTag, checking the
    // invariants the rewriter relies on.
    fn build(
        &self,
        start: usize,
        end: usize,
        parts: AnchorTagParts,
    ) -> Result<AnchorTag<'a>, ScanError> {
        let len = self.html.len();
        if end > len || start >= end {
            return Err(ScanError::OutOfBounds { start, end, len });
        }
        if start < self.previous_end {
            return Err(ScanError::Overlap {
                start,
                previous_end: self.previous_end,
            });
        }
        if !self.html.is_char_boundary(start) || !self.html.is_char_boundary(end) {
            return Err(ScanError::NotCharBoundary { start, end });
        }

        let raw_text = &self.html[start..end];
        let slice = |range: &Range<usize>| -> Result<&'a str, ScanError> {
            self.html
                .get(range.clone())
                .ok_or(ScanError::NotCharBoundary {
                    start: range.start,
                    end: range.end,
                })
        };

        let mut attributes = Vec::with_capacity(parts.attributes.len());
        for raw in &parts.attributes {
            attributes.push(Attribute {
                name: slice(&raw.name)?,
                value: raw.value.as_ref().map(slice).transpose()?,
                span: raw.span.start - start..raw.span.end - start,
            });
        }

        let href = attributes
            .iter()
            .find(|attr| attr.is_named("href"))
            .map(|attr| attr.value.unwrap_or(""))
            .unwrap_or("");

        Ok(AnchorTag {
            raw_text,
            span: start..end,
            href,
            attributes,
            close_at: parts.close_at - start,
        })
    }
}

// Offsets collected while reading a tag, absolute to the document.
struct AnchorTagParts {
    attributes: Vec<RawAttribute>,
    close_at: usize,
}

struct RawAttribute {
    name: Range<usize>,
    value: Option<Range<usize>>,
    span: Range<usize>,
}

impl<'a> Iterator for Scanner<'a> {
    type Item = Result<AnchorTag<'a>, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let html = self.html;
        let bytes = html.as_bytes();

        while self.pos < bytes.len() {
            // Nothing after the last `>` can close a tag.
            match self.last_gt {
                Some(last) if self.pos <= last => {}
                _ => {
                    self.pos = bytes.len();
                    return None;
                }
            }

            let start = match bytes[self.pos..].iter().position(|&b| b == b'<') {
                Some(offset) => self.pos + offset,
                None => {
                    self.pos = bytes.len();
                    return None;
                }
            };

            if !is_anchor_open(bytes, start) {
                self.pos = start + 1;
                continue;
            }

            let Some((parts, end)) = self.read_tag(start) else {
                // The tag ran into the end of input, either unquoted or
                // inside an open quote. Like a browser, treat everything
                // after it as part of that broken tag: stop here. This also
                // keeps the whole scan to one pass over the input.
                self.pos = bytes.len();
                return None;
            };

            let has_href = parts
                .attributes
                .iter()
                .any(|attr| html[attr.name.clone()].eq_ignore_ascii_case("href"));
            if !has_href {
                self.pos = end;
                continue;
            }

            return match self.build(start, end, parts) {
                Ok(tag) => {
                    self.pos = end;
                    self.previous_end = end;
                    Some(Ok(tag))
                }
                Err(err) => {
                    self.failed = true;
                    Some(Err(err))
                }
            };
        }

        None
    }
}

// `<a` or `<A` followed by whitespace, `>` or `/`. Rejects `<abbr>`,
// `<area>`, `<article>` and friends.
fn is_anchor_open(bytes: &[u8], start: usize) -> bool {
    matches!(bytes.get(start + 1), Some(b'a' | b'A'))
        && matches!(
            bytes.get(start + 2),
            Some(b) if b.is_ascii_whitespace() || *b == b'>' || *b == b'/'
        )
}

fn is_name_terminator(b: u8) -> bool {
    b.is_ascii_whitespace() || b == b'=' || b == b'>' || b == b'/'
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why bytes instead of chars?
//    - Every character we care about (<, >, =, quotes, whitespace) is ASCII
//    - In UTF-8 an ASCII byte can never appear inside a multi-byte character
//    - So slicing right next to one of them is always on a char boundary
//
// 2. What does `let Some(x) = ... else { ... };` do?
//    - It's "let-else": bind x if the pattern matches, otherwise run the
//      else block, which must leave the function or loop (return here)
//
// 3. Why Range<usize> for spans?
//    - A Range is just start..end; slicing a &str with it is cheap
//    - Storing offsets instead of copies keeps scanning allocation-light
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(html: &str) -> Vec<AnchorTag<'_>> {
        scan(html).collect::<Result<Vec<_>, _>>().unwrap()
    }

    #[test]
    fn test_scan_simple_tag() {
        let html = r#"<p>Go <a href="https://rust-lang.org">Rust</a></p>"#;
        let found = tags(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].raw_text, r#"<a href="https://rust-lang.org">"#);
        assert_eq!(found[0].href, "https://rust-lang.org");
        assert_eq!(&html[found[0].span.clone()], found[0].raw_text);
    }

    #[test]
    fn test_scan_captures_whole_tag() {
        let html = r#"<a class="btn" href='https://x.org' target="_blank" >x</a>"#;
        let found = tags(html);
        assert_eq!(
            found[0].raw_text,
            r#"<a class="btn" href='https://x.org' target="_blank" >"#
        );
        assert_eq!(found[0].attributes.len(), 3);
        assert_eq!(found[0].attributes[2].name, "target");
    }

    #[test]
    fn test_scan_whitespace_around_equals_and_unquoted() {
        let found = tags("<A HREF = https://x.org/a?b=1 rel = nofollow>x</A>");
        assert_eq!(found[0].href, "https://x.org/a?b=1");
        assert_eq!(found[0].rel_attribute().unwrap().value, Some("nofollow"));
    }

    #[test]
    fn test_scan_gt_inside_quotes() {
        let html = r#"<a title="a > b" href="https://x.org">x</a>"#;
        let found = tags(html);
        assert_eq!(found[0].raw_text, r#"<a title="a > b" href="https://x.org">"#);
    }

    #[test]
    fn test_scan_skips_other_tags() {
        let html = r#"<abbr title="x">A</abbr><area href="https://x.org"><article>"#;
        assert!(tags(html).is_empty());
    }

    #[test]
    fn test_scan_skips_tag_without_href() {
        let html = r#"<a name="top"></a><a href="/x">x</a>"#;
        let found = tags(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].href, "/x");
    }

    #[test]
    fn test_scan_quote_spanning_two_tags() {
        let html = r#"<a href="https://a.org <a href="https://b.org">b</a>"#;
        // The first tag swallows up to the second quote, then closes at the
        // first `>`; no crash and no overlap.
        let found = tags(html);
        assert_eq!(found.len(), 1);

        let truncated = r#"<a href="https://b.org">b</a><a href="https://c"#;
        let found = tags(truncated);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].href, "https://b.org");
    }

    #[test]
    fn test_scan_unterminated_tag_swallows_rest_of_input() {
        // The second anchor only looks closed from inside the first tag's
        // quoted value.
        let html = r#"<a href="https://b.org">ok</a><a title='x <a href="https://c.org">' z"#;
        let found = tags(html);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].href, "https://b.org");

        // Unquoted run to the end of input, with the only `>` quoted
        let html = "<a b ".repeat(50) + "x=\">\"";
        assert!(tags(&html).is_empty());
    }

    #[test]
    fn test_scan_self_closing() {
        let found = tags(r#"<a href="https://x.org"/>"#);
        assert!(found[0].is_self_closing());
        assert_eq!(found[0].close_at, found[0].raw_text.len() - 2);
    }

    #[test]
    fn test_scan_is_restartable() {
        let html = r#"<a href="https://a.org">a</a> <a href='/b'>b</a>"#;
        let scanner = scan(html);
        let first: Vec<_> = scanner.clone().collect();
        let second: Vec<_> = scanner.collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_scan_multibyte_text() {
        let html = "Привет <a href=\"https://пример.рф\">ссылка</a> ✓";
        let found = tags(html);
        assert_eq!(found[0].href, "https://пример.рф");
    }

    #[test]
    fn test_href_decodes_entities() {
        let found = tags(r#"<a href=" https://x.org/?a=1&amp;b=2 ">x</a>"#);
        assert_eq!(found[0].href(), "https://x.org/?a=1&b=2");
    }

    #[test]
    fn test_existing_rel_tokens() {
        let found = tags(r#"<a href="https://x.org" rel="Sponsored  UGC">x</a>"#);
        let rel = found[0].existing_rel().unwrap();
        assert_eq!(rel.tokens(), ["Sponsored", "UGC"]);

        let found = tags(r#"<a href="https://x.org">x</a>"#);
        assert!(found[0].existing_rel().is_none());
    }
}
