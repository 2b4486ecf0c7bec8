// src/rewriter/rel.rs
// =============================================================================
// This module owns the `rel` attribute: parsing its tokens, merging
// `nofollow` into them, and writing the attribute back into a tag.
//
// Rewriting rules for a tag that must be nofollowed:
// - rel already has `nofollow` (any case)  -> tag returned untouched
// - rel exists without it                  -> `rel="<tokens> nofollow"`,
//                                             replacing the old attribute
//                                             where it stood
// - no rel at all                          -> ` rel="nofollow"` inserted
//                                             right before the closing `>`
//
// Every other byte of the tag is kept as it was.
//
// Rust concepts:
// - Cow<str>: "clone on write", lets us return the original slice when
//   nothing changes and an owned String only when we really rewrote
// =============================================================================

use std::borrow::Cow;

use crate::rewriter::scanner::AnchorTag;

pub const NOFOLLOW: &str = "nofollow";

// Ordered set of rel tokens.
//
// Order is the order of first appearance in the source; duplicates are
// dropped (case-insensitively) so `rel="a A"` serializes as `rel="a"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelAttribute {
    tokens: Vec<String>,
}

impl RelAttribute {
    // Parses a raw attribute value (quotes already stripped).
    pub fn parse(raw: &str) -> Self {
        // `rel="a&#32;b"` is two tokens to a browser, so decode first
        let decoded = html_escape::decode_html_entities(raw);
        let mut rel = Self::default();
        for token in decoded.split_ascii_whitespace() {
            rel.insert(token);
        }
        rel
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    pub fn contains(&self, token: &str) -> bool {
        self.tokens.iter().any(|t| t.eq_ignore_ascii_case(token))
    }

    pub fn has_nofollow(&self) -> bool {
        self.contains(NOFOLLOW)
    }

    pub fn insert(&mut self, token: &str) {
        if !token.is_empty() && !self.contains(token) {
            self.tokens.push(token.to_string());
        }
    }

    // Serializes as a complete double-quoted attribute: `rel="a b"`.
    pub fn to_attribute(&self) -> String {
        let joined = self.tokens.join(" ");
        format!(
            "rel=\"{}\"",
            html_escape::encode_double_quoted_attribute(&joined)
        )
    }
}

// Produces the nofollowed version of `tag`.
//
// Callers only invoke this once the classifier said the link must be
// nofollowed; the decision itself does not live here.
pub fn add_nofollow<'a>(tag: &AnchorTag<'a>) -> Cow<'a, str> {
    let raw = tag.raw_text;

    match tag.rel_attribute() {
        Some(attr) => {
            // A bare `rel` has no value; treat it as empty
            let mut rel = RelAttribute::parse(attr.value.unwrap_or(""));
            if rel.has_nofollow() {
                return Cow::Borrowed(raw);
            }
            rel.insert(NOFOLLOW);

            // Swap the old attribute for the merged one, in place
            let mut out = String::with_capacity(raw.len() + NOFOLLOW.len() + 4);
            out.push_str(&raw[..attr.span.start]);
            out.push_str(&rel.to_attribute());
            out.push_str(&raw[attr.span.end..]);
            Cow::Owned(out)
        }
        None => {
            // tail is `>` or `/>`
            let (head, tail) = raw.split_at(tag.close_at);
            let separator = if head.ends_with(|c: char| c.is_ascii_whitespace()) {
                ""
            } else {
                " "
            };

            let mut out = String::with_capacity(raw.len() + 16);
            out.push_str(head);
            out.push_str(separator);
            out.push_str("rel=\"nofollow\"");
            out.push_str(tail);
            Cow::Owned(out)
        }
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is Cow<'a, str>?
//    - Either Cow::Borrowed(&'a str) or Cow::Owned(String)
//    - We borrow the original tag when nothing changes and only allocate
//      a new String when we really rewrite it
//    - It derefs to &str, so callers can use it like any string
//
// 2. Why a Vec instead of a HashSet for tokens?
//    - rel lists are tiny (one to three tokens)
//    - A Vec keeps the order tokens were written in, so `rel="ugc"`
//      becomes `rel="ugc nofollow"` and not some hashed order
//
// 3. What does split_at do?
//    - Splits a &str into two slices at a byte offset, without copying
//    - The offset must sit on a char boundary; close_at always points at
//      an ASCII `>` or `/`, so it does
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rewriter::scanner::scan;

    fn rewrite_first(html: &str) -> String {
        let tag = scan(html).next().unwrap().unwrap();
        add_nofollow(&tag).into_owned()
    }

    #[test]
    fn test_insert_when_no_rel() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com">"#),
            r#"<a href="https://ext.com" rel="nofollow">"#
        );
    }

    #[test]
    fn test_insert_keeps_single_space_before_close() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com" >"#),
            r#"<a href="https://ext.com" rel="nofollow">"#
        );
    }

    #[test]
    fn test_insert_before_self_closing_slash() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com"/>"#),
            r#"<a href="https://ext.com" rel="nofollow"/>"#
        );
    }

    #[test]
    fn test_merge_with_existing_rel() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com" rel="sponsored">"#),
            r#"<a href="https://ext.com" rel="sponsored nofollow">"#
        );
    }

    #[test]
    fn test_merge_keeps_position_and_other_attributes() {
        assert_eq!(
            rewrite_first(r#"<a rel='noopener  ugc' class="x" href="https://ext.com">"#),
            r#"<a rel="noopener ugc nofollow" class="x" href="https://ext.com">"#
        );
    }

    #[test]
    fn test_existing_nofollow_any_case_is_untouched() {
        let html = r#"<a href="https://ext.com" rel='external NoFollow'>"#;
        let tag = scan(html).next().unwrap().unwrap();
        assert!(matches!(add_nofollow(&tag), Cow::Borrowed(_)));
    }

    #[test]
    fn test_bare_and_empty_rel() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com" rel>"#),
            r#"<a href="https://ext.com" rel="nofollow">"#
        );
        assert_eq!(
            rewrite_first(r#"<a rel="" href="https://ext.com">"#),
            r#"<a rel="nofollow" href="https://ext.com">"#
        );
    }

    #[test]
    fn test_quotes_in_tokens_are_escaped() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com" rel='a"b'>"#),
            r#"<a href="https://ext.com" rel="a&quot;b nofollow">"#
        );
    }

    #[test]
    fn test_only_first_rel_is_rewritten() {
        assert_eq!(
            rewrite_first(r#"<a href="https://ext.com" rel="me" rel="x">"#),
            r#"<a href="https://ext.com" rel="me nofollow" rel="x">"#
        );
    }

    #[test]
    fn test_rel_attribute_dedupes_tokens() {
        let rel = RelAttribute::parse("noopener NOOPENER ugc");
        assert_eq!(rel.tokens(), ["noopener", "ugc"]);
        assert!(!rel.has_nofollow());
    }
}
