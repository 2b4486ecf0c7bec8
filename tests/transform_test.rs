// tests/transform_test.rs
// =============================================================================
// End-to-end behaviour of transform(): one test per documented property,
// plus a cross-check against a real HTML parser.
// =============================================================================

use nofollow_guard::{scan, transform, transform_with_sink, Policy, Stats, Verdict};
use scraper::{Html, Selector};

fn policy() -> Policy {
    Policy {
        site_host: "example.com".to_string(),
        ..Policy::default()
    }
}

#[test]
fn test_no_rel_insertion() {
    assert_eq!(
        transform(r#"<a href="https://ext.com">text</a>"#, &policy()),
        r#"<a href="https://ext.com" rel="nofollow">text</a>"#
    );
}

#[test]
fn test_existing_rel_merge() {
    assert_eq!(
        transform(r#"<a href="https://ext.com" rel="sponsored">"#, &policy()),
        r#"<a href="https://ext.com" rel="sponsored nofollow">"#
    );
}

#[test]
fn test_already_nofollow_is_byte_identical() {
    let html = r#"<a href="https://ext.com" rel="nofollow">x</a>"#;
    assert_eq!(transform(html, &policy()), html);
}

#[test]
fn test_relative_and_anchor_links_unchanged() {
    for html in [
        r#"<a href="/about">About</a>"#,
        r##"<a href="#section1">Jump</a>"##,
        r#"<a href="/search?q=x#results">Search</a>"#,
        r#"<a href="mailto:me@ext.com">Mail</a>"#,
    ] {
        assert_eq!(transform(html, &policy()), html);
    }
}

#[test]
fn test_internal_links_unchanged() {
    let html = r#"<a href="https://example.com/x">a</a> <a href="//EXAMPLE.com/y">b</a>"#;
    assert_eq!(transform(html, &policy()), html);
}

#[test]
fn test_protocol_relative_external() {
    assert_eq!(
        transform(r#"<a href="//cdn.ext.com/file">f</a>"#, &policy()),
        r#"<a href="//cdn.ext.com/file" rel="nofollow">f</a>"#
    );
}

#[test]
fn test_exclusion_substring_match() {
    let p = Policy {
        exclusion_patterns: vec!["partner.com".to_string()],
        ..policy()
    };
    let html = r#"<a href="https://partner.com/page">x</a>"#;
    assert_eq!(transform(html, &p), html);
}

#[test]
fn test_blocklist_priority() {
    let p = Policy {
        exclusion_patterns: vec!["partner.com".to_string()],
        blocklist_patterns: vec!["partner.com/ads".to_string()],
        geo_exempt: true,
        yandex_market_excluded: true,
        ..policy()
    };
    let html = r#"<a href="https://partner.com/ads/1">ad</a> <a href="https://partner.com/">ok</a>"#;
    assert_eq!(
        transform(html, &p),
        r#"<a href="https://partner.com/ads/1" rel="nofollow">ad</a> <a href="https://partner.com/">ok</a>"#
    );
}

#[test]
fn test_geo_exempt_leaves_external_links() {
    let p = Policy {
        geo_exempt: true,
        ..policy()
    };
    let html = r#"<a href="https://ext.com">x</a>"#;
    assert_eq!(transform(html, &p), html);
}

#[test]
fn test_idempotent_on_sample() {
    let html = r#"<div><a class="x" href='https://a.com' rel="ugc">a</a>
        <A HREF=https://b.com>b</A> <a href="/c">c</a></div>"#;
    let once = transform(html, &policy());
    assert_eq!(transform(&once, &policy()), once);
    assert_eq!(once.matches("nofollow").count(), 2);
}

#[test]
fn test_non_tag_content_preserved() {
    let html = "<!doctype html>\n<p class=\"lead\">Tom &amp; Jerry — <b>bold</b>\t\
                <a href=\"https://ext.com\">link</a> ünïcödé</p>\r\n";
    let out = transform(html, &policy());
    assert_eq!(
        out,
        "<!doctype html>\n<p class=\"lead\">Tom &amp; Jerry — <b>bold</b>\t\
         <a href=\"https://ext.com\" rel=\"nofollow\">link</a> ünïcödé</p>\r\n"
    );
}

#[test]
fn test_malformed_markup_does_not_panic() {
    for html in [
        "<a",
        "<a href",
        "<a href=",
        "<a href=\"https://ext.com",
        "<a href='https://ext.com\">x</a>",
        "<<a href=https://ext.com>>",
        "</a><a/><a>",
        "<a href=\"https://ext.com\"",
    ] {
        let _ = transform(html, &policy());
    }
    assert_eq!(
        transform("<<a href=https://ext.com>>", &policy()),
        "<<a href=https://ext.com rel=\"nofollow\">>"
    );
}

#[test]
fn test_sink_sees_every_tag() {
    let html = r#"<a href="https://ext.com">1</a><a href="/x">2</a><a href="https://ext.com" rel="nofollow">3</a>"#;
    let mut stats = Stats::new();
    transform_with_sink(html, &policy(), &mut stats);

    assert_eq!(stats.links_seen, 3);
    assert_eq!(stats.links_rewritten, 1);
    assert_eq!(stats.count(Verdict::Nofollow), 2);
    assert_eq!(stats.count(Verdict::NotExternal), 1);
}

#[test]
fn test_parallel_transforms_share_policy() {
    let p = std::sync::Arc::new(policy());
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let p = std::sync::Arc::clone(&p);
            std::thread::spawn(move || {
                let html = format!(r#"<a href="https://ext{i}.com">{i}</a>"#);
                transform(&html, &p)
            })
        })
        .collect();

    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(
            handle.join().unwrap(),
            format!(r#"<a href="https://ext{i}.com" rel="nofollow">{i}</a>"#)
        );
    }
}

// On well-formed HTML our scanner must see the same anchors a DOM parser
// sees, and after rewriting every external one must carry nofollow.
#[test]
fn test_agrees_with_dom_parser() {
    let html = r#"
        <html><body>
          <nav><a href="/">Home</a> <a href="https://example.com/blog">Blog</a></nav>
          <p>Read <a title="a > b" href="https://ext.com/x?a=1&amp;b=2">this</a>
             or <a href='https://other.org' rel='noopener'>that</a>.</p>
          <a name="anchor-only"></a>
          <area href="https://ext.com/map">
          <footer><a href="https://social.net/me" rel="me nofollow">me</a></footer>
        </body></html>
    "#;

    let selector = Selector::parse("a[href]").unwrap();
    let dom_count = Html::parse_document(html).select(&selector).count();
    let scanned = scan(html).filter_map(Result::ok).count();
    assert_eq!(scanned, dom_count);

    let out = transform(html, &policy());
    let document = Html::parse_document(&out);
    for element in document.select(&selector) {
        let href = element.value().attr("href").unwrap();
        let rel = element.value().attr("rel").unwrap_or("");
        let external = href.starts_with("https://") && !href.starts_with("https://example.com");
        assert_eq!(
            rel.split_whitespace().any(|t| t == "nofollow"),
            external,
            "href {href:?} has rel {rel:?}"
        );
    }
}
