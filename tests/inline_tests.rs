use dtext::to_html;

fn html(input: &str) -> String {
    to_html(input).unwrap()
}

#[test]
fn test_basic_spans() {
    assert_eq!(
        html("[b]bold[/b] [i]it[/i] [u]u[/u] [s]s[/s]"),
        "<p><strong>bold</strong> <em>it</em> <u>u</u> <s>s</s></p>"
    );
    assert_eq!(
        html("[sup]a[/sup][sub]b[/sub][tn]note[/tn]"),
        "<p><sup>a</sup><sub>b</sub><span class=\"tn\">note</span></p>"
    );
}

#[test]
fn test_tags_ignore_case() {
    assert_eq!(html("[B]x[/b]"), "<p><strong>x</strong></p>");
}

#[test]
fn test_overlapping_spans() {
    assert_eq!(
        html("[b]bold [i]both[/b] tail[/i]"),
        "<p><strong>bold [i]both</strong> tail[/i]</p>"
    );
}

#[test]
fn test_unclosed_span() {
    assert_eq!(html("[b]open"), "<p><strong>open</strong></p>");
}

#[test]
fn test_stray_closer() {
    assert_eq!(html("a[/i]b"), "<p>a[/i]b</p>");
}

#[test]
fn test_inline_code() {
    assert_eq!(html("use `[b]` here"), "<p>use <code>[b]</code> here</p>");
    assert_eq!(
        html("a [code][i]x[/i][/code] b"),
        "<p>a <code>[i]x[/i]</code> b</p>"
    );
}

#[test]
fn test_wiki_links() {
    assert_eq!(
        html("[[Cat]]"),
        "<p><a class=\"dtext-link dtext-wiki-link\" href=\"/wiki_pages/show_or_new?title=cat\">Cat</a></p>"
    );
    assert_eq!(
        html("[[Tag Group|groups]]"),
        "<p><a class=\"dtext-link dtext-wiki-link\" href=\"/wiki_pages/show_or_new?title=tag_group\">groups</a></p>"
    );
    assert_eq!(
        html("[[Help#Links]]"),
        "<p><a class=\"dtext-link dtext-wiki-link\" href=\"/wiki_pages/show_or_new?title=help#links\">Help#Links</a></p>"
    );
}

#[test]
fn test_post_search() {
    assert_eq!(
        html("{{Cat_Ears rating:s|ears}}"),
        "<p><a class=\"dtext-link dtext-post-search-link\" href=\"/posts?tags=cat_ears%20rating%3As\">ears</a></p>"
    );
}

#[test]
fn test_url_tags() {
    assert_eq!(
        html("[url=https://example.com]site[/url]"),
        "<p><a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://example.com\">site</a></p>"
    );
    assert_eq!(
        html("[url]https://example.com[/url]"),
        "<p><a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://example.com\">https://example.com</a></p>"
    );
}

#[test]
fn test_named_links() {
    assert_eq!(
        html("\"home\":/posts"),
        "<p><a class=\"dtext-link\" href=\"/posts\">home</a></p>"
    );
    assert_eq!(
        html("\"x\":[https://e.example/a]"),
        "<p><a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://e.example/a\">x</a></p>"
    );
}

#[test]
fn test_autolinks() {
    assert_eq!(
        html("see https://example.com/a."),
        "<p>see <a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://example.com/a\">https://example.com/a</a>.</p>"
    );
    assert_eq!(
        html("<https://example.com/b>"),
        "<p><a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://example.com/b\">https://example.com/b</a></p>"
    );
}

#[test]
fn test_unsafe_hrefs_degrade() {
    assert_eq!(html("[url=javascript:alert(1)]x[/url]"), "<p>x</p>");
    assert_eq!(html("\"x\":[//evil.example]"), "<p>x</p>");
    assert_eq!(html("\"x\":[data:text/html,hi]"), "<p>x</p>");
}

#[test]
fn test_mentions() {
    assert_eq!(
        html("hi @alice"),
        "<p>hi <a class=\"dtext-link dtext-user-mention-link\" href=\"/users?name=alice\">@alice</a></p>"
    );
    assert_eq!(html("mail bob@example.com"), "<p>mail bob@example.com</p>");
}

#[test]
fn test_id_links() {
    assert_eq!(
        html("post #123"),
        "<p><a class=\"dtext-link dtext-id-link dtext-post-id-link\" href=\"/posts/123\">post #123</a></p>"
    );
    assert_eq!(
        html("see topic #4"),
        "<p>see <a class=\"dtext-link dtext-id-link dtext-forum-topic-id-link\" href=\"/forum_topics/4\">topic #4</a></p>"
    );
}

#[test]
fn test_thumb_embed() {
    assert_eq!(
        html("thumb #7"),
        "<p><a class=\"dtext-link dtext-id-link dtext-post-id-link thumb-placeholder-link\" data-id=\"7\" href=\"/posts/7\">post #7</a></p>"
    );
}

#[test]
fn test_anchor() {
    assert_eq!(html("[#Top]"), "<p><a id=\"top\"></a></p>");
}

#[test]
fn test_script_escaped() {
    assert_eq!(
        html("<script>alert(\"x\")</script>"),
        "<p>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;</p>"
    );
}

#[test]
fn test_attribute_injection_escaped() {
    assert_eq!(
        html("[url=https://e.example/\"onmouseover=x]a[/url]"),
        "<p><a rel=\"nofollow\" class=\"dtext-link dtext-external-link\" href=\"https://e.example/&quot;onmouseover=x\">a</a></p>"
    );
}
