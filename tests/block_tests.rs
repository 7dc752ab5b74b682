use dtext::to_html;

fn html(input: &str) -> String {
    to_html(input).unwrap()
}

#[test]
fn test_paragraphs() {
    assert_eq!(html("one\ntwo\n\nthree"), "<p>one<br>two</p><p>three</p>");
}

#[test]
fn test_blank_input() {
    assert_eq!(html(""), "");
    assert_eq!(html("\n \n\t\n"), "");
}

#[test]
fn test_headers() {
    assert_eq!(html("h1. Title"), "<h1>Title</h1>");
    assert_eq!(html("h4. [i]Sub[/i] title"), "<h4><em>Sub</em> title</h4>");
    assert_eq!(
        html("h2#intro-part. Text"),
        "<h2 id=\"dtext-intro-part\">Text</h2>"
    );
}

#[test]
fn test_header_lookalikes_are_text() {
    assert_eq!(html("h7. no"), "<p>h7. no</p>");
    assert_eq!(html("h1.nospace"), "<p>h1.nospace</p>");
    assert_eq!(html("say h1. mid-line"), "<p>say h1. mid-line</p>");
}

#[test]
fn test_header_ends_paragraph() {
    assert_eq!(html("text\nh3. Next"), "<p>text</p><h3>Next</h3>");
}

#[test]
fn test_unordered_list() {
    assert_eq!(
        html("*item one\n*item two"),
        "<ul><li>item one</li><li>item two</li></ul>"
    );
}

#[test]
fn test_nested_list() {
    assert_eq!(
        html("* a\n** b\n* c"),
        "<ul><li>a<ul><li>b</li></ul></li><li>c</li></ul>"
    );
}

#[test]
fn test_ordered_list() {
    assert_eq!(html("# one\n# two"), "<ol><li>one</li><li>two</li></ol>");
    assert_eq!(html("#nospace"), "<p>#nospace</p>");
}

#[test]
fn test_list_ends_at_plain_line() {
    assert_eq!(html("* a\nplain"), "<ul><li>a</li></ul><p>plain</p>");
}

#[test]
fn test_quote_container() {
    assert_eq!(
        html("[quote]\nhi\n[/quote]"),
        "<blockquote><p>hi</p></blockquote>"
    );
}

#[test]
fn test_gt_quote() {
    assert_eq!(html("> a\n> b"), "<blockquote><p>a<br>b</p></blockquote>");
    assert_eq!(
        html("> > x"),
        "<blockquote><blockquote><p>x</p></blockquote></blockquote>"
    );
}

#[test]
fn test_unterminated_quote() {
    assert_eq!(html("[quote]\nx"), "<blockquote><p>x</p></blockquote>");
}

#[test]
fn test_closer_mid_line() {
    assert_eq!(
        html("[quote]\nhello[/quote] after"),
        "<blockquote><p>hello</p></blockquote><p>after</p>"
    );
}

#[test]
fn test_opener_mid_line_is_text() {
    assert_eq!(html("text [quote] more"), "<p>text [quote] more</p>");
}

#[test]
fn test_outer_closer_closes_inner() {
    assert_eq!(
        html("[quote]\n[spoiler]\nx\n[/quote]"),
        "<blockquote><div class=\"spoiler\"><p>x</p></div></blockquote>"
    );
}

#[test]
fn test_stray_block_closer() {
    assert_eq!(html("[/quote]"), "<p>[/quote]</p>");
}

#[test]
fn test_sections() {
    assert_eq!(
        html("[section=Details]\nbody\n[/section]"),
        "<div class=\"expandable\"><div class=\"expandable-header\"><span class=\"section-arrow\"></span>\
         <span>Details</span></div><div class=\"expandable-content\"><p>body</p></div></div>"
    );
    assert_eq!(
        html("[section,expanded=More]\nx\n[/section]"),
        "<div class=\"expandable expanded\"><div class=\"expandable-header\">\
         <span class=\"section-arrow expanded\"></span><span>More</span></div>\
         <div class=\"expandable-content\"><p>x</p></div></div>"
    );
    assert_eq!(
        html("[expand]\nx\n[/expand]"),
        "<div class=\"expandable\"><div class=\"expandable-header\"><span class=\"section-arrow\"></span></div>\
         <div class=\"expandable-content\"><p>x</p></div></div>"
    );
}

#[test]
fn test_block_translator_note() {
    assert_eq!(html("[tn]\nnote\n[/tn]"), "<p class=\"tn\">note</p>");
    assert_eq!(
        html("a\n[tn]\nline one\nline two\n[/tn]\nb"),
        "<p>a</p><p class=\"tn\">line one<br>line two</p><p>b</p>"
    );
    assert_eq!(html("[tn]\nopen"), "<p class=\"tn\">open</p>");
}

#[test]
fn test_inline_translator_note_spans_lines() {
    assert_eq!(
        html("[tn]a\nb[/tn]"),
        "<p><span class=\"tn\">a<br>b</span></p>"
    );
}

#[test]
fn test_block_spoiler() {
    assert_eq!(
        html("[spoiler]\nsecret\n[/spoiler]"),
        "<div class=\"spoiler\"><p>secret</p></div>"
    );
}

#[test]
fn test_spoiler_on_one_line_is_inline() {
    assert_eq!(
        html("[spoiler]b[/spoiler]"),
        "<p><span class=\"spoiler\">b</span></p>"
    );
}

#[test]
fn test_code_fence() {
    assert_eq!(
        html("[code]\n<b>x</b>\n[/code]"),
        "<pre>&lt;b&gt;x&lt;/b&gt;</pre>"
    );
    assert_eq!(
        html("[code=ruby]\nputs 1\n[/code]"),
        "<pre class=\"language-ruby\">puts 1</pre>"
    );
    assert_eq!(html("[code]\na\n\nb\n[/code]"), "<pre>a\n\nb</pre>");
}

#[test]
fn test_code_fence_hides_closers() {
    assert_eq!(
        html("[quote]\n[code]\n[/quote]\n[/code]\n[/quote]"),
        "<blockquote><pre>[/quote]</pre></blockquote>"
    );
}

#[test]
fn test_nodtext_fence() {
    assert_eq!(html("[nodtext]\n[b]x[/b]\n[/nodtext]"), "<p>[b]x[/b]</p>");
}

#[test]
fn test_table() {
    assert_eq!(
        html("[table]\n[tr][td]a[/td][td]b[/td][/tr]\n[/table]"),
        "<table class=\"striped\"><tr><td>a</td><td>b</td></tr></table>"
    );
}

#[test]
fn test_table_sections() {
    let input = "[table]\n[thead]\n[tr][th]Name[/th][/tr]\n[/thead]\n[tbody]\n[tr][td][b]x[/b][/td][/tr]\n[/tbody]\n[/table]";
    assert_eq!(
        html(input),
        "<table class=\"striped\"><thead><tr><th>Name</th></tr></thead>\
         <tbody><tr><td><strong>x</strong></td></tr></tbody></table>"
    );
}

#[test]
fn test_horizontal_rule() {
    assert_eq!(html("a\n[hr]\nb"), "<p>a</p><hr><p>b</p>");
}
