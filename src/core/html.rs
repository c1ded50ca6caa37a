// src/core/html.rs
//
// Case-insensitive slicing helpers for crawled pages. No DOM: pages from
// dozens of different CMSs are too irregular to be worth parsing strictly.

pub fn to_lower(s: &str) -> String {
    // ASCII-only lowering keeps byte offsets identical to `s`
    s.to_ascii_lowercase()
}

/// Next `<o ...> ... c` block at or after `from`, as byte range (end exclusive).
pub fn next_tag_block_ci(s: &str, o: &str, c: &str, from: usize) -> Option<(usize, usize)> {
    let lc = to_lower(s);
    let ol = to_lower(o);
    let cl = to_lower(c);
    let start = lc.get(from..)?.find(&ol)? + from;
    let open_end = s[start..].find('>')? + start + 1;
    let end_rel = lc[open_end..].find(&cl)?;
    let end = open_end + end_rel + c.len();
    Some((start, end))
}

/// Drop every `<tag ...>...</tag>` block (scripts, styles, noscript).
pub fn remove_blocks_ci(s: &str, tag: &str) -> String {
    let open = format!("<{tag}");
    let close = format!("</{tag}>");
    let mut out = String::with_capacity(s.len());
    let mut pos = 0;
    while let Some((start, end)) = next_tag_block_ci(s, &open, &close, pos) {
        out.push_str(&s[pos..start]);
        pos = end;
    }
    out.push_str(&s[pos..]);
    out
}

/// Inner HTML of the first element whose opening tag carries `class="<class>"`.
/// Nested elements of the same tag name end the slice early; good enough
/// for sitemap containers, which hold lists rather than nested wrappers.
pub fn element_with_class_ci<'a>(s: &'a str, class: &str) -> Option<&'a str> {
    let lc = to_lower(s);
    let needle_dq = format!("class=\"{}\"", to_lower(class));
    let needle_sq = format!("class='{}'", to_lower(class));
    let attr = lc.find(&needle_dq).or_else(|| lc.find(&needle_sq))?;
    let open = lc[..attr].rfind('<')?;
    let tag: String = lc[open + 1..]
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric())
        .collect();
    if tag.is_empty() {
        return None;
    }
    let inner_start = s[attr..].find('>')? + attr + 1;
    let inner_end = lc[inner_start..].find(&format!("</{tag}>"))? + inner_start;
    Some(&s[inner_start..inner_end])
}

pub fn strip_tags<S: AsRef<str>>(s: S) -> String {
    let s = s.as_ref();

    let mut out = String::with_capacity(s.len());
    let mut in_tag = false;

    for ch in s.chars() {
        match ch {
            '<' => in_tag = true,
            // tags separate words: "<li>A</li><li>B</li>" reads "A B"
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    super::sanitize::normalize_ws(&super::sanitize::normalize_entities(&out))
}

/// Visible text of a whole page.
pub fn page_text(doc: &str) -> String {
    let mut body = remove_blocks_ci(doc, "script");
    body = remove_blocks_ci(&body, "style");
    body = remove_blocks_ci(&body, "noscript");
    strip_tags(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripts_and_styles_do_not_leak_into_text() {
        let doc = r#"<html><head><STYLE>p{color:red}</STYLE><script type="x">var a="x@y.de";</script></head>
            <body><p>AWO&nbsp;Ortsverein</p><p>Bernau</p></body></html>"#;
        assert_eq!(page_text(doc), "AWO Ortsverein Bernau");
    }

    #[test]
    fn finds_container_by_class() {
        let doc = r#"<div class="nav">x</div><DIV class="simple-sitemap-page main"><ul><li>A</li></ul></DIV>"#;
        let inner = element_with_class_ci(doc, "simple-sitemap-page main").unwrap();
        assert_eq!(inner, "<ul><li>A</li></ul>");
        assert!(element_with_class_ci(doc, "missing").is_none());
    }
}
