// src/core/sanitize.rs

/// Decode the handful of entities German CMS pages actually use.
pub fn normalize_entities(s: &str) -> String {
    if !s.contains('&') {
        return s!(s);
    }
    const ENTITIES: [(&str, &str); 16] = [
        ("&nbsp;", " "),
        ("&lt;", "<"),
        ("&gt;", ">"),
        ("&quot;", "\""),
        ("&#39;", "'"),
        ("&#039;", "'"),
        ("&auml;", "ä"),
        ("&ouml;", "ö"),
        ("&uuml;", "ü"),
        ("&Auml;", "Ä"),
        ("&Ouml;", "Ö"),
        ("&Uuml;", "Ü"),
        ("&szlig;", "ß"),
        ("&ndash;", "–"),
        ("&#64;", "@"),
        ("&commat;", "@"),
    ];
    let mut out = s!(s);
    for (entity, text) in ENTITIES {
        if out.contains(entity) {
            out = out.replace(entity, text);
        }
    }
    // last, so "&amp;lt;" stays "&lt;"
    out.replace("&amp;", "&")
}

pub fn normalize_ws(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_space = false;
    for ch in s.chars() {
        if ch.is_whitespace() {
            if !prev_space { out.push(' '); prev_space = true; }
        } else { out.push(ch); prev_space = false; }
    }
    out.trim().to_string()
}

/// Phone numbers compare by digits only ("030 123-45" == "030/12345").
pub fn phone_key(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entities_decode_once() {
        assert_eq!(normalize_entities("Stra&szlig;e &amp; Platz"), "Straße & Platz");
        assert_eq!(normalize_entities("a&amp;lt;b"), "a&lt;b");
        assert_eq!(normalize_entities("info&#64;awo.de"), "info@awo.de");
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize_ws("  AWO \n\t Berlin  "), "AWO Berlin");
    }

    #[test]
    fn phone_key_ignores_separators() {
        assert_eq!(phone_key("+49 30 123-45"), "+493012345");
    }
}
