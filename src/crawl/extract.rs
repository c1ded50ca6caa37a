// src/crawl/extract.rs
//
// Contact and service details pulled out of a fetched page with regexes.
// Text patterns run on the visible text; link patterns run on the markup.

use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::core::html::{element_with_class_ci, page_text, strip_tags};
use crate::core::sanitize::phone_key;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").unwrap());

/// German numbers: +49 or a leading 0, area code, subscriber part.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:\+49|\b0)[\s\-]?\(?\d{2,5}\)?[\s\-/]?\d{2,10}(?:[\s\-]\d{1,6})?").unwrap());

static SOCIAL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(?:https?://)?(?:www\.)?(?:(?:facebook|twitter|instagram)\.com/[\w\-\.]+|linkedin\.com/(?:company|in)/[\w\-\.]+)",
    )
    .unwrap()
});

static HOURS_HEADING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:Öffnungszeiten|Sprechzeiten|Öffnungs-zeiten)[\s:]*(.{0,200})").unwrap()
});

/// "Mo-Fr 8:00", "Mo. bis Do. 9:00 - 16:00"
static HOURS_RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:Mo|Di|Mi|Do|Fr|Sa|So)\.?\s*(?:-|–|bis)\s*(?:Mo|Di|Mi|Do|Fr|Sa|So)[.\s]*\d{1,2}:\d{2}(?:\s*(?:-|–|bis)\s*\d{1,2}:\d{2})?",
    )
    .unwrap()
});

static BLOCK_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    ["h2", "h3", "h4", "li", "p"]
        .iter()
        .map(|t| Regex::new(&format!(r"(?is)<{t}\b[^>]*>(.*?)</{t}\s*>")).unwrap())
        .collect()
});

static ANCHOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<a\b[^>]*?\bhref\s*=\s*["']([^"']*)["'][^>]*>(.*?)</a\s*>"#).unwrap()
});

static REGISTER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:registernummer|vereinsregister|handelsregister)[\s:]*(?:Nr\.?\s*)?((?:[A-Z]{1,3}\s*)?\d+(?:\s*[A-Z]\b)?)",
    )
    .unwrap()
});

const SERVICE_KEYWORDS: [&str; 13] = [
    "beratung", "pflege", "betreuung", "kindergarten", "kita", "seniorenheim", "tagespflege",
    "ambulant", "stationär", "jugend", "familie", "migration", "integration",
];
const MAX_SERVICES: usize = 10;

const IMPRESSUM_HINTS: [&str; 4] = ["impressum", "imprint", "legal notice", "rechtliches"];

// gGmbH before GmbH
const LEGAL_FORMS: [&str; 5] = ["e.V.", "gGmbH", "GmbH", "gemeinnützige GmbH", "Verein"];

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageData {
    pub emails: Vec<String>,
    pub phones: Vec<String>,
    pub social_links: Vec<String>,
    pub opening_hours: Vec<String>,
    pub services: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impressum_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impressum: Option<ImpressumData>,
    /// Outgoing links; only filled for overview pages.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub links: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImpressumData {
    pub legal_form: Option<String>,
    pub registration: Option<String>,
}

impl ImpressumData {
    pub fn is_empty(&self) -> bool {
        self.legal_form.is_none() && self.registration.is_none()
    }
}

/// Everything we know how to extract from one page. `scope` narrows the
/// page to the element carrying that class, when present.
pub fn extract_page(html: &str, page_url: &str, scope: Option<&str>) -> PageData {
    let html = scoped(html, scope);
    extract_parts(html, &page_text(html), page_url)
}

/// The element carrying class `scope`, or the whole page.
pub fn scoped<'a>(html: &'a str, scope: Option<&str>) -> &'a str {
    scope
        .and_then(|class| element_with_class_ci(html, class))
        .unwrap_or(html)
}

/// Extraction over markup plus its already computed visible text.
pub fn extract_parts(html: &str, text: &str, page_url: &str) -> PageData {
    let impressum = looks_like_impressum(page_url)
        .then(|| extract_impressum(text))
        .filter(|d| !d.is_empty());

    PageData {
        emails: extract_emails(text),
        phones: extract_phones(text),
        social_links: extract_social_links(html),
        opening_hours: extract_opening_hours(text),
        services: extract_services(html),
        impressum_link: find_impressum_link(html, page_url),
        impressum,
        links: Vec::new(),
    }
}

pub fn extract_emails(text: &str) -> Vec<String> {
    let set: BTreeSet<String> = EMAIL_RE
        .find_iter(text)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .collect();
    set.into_iter().collect()
}

/// Deduplicated by digits; short digit runs (postcodes, years) are dropped.
pub fn extract_phones(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim().to_string())
        .filter(|p| phone_key(p).len() >= 7)
        .filter(|p| seen.insert(phone_key(p)))
        .collect();
    out.sort();
    out
}

pub fn extract_social_links(html: &str) -> Vec<String> {
    let set: BTreeSet<String> = SOCIAL_RE
        .find_iter(html)
        .map(|m| m.as_str().trim_end_matches('.').to_string())
        .collect();
    set.into_iter().collect()
}

pub fn extract_opening_hours(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let headed = HOURS_HEADING_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    let ranges = HOURS_RANGE_RE.find_iter(text).map(|m| m.as_str().trim().to_string());
    for h in headed.chain(ranges) {
        if !h.is_empty() && !out.contains(&h) {
            out.push(h);
        }
    }
    out
}

/// Headings, list items and paragraphs mentioning a care-domain keyword,
/// in document order, at most ten.
pub fn extract_services(html: &str) -> Vec<String> {
    let mut blocks: Vec<(usize, String)> = BLOCK_RES
        .iter()
        .flat_map(|re| re.captures_iter(html))
        .filter_map(|c| {
            let whole = c.get(0)?;
            let inner = c.get(1)?;
            Some((whole.start(), strip_tags(inner.as_str())))
        })
        .collect();
    blocks.sort_by_key(|(pos, _)| *pos);

    let mut out: Vec<String> = Vec::new();
    for (_, text) in blocks {
        let lower = text.to_lowercase();
        if SERVICE_KEYWORDS.iter().any(|k| lower.contains(k)) && !out.contains(&text) {
            out.push(text);
            if out.len() == MAX_SERVICES {
                break;
            }
        }
    }
    out
}

/// First anchor whose text or target mentions the legal notice, made absolute.
pub fn find_impressum_link(html: &str, page_url: &str) -> Option<String> {
    ANCHOR_RE.captures_iter(html).find_map(|c| {
        let href = c.get(1)?.as_str().trim();
        let label = strip_tags(c.get(2)?.as_str()).to_lowercase();
        let href_lc = href.to_lowercase();
        if IMPRESSUM_HINTS.iter().any(|p| label.contains(p) || href_lc.contains(p)) {
            absolute(page_url, href)
        } else {
            None
        }
    })
}

/// Every http(s) link on the page, absolute, fragment dropped, first occurrence kept.
pub fn extract_links(html: &str, page_url: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|c| absolute(page_url, c.get(1)?.as_str().trim()))
        .filter(|u| seen.insert(u.clone()))
        .collect()
}

pub fn extract_impressum(text: &str) -> ImpressumData {
    ImpressumData {
        legal_form: LEGAL_FORMS.iter().find(|f| text.contains(**f)).map(|f| s!(*f)),
        registration: REGISTER_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().trim().to_string()),
    }
}

pub fn looks_like_impressum(url: &str) -> bool {
    let lc = url.to_lowercase();
    lc.contains("impressum") || lc.contains("imprint")
}

fn absolute(base: &str, href: &str) -> Option<String> {
    if href.is_empty() || href.starts_with('#') {
        return None;
    }
    let mut url = match Url::parse(href) {
        Ok(u) => u,
        Err(_) => Url::parse(base).ok()?.join(href).ok()?,
    };
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url.into())
}
