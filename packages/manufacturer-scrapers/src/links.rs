//! Link helpers: resolving, PDF detection and datasheet ranking.

use url::Url;

/// Resolve `href` against `base`, dropping fragments.
pub fn resolve(base: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with("javascript:") || href.starts_with("mailto:") {
        return None;
    }
    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url.to_string())
}

/// True if the URL path ends in `.pdf` (query strings ignored).
pub fn is_pdf_link(href: &str) -> bool {
    let path = href.split(['?', '#']).next().unwrap_or(href);
    path.to_ascii_lowercase().ends_with(".pdf")
}

const DATASHEET_MARKERS: &[&str] = &[
    "tds",
    "datasheet",
    "data-sheet",
    "adatlap",
    "muszaki",
    "műszaki",
    "merkblatt",
    "technisch",
    "technical",
];

const LOW_PRIORITY_MARKERS: &[&str] = &["dop", "teljesitmeny", "leistungserkl", "sds", "biztonsag"];

fn rank(url: &str) -> u8 {
    let lower = url.to_lowercase();
    if DATASHEET_MARKERS.iter().any(|m| lower.contains(m)) {
        0
    } else if LOW_PRIORITY_MARKERS.iter().any(|m| lower.contains(m)) {
        2
    } else {
        1
    }
}

/// Deduplicate and order PDF links so technical datasheets come first.
///
/// Declarations of performance and safety sheets go last; the relative order
/// within a rank is preserved.
pub fn rank_datasheets(urls: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut unique: Vec<String> = urls.into_iter().filter(|u| seen.insert(u.clone())).collect();
    unique.sort_by_key(|u| rank(u));
    unique
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_links() {
        let base = Url::parse("https://www.leier.hu/termekek/falazoelemek?page=2").unwrap();
        assert_eq!(
            resolve(&base, "/media/tds.pdf#page=1").as_deref(),
            Some("https://www.leier.hu/media/tds.pdf")
        );
        assert_eq!(
            resolve(&base, "kemeny-tegla").as_deref(),
            Some("https://www.leier.hu/termekek/kemeny-tegla")
        );
        assert_eq!(resolve(&base, "mailto:info@leier.hu"), None);
    }

    #[test]
    fn test_is_pdf_link() {
        assert!(is_pdf_link("https://x.hu/a/B.PDF"));
        assert!(is_pdf_link("/files/tds.pdf?v=3"));
        assert!(!is_pdf_link("/files/tds.pdf.html"));
    }

    #[test]
    fn test_rank_datasheets() {
        let ranked = rank_datasheets(vec![
            "https://x.hu/dop-123.pdf".into(),
            "https://x.hu/brochure.pdf".into(),
            "https://x.hu/muszaki-adatlap.pdf".into(),
            "https://x.hu/brochure.pdf".into(),
        ]);
        assert_eq!(
            ranked,
            vec![
                "https://x.hu/muszaki-adatlap.pdf",
                "https://x.hu/brochure.pdf",
                "https://x.hu/dop-123.pdf",
            ]
        );
    }
}
