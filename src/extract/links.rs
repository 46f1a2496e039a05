//! Hyperlink strategy
//!
//! An anchor pointing at another site is a candidate when its text reads
//! like an organization name. Links within the same site are navigation and
//! are never candidates; skip-listed hosts are ignored.

use crate::extract::{
    clean_text, truncate_chars, EntityExtractor, Evidence, ExtractionMethod, OrgType,
    OrganizationCandidate,
};
use crate::intent::QueryIntent;
use crate::url::{extract_domain, is_same_site, matches_any};
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// Longest anchor text considered a name
const MAX_NAME_CHARS: usize = 150;

/// Attributes sites use to carry the real target of a `javascript:` link
const SCRIPT_TARGET_ATTRS: &[&str] = &[
    "data-href",
    "data-url",
    "data-link",
    "data-target",
    "data-target-url",
];

impl EntityExtractor {
    pub(super) fn link_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        errors: &mut Vec<ExtractionError>,
    ) -> Vec<OrganizationCandidate> {
        let Ok(selector) = Selector::parse("a[href]") else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for anchor in document.select(&selector) {
            let name = anchor_text(&anchor);
            if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
                continue;
            }

            let url = match self.resolve_href(&anchor, source_url) {
                Ok(Some(url)) => url,
                Ok(None) => continue,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };

            if is_same_site(&url, source_url) || self.is_skipped(&url) {
                continue;
            }

            let context = self.link_context(&anchor);
            let confidence = self.scorer.score(
                &Evidence {
                    name: &name,
                    url: Some(&url),
                    context: Some(&context),
                    base: 0.0,
                },
                intent,
            );

            if !self.accepts(confidence, self.config.link_min_confidence) {
                continue;
            }

            let description = anchor.value().attr("title").map(clean_text);
            candidates.push(
                OrganizationCandidate::new(
                    name.clone(),
                    Some(url.to_string()),
                    OrgType::classify(&name),
                    source_url.as_str(),
                    confidence,
                    ExtractionMethod::LinkAnalysis,
                )
                .with_description(description),
            );
        }

        candidates
    }

    /// Resolves an anchor's target to an absolute HTTP(S) URL
    ///
    /// `javascript:` hrefs are resolved through `data-*` attributes or a
    /// quoted path in `onclick` when the page provides one.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(url))` - A followable target
    /// * `Ok(None)` - Fragment, `mailto:`, `tel:`, `data:`, other schemes, or
    ///   a script link without a recoverable target
    /// * `Err(ExtractionError::Link)` - The href cannot be resolved
    pub(super) fn resolve_href(
        &self,
        anchor: &ElementRef<'_>,
        base: &Url,
    ) -> Result<Option<Url>, ExtractionError> {
        let element = anchor.value();
        let Some(href) = element.attr("href").map(str::trim) else {
            return Ok(None);
        };

        if anchor.value().attr("download").is_some() {
            return Ok(None);
        }

        let lower = href.to_lowercase();
        let target = if lower.starts_with("javascript:") {
            // data-target often holds an element selector such as "#menu"
            let from_attr = SCRIPT_TARGET_ATTRS
                .iter()
                .filter_map(|attr| element.attr(attr))
                .map(str::trim)
                .find(|t| !t.is_empty() && !t.starts_with('#'));

            let from_onclick = || {
                element
                    .attr("onclick")
                    .and_then(|js| self.onclick_target.captures(js))
                    .and_then(|caps| caps.get(1))
                    .map(|m| m.as_str())
            };

            match from_attr.or_else(from_onclick) {
                Some(target) => target,
                None => return Ok(None),
            }
        } else {
            href
        };

        if target.is_empty()
            || target.starts_with('#')
            || lower.starts_with("mailto:")
            || lower.starts_with("tel:")
            || lower.starts_with("data:")
        {
            return Ok(None);
        }

        let url = base.join(target).map_err(|e| ExtractionError::Link {
            href: href.to_string(),
            message: e.to_string(),
        })?;

        if matches!(url.scheme(), "http" | "https") {
            Ok(Some(url))
        } else {
            Ok(None)
        }
    }

    /// Text of the anchor's nearest block of surrounding content
    pub(super) fn link_context(&self, anchor: &ElementRef<'_>) -> String {
        let mut context = String::new();
        for node in anchor.ancestors().take(2) {
            let Some(element) = ElementRef::wrap(node) else {
                break;
            };
            if matches!(element.value().name(), "body" | "html") {
                break;
            }
            context = clean_text(&element.text().collect::<String>());
        }
        truncate_chars(&context, self.config.context_max_chars)
    }

    pub(super) fn is_skipped(&self, url: &Url) -> bool {
        extract_domain(url).is_some_and(|host| matches_any(&self.skip_domains, &host))
    }
}

pub(super) fn anchor_text(anchor: &ElementRef<'_>) -> String {
    let text = clean_text(&anchor.text().collect::<String>());
    if text.is_empty() {
        anchor
            .value()
            .attr("title")
            .or_else(|| anchor.value().attr("aria-label"))
            .map(clean_text)
            .unwrap_or_default()
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::create_extractor;

    fn source() -> Url {
        Url::parse("https://guide.example.org/study/europe").unwrap()
    }

    fn first_anchor_target(html: &str) -> Result<Option<Url>, ExtractionError> {
        let extractor = create_extractor();
        let document = Html::parse_fragment(html);
        let selector = Selector::parse("a").unwrap();
        let anchor = document.select(&selector).next().unwrap();
        extractor.resolve_href(&anchor, &source())
    }

    fn candidates(html: &str) -> Vec<OrganizationCandidate> {
        let extractor = create_extractor();
        let intent = QueryIntent::academic("universities");
        let mut errors = Vec::new();
        extractor.link_candidates(&Html::parse_document(html), &source(), &intent, &mut errors)
    }

    #[test]
    fn test_resolves_relative_and_absolute() {
        assert_eq!(
            first_anchor_target(r#"<a href="../uk">UK</a>"#).unwrap().unwrap().as_str(),
            "https://guide.example.org/uk"
        );
        assert_eq!(
            first_anchor_target(r#"<a href="https://www.example.edu/">X</a>"#)
                .unwrap()
                .unwrap()
                .as_str(),
            "https://www.example.edu/"
        );
    }

    #[test]
    fn test_skips_non_navigable_hrefs() {
        for html in [
            r##"<a href="#top">Top</a>"##,
            r#"<a href="mailto:admissions@example.edu">Mail</a>"#,
            r#"<a href="tel:+15550100">Call</a>"#,
            r#"<a href="data:text/html,hi">Data</a>"#,
            r#"<a href="ftp://files.example.edu/">FTP</a>"#,
            r#"<a href="javascript:void(0)">Script</a>"#,
            r#"<a href="/brochure.pdf" download>Brochure</a>"#,
        ] {
            assert!(first_anchor_target(html).unwrap().is_none(), "{}", html);
        }
    }

    #[test]
    fn test_resolves_javascript_targets() {
        let from_data = first_anchor_target(
            r#"<a href="javascript:void(0)" data-href="https://www.north.edu/">North</a>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(from_data.as_str(), "https://www.north.edu/");

        let from_onclick = first_anchor_target(
            r#"<a href="javascript:;" onclick="window.open('https://www.south.edu/about')">South</a>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(from_onclick.as_str(), "https://www.south.edu/about");
    }

    #[test]
    fn test_resolves_data_target_attributes() {
        let from_target = first_anchor_target(
            r#"<a href="javascript:void(0)" data-target="https://www.east.edu/">East</a>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(from_target.as_str(), "https://www.east.edu/");

        let from_target_url = first_anchor_target(
            r#"<a href="javascript:void(0)" data-target-url="/west">West</a>"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(from_target_url.as_str(), "https://guide.example.org/west");

        // a selector in data-target does not hide a later real target
        let past_selector = first_anchor_target(
            r##"<a href="javascript:void(0)" data-target="#modal" data-target-url="https://www.north.edu/">North</a>"##,
        )
        .unwrap()
        .unwrap();
        assert_eq!(past_selector.as_str(), "https://www.north.edu/");
    }

    #[test]
    fn test_cross_site_institution_link_is_candidate() {
        let found = candidates(
            r#"<body><p>A research university: <a href="https://www.example.edu/">Example University</a></p></body>"#,
        );

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].method, ExtractionMethod::LinkAnalysis);
        assert_eq!(found[0].url.as_deref(), Some("https://www.example.edu/"));
        assert!(found[0].confidence() >= 0.6);
    }

    #[test]
    fn test_same_site_and_skip_listed_links_are_ignored() {
        let found = candidates(
            r#"<body>
                <a href="/example-university">Example University</a>
                <a href="https://www.guide.example.org/other">Other University</a>
                <a href="https://www.facebook.com/ExampleUniversity">Example University</a>
            </body>"#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn test_low_scoring_links_are_dropped() {
        let found = candidates(r#"<body><a href="https://shop.example.com/">buy stuff</a></body>"#);
        assert!(found.is_empty());
    }

    #[test]
    fn test_context_is_bounded() {
        let extractor = create_extractor();
        let long = "research ".repeat(200);
        let html = format!(r#"<div><p>{}<a href="https://x.edu/">X</a></p></div>"#, long);
        let document = Html::parse_fragment(&html);
        let selector = Selector::parse("a").unwrap();
        let anchor = document.select(&selector).next().unwrap();

        let context = extractor.link_context(&anchor);
        assert!(context.chars().count() <= 500);
        assert!(context.starts_with("research"));
    }
}
