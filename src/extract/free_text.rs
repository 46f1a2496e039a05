//! Free-text strategy
//!
//! The page's visible text goes to the query analyzer's entity recognizer;
//! organization entities are scored from a low base since they carry no URL
//! and no structural evidence.

use crate::extract::{
    clean_text, truncate_chars, EntityExtractor, Evidence, ExtractionMethod, OrgType,
    OrganizationCandidate,
};
use crate::intent::{EntityLabel, QueryIntent};
use scraper::{Html, Node};
use std::collections::HashSet;
use url::Url;

/// Elements whose text is never rendered
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template", "head"];

impl EntityExtractor {
    pub(super) fn free_text_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
    ) -> Vec<OrganizationCandidate> {
        let text = truncate_chars(&visible_text(document), self.config.max_text_chars);
        if text.is_empty() {
            return Vec::new();
        }

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for entity in self.analyzer.extract_entities(&text) {
            if entity.label != EntityLabel::Organization || !seen.insert(entity.text.clone()) {
                continue;
            }

            let confidence = self.scorer.score(
                &Evidence {
                    name: &entity.text,
                    url: None,
                    context: None,
                    base: self.config.free_text_base,
                },
                intent,
            );

            if self.accepts(confidence, self.config.free_text_min_confidence) {
                candidates.push(OrganizationCandidate::new(
                    entity.text.clone(),
                    None,
                    OrgType::classify(&entity.text),
                    source_url.as_str(),
                    confidence,
                    ExtractionMethod::FreeText,
                ));
            }
        }

        candidates
    }
}

/// Concatenates the document's rendered text, skipping scripts and styles
pub fn visible_text(document: &Html) -> String {
    let mut parts = Vec::new();

    for node in document.tree.root().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|e| HIDDEN_ELEMENTS.contains(&e.name()))
        });

        if !hidden && !text.trim().is_empty() {
            parts.push(text.trim().to_string());
        }
    }

    clean_text(&parts.join(" "))
}
