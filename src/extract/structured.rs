//! JSON-LD structured data strategy
//!
//! Reads every `<script type="application/ld+json">` block. A block may hold
//! one object, an array of objects, or an object with an `@graph` array;
//! `@type` may be a string or an array of strings. Objects whose type is in
//! the accepted list and that carry a `name` become candidates.

use crate::extract::{
    clean_text, EntityExtractor, Evidence, ExtractionMethod, OrgType, OrganizationCandidate,
};
use crate::intent::QueryIntent;
use crate::ExtractionError;
use scraper::{Html, Selector};
use serde_json::Value;
use url::Url;

const SCHEMA_PREFIXES: &[&str] = &["http://schema.org/", "https://schema.org/", "schema:"];

impl EntityExtractor {
    pub(super) fn structured_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        errors: &mut Vec<ExtractionError>,
    ) -> Vec<OrganizationCandidate> {
        let Ok(selector) = Selector::parse(r#"script[type="application/ld+json"]"#) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for script in document.select(&selector) {
            let raw: String = script.text().collect();
            let value: Value = match serde_json::from_str(raw.trim()) {
                Ok(value) => value,
                Err(e) => {
                    errors.push(e.into());
                    continue;
                }
            };

            let mut nodes = Vec::new();
            collect_nodes(&value, &mut nodes);

            candidates.extend(
                nodes
                    .into_iter()
                    .filter_map(|node| self.structured_candidate(node, source_url, intent)),
            );
        }

        candidates
    }

    fn structured_candidate(
        &self,
        node: &Value,
        source_url: &Url,
        intent: &QueryIntent,
    ) -> Option<OrganizationCandidate> {
        let schema_type = node_types(node)
            .into_iter()
            .find(|t| self.config.accepted_types.iter().any(|a| a == t))?;

        let name = node
            .get("name")
            .and_then(Value::as_str)
            .map(clean_text)
            .filter(|n| !n.is_empty())?;

        let url = node
            .get("url")
            .and_then(Value::as_str)
            .and_then(|u| source_url.join(u.trim()).ok())
            .filter(|u| matches!(u.scheme(), "http" | "https"));

        let description = node
            .get("description")
            .and_then(Value::as_str)
            .map(clean_text);

        // Publishers and site owners are often plain Organization entries
        if schema_type == "Organization" && !self.scorer.has_institution_keyword(&name) {
            return None;
        }

        let confidence = self.scorer.score(
            &Evidence {
                name: &name,
                url: url.as_ref(),
                context: description.as_deref(),
                base: self.config.structured_base,
            },
            intent,
        );

        if !self.accepts(confidence, self.config.structured_min_confidence) {
            tracing::trace!("structured candidate '{}' scored {:.2}", name, confidence);
            return None;
        }

        let org_type = OrgType::from_schema_type(&schema_type).unwrap_or_else(|| OrgType::classify(&name));

        Some(
            OrganizationCandidate::new(
                name,
                url.map(String::from),
                org_type,
                source_url.as_str(),
                confidence,
                ExtractionMethod::StructuredData,
            )
            .with_description(description),
        )
    }
}

/// Flattens arrays and `@graph` containers into their typed objects
fn collect_nodes<'a>(value: &'a Value, nodes: &mut Vec<&'a Value>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_nodes(item, nodes);
            }
        }
        Value::Object(map) => {
            if let Some(graph) = map.get("@graph") {
                collect_nodes(graph, nodes);
            }
            if map.contains_key("@type") {
                nodes.push(value);
            }
        }
        _ => {}
    }
}

fn node_types(node: &Value) -> Vec<String> {
    let raw: Vec<&str> = match node.get("@type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(items)) => items.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|t| {
            SCHEMA_PREFIXES
                .iter()
                .find_map(|p| t.strip_prefix(p))
                .unwrap_or(t)
                .to_string()
        })
        .collect()
}
