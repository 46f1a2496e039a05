//! Table and list strategies
//!
//! Directory pages usually put one institution per table row or list item.
//! The first link in the row (or the first cell's text when there is no
//! link) is the name; the row's text is the context. Rank prefixes and
//! trailing details ("1. Example University – Springfield") are cut from the
//! name. A link back into the same site describes the organization but is
//! not its website, so such candidates carry no URL.

use crate::extract::links::anchor_text;
use crate::extract::{
    clean_text, truncate_chars, EntityExtractor, Evidence, ExtractionMethod, OrgType,
    OrganizationCandidate,
};
use crate::intent::QueryIntent;
use crate::url::is_same_site;
use crate::ExtractionError;
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// List items longer than this are prose, not names
const MAX_ITEM_CHARS: usize = 120;

impl EntityExtractor {
    pub(super) fn table_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        errors: &mut Vec<ExtractionError>,
    ) -> Vec<OrganizationCandidate> {
        let (Ok(rows), Ok(cells), Ok(header_cells)) = (
            Selector::parse("table tr"),
            Selector::parse("td, th"),
            Selector::parse("td"),
        ) else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for row in document.select(&rows) {
            let Some(first) = row.select(&cells).next() else {
                errors.push(ExtractionError::Row("table row without cells".to_string()));
                continue;
            };

            // Header rows have no data cells
            if row.select(&header_cells).next().is_none() {
                continue;
            }

            match self.row_candidate(
                &row,
                &first,
                source_url,
                intent,
                ExtractionMethod::TableExtraction,
            ) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        candidates
    }

    pub(super) fn list_candidates(
        &self,
        document: &Html,
        source_url: &Url,
        intent: &QueryIntent,
        errors: &mut Vec<ExtractionError>,
    ) -> Vec<OrganizationCandidate> {
        let (Ok(items), Ok(nested)) = (Selector::parse("ul > li, ol > li"), Selector::parse("ul, ol"))
        else {
            return Vec::new();
        };

        let mut candidates = Vec::new();
        for item in document.select(&items) {
            // Menus nest lists; only leaf items name things
            if item.select(&nested).next().is_some() {
                continue;
            }

            match self.row_candidate(&item, &item, source_url, intent, ExtractionMethod::ListExtraction) {
                Ok(Some(candidate)) => candidates.push(candidate),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        candidates
    }

    /// Builds a candidate from a row (or item) and the cell holding the name
    fn row_candidate(
        &self,
        row: &ElementRef<'_>,
        name_cell: &ElementRef<'_>,
        source_url: &Url,
        intent: &QueryIntent,
        method: ExtractionMethod,
    ) -> Result<Option<OrganizationCandidate>, ExtractionError> {
        let Ok(anchors) = Selector::parse("a[href]") else {
            return Ok(None);
        };

        let anchor = name_cell.select(&anchors).next();
        let raw = match &anchor {
            Some(anchor) => anchor_text(anchor),
            None => clean_text(&name_cell.text().collect::<String>()),
        };

        if raw.is_empty() {
            if method == ExtractionMethod::TableExtraction {
                return Err(ExtractionError::Row("first cell is empty".to_string()));
            }
            return Ok(None);
        }
        if raw.chars().count() > MAX_ITEM_CHARS {
            return Ok(None);
        }
        let Some(name) = self.item_names.clean(&raw) else {
            return Ok(None);
        };

        let url = match &anchor {
            Some(anchor) => self
                .resolve_href(anchor, source_url)?
                .filter(|u| !is_same_site(u, source_url) && !self.is_skipped(u)),
            None => None,
        };

        let context = truncate_chars(
            &clean_text(&row.text().collect::<String>()),
            self.config.context_max_chars,
        );

        let confidence = self.scorer.score(
            &Evidence {
                name: &name,
                url: url.as_ref(),
                context: Some(&context),
                base: 0.0,
            },
            intent,
        );

        if !self.accepts(confidence, self.config.table_min_confidence) {
            return Ok(None);
        }

        let description = (context != name).then_some(context);
        Ok(Some(
            OrganizationCandidate::new(
                name.clone(),
                url.map(String::from),
                OrgType::classify(&name),
                source_url.as_str(),
                confidence,
                method,
            )
            .with_description(description),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::tests::create_extractor;
    use crate::intent::{KeywordAnalyzer, QueryAnalyzer};

    fn source() -> Url {
        Url::parse("https://guide.example.org/directory").unwrap()
    }

    fn analyzed_intent() -> QueryIntent {
        KeywordAnalyzer::new().analyze("universities")
    }

    #[test]
    fn test_table_rows_become_candidates() {
        let html = r#"<table>
            <tr><th>Institution</th><th>City</th></tr>
            <tr><td><a href="https://www.north.edu/">North University</a></td><td>Research campus</td></tr>
            <tr><td>South Polytechnic Institute</td><td>Research campus</td></tr>
            <tr><td>Parking</td><td>Lot B</td></tr>
        </table>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.table_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].name, "North University");
        assert_eq!(found[0].url.as_deref(), Some("https://www.north.edu/"));
        assert_eq!(found[0].method, ExtractionMethod::TableExtraction);
        assert_eq!(found[1].name, "South Polytechnic Institute");
        assert!(found[1].url.is_none());
        assert!(errors.is_empty());
    }

    #[test]
    fn test_empty_first_cell_is_a_row_error() {
        let html = r#"<table><tr><td></td><td>x</td></tr><tr><td><a href="https://www.east.edu/">East University</a></td></tr></table>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.table_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        assert_eq!(found.len(), 1);
        assert_eq!(errors.len(), 1);
        assert!(matches!(errors[0], ExtractionError::Row(_)));
    }

    #[test]
    fn test_list_items_become_candidates() {
        let html = r#"<ul>
            <li><a href="https://www.west.edu/">West University</a> - public research university</li>
            <li><a href="/about">About</a></li>
            <li>Cafeteria hours</li>
        </ul>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.list_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "West University");
        assert_eq!(found[0].method, ExtractionMethod::ListExtraction);
        assert_eq!(
            found[0].description.as_deref(),
            Some("West University - public research university")
        );
    }

    #[test]
    fn test_numbered_items_are_cleaned_before_scoring() {
        let html = r#"<ol>
            <li>1. Harvard University – Cambridge, MA, a private research university</li>
            <li>#2 <a href="https://www.north.edu/">North University</a> (public)</li>
            <li>3. Scholarships in Germany for International Students</li>
        </ol>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.list_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        let names: Vec<&str> = found.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Harvard University", "North University"]);
        assert!(found[0].url.is_none());
        assert_eq!(found[1].url.as_deref(), Some("https://www.north.edu/"));
    }

    #[test]
    fn test_ranked_table_cells_are_cleaned() {
        let html = r#"<table>
            <tr><th>Rank</th><th>Institution</th></tr>
            <tr><td>=8. East College - Research campus</td><td>USA</td></tr>
        </table>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.table_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "East College");
    }

    #[test]
    fn test_nested_menu_items_are_skipped() {
        let html = r#"<ul><li>Universities<ul><li><a href="https://www.north.edu/">North University</a></li></ul></li></ul>"#;
        let extractor = create_extractor();
        let intent = analyzed_intent();
        let mut errors = Vec::new();

        let found = extractor.list_candidates(&Html::parse_document(html), &source(), &intent, &mut errors);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "North University");
    }
}
