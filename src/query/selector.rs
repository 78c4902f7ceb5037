//! Local selector-based metadata query
//!
//! Takes one HTML snapshot of the page and resolves every schema field to
//! the text of the first element its selector matches.

use super::{MetadataQuery, MetadataSchema, QueryError, QueryResult};
use crate::record::Metadata;
use crate::surface::Surface;
use async_trait::async_trait;
use scraper::{Html, Selector};

/// Resolves schema selectors against a snapshot of the page HTML
#[derive(Debug, Clone, Default)]
pub struct SelectorQuery;

impl SelectorQuery {
    pub fn new() -> Self {
        Self
    }
}

/// Resolves every field of `schema` in `html`
///
/// A snapshot in which no field resolves at all is reported as a transient
/// failure: the details panel is most likely still rendering.
pub fn resolve_fields(html: &str, schema: &MetadataSchema) -> QueryResult<Metadata> {
    let document = Html::parse_document(html);
    let mut metadata = Metadata::new();

    for field in &schema.fields {
        let selector = Selector::parse(&field.selector)
            .map_err(|_| QueryError::Selector(field.selector.clone()))?;

        let value = document
            .select(&selector)
            .next()
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .filter(|text| !text.is_empty());

        metadata.insert(field.name.clone(), value);
    }

    if !schema.fields.is_empty() && metadata.values().all(Option::is_none) {
        return Err(QueryError::Transient(format!(
            "none of the {} `{}` fields resolved",
            schema.fields.len(),
            schema.root
        )));
    }

    Ok(metadata)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl MetadataQuery for SelectorQuery {
    fn name(&self) -> &str {
        "selectors"
    }

    async fn query(
        &self,
        surface: &dyn Surface,
        schema: &MetadataSchema,
    ) -> QueryResult<Metadata> {
        let html = surface.content().await?;
        resolve_fields(&html, schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::FieldSpec;

    fn schema() -> MetadataSchema {
        MetadataSchema {
            root: "job_details".to_string(),
            fields: vec![
                FieldSpec {
                    name: "job_title".to_string(),
                    selector: ".top-card__job-title".to_string(),
                },
                FieldSpec {
                    name: "org_name".to_string(),
                    selector: ".top-card__company-name".to_string(),
                },
                FieldSpec {
                    name: "salary".to_string(),
                    selector: ".top-card__salary".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_resolves_first_match_and_collapses_whitespace() {
        let html = r#"<html><body>
            <h1 class="top-card__job-title">  Senior
                Data Analyst </h1>
            <h1 class="top-card__job-title">Second</h1>
            <a class="top-card__company-name">Acme <b>Corp</b></a>
        </body></html>"#;

        let metadata = resolve_fields(html, &schema()).unwrap();
        assert_eq!(
            metadata.get("job_title").cloned().flatten().as_deref(),
            Some("Senior Data Analyst")
        );
        assert_eq!(
            metadata.get("org_name").cloned().flatten().as_deref(),
            Some("Acme Corp")
        );
        assert_eq!(metadata.get("salary"), Some(&None));
    }

    #[test]
    fn test_nothing_resolved_is_transient() {
        let result = resolve_fields("<html><body><p>loading</p></body></html>", &schema());
        assert!(matches!(result, Err(QueryError::Transient(_))));
    }

    #[test]
    fn test_invalid_selector() {
        let schema = MetadataSchema {
            root: "job_details".to_string(),
            fields: vec![FieldSpec {
                name: "broken".to_string(),
                selector: "[[[".to_string(),
            }],
        };
        let result = resolve_fields("<html></html>", &schema);
        assert!(matches!(result, Err(QueryError::Selector(_))));
    }

    #[tokio::test]
    async fn test_query_reads_surface_content() {
        use crate::surface::testing::FakeSurface;

        let surface = FakeSurface::new().with_text(
            "html",
            r#"<div class="top-card__job-title">Analyst</div>"#,
        );
        let metadata = SelectorQuery::new().query(&surface, &schema()).await.unwrap();
        assert_eq!(
            metadata.get("job_title").cloned().flatten().as_deref(),
            Some("Analyst")
        );
        assert_eq!(surface.count_calls("content"), 1);
    }
}
